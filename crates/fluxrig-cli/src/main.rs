//! fluxrig CLI — run experiment plans and validate inputs.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "fluxrig")]
#[command(version, about = "fluxrig — fault-tolerant field-solver experiment runner")]
struct Cli {
    /// Mirror orchestration events to stderr (filter with RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an experiment plan against a reference machine fixture.
    Run {
        /// Experiment plan (TOML).
        #[arg(short, long, default_value = "plan.toml")]
        plan: PathBuf,

        /// Reference machine description (TOML).
        #[arg(short, long)]
        fixture: PathBuf,

        /// Session log, appended to.
        #[arg(short, long, default_value = fluxrig_types::constants::DEFAULT_LOG_FILE)]
        log: PathBuf,

        /// Report file (JSON). Printed to stdout when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a plan, or a fixture with --fixture.
    Validate {
        /// Path to the TOML file.
        path: PathBuf,

        /// Treat the file as a machine fixture instead of a plan.
        #[arg(long)]
        fixture: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let result = match cli.command {
        Commands::Run {
            plan,
            fixture,
            log,
            output,
        } => commands::run(&plan, &fixture, &log, output.as_deref(), cli.verbose),
        Commands::Validate { path, fixture } => commands::validate(&path, fixture),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
