//! Orchestration defaults.

/// Default number of attempts (first try included) per public operation.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default delay before the first retry (milliseconds).
pub const DEFAULT_BACKOFF_MS: u64 = 500;

/// Upper bound on sequential magnet label probes.
pub const DEFAULT_MAGNET_PROBE_LIMIT: u32 = 256;

/// Decimal places kept when writing phase currents.
pub const DEFAULT_CURRENT_DECIMALS: u32 = 2;

/// Default session log file, relative to the working directory.
pub const DEFAULT_LOG_FILE: &str = "log.txt";

/// Prefix of failure lines in the session log. Log readers grep for it.
pub const FAILURE_TAG: &str = "Ошибка";
