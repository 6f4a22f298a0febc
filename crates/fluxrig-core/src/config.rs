//! Orchestrator configuration.
//!
//! Parameters that control recovery, solve supervision and how model
//! regions are named.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use fluxrig_types::constants::{DEFAULT_CURRENT_DECIMALS, DEFAULT_MAGNET_PROBE_LIMIT};
use fluxrig_types::{FluxrigError, FluxrigResult, LabelScheme};

use crate::recovery::{Backoff, RetryPolicy};

/// Configuration for the [`Orchestrator`](crate::Orchestrator).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Attempts and backoff per public operation.
    pub retry: RetryPolicy,

    /// Longest a solve + analyze may take (seconds). `None` waits forever.
    pub solve_timeout_secs: Option<f64>,

    /// Region naming used by the model.
    pub labels: LabelScheme,

    /// Upper bound on sequential magnet label probes.
    pub magnet_probe_limit: u32,

    /// Decimal places kept when writing phase currents.
    pub current_decimals: u32,

    /// Re-apply magnets, rotor angle and phase currents set by earlier
    /// calls after a session is rebuilt.
    pub replay_setup: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            solve_timeout_secs: None,
            labels: LabelScheme::latin(),
            magnet_probe_limit: DEFAULT_MAGNET_PROBE_LIMIT,
            current_decimals: DEFAULT_CURRENT_DECIMALS,
            replay_setup: true,
        }
    }
}

impl OrchestratorConfig {
    /// Single attempt, no waiting. Failures surface immediately.
    pub fn fast_fail() -> Self {
        Self {
            retry: RetryPolicy::no_retry(),
            ..Default::default()
        }
    }

    /// For flaky engines: more attempts, exponential backoff, solve timeout.
    pub fn patient() -> Self {
        Self {
            retry: RetryPolicy {
                max_attempts: 10,
                backoff: Backoff::Exponential {
                    initial_ms: 1_000,
                    factor: 2.0,
                    max_ms: 60_000,
                },
            },
            solve_timeout_secs: Some(600.0),
            ..Default::default()
        }
    }

    /// Builder: replace the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Builder: replace the label scheme.
    pub fn with_labels(mut self, labels: LabelScheme) -> Self {
        self.labels = labels;
        self
    }

    /// The solve timeout as a `Duration`. Values `validate` rejects
    /// give `None`.
    pub fn solve_timeout(&self) -> Option<Duration> {
        self.solve_timeout_secs
            .and_then(|t| Duration::try_from_secs_f64(t).ok())
    }

    /// Checks ranges the orchestrator relies on.
    pub fn validate(&self) -> FluxrigResult<()> {
        if self.retry.max_attempts == 0 {
            return Err(FluxrigError::InvalidConfig(
                "retry.max_attempts must be >= 1".into(),
            ));
        }
        if let Backoff::Exponential { factor, .. } = self.retry.backoff {
            if !(factor >= 1.0) {
                return Err(FluxrigError::InvalidConfig(
                    "exponential backoff factor must be >= 1".into(),
                ));
            }
        }
        if let Some(t) = self.solve_timeout_secs {
            if !(t.is_finite() && t > 0.0) {
                return Err(FluxrigError::InvalidConfig(
                    "solve_timeout_secs must be positive".into(),
                ));
            }
            if Duration::try_from_secs_f64(t).is_err() {
                return Err(FluxrigError::InvalidConfig(format!(
                    "solve_timeout_secs {t} does not fit a duration"
                )));
            }
        }
        if self.magnet_probe_limit == 0 {
            return Err(FluxrigError::InvalidConfig(
                "magnet_probe_limit must be >= 1".into(),
            ));
        }
        if self.current_decimals > 12 {
            return Err(FluxrigError::InvalidConfig(
                "current_decimals must be <= 12".into(),
            ));
        }
        let l = &self.labels;
        if l.phase_prefix.is_empty() || l.magnet_prefix.is_empty() {
            return Err(FluxrigError::InvalidConfig(
                "label prefixes must not be empty".into(),
            ));
        }
        Ok(())
    }
}
