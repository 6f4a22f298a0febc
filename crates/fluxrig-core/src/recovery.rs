//! Retry policy for the fault-recovery loop.
//!
//! A failed attempt costs one unit of the budget whether it failed inside
//! the operation or while reopening the session for it.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use fluxrig_types::constants::{DEFAULT_BACKOFF_MS, DEFAULT_MAX_ATTEMPTS};

/// Delay between a failed attempt and the next one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Backoff {
    /// Retry immediately.
    None,
    /// Same delay before every retry.
    Fixed { delay_ms: u64 },
    /// `initial_ms · factor^(attempt-1)`, capped at `max_ms`.
    Exponential {
        initial_ms: u64,
        factor: f64,
        max_ms: u64,
    },
}

impl Backoff {
    /// Delay after the `attempt`-th (1-based) failure.
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::None => Duration::ZERO,
            Backoff::Fixed { delay_ms } => Duration::from_millis(delay_ms),
            Backoff::Exponential {
                initial_ms,
                factor,
                max_ms,
            } => {
                let exponent = attempt.saturating_sub(1).min(63) as i32;
                let ms = initial_ms as f64 * factor.max(1.0).powi(exponent);
                Duration::from_millis(ms.min(max_ms as f64) as u64)
            }
        }
    }
}

/// How many times an operation is attempted, and how long to wait between.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Must be >= 1.
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Backoff::Fixed {
                delay_ms: DEFAULT_BACKOFF_MS,
            },
        }
    }
}

impl RetryPolicy {
    /// One attempt, no retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            backoff: Backoff::None,
        }
    }

    /// `max_attempts` attempts without waiting.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::None,
        }
    }

    /// True when no attempt is left after `attempt` failures.
    pub fn is_exhausted(&self, attempt: u32) -> bool {
        attempt >= self.max_attempts.max(1)
    }
}
