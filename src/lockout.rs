//! Lockout after repeated failed biometric challenges.
//!
//! After `max_failures` consecutive failures the biometric affordance is
//! suspended and the user falls back to credentials. The suspension grows
//! exponentially with every further failure. Cancellations are not failures.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

/// Default consecutive failures before lockout
pub const DEFAULT_MAX_FAILURES: u32 = 3;

/// Upper bound on a single lockout (one week)
pub const MAX_LOCKOUT_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Lockout configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LockoutConfig {
    /// Consecutive failures that trigger a lockout
    pub max_failures: u32,
    /// Base lockout duration in seconds (exponential backoff multiplier)
    pub base_lockout_seconds: i64,
    pub enabled: bool,
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            max_failures: DEFAULT_MAX_FAILURES,
            base_lockout_seconds: 30,
            enabled: true,
        }
    }
}

impl LockoutConfig {
    /// Lockout duration for a failure count: 2^(failures - max_failures) * base
    pub fn calculate_lockout_duration(&self, failures: u32) -> Option<Duration> {
        if !self.enabled || failures < self.max_failures {
            return None;
        }

        let excess = failures - self.max_failures;
        let multiplier = 2_i64.pow(excess.min(10)); // Cap at 2^10 to avoid overflow
        let seconds = self
            .base_lockout_seconds
            .max(0)
            .checked_mul(multiplier)
            .unwrap_or(MAX_LOCKOUT_SECONDS)
            .min(MAX_LOCKOUT_SECONDS);
        Some(Duration::seconds(seconds))
    }
}

/// In-memory consecutive failure counter
#[derive(Debug, Clone)]
pub struct FailureTracker {
    config: LockoutConfig,
    consecutive_failures: u32,
    last_failure: Option<DateTime<Utc>>,
}

impl FailureTracker {
    pub fn new(config: LockoutConfig) -> Self {
        Self {
            config,
            consecutive_failures: 0,
            last_failure: None,
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn max_failures(&self) -> u32 {
        self.config.max_failures
    }

    pub fn record_failure(&mut self, at: DateTime<Utc>) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_failure = Some(at);
    }

    /// Clear the counter (successful challenge or credential sign-in)
    pub fn reset(&mut self) {
        self.consecutive_failures = 0;
        self.last_failure = None;
    }

    pub fn locked_until(&self) -> Option<DateTime<Utc>> {
        let duration = self.config.calculate_lockout_duration(self.consecutive_failures)?;
        self.last_failure.map(|last| last + duration)
    }

    pub fn is_locked_out(&self, now: DateTime<Utc>) -> bool {
        self.locked_until().is_some_and(|until| now < until)
    }

    /// Remaining lockout in whole seconds, if any
    pub fn remaining_lockout_seconds(&self, now: DateTime<Utc>) -> Option<i64> {
        let remaining = (self.locked_until()? - now).num_seconds();
        (remaining > 0).then_some(remaining)
    }
}
