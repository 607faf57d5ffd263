//! Retry policy with exponential backoff, and the sleep abstraction the
//! collector pauses through.
//!
//! Bitfinex rate-limits public REST calls somewhere between 10 and 90
//! requests per minute depending on server load, and does not say which.
//! The collector therefore backs off aggressively: 30 s, then doubling.

use std::time::Duration;

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{BitfxError, Result};

fn default_max_attempts() -> u32 {
    10
}

fn default_initial_delay_secs() -> f64 {
    30.0
}

fn default_multiplier() -> f64 {
    2.0
}

/// How many times to ask for one symbol's rate, and how long to pause after
/// each failed attempt.
///
/// The pause after failed attempt `n` (0-based) is
/// `initial_delay * multiplier ^ n`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Attempts per symbol before giving up on it.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Pause after the first failed attempt, in seconds.
    #[serde(default = "default_initial_delay_secs")]
    pub initial_delay_secs: f64,

    /// Factor applied to the pause after every failed attempt.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_secs: default_initial_delay_secs(),
            multiplier: default_multiplier(),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration, multiplier: f64) -> Self {
        Self {
            max_attempts,
            initial_delay_secs: initial_delay.as_secs_f64(),
            multiplier,
        }
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.initial_delay_secs).unwrap_or(Duration::ZERO)
    }

    /// Pause to apply after failed attempt `attempt` (0-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let scale = self.multiplier.powi(attempt as i32);
        let seconds = self.initial_delay_secs * scale;
        Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
    }

    /// Every pause an always-failing symbol goes through, in order.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_attempts).map(|attempt| self.delay_for_attempt(attempt))
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(BitfxError::config("retry.max_attempts must be at least 1"));
        }
        if !self.initial_delay_secs.is_finite() || self.initial_delay_secs < 0.0 {
            return Err(BitfxError::config(format!(
                "retry.initial_delay_secs must be a non-negative number, got {}",
                self.initial_delay_secs
            )));
        }
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(BitfxError::config(format!(
                "retry.multiplier must be at least 1.0, got {}",
                self.multiplier
            )));
        }
        Ok(())
    }
}

/// Pauses the collector between attempts.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()>;
}

/// Real wall-clock pause on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Returns immediately and remembers every requested pause.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    pauses: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.lock().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()> {
        self.pauses.lock().push(duration);
        Box::pin(async {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_doubles_from_thirty_seconds() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.max_attempts, 10);
        assert_eq!(policy.initial_delay(), Duration::from_secs(30));
        assert_eq!(policy.delay_for_attempt(0), Duration::from_secs(30));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(60));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(120));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_secs(240));
        assert_eq!(policy.delay_for_attempt(9), Duration::from_secs(15_360));
    }

    #[test]
    fn delays_yield_one_pause_per_attempt() {
        let policy = RetryPolicy::new(4, Duration::from_millis(250), 3.0);
        let delays: Vec<Duration> = policy.delays().collect();

        assert_eq!(
            delays,
            vec![
                Duration::from_millis(250),
                Duration::from_millis(750),
                Duration::from_millis(2250),
                Duration::from_millis(6750),
            ]
        );
    }

    #[test]
    fn validate_rejects_unusable_policies() {
        assert!(RetryPolicy::default().validate().is_ok());
        assert!(RetryPolicy::new(0, Duration::from_secs(1), 2.0).validate().is_err());
        assert!(RetryPolicy::new(3, Duration::from_secs(1), 0.5).validate().is_err());

        let negative = RetryPolicy {
            initial_delay_secs: -1.0,
            ..RetryPolicy::default()
        };
        assert!(matches!(negative.validate(), Err(BitfxError::Config(_))));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let policy: RetryPolicy = serde_json::from_str(r#"{ "max_attempts": 3 }"#).unwrap();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.initial_delay(), Duration::from_secs(30));
        assert!((policy.multiplier - 2.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn recording_sleeper_returns_immediately() {
        let sleeper = RecordingSleeper::new();
        sleeper.sleep(Duration::from_secs(3600)).await;
        sleeper.sleep(Duration::from_secs(7200)).await;

        assert_eq!(
            sleeper.pauses(),
            vec![Duration::from_secs(3600), Duration::from_secs(7200)]
        );
    }
}
