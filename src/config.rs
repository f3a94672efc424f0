use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// How many times to try an operation and how long to wait in between.
///
/// `max_retries` is the total number of attempts, so a value of 1 means the
/// operation runs once and is never retried.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts before giving up.
    pub max_retries: u32,

    /// Delay, in milliseconds, after the first failed attempt.
    pub initial_delay_ms: u64,

    /// Multiplier applied to the delay after each further failure.
    pub factor: f64,

    /// Upper bound, in milliseconds, on any single delay.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 100,
            factor: 2.0,
            max_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("backoff factor must be a finite number >= 1, got {0}")]
    InvalidFactor(f64),
    #[error("max delay ({max_delay_ms}ms) is smaller than initial delay ({initial_delay_ms}ms)")]
    MaxDelayBelowInitial {
        initial_delay_ms: u64,
        max_delay_ms: u64,
    },
}

impl RetryConfig {
    /// Durations are truncated to whole milliseconds.
    #[must_use]
    pub fn new(max_retries: u32, initial_delay: Duration, factor: f64, max_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay_ms: duration_to_ms(initial_delay),
            factor,
            max_delay_ms: duration_to_ms(max_delay),
        }
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay_ms = duration_to_ms(initial_delay);
        self
    }

    #[must_use]
    pub fn with_factor(mut self, factor: f64) -> Self {
        self.factor = factor;
        self
    }

    #[must_use]
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay_ms = duration_to_ms(max_delay);
        self
    }

    /// Checks the expectations on the config that `execute` itself does not enforce.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.factor.is_finite() || self.factor < 1.0 {
            return Err(ConfigError::InvalidFactor(self.factor));
        }
        if self.max_delay_ms < self.initial_delay_ms {
            return Err(ConfigError::MaxDelayBelowInitial {
                initial_delay_ms: self.initial_delay_ms,
                max_delay_ms: self.max_delay_ms,
            });
        }
        Ok(())
    }

    /// The wait after attempt `attempt` (1-based) fails and before the next one starts:
    /// `min(initial_delay * factor^(attempt - 1), max_delay)`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = f64::from(attempt.saturating_sub(1));
        #[allow(clippy::cast_precision_loss)]
        let max_ms = self.max_delay_ms as f64;
        #[allow(clippy::cast_precision_loss)]
        let raw_ms = self.initial_delay_ms as f64 * self.factor.powf(exponent);
        // f64::min picks max_ms when raw_ms is NaN; infinity clamps the same way
        let ms = raw_ms.min(max_ms).max(0.0);
        let whole_ms = ms.trunc();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (whole, frac_ns) = (whole_ms as u64, ((ms - whole_ms) * 1_000_000.0).round() as u64);
        Duration::from_millis(whole) + Duration::from_nanos(frac_ns)
    }
}

fn duration_to_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod test {
    use super::{ConfigError, RetryConfig};
    use std::time::Duration;

    #[test]
    fn delays_grow_then_clamp() {
        let config = RetryConfig::default();
        let delays: Vec<_> = (1..=6).map(|a| config.delay_for(a)).collect();
        assert_eq!(
            delays,
            [100, 200, 400, 800, 1000, 1000].map(Duration::from_millis)
        );
    }

    #[test]
    fn large_attempts_never_exceed_max_delay() {
        let config = RetryConfig::default().with_factor(10.0);
        for attempt in [10, 100, 1_000, u32::MAX] {
            assert_eq!(config.delay_for(attempt), Duration::from_millis(1000));
        }
    }

    #[test]
    fn fractional_factor_is_exact() {
        let config = RetryConfig::default().with_factor(1.5);
        assert_eq!(config.delay_for(2), Duration::from_millis(150));
        assert_eq!(config.delay_for(3), Duration::from_millis(225));
    }

    #[test]
    fn max_delay_below_initial_clamps_first_delay() {
        let config = RetryConfig::new(
            3,
            Duration::from_millis(500),
            2.0,
            Duration::from_millis(50),
        );
        assert_eq!(config.delay_for(1), Duration::from_millis(50));
        assert_eq!(
            config.validate(),
            Err(ConfigError::MaxDelayBelowInitial {
                initial_delay_ms: 500,
                max_delay_ms: 50
            })
        );
    }

    #[test]
    fn nan_factor_falls_back_to_max_delay() {
        let config = RetryConfig::default().with_factor(f64::NAN);
        assert_eq!(config.delay_for(2), Duration::from_millis(1000));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidFactor(f)) if f.is_nan()
        ));
    }

    #[test]
    fn shrinking_factor_is_rejected() {
        let config = RetryConfig::default().with_factor(0.5);
        assert_eq!(config.validate(), Err(ConfigError::InvalidFactor(0.5)));
        assert!(RetryConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_config_uses_defaults() {
        let config: RetryConfig =
            serde_json::from_str(r#"{"max_retries": 5, "max_delay_ms": 200}"#).expect("valid json");
        assert_eq!(
            config,
            RetryConfig::default()
                .with_max_retries(5)
                .with_max_delay(Duration::from_millis(200))
        );
    }
}
