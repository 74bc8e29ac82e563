//! Batch scheduler configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::SchedulerError;

const fn default_capacity() -> usize {
    1
}

const fn default_concurrency() -> usize {
    1
}

/// Scheduler configuration.
///
/// Degenerate values are accepted and silently normalized rather than
/// rejected: a zero `capacity` or `concurrency` falls back to 1, the uniform
/// default on every construction path. `delay_ms = 0` is valid and means a
/// window becomes urgent at the next scheduling opportunity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Maximum items per batch; also the timer-window size.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Maximum simultaneous worker invocations.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Maximum time in milliseconds a window may wait before being flushed.
    #[serde(default)]
    pub delay_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            concurrency: default_concurrency(),
            delay_ms: 0,
        }
    }
}

impl BatchConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum batch size.
    #[must_use]
    pub const fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the maximum number of simultaneous worker invocations.
    #[must_use]
    pub const fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the maximum wait before a partial window is flushed.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay_ms = delay.as_millis() as u64;
        self
    }

    /// The flush delay as a [`Duration`].
    #[must_use]
    pub const fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Resolve degenerate values to their defaults.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            capacity: self.capacity.max(default_capacity()),
            concurrency: self.concurrency.max(default_concurrency()),
            delay_ms: self.delay_ms,
        }
    }

    /// Parse a configuration from a JSON string and normalize it.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Config`] if the input is not valid JSON for
    /// this shape. Out-of-range values are not an error; they normalize.
    pub fn from_json_str(input: &str) -> Result<Self, SchedulerError> {
        let cfg: Self = serde_json::from_str(input)
            .map_err(|e| SchedulerError::Config(format!("parse error: {e}")))?;
        Ok(cfg.normalized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = BatchConfig::new();
        assert_eq!(cfg.capacity, 1);
        assert_eq!(cfg.concurrency, 1);
        assert_eq!(cfg.delay(), Duration::ZERO);
    }

    #[test]
    fn builder_setters() {
        let cfg = BatchConfig::new()
            .with_capacity(42)
            .with_concurrency(43)
            .with_delay(Duration::from_millis(44));
        assert_eq!(cfg.capacity, 42);
        assert_eq!(cfg.concurrency, 43);
        assert_eq!(cfg.delay_ms, 44);
    }

    #[test]
    fn zero_values_normalize_to_defaults() {
        let cfg = BatchConfig {
            capacity: 0,
            concurrency: 0,
            delay_ms: 0,
        }
        .normalized();
        assert_eq!(cfg.capacity, 1);
        assert_eq!(cfg.concurrency, 1);
        assert_eq!(cfg.delay_ms, 0);
    }

    #[test]
    fn json_with_missing_fields_uses_defaults() {
        let cfg = BatchConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg.capacity, 1);
        assert_eq!(cfg.concurrency, 1);
        assert_eq!(cfg.delay_ms, 0);
    }

    #[test]
    fn json_full_shape() {
        let cfg =
            BatchConfig::from_json_str(r#"{"capacity": 10, "concurrency": 3, "delay_ms": 250}"#)
                .unwrap();
        assert_eq!(cfg.capacity, 10);
        assert_eq!(cfg.concurrency, 3);
        assert_eq!(cfg.delay(), Duration::from_millis(250));
    }

    #[test]
    fn json_parse_error() {
        let err = BatchConfig::from_json_str("not json").unwrap_err();
        assert!(err.to_string().contains("config parse error"));
    }
}
