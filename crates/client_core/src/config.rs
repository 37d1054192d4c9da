use std::time::Duration;

use shared::domain::OperatorId;

use crate::error::ConfigError;

pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(10_000);
pub const DEFAULT_MIN_DELAY: Duration = Duration::from_millis(30_000);
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(60_000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatorConfig {
    pub operator_id: OperatorId,
    pub enabled: bool,
    /// Delay before the first call of the controller's lifetime.
    pub initial_delay: Duration,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            operator_id: OperatorId(0),
            enabled: true,
            initial_delay: DEFAULT_INITIAL_DELAY,
            min_delay: DEFAULT_MIN_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl SimulatorConfig {
    pub fn new(operator_id: OperatorId) -> Self {
        Self {
            operator_id,
            ..Self::default()
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_delay_range(mut self, min: Duration, max: Duration) -> Self {
        self.min_delay = min;
        self.max_delay = max;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.operator_id.0 <= 0 {
            return Err(ConfigError::InvalidOperator(self.operator_id.0));
        }
        if self.min_delay > self.max_delay {
            return Err(ConfigError::InvertedDelayRange {
                min_ms: self.min_delay.as_millis(),
                max_ms: self.max_delay.as_millis(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_simulator_timings() {
        let config = SimulatorConfig::new(OperatorId(3));
        assert!(config.enabled);
        assert_eq!(config.initial_delay, Duration::from_secs(10));
        assert_eq!(config.min_delay, Duration::from_secs(30));
        assert_eq!(config.max_delay, Duration::from_secs(60));
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn rejects_inverted_range() {
        let err = SimulatorConfig::new(OperatorId(3))
            .with_delay_range(Duration::from_secs(5), Duration::from_secs(1))
            .validate()
            .expect_err("inverted");
        assert_eq!(
            err,
            ConfigError::InvertedDelayRange {
                min_ms: 5_000,
                max_ms: 1_000
            }
        );
    }

    #[test]
    fn rejects_missing_operator() {
        assert_eq!(
            SimulatorConfig::default().validate(),
            Err(ConfigError::InvalidOperator(0))
        );
    }
}
