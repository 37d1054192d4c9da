use std::{future::Future, time::Duration};

use rand::Rng;
use tokio::task::JoinHandle;

use crate::config::SimulatorConfig;

/// Picks the wait before the next simulated call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DelayPolicy {
    initial: Duration,
    min: Duration,
    max: Duration,
}

impl DelayPolicy {
    pub(crate) fn from_config(config: &SimulatorConfig) -> Self {
        Self {
            initial: config.initial_delay,
            min: config.min_delay,
            max: config.max_delay,
        }
    }

    /// `initial` for the first call of a lifetime, otherwise uniform in `[min, max]`.
    pub(crate) fn next_delay<R: Rng>(&self, first: bool, rng: &mut R) -> Duration {
        if first {
            return self.initial;
        }
        let min_ms = duration_millis(self.min);
        let max_ms = duration_millis(self.max);
        Duration::from_millis(rng.gen_range(min_ms..=max_ms))
    }
}

pub(crate) fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Single-shot delayed task plus the handle that cancels it.
pub(crate) struct ScheduledTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

impl ScheduledTimer {
    pub(crate) fn spawn<F>(generation: u64, delay: Duration, on_fire: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            on_fire.await;
        });
        Self { generation, handle }
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn cancel(self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use shared::domain::OperatorId;

    #[test]
    fn first_delay_is_the_initial_delay() {
        let policy = DelayPolicy::from_config(&SimulatorConfig::new(OperatorId(1)));
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(policy.next_delay(true, &mut rng), Duration::from_secs(10));
    }

    #[test]
    fn later_delays_stay_within_inclusive_bounds() {
        let config = SimulatorConfig::new(OperatorId(1))
            .with_delay_range(Duration::from_millis(5), Duration::from_millis(8));
        let policy = DelayPolicy::from_config(&config);
        let mut rng = StdRng::seed_from_u64(9);
        let mut seen_min = false;
        let mut seen_max = false;
        for _ in 0..1_000 {
            let delay = policy.next_delay(false, &mut rng);
            assert!(delay >= config.min_delay && delay <= config.max_delay);
            seen_min |= delay == config.min_delay;
            seen_max |= delay == config.max_delay;
        }
        assert!(seen_min && seen_max, "both bounds should be reachable");
    }

    #[test]
    fn millis_saturate_instead_of_wrapping() {
        assert_eq!(duration_millis(Duration::from_millis(1_500)), 1_500);
        assert_eq!(duration_millis(Duration::MAX), u64::MAX);
    }

    #[test]
    fn equal_bounds_yield_fixed_delay() {
        let config = SimulatorConfig::new(OperatorId(1))
            .with_delay_range(Duration::from_secs(2), Duration::from_secs(2));
        let policy = DelayPolicy::from_config(&config);
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(policy.next_delay(false, &mut rng), Duration::from_secs(2));
    }
}
