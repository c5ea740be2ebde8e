use std::time::Duration;

use crate::batch::Backoff;

pub(crate) mod blocking_transport;

/// Attempt budget for one HTTP request. Distinct from
/// [`BatchPolicy`](crate::batch::BatchPolicy), which governs resubmission of
/// unprocessed batch items.
#[derive(Clone, Copy, Debug)]
pub(crate) struct RetryConfig {
    pub(crate) max_attempts: u32,
    pub(crate) backoff: Backoff,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::exponential(Duration::from_millis(200), Duration::from_secs(2)),
        }
    }
}

/// Full-jitter delay: uniform-ish in `[0, backoff.delay(attempt))`.
pub(crate) fn backoff_delay(config: RetryConfig, attempt: u32) -> Duration {
    let capped = config.backoff.delay(attempt).as_millis();
    Duration::from_millis(jitter_millis(capped) as u64)
}

fn jitter_millis(max_millis: u128) -> u128 {
    if max_millis <= 1 {
        return max_millis;
    }

    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::SystemTime::UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as u128)
        .unwrap_or(0);

    nanos % max_millis
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jittered_delay_stays_under_the_backoff() {
        let config = RetryConfig::default();
        for attempt in 1..=6 {
            let bound = config.backoff.delay(attempt);
            assert!(backoff_delay(config, attempt) <= bound);
        }
    }

    #[test]
    fn no_backoff_means_no_wait() {
        let config = RetryConfig {
            max_attempts: 2,
            backoff: Backoff::None,
        };
        assert_eq!(backoff_delay(config, 1), Duration::ZERO);
    }
}
