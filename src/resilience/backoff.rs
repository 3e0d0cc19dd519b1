//! Exponential backoff with optional jitter.

use std::time::Duration;
use rand::Rng;

/// Delay before the retry that follows attempt `attempt_index` (0-based).
///
/// `base_ms * 2^attempt_index`, capped at `max_ms`. With `jitter`, up to 10%
/// of the capped delay is added.
pub fn calculate_backoff(attempt_index: u32, base_ms: u64, max_ms: u64, jitter: bool) -> Duration {
    let exponential_base = 2u64.saturating_pow(attempt_index);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    let jitter_range = if jitter { capped_delay / 10 } else { 0 };
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_calculation() {
        assert_eq!(calculate_backoff(0, 1000, 30_000, false), Duration::from_millis(1000));
        assert_eq!(calculate_backoff(1, 1000, 30_000, false), Duration::from_millis(2000));
        assert_eq!(calculate_backoff(2, 1000, 30_000, false), Duration::from_millis(4000));

        let max = calculate_backoff(10, 100, 1000, false);
        assert_eq!(max, Duration::from_millis(1000));
    }

    #[test]
    fn test_backoff_jitter_bounds() {
        for _ in 0..50 {
            let d = calculate_backoff(1, 100, 2000, true).as_millis();
            assert!((200..220).contains(&d));
        }
    }

    #[test]
    fn test_backoff_overflow_saturates() {
        assert_eq!(calculate_backoff(80, u64::MAX, 5000, false), Duration::from_millis(5000));
    }
}
