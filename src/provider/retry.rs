use std::time::Duration;

/// Bounded retry for the image-generation route: `max_retries`
/// re-attempts after the initial one, exponential backoff on rate
/// limiting, immediate re-attempt on timeouts and transport faults.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_interval: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_interval: Duration::from_secs(1),
        }
    }

    /// Backoff before re-attempting after a rate limit on `attempt`
    /// (0-based): `initial * 2^attempt`.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let multiplier = 2u32.saturating_pow(attempt);
        self.initial_interval.saturating_mul(multiplier)
    }

    /// Total attempts allowed, including the initial one.
    pub fn total_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_per_attempt() {
        let policy = RetryPolicy::new(2);
        assert_eq!(policy.backoff_for(0), Duration::from_secs(1));
        assert_eq!(policy.backoff_for(1), Duration::from_secs(2));
        assert_eq!(policy.backoff_for(2), Duration::from_secs(4));
    }

    #[test]
    fn total_attempts_includes_first() {
        assert_eq!(RetryPolicy::new(2).total_attempts(), 3);
        assert_eq!(RetryPolicy::new(0).total_attempts(), 1);
    }

    #[test]
    fn backoff_saturates_instead_of_overflowing() {
        let policy = RetryPolicy::new(64);
        assert!(policy.backoff_for(40) > Duration::from_secs(3600));
    }
}
