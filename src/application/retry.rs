// Reconnect backoff policy - pure and clock-free
use std::time::Duration;

/// Exponential backoff for the streaming transport.
///
/// `delay(n)` for the n-th failed attempt is `min(base * 2^n, cap)`; past
/// `max_attempts` it yields `None`, which the connection manager takes as
/// the signal to fall back to polling permanently.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub base: Duration,
    pub cap: Duration,
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(1000),
            cap: Duration::from_millis(30_000),
            max_attempts: 5,
        }
    }
}

impl RetryPolicy {
    pub fn delay(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }
        let factor = 2u32.saturating_pow(attempt);
        let delay = self.base.checked_mul(factor).unwrap_or(self.cap);
        Some(delay.min(self.cap))
    }
}
