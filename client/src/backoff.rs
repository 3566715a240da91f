//! Reconnect backoff
//!
//! 指数退避：`base * 2^attempt`，封顶 `max_delay`，超过
//! `max_attempts` 放弃。

use std::time::Duration;

/// Reconnect policy
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    /// First retry delay
    pub base_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Give up after this many consecutive failures
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            max_attempts: 10,
        }
    }
}

/// Stateful backoff counter, reset after a successful connection
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: ReconnectPolicy,
    attempt: u32,
}

impl Backoff {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self { policy, attempt: 0 }
    }

    /// Delay before the next attempt, or None once attempts run out
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempt >= self.policy.max_attempts {
            return None;
        }

        let exp = self.attempt.min(31);
        let delay = self
            .policy
            .base_delay
            .saturating_mul(1u32 << exp.min(16))
            .min(self.policy.max_delay);

        self.attempt += 1;
        Some(delay)
    }

    /// Number of attempts made since the last reset
    pub fn attempts(&self) -> u32 {
        self.attempt
    }

    /// Call after a successful connection
    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}
