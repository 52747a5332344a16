use std::time::Duration;

/// Delay between a channel close and the next connect attempt.
pub const RECONNECT_DELAY_MS: u64 = 1000;

/// Reconnect schedule for the log channel.
///
/// The delay is fixed: attempt 1 and attempt 10_000 wait the same amount.
/// `max_attempts: None` means the loop only ends on cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub delay: Duration,
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(RECONNECT_DELAY_MS),
            max_attempts: None,
        }
    }
}

impl ReconnectPolicy {
    pub fn fixed(delay: Duration) -> Self {
        Self {
            delay,
            max_attempts: None,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn is_unbounded(&self) -> bool {
        self.max_attempts.is_none()
    }

    /// Delay before reconnect attempt `attempt` (1-based), or `None` once a
    /// bounded policy is used up.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        match self.max_attempts {
            Some(max) if attempt > max => None,
            _ => Some(self.delay),
        }
    }
}
