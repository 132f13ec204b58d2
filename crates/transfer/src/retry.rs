use std::time::Duration;

/// Default delay before the first retry of a fragment.
const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(200);

/// Default ceiling for the per-fragment retry delay.
const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(5);

/// How failed fragment uploads are retried.
///
/// The delay doubles with every consecutive failure of the same fragment,
/// starting at `initial_backoff` and capped at `max_backoff`. A zero
/// `initial_backoff` requeues immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts allowed per fragment; `None` retries forever.
    pub max_attempts: Option<u32>,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: None,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Unlimited attempts with no delay between them.
    pub fn immediate() -> Self {
        Self {
            max_attempts: None,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Caps the number of attempts per fragment (0 means unlimited).
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = (attempts > 0).then_some(attempts);
        self
    }

    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max.max(initial);
        self
    }

    /// Delay to wait after a fragment has failed `failures` times.
    ///
    /// Returns `None` once the attempt budget is spent.
    pub fn delay_after(&self, failures: u32) -> Option<Duration> {
        if let Some(max) = self.max_attempts
            && failures >= max
        {
            return None;
        }
        if self.initial_backoff.is_zero() || failures == 0 {
            return Some(Duration::ZERO);
        }
        let factor = 1u32 << (failures - 1).min(16);
        Some(
            self.initial_backoff
                .saturating_mul(factor)
                .min(self.max_backoff),
        )
    }
}
