use std::time::Duration;

/// High-level classification of a lookup failure.
///
/// Every kind is retried; the kind is kept for narration and run statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operation timed out (connect/read).
    Timeout,
    /// Service asked us to slow down (e.g. 429, 503, quota reached).
    Throttled,
    /// Network-level failure (connection reset, DNS, etc.).
    Connection,
    /// Server-side HTTP failure (5xx).
    Http5xx(u16),
    /// Anything else the client raised.
    Other,
}

/// Decision returned by the retry policy after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait, then try again.
    RetryAfter(Duration),
    /// Attempt budget spent: wait, then give up on this key.
    GiveUpAfter(Duration),
}

impl RetryDecision {
    pub fn delay(self) -> Duration {
        match self {
            RetryDecision::RetryAfter(d) | RetryDecision::GiveUpAfter(d) => d,
        }
    }
}

/// Fixed-delay retry policy with a bounded attempt count.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Wait after each failed attempt.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Decide what follows failed attempt number `attempt` (1-based).
    ///
    /// The delay also applies after the final attempt.
    pub fn decide(&self, attempt: u32) -> RetryDecision {
        if attempt >= self.max_attempts {
            RetryDecision::GiveUpAfter(self.delay)
        } else {
            RetryDecision::RetryAfter(self.delay)
        }
    }
}
