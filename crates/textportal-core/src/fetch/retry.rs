//! Retry budgets and soft-failure detection for upstream fetches
//!
//! Every upstream (feed documents, the weather service) gets a bounded number
//! of attempts with plain exponential backoff between them:
//! `base_delay * 2^attempt_index`, no jitter, no sleep after the last attempt.

use std::time::Duration;

/// Attempt budget and backoff base for one upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Delay to wait after the failed attempt with zero-based index `attempt`
    ///
    /// Base 1s: 1s, 2s, 4s, 8s, ... and `Duration::MAX` once the factor overflows
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        match 2u32.checked_pow(attempt) {
            Some(factor) => self.base_delay.saturating_mul(factor),
            None => Duration::MAX,
        }
    }

    /// Whether `attempt` (zero-based) is the final one in the budget
    pub fn is_last(&self, attempt: u32) -> bool {
        attempt + 1 >= self.max_attempts
    }
}

/// Classifies a successful response body as a retryable failure
///
/// Some upstreams answer 200 with a "try again" payload. The detection rule
/// lives behind this trait so the retry loop never inspects bodies itself.
pub trait SoftFailure: Send + Sync {
    fn is_soft_failure(&self, body: &str) -> bool;
}

/// Every successful body is accepted
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSoftFailure;

impl SoftFailure for NoSoftFailure {
    fn is_soft_failure(&self, _body: &str) -> bool {
        false
    }
}

/// Bodies containing a fixed phrase are retried
#[derive(Debug, Clone)]
pub struct BusyPhrase {
    phrase: String,
}

impl BusyPhrase {
    pub fn new(phrase: impl Into<String>) -> Self {
        Self {
            phrase: phrase.into(),
        }
    }
}

impl SoftFailure for BusyPhrase {
    fn is_soft_failure(&self, body: &str) -> bool {
        !self.phrase.is_empty() && body.contains(&self.phrase)
    }
}
