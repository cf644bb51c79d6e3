//! Fixed-interval retry
//!
//! Navigation verification and the heavy-page content check both poll a
//! condition a bounded number of times. Attempts are 1-indexed.

use std::future::Future;
use std::time::Duration;

/// Bounded fixed-delay retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first (at least 1)
    pub max_attempts: u32,
    /// Pause between consecutive attempts
    pub delay: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Single attempt, no delay
    #[must_use]
    pub const fn once() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
        }
    }

    /// True if another attempt is allowed after `attempt`
    #[inline]
    #[must_use]
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

/// Result of a retried operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome<T, E> {
    /// Operation succeeded
    Success(T),
    /// Every attempt failed
    Exhausted {
        /// Error of the last attempt
        error: E,
        attempts: u32,
    },
    /// The liveness check failed between attempts
    Aborted,
}

impl<T, E> RetryOutcome<T, E> {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    #[must_use]
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted)
    }

    /// Convert to a `Result`; `Aborted` maps through `on_abort`
    ///
    /// # Errors
    /// The last attempt's error, or `on_abort()`.
    pub fn into_result(self, on_abort: impl FnOnce() -> E) -> Result<T, E> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Exhausted { error, .. } => Err(error),
            Self::Aborted => Err(on_abort()),
        }
    }
}

/// Run `op` until it succeeds, attempts run out or `is_live` turns false
///
/// `op` receives the 1-indexed attempt number. `is_live` is checked before
/// every retry, never before the first attempt.
pub async fn retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    is_live: impl Fn() -> bool,
    mut op: F,
) -> RetryOutcome<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return RetryOutcome::Success(value),
            Err(error) if !policy.should_retry(attempt) => {
                return RetryOutcome::Exhausted {
                    error,
                    attempts: attempt,
                };
            }
            Err(_) => {
                tracing::trace!(attempt, max = policy.max_attempts, "retrying");
                if !policy.delay.is_zero() {
                    tokio::time::sleep(policy.delay).await;
                }
                if !is_live() {
                    return RetryOutcome::Aborted;
                }
                attempt += 1;
            }
        }
    }
}
