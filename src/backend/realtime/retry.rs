//! # Retry Logic and Backoff
//!
//! Bounded retry with exponential backoff for fallible operations.
//! After failed attempt `n` (1-based) the executor sleeps `base * 2^n`
//! before the next attempt. The last failure is returned immediately,
//! wrapped with the number of attempts made.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use chathub::backend::realtime::retry::retry;
//! use std::time::Duration;
//!
//! # async fn example() {
//! let result: Result<u32, _> = retry(3, Duration::from_millis(100), || async {
//!     Err::<u32, std::io::Error>(std::io::Error::other("socket closed"))
//! })
//! .await;
//! assert!(result.is_err());
//! # }
//! ```

use futures_util::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Attempt budget and base delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of calls, at least one call is always made
    pub max_attempts: u32,
    /// Delay unit doubled on every failed attempt
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Create a policy
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Sleep taken after failed attempt `attempt` (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .unwrap_or(Duration::MAX)
    }

    /// Total sleep of an operation that never succeeds
    pub fn worst_case_sleep(&self) -> Duration {
        (1..self.max_attempts.max(1))
            .map(|attempt| self.delay_after(attempt))
            .fold(Duration::ZERO, Duration::saturating_add)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(100))
    }
}

/// Returned once the attempt budget is exhausted
#[derive(Debug, Error)]
#[error("max retries reached after {attempts} attempts: {source}")]
pub struct RetryError<E> {
    /// Number of calls made
    pub attempts: u32,
    /// Error of the last call
    #[source]
    pub source: E,
}

impl<E> RetryError<E> {
    /// Unwrap the last error
    pub fn into_inner(self) -> E {
        self.source
    }
}

/// Call `op` up to `max_attempts` times with exponential backoff
pub async fn retry<T, E, F, Fut>(
    max_attempts: u32,
    base_delay: Duration,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let policy = RetryPolicy::new(max_attempts.max(1), base_delay);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(source) => {
                if attempt >= policy.max_attempts {
                    return Err(RetryError { attempts: attempt, source });
                }
                tracing::warn!(
                    "[Retry] attempt {}/{} failed: {}",
                    attempt,
                    policy.max_attempts,
                    source
                );
                tokio::time::sleep(policy.delay_after(attempt)).await;
                attempt += 1;
            }
        }
    }
}

/// Like [`retry`], for operations that need `&mut` access to some state
///
/// The state is lent to every attempt in turn, which `FnMut() -> Fut`
/// closures cannot express for futures that borrow it.
pub async fn retry_with<S, T, E, F>(
    policy: RetryPolicy,
    state: &mut S,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    S: ?Sized,
    F: for<'a> FnMut(&'a mut S) -> BoxFuture<'a, Result<T, E>>,
    E: fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(&mut *state).await {
            Ok(value) => return Ok(value),
            Err(source) => {
                if attempt >= max_attempts {
                    return Err(RetryError { attempts: attempt, source });
                }
                tracing::warn!(
                    "[Retry] attempt {}/{} failed: {}",
                    attempt,
                    max_attempts,
                    source
                );
                tokio::time::sleep(policy.delay_after(attempt)).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Instant;

    #[test]
    fn test_delay_doubles_per_attempt() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));
        assert_eq!(policy.delay_after(1), Duration::from_millis(200));
        assert_eq!(policy.delay_after(2), Duration::from_millis(400));
        assert_eq!(policy.worst_case_sleep(), Duration::from_millis(600));
    }

    #[test]
    fn test_delay_saturates() {
        let policy = RetryPolicy::new(64, Duration::from_secs(1));
        assert_eq!(policy.delay_after(40), Duration::MAX);
    }

    #[tokio::test]
    async fn test_success_short_circuits() {
        let calls = AtomicU32::new(0);
        let result = retry(3, Duration::from_millis(1), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, String>("done") }
        })
        .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recovers_after_k_failures() {
        let calls = AtomicU32::new(0);
        let result = retry(3, Duration::from_millis(1), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(format!("failure {}", n))
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausts_budget_and_sleeps() {
        let calls = AtomicU32::new(0);
        let base = Duration::from_millis(5);
        let started = Instant::now();
        let result: Result<(), _> = retry(3, base, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>("broken pipe") }
        })
        .await;
        let elapsed = started.elapsed();

        let err = result.unwrap_err();
        assert_eq!(err.attempts, 3);
        assert_eq!(err.source, "broken pipe");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // base * (2^1 + 2^2)
        assert!(elapsed >= base * 6, "slept only {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_calls_once() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry(0, Duration::from_millis(1), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>("nope") }
        })
        .await;
        assert_eq!(result.unwrap_err().attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_with_lends_state() {
        let mut failures_left = 2u32;
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let result = retry_with(policy, &mut failures_left, |left| {
            Box::pin(async move {
                if *left > 0 {
                    *left -= 1;
                    Err("again")
                } else {
                    Ok(())
                }
            })
        })
        .await;
        assert!(result.is_ok());
        assert_eq!(failures_left, 0);
    }

    #[test]
    fn test_error_display_mentions_attempts() {
        let err = RetryError {
            attempts: 3,
            source: std::io::Error::other("reset"),
        };
        assert!(err.to_string().contains("3 attempts"));
        assert_eq!(err.into_inner().to_string(), "reset");
    }
}
