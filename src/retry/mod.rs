//! Decorators that retry remote operations on transient failure.
//!
//! Every decorator forwards to its origin through [`retry`] and wraps the
//! objects it returns, so a whole chain obtained from a [`ReRegion`] or
//! [`ReTable`] keeps retrying.

mod redosage;
mod reframe;
mod reiterator;
mod reregion;
mod retable;
mod revalve;

use std::future::Future;
use std::time::Duration;

pub use redosage::ReDosage;
pub use reframe::ReFrame;
pub use reiterator::ReIterator;
pub use reregion::ReRegion;
pub use retable::ReTable;
pub use revalve::ReValve;

use crate::error::Result;

/// How often, and how patiently, to retry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, the first one included.
    pub attempts: usize,

    /// Fixed pause between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// `attempts` tries in total, `delay` apart.
    pub fn new(attempts: usize, delay: Duration) -> Self {
        Self { attempts, delay }
    }
}

/// Run `call` until it succeeds, fails with a non-retryable error, or runs
/// out of attempts. The last error is returned unchanged.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, label: &str, mut call: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(error) if error.is_retryable() && attempt < attempts => {
                log::warn!(
                    "{}: attempt {}/{} failed, retrying in {:?}: {}",
                    label,
                    attempt,
                    attempts,
                    policy.delay,
                    error
                );
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            Err(error) => {
                if error.is_retryable() {
                    log::warn!("{}: giving up after {} attempt(s): {}", label, attempt, error);
                }
                return Err(error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_the_third_attempt() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let value = retry(&RetryPolicy::default(), "test", || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(Error::transport("throttled"))
            } else {
                Ok(42)
            }
        })
        .await
        .unwrap();
        assert_eq!(value, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_with_the_last_error() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let error = retry(&RetryPolicy::default(), "test", || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(Error::transport(format!("failure {n}")))
        })
        .await
        .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(error, Error::Transport("failure 2".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn deterministic_errors_are_not_retried() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let error = retry(&RetryPolicy::default(), "test", || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(Error::Exhausted("end".to_string()))
        })
        .await
        .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(error, Error::Exhausted(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn waits_between_attempts() {
        let start = tokio::time::Instant::now();
        let policy = RetryPolicy::new(2, Duration::from_secs(5));
        let _ = retry(&policy, "test", || async {
            Err::<(), _>(Error::transport("down"))
        })
        .await;
        assert!(start.elapsed() >= Duration::from_secs(5));
    }
}
