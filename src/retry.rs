//! Bounded retry and polling policies.
//!
//! ## Retry Strategy
//!
//! Only one call in the crate retries: the YouTube summary generation, and
//! only when the provider reports an exhausted quota. Every other error class
//! from the same call is returned on the first failure. Waits grow
//! exponentially and are clamped into `[min_wait, max_wait]`; with the
//! defaults (1 s multiplier, 4 s floor, 30 s ceiling, 3 attempts) the
//! sequence is 4 s → 4 s.

use crate::error::WorkflowError;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Exponential backoff scoped to quota exhaustion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first call. Default: 3.
    pub max_attempts: u32,
    /// Base of the exponential wait. Default: 1 s.
    pub multiplier: Duration,
    /// Lower clamp of every wait. Default: 4 s.
    pub min_wait: Duration,
    /// Upper clamp of every wait. Default: 30 s.
    pub max_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            multiplier: Duration::from_secs(1),
            min_wait: Duration::from_secs(4),
            max_wait: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Wait applied after the `failed_attempts`-th failure (1-based).
    pub fn wait_after(&self, failed_attempts: u32) -> Duration {
        let exp = 2u32.saturating_pow(failed_attempts.saturating_sub(1));
        self.multiplier
            .saturating_mul(exp)
            .clamp(self.min_wait, self.max_wait)
    }
}

/// Fixed-interval status polling with an attempt ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Maximum number of status checks. Default: 10.
    pub max_attempts: u32,
    /// Pause between two checks. Default: 30 s.
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            interval: Duration::from_secs(30),
        }
    }
}

/// Run `op`, retrying only while it fails with
/// [`WorkflowError::QuotaExhausted`] and attempts remain.
pub async fn retry_on_quota<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
) -> Result<T, WorkflowError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, WorkflowError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_quota_exhausted() && attempt < policy.max_attempts => {
                let wait = policy.wait_after(attempt);
                warn!(
                    "{}: quota exhausted on attempt {}/{}, retrying in {:?}: {}",
                    label, attempt, policy.max_attempts, wait, e
                );
                sleep(wait).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn quota() -> WorkflowError {
        WorkflowError::QuotaExhausted {
            message: "resource exhausted".into(),
        }
    }

    #[test]
    fn waits_are_clamped() {
        let p = RetryPolicy::default();
        assert_eq!(p.wait_after(1), Duration::from_secs(4));
        assert_eq!(p.wait_after(2), Duration::from_secs(4));
        assert_eq!(p.wait_after(4), Duration::from_secs(8));
        assert_eq!(p.wait_after(5), Duration::from_secs(16));
        assert_eq!(p.wait_after(6), Duration::from_secs(30));
        assert_eq!(p.wait_after(40), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_third_attempt_after_waiting() {
        let calls = AtomicU32::new(0);
        let first_retry_at = std::sync::Mutex::new(None);
        let start = Instant::now();

        let out = retry_on_quota(&RetryPolicy::default(), "test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n == 2 {
                *first_retry_at.lock().unwrap() = Some(start.elapsed());
            }
            async move {
                if n < 3 {
                    Err(quota())
                } else {
                    Ok("summary")
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(out, "summary");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let waited = first_retry_at.lock().unwrap().expect("second call happened");
        assert!(waited >= Duration::from_secs(4), "waited only {waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let err = retry_on_quota(&RetryPolicy::default(), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(quota()) }
        })
        .await
        .unwrap_err();

        assert!(err.is_quota_exhausted());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn other_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let err = retry_on_quota(&RetryPolicy::default(), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err::<(), _>(WorkflowError::Generation {
                    message: "bad request".into(),
                })
            }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, WorkflowError::Generation { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
