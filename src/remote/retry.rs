//! Retry with exponential backoff for idempotent reads.

use std::future::Future;
use std::time::Duration;

use super::ApiError;

/// Default number of retries after the first failed attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// How many times, and how far apart, a failed read is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the initial attempt. `3` means at most 4 attempts.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Never retry.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (0-based): `base * 2^retry`, capped.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }

    /// Whether to try again after `failures` consecutive failures.
    ///
    /// Client errors (4xx, including 401) and decode errors never retry.
    pub fn should_retry(&self, failures: u32, error: &ApiError) -> bool {
        error.is_retryable() && failures <= self.max_retries
    }
}

/// Run `operation` until it succeeds, fails terminally, or the retry budget
/// is spent. The last error is returned.
pub async fn execute_with_retry<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut failures = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                failures += 1;
                if !policy.should_retry(failures, &error) {
                    return Err(error);
                }

                let delay = policy.delay_for(failures - 1);
                tracing::warn!(
                    kind = %error.kind(),
                    attempt = failures,
                    delay_ms = delay.as_millis() as u64,
                    "request failed, retrying: {error}"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn counting_op(
        calls: Arc<AtomicU32>,
        error: ApiError,
        succeed_on: Option<u32>,
    ) -> impl FnMut() -> std::pin::Pin<Box<dyn Future<Output = Result<u32, ApiError>> + Send>> {
        move || {
            let calls = calls.clone();
            let error = error.clone();
            Box::pin(async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                match succeed_on {
                    Some(target) if n >= target => Ok(n),
                    _ => Err(error),
                }
            })
        }
    }

    #[test]
    fn test_delay_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(10), Duration::from_secs(30));
        assert_eq!(policy.delay_for(64), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_errors_retry_three_times() {
        let calls = Arc::new(AtomicU32::new(0));
        let error = ApiError::from_status(503, "unavailable").unwrap();
        let result =
            execute_with_retry(&RetryPolicy::default(), counting_op(calls.clone(), error, None))
                .await;

        assert_eq!(result.unwrap_err().status(), Some(503));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_errors_fail_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let error = ApiError::from_status(404, "missing").unwrap();
        let result =
            execute_with_retry(&RetryPolicy::default(), counting_op(calls.clone(), error, None))
                .await;

        assert_eq!(result.unwrap_err().status(), Some(404));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_errors_fail_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let error = ApiError::from_status(401, "expired").unwrap();
        let result =
            execute_with_retry(&RetryPolicy::default(), counting_op(calls.clone(), error, None))
                .await;

        assert!(result.unwrap_err().is_auth());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_network_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let result = execute_with_retry(
            &RetryPolicy::default(),
            counting_op(calls.clone(), ApiError::network("reset"), Some(3)),
        )
        .await;

        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_policy_none_never_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let result = execute_with_retry(
            &RetryPolicy::none(),
            counting_op(calls.clone(), ApiError::network("reset"), None),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
