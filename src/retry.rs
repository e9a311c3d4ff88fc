//! Retry loop with exponential backoff and a pluggable continuation veto.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use crate::{ClientResponse, HttpClientError, RequestInfo, Result};

/// Decides whether a failed call may keep retrying.
///
/// Consulted after every failed attempt that still has retry budget left.
/// Returning `false` is a hard veto: the failure propagates immediately,
/// regardless of how many retries remain.
#[async_trait]
pub trait ContinuationPolicy: Send + Sync {
    async fn can_continue(&self, error: &HttpClientError, request: &RequestInfo) -> bool;
}

/// Attempt budget and backoff configuration for a logical call.
///
/// With `unlimited_retries` unset, a call makes at most `retry_count + 1`
/// attempts. The delay before retry `n + 1` is
/// `min(max_retry_delay, init_retry_delay * retry_delay_coeff^n)` for `n`
/// failed attempts so far.
#[derive(Clone)]
pub struct RetryPolicy {
    pub unlimited_retries: bool,
    pub retry_count: usize,
    pub init_retry_delay: Duration,
    pub max_retry_delay: Duration,
    pub retry_delay_coeff: f64,
    pub can_continue: Option<Arc<dyn ContinuationPolicy>>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            unlimited_retries: false,
            retry_count: 3,
            init_retry_delay: Duration::from_millis(500),
            max_retry_delay: Duration::from_secs(5),
            retry_delay_coeff: 2.0,
            can_continue: None,
        }
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("RetryPolicy")
            .field("unlimited_retries", &self.unlimited_retries)
            .field("retry_count", &self.retry_count)
            .field("init_retry_delay", &self.init_retry_delay)
            .field("max_retry_delay", &self.max_retry_delay)
            .field("retry_delay_coeff", &self.retry_delay_coeff)
            .field("can_continue", &self.can_continue.is_some())
            .finish()
    }
}

impl RetryPolicy {
    fn delay_for(&self, failed_attempts: usize) -> Duration {
        let exponent = failed_attempts.min(32) as i32;
        let base_ms = self.init_retry_delay.as_millis() as f64;
        let max_ms = self.max_retry_delay.as_millis() as f64;
        let scaled_ms = base_ms * self.retry_delay_coeff.powi(exponent);
        Duration::from_millis(scaled_ms.min(max_ms) as u64)
    }
}

/// One attempt of a retryable call.
#[async_trait]
pub(crate) trait Operation: Send + Sync {
    async fn attempt(&self, request: &mut RequestInfo) -> Result<ClientResponse>;
}

/// Drives `operation` to a terminal state under `policy`.
pub(crate) async fn run(
    policy: &RetryPolicy,
    operation: &dyn Operation,
    request: &mut RequestInfo,
) -> Result<ClientResponse> {
    let mut failed_attempts = 0usize;
    loop {
        match operation.attempt(request).await {
            Ok(response) => return Ok(response),
            Err(error) => {
                if !policy.unlimited_retries && failed_attempts >= policy.retry_count {
                    return Err(error);
                }
                if let Some(can_continue) = &policy.can_continue {
                    if !can_continue.can_continue(&error, request).await {
                        return Err(error);
                    }
                }

                let delay = policy.delay_for(failed_attempts);
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    "retrying {} {} after {:?}",
                    request.method,
                    request.url,
                    delay
                );
                sleep(delay).await;
                failed_attempts += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::Value as JsonValue;
    use uuid::Uuid;

    use super::{run, ContinuationPolicy, Operation, RetryPolicy};
    use crate::{
        ClientResponse, ErrorKind, HttpClientError, HttpMethod, Params, RequestInfo, Result,
    };

    fn test_request() -> RequestInfo {
        RequestInfo {
            id: Uuid::new_v4(),
            method: HttpMethod::Get,
            url: "http://localhost/widgets".to_owned(),
            params: Params::default(),
            body: None,
            headers: BTreeMap::new(),
        }
    }

    fn refused(request: &RequestInfo) -> HttpClientError {
        HttpClientError {
            kind: ErrorKind::Connection,
            message: "connection refused".to_owned(),
            method: request.method,
            url: request.url.clone(),
            params: request.params.clone(),
            status: None,
            status_text: None,
        }
    }

    /// Fails until `succeed_on` attempts have happened; `0` never succeeds.
    struct CountingOperation {
        attempts: AtomicUsize,
        succeed_on: usize,
    }

    impl CountingOperation {
        fn failing() -> Self {
            Self {
                attempts: AtomicUsize::new(0),
                succeed_on: 0,
            }
        }

        fn succeeding_on(succeed_on: usize) -> Self {
            Self {
                attempts: AtomicUsize::new(0),
                succeed_on,
            }
        }
    }

    #[async_trait]
    impl Operation for CountingOperation {
        async fn attempt(&self, request: &mut RequestInfo) -> Result<ClientResponse> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if self.succeed_on != 0 && attempt >= self.succeed_on {
                Ok(ClientResponse {
                    data: JsonValue::Null,
                    status: 200,
                    status_text: "OK".to_owned(),
                })
            } else {
                Err(refused(request))
            }
        }
    }

    struct Veto {
        consults: AtomicUsize,
    }

    #[async_trait]
    impl ContinuationPolicy for Veto {
        async fn can_continue(&self, _error: &HttpClientError, _request: &RequestInfo) -> bool {
            self.consults.fetch_add(1, Ordering::SeqCst);
            false
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retry_count_three_runs_exactly_four_attempts() {
        let policy = RetryPolicy {
            init_retry_delay: Duration::from_millis(10),
            max_retry_delay: Duration::from_millis(100),
            ..RetryPolicy::default()
        };
        let operation = CountingOperation::failing();
        let mut request = test_request();

        let result = run(&policy, &operation, &mut request).await;

        assert!(result.is_err());
        assert_eq!(operation.attempts.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn success_midway_stops_retrying() {
        let policy = RetryPolicy {
            init_retry_delay: Duration::from_millis(10),
            ..RetryPolicy::default()
        };
        let operation = CountingOperation::succeeding_on(3);
        let mut request = test_request();

        let response = run(&policy, &operation, &mut request)
            .await
            .expect("third attempt succeeds");

        assert_eq!(response.status, 200);
        assert_eq!(operation.attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn predicate_veto_bypasses_remaining_budget() {
        let veto = Arc::new(Veto {
            consults: AtomicUsize::new(0),
        });
        let policy = RetryPolicy {
            retry_count: 5,
            init_retry_delay: Duration::from_millis(10),
            can_continue: Some(veto.clone()),
            ..RetryPolicy::default()
        };
        let operation = CountingOperation::failing();
        let mut request = test_request();

        let result = run(&policy, &operation, &mut request).await;

        assert!(result.is_err());
        assert_eq!(operation.attempts.load(Ordering::SeqCst), 1);
        assert_eq!(veto.consults.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unlimited_retries_ignore_retry_count() {
        let policy = RetryPolicy {
            unlimited_retries: true,
            retry_count: 0,
            init_retry_delay: Duration::from_millis(1),
            max_retry_delay: Duration::from_millis(2),
            ..RetryPolicy::default()
        };
        let operation = CountingOperation::succeeding_on(7);
        let mut request = test_request();

        run(&policy, &operation, &mut request)
            .await
            .expect("seventh attempt succeeds");

        assert_eq!(operation.attempts.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn backoff_grows_geometrically_and_caps() {
        let policy = RetryPolicy {
            init_retry_delay: Duration::from_millis(100),
            max_retry_delay: Duration::from_millis(1_000),
            retry_delay_coeff: 2.0,
            ..RetryPolicy::default()
        };

        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(800));
        assert_eq!(policy.delay_for(4), Duration::from_millis(1_000));
        assert_eq!(policy.delay_for(20), Duration::from_millis(1_000));
    }
}
