//! Retry schedule for API requests.
//!
//! Throttling and gateway statuses are retried for idempotent methods only.
//! Connection failures are retried for every method because the request
//! never reached the server. The wait before retry *n* is zero for the
//! first retry and `backoff_factor * 2^(n-1)` afterwards, capped at
//! `max_backoff`. A `Retry-After` header on 429 and 503 responses replaces
//! the computed wait.

use std::time::Duration;

use tracing::debug;

use super::error::ClientError;
use super::transport::{
    ApiRequest, HttpMethod, HttpTransport, RawResponse, TransportError, TransportErrorKind,
};

/// Statuses that trigger a retry for idempotent methods.
pub const RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Statuses whose `Retry-After` header is honoured.
const RETRY_AFTER_STATUSES: [u16; 2] = [429, 503];

/// Retry budget and backoff schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Number of retries after the first attempt.
    pub retries: u32,
    /// Base of the exponential backoff.
    pub backoff_factor: Duration,
    /// Upper bound of a single wait.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: Self::DEFAULT_RETRIES,
            backoff_factor: Self::DEFAULT_BACKOFF_FACTOR,
            max_backoff: Self::DEFAULT_MAX_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Default retry budget.
    pub const DEFAULT_RETRIES: u32 = 10;

    /// Default backoff factor.
    pub const DEFAULT_BACKOFF_FACTOR: Duration = Duration::from_millis(600);

    /// Default cap on a single wait.
    pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(30);

    /// A policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            retries: 0,
            backoff_factor: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Wait before retry number `retry` (1-based).
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use oaaclient::client::RetryPolicy;
    ///
    /// let policy = RetryPolicy::default();
    /// assert_eq!(policy.backoff(1), Duration::ZERO);
    /// assert_eq!(policy.backoff(2), Duration::from_millis(1200));
    /// assert_eq!(policy.backoff(9), Duration::from_secs(30));
    /// ```
    #[must_use]
    pub fn backoff(&self, retry: u32) -> Duration {
        if retry <= 1 {
            return Duration::ZERO;
        }
        2_u32
            .checked_pow(retry - 1)
            .map_or(self.max_backoff, |factor| {
                self.backoff_factor.saturating_mul(factor)
            })
            .min(self.max_backoff)
    }

    fn retries_status(method: HttpMethod, status: u16) -> bool {
        method.is_idempotent() && RETRY_STATUSES.contains(&status)
    }

    const fn retries_error(method: HttpMethod, error: &TransportError) -> bool {
        match error.kind {
            TransportErrorKind::Connect => true,
            TransportErrorKind::Timeout | TransportErrorKind::Other => method.is_idempotent(),
        }
    }
}

/// Sends `request`, retrying according to `policy`.
///
/// Responses with non-retried statuses are returned as-is for the caller to
/// map; only exhausted retries and unretried transport failures become
/// errors here.
pub(crate) async fn send_with_retry<T>(
    transport: &T,
    policy: &RetryPolicy,
    request: &ApiRequest,
) -> Result<RawResponse, ClientError>
where
    T: HttpTransport + ?Sized,
{
    let mut retry = 0_u32;
    loop {
        let outcome = transport.execute(request).await;
        let (cause, status, retry_after) = match outcome {
            Ok(response) if RetryPolicy::retries_status(request.method, response.status) => {
                let requested = response
                    .retry_after
                    .filter(|_| RETRY_AFTER_STATUSES.contains(&response.status));
                (
                    format!("too many {} error responses", response.status),
                    Some(response.status),
                    requested,
                )
            }
            Ok(response) => return Ok(response),
            Err(error) if RetryPolicy::retries_error(request.method, &error) => {
                (error.message, None, None)
            }
            Err(error) => return Err(ClientError::connection(error.message, None)),
        };

        retry += 1;
        if retry > policy.retries {
            return Err(ClientError::connection(
                format!("Max retries exceeded with url: /{} ({cause})", request.path),
                status,
            ));
        }
        let wait = retry_after.unwrap_or_else(|| policy.backoff(retry));
        debug!(
            method = %request.method,
            path = %request.path,
            retry,
            wait_ms = wait.as_millis(),
            %cause,
            "retrying request"
        );
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    //! Backoff schedule and retry decisions against a mock transport.

    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::client::transport::MockHttpTransport;

    fn request(method: HttpMethod) -> ApiRequest {
        ApiRequest {
            method,
            path: "api/v1/providers/custom".to_owned(),
            query: Vec::new(),
            body: None,
            user_agent: "test".to_owned(),
        }
    }

    fn quick(retries: u32) -> RetryPolicy {
        RetryPolicy {
            retries,
            ..RetryPolicy::none()
        }
    }

    #[rstest]
    fn default_schedule_totals_157_seconds() {
        let policy = RetryPolicy::default();
        let total: Duration = (1..=policy.retries).map(|retry| policy.backoff(retry)).sum();
        assert_eq!(total, Duration::from_millis(157_200));
        assert_eq!(policy.backoff(7), Duration::from_secs(30));
        assert_eq!(policy.backoff(64), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn retries_server_errors_for_get_until_success() {
        let mut transport = MockHttpTransport::new();
        let mut calls = 0_u32;
        transport.expect_execute().times(3).returning(move |_| {
            calls += 1;
            let status = if calls < 3 { 503 } else { 200 };
            Ok(RawResponse::json(status, &json!({"value": calls})))
        });

        let response = send_with_retry(&transport, &quick(5), &request(HttpMethod::Get))
            .await
            .expect("third attempt succeeds");
        assert_eq!(response.status, 200);
    }

    fn throttled(status: u16, seconds: u64) -> RawResponse {
        RawResponse {
            retry_after: Some(Duration::from_secs(seconds)),
            ..RawResponse::json(status, &json!({}))
        }
    }

    fn scripted(first: Vec<RawResponse>) -> MockHttpTransport {
        let mut transport = MockHttpTransport::new();
        let mut pending = first.into_iter();
        let total = pending.len() + 1;
        transport.expect_execute().times(total).returning(move |_| {
            Ok(pending
                .next()
                .unwrap_or_else(|| RawResponse::json(200, &json!({"value": "done"}))))
        });
        transport
    }

    fn backing_off(retries: u32) -> RetryPolicy {
        RetryPolicy {
            retries,
            backoff_factor: Duration::from_millis(600),
            max_backoff: Duration::from_secs(30),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retry_after_on_503_replaces_the_backoff() {
        let transport = scripted(vec![throttled(503, 7)]);
        let started = tokio::time::Instant::now();

        let response = send_with_retry(&transport, &backing_off(3), &request(HttpMethod::Get))
            .await
            .expect("second attempt succeeds");

        let waited = started.elapsed();
        assert_eq!(response.status, 200);
        assert!(waited >= Duration::from_secs(7), "waited {waited:?}");
        assert!(waited < Duration::from_millis(7_010), "waited {waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn retry_after_on_500_is_ignored() {
        let transport = scripted(vec![throttled(500, 7), throttled(500, 7)]);
        let started = tokio::time::Instant::now();

        let response = send_with_retry(&transport, &backing_off(3), &request(HttpMethod::Get))
            .await
            .expect("third attempt succeeds");

        let waited = started.elapsed();
        assert_eq!(response.status, 200);
        assert!(waited >= Duration::from_millis(1_200), "waited {waited:?}");
        assert!(waited < Duration::from_millis(1_210), "waited {waited:?}");
    }

    #[tokio::test]
    async fn post_is_not_retried_on_server_errors() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_execute()
            .times(1)
            .returning(|_| Ok(RawResponse::json(500, &json!({"code": "Internal"}))));

        let response = send_with_retry(&transport, &quick(5), &request(HttpMethod::Post))
            .await
            .expect("response passed through");
        assert_eq!(response.status, 500);
    }

    #[tokio::test]
    async fn exhausted_status_retries_report_the_path() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_execute()
            .times(3)
            .returning(|_| Ok(RawResponse::json(429, &json!({}))));

        let error = send_with_retry(&transport, &quick(2), &request(HttpMethod::Get))
            .await
            .expect_err("retries exhausted");
        assert!(matches!(error, ClientError::Connection { .. }));
        assert_eq!(error.error_code(), "ERROR");
        assert_eq!(
            error.message(),
            "Max retries exceeded with url: /api/v1/providers/custom (too many 429 error responses)"
        );
        assert_eq!(error.status_code(), Some(429));
    }

    #[tokio::test]
    async fn connection_failures_are_retried_for_post() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_execute()
            .times(2)
            .returning(|_| Err(TransportError::connect("connection refused")));

        let error = send_with_retry(&transport, &quick(1), &request(HttpMethod::Post))
            .await
            .expect_err("retries exhausted");
        assert_eq!(
            error.message(),
            "Max retries exceeded with url: /api/v1/providers/custom (connection refused)"
        );
    }

    #[tokio::test]
    async fn timeouts_on_post_fail_immediately() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_execute()
            .times(1)
            .returning(|_| Err(TransportError::timeout("operation timed out")));

        let error = send_with_retry(&transport, &quick(5), &request(HttpMethod::Post))
            .await
            .expect_err("not retried");
        assert!(matches!(error, ClientError::Connection { .. }));
        assert_eq!(error.message(), "operation timed out");
    }
}
