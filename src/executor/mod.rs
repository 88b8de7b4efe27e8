//! Request executor.
//!
//! Performs one logical outbound call: language-aware headers, a per-attempt
//! timeout and a bounded retry loop driven by [`RetryPolicy`].

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::errors::MarketplaceResult;
use crate::resilience::{AttemptFailure, RateLimiter, RetryPolicy};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, TransportError};
use crate::types::language::LanguageTag;

/// Default number of retries after the first attempt.
pub const DEFAULT_RETRIES: u32 = 3;

/// Default per-attempt timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;

/// Per-call options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOptions {
    /// Retries after the first attempt; 0 disables retrying.
    pub retries: u32,
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
    /// Language sent as `Accept-Language`.
    pub language: LanguageTag,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            language: LanguageTag::default(),
        }
    }
}

impl RequestOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the retry count.
    #[must_use]
    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Sets the timeout in milliseconds.
    #[must_use]
    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Sets the language.
    #[must_use]
    pub fn language(mut self, language: LanguageTag) -> Self {
        self.language = language;
        self
    }

    /// Effective per-attempt timeout; zero is clamped to 1 ms.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.max(1))
    }
}

/// Executes outbound requests with retries.
pub struct RequestExecutor {
    transport: Arc<dyn HttpTransport>,
    retry_policy: RetryPolicy,
    rate_limiter: Option<Arc<RateLimiter>>,
}

impl RequestExecutor {
    /// Creates an executor with the default backoff and no rate limiting.
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            retry_policy: RetryPolicy::default(),
            rate_limiter: None,
        }
    }

    /// Replaces the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Enforces `limiter` before every call.
    #[must_use]
    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    /// The retry policy.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Sends `request`, retrying transient failures.
    ///
    /// Returns the first 2xx response, or the classified error of the last
    /// attempt. Every attempt carries the same `X-Request-Id`.
    #[instrument(skip(self, request, options), fields(url = %request.url, language = %options.language))]
    pub async fn execute(
        &self,
        request: HttpRequest,
        options: &RequestOptions,
    ) -> MarketplaceResult<HttpResponse> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.acquire(&options.language)?;
        }

        let timeout = options.timeout();
        let mut request = request.with_timeout(timeout);
        request
            .headers
            .insert("Accept-Language".to_string(), options.language.to_string());
        request
            .headers
            .insert("X-Request-Id".to_string(), Uuid::new_v4().to_string());

        let mut retry = 0u32;
        loop {
            let failure = match self.attempt(request.clone(), timeout).await {
                Ok(response) if response.is_success() => {
                    debug!(status = response.status, retries = retry, "Request succeeded");
                    return Ok(response);
                }
                Ok(response) => AttemptFailure::Status(response),
                Err(error) => AttemptFailure::Transport(error),
            };

            if retry >= options.retries || !RetryPolicy::is_retryable(&failure) {
                debug!(failure = %failure, retries = retry, "Request failed");
                return Err(failure.into_error());
            }

            let delay = self.retry_policy.delay_for(retry);
            retry += 1;
            warn!(
                attempt = retry,
                max_retries = options.retries,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                failure = %failure,
                "Retrying request after transient failure"
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn attempt(
        &self,
        request: HttpRequest,
        timeout: Duration,
    ) -> Result<HttpResponse, TransportError> {
        match tokio::time::timeout(timeout, self.transport.send(request)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout { timeout }),
        }
    }
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("retry_policy", &self.retry_policy)
            .field("rate_limited", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ErrorKind, MarketplaceError};
    use crate::mocks::{MockResponse, MockTransport};
    use crate::resilience::{RateLimitConfig, RateLimitTable};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    const URL: &str = "https://api.test/v1/thing";

    fn executor(transport: &Arc<MockTransport>) -> RequestExecutor {
        RequestExecutor::new(Arc::clone(transport) as Arc<dyn HttpTransport>)
    }

    fn connection_refused() -> TransportError {
        TransportError::Connection {
            message: "connection refused".to_string(),
        }
    }

    fn gaps_ms(transport: &MockTransport) -> Vec<u128> {
        transport
            .requests()
            .windows(2)
            .map(|pair| pair[1].at.duration_since(pair[0].at).as_millis())
            .collect()
    }

    #[test]
    fn test_default_options() {
        let options = RequestOptions::default();
        assert_eq!(options.retries, 3);
        assert_eq!(options.timeout(), Duration::from_millis(15_000));
        assert_eq!(options.language.as_str(), "en-US");
    }

    #[test]
    fn test_zero_timeout_is_clamped() {
        assert_eq!(
            RequestOptions::new().timeout_ms(0).timeout(),
            Duration::from_millis(1)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_503_with_exponential_backoff() {
        let transport = Arc::new(MockTransport::new());
        for _ in 0..4 {
            transport.queue_error(503, "unavailable");
        }

        let err = executor(&transport)
            .execute(HttpRequest::get(URL), &RequestOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ServerError);
        assert_eq!(transport.request_count(), 4);
        assert_eq!(gaps_ms(&transport), vec![1000, 2000, 4000]);
    }

    #[tokio::test]
    async fn test_every_attempt_carries_the_attempt_timeout() {
        let transport = Arc::new(MockTransport::new());
        transport.queue_error(502, "bad gateway");
        transport.queue_json(&serde_json::json!({"ok": true}));
        let executor = executor(&transport).with_retry_policy(RetryPolicy::new(
            crate::resilience::RetryConfig::new().initial_delay(Duration::from_millis(1)),
        ));

        executor
            .execute(HttpRequest::get(URL), &RequestOptions::new().timeout_ms(2_500))
            .await
            .unwrap();

        let timeouts: Vec<_> = transport.requests().iter().map(|r| r.timeout).collect();
        assert_eq!(timeouts, vec![Some(Duration::from_millis(2_500)); 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_when_no_response() {
        let transport = Arc::new(MockTransport::new());
        transport.queue_transport_error(connection_refused());
        transport.queue_transport_error(connection_refused());
        transport.queue_json(&serde_json::json!({"ok": true}));

        let response = executor(&transport)
            .execute(HttpRequest::get(URL), &RequestOptions::default())
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(transport.request_count(), 3);
        assert_eq!(gaps_ms(&transport), vec![1000, 2000]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_failure_after_retries_is_network_error() {
        let transport = Arc::new(MockTransport::new());
        for _ in 0..3 {
            transport.queue_transport_error(connection_refused());
        }

        let err = executor(&transport)
            .execute(HttpRequest::get(URL), &RequestOptions::new().retries(2))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NetworkError);
        assert_eq!(transport.request_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_404_is_attempted_once() {
        let transport = Arc::new(MockTransport::new());
        transport.queue_error(404, "no such model");

        let err = executor(&transport)
            .execute(HttpRequest::get(URL), &RequestOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFoundError);
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_429_is_not_retried() {
        let transport = Arc::new(MockTransport::new());
        transport.queue(MockResponse::error(429, "slow down").with_header("Retry-After", "7"));

        let err = executor(&transport)
            .execute(HttpRequest::get(URL), &RequestOptions::default())
            .await
            .unwrap_err();

        assert_eq!(transport.request_count(), 1);
        assert_eq!(err.retry_after(), Some(Duration::from_secs(7)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retries_never_retries() {
        let transport = Arc::new(MockTransport::new());
        transport.queue_error(503, "unavailable");
        transport.queue_json(&serde_json::json!({}));

        let err = executor(&transport)
            .execute(HttpRequest::get(URL), &RequestOptions::new().retries(0))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ServerError);
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_headers_are_merged_and_request_id_is_stable() {
        let transport = Arc::new(MockTransport::new());
        transport.queue_error(500, "boom");
        transport.queue_json(&serde_json::json!({}));

        let request = HttpRequest::get(URL).with_header("Authorization", "Bearer k");
        let options = RequestOptions::new().language(LanguageTag::parse("fr-CA"));
        executor(&transport).execute(request, &options).await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].header("Accept-Language"), Some("fr-CA"));
        assert_eq!(requests[0].header("Authorization"), Some("Bearer k"));
        assert!(requests[0].header("X-Request-Id").is_some());
        assert_eq!(
            requests[0].header("X-Request-Id"),
            requests[1].header("X-Request-Id")
        );
    }

    struct StalledTransport;

    #[async_trait]
    impl HttpTransport for StalledTransport {
        async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(TransportError::Aborted {
                message: "unreachable".to_string(),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_timeout_is_network_error() {
        let executor = RequestExecutor::new(Arc::new(StalledTransport));

        let err = executor
            .execute(
                HttpRequest::get(URL),
                &RequestOptions::new().retries(0).timeout_ms(0),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, MarketplaceError::Network { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_enforced_rate_limit_fails_fast() {
        let transport = Arc::new(MockTransport::new());
        transport.set_default(MockResponse::json(&serde_json::json!({})));
        let limiter = Arc::new(RateLimiter::new(RateLimitTable::new(RateLimitConfig::new(
            1, 1, 1000,
        ))));
        let executor = executor(&transport).with_rate_limiter(limiter);

        executor
            .execute(HttpRequest::get(URL), &RequestOptions::default())
            .await
            .unwrap();
        let err = executor
            .execute(HttpRequest::get(URL), &RequestOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RateLimited);
        assert_eq!(transport.request_count(), 1);
    }
}
