//! Mock implementations for testing.
//!
//! Provides a scripted transport so the executor and the live wrappers can be
//! exercised without real network calls.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use crate::transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportError};

/// Mock HTTP transport for testing.
///
/// Outcomes are served in the order they were queued; once the queue is
/// empty the default outcome (a 500) is returned.
pub struct MockTransport {
    outcomes: Mutex<VecDeque<Result<MockResponse, TransportError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    default_response: Mutex<Option<MockResponse>>,
}

/// A recorded request.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Target URL.
    pub url: String,
    /// Request body.
    pub body: Option<Bytes>,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// Timeout the transport was asked to apply.
    pub timeout: Option<Duration>,
    /// When the request was sent (follows the tokio clock, so paused-time
    /// tests can measure backoff).
    pub at: Instant,
}

impl RecordedRequest {
    /// Looks up a header by exact name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// A mock response.
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: Bytes,
}

impl MockResponse {
    /// Creates a successful JSON response.
    pub fn json<T: serde::Serialize>(value: &T) -> Self {
        let body = serde_json::to_vec(value).unwrap_or_default();
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());

        Self {
            status: 200,
            headers,
            body: Bytes::from(body),
        }
    }

    /// Creates an error response with an `{"error": {"message": ...}}` body.
    pub fn error(status: u16, message: &str) -> Self {
        let error = serde_json::json!({
            "error": {
                "message": message,
                "type": "error"
            }
        });

        Self::json(&error).with_status(status)
    }

    /// Sets the status.
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockTransport {
    /// Creates a new mock transport.
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            default_response: Mutex::new(None),
        }
    }

    /// Queues a response.
    pub fn queue(&self, response: MockResponse) {
        lock(&self.outcomes).push_back(Ok(response));
    }

    /// Queues a JSON response.
    pub fn queue_json<T: serde::Serialize>(&self, value: &T) {
        self.queue(MockResponse::json(value));
    }

    /// Queues an error response.
    pub fn queue_error(&self, status: u16, message: &str) {
        self.queue(MockResponse::error(status, message));
    }

    /// Queues a failure where no response arrives.
    pub fn queue_transport_error(&self, error: TransportError) {
        lock(&self.outcomes).push_back(Err(error));
    }

    /// Sets the default response.
    pub fn set_default(&self, response: MockResponse) {
        *lock(&self.default_response) = Some(response);
    }

    /// Gets all recorded requests.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    /// Gets the last recorded request.
    pub fn last_request(&self) -> Option<RecordedRequest> {
        lock(&self.requests).last().cloned()
    }

    /// Returns the number of requests made.
    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    fn next_outcome(&self) -> Result<MockResponse, TransportError> {
        if let Some(outcome) = lock(&self.outcomes).pop_front() {
            return outcome;
        }
        Ok(lock(&self.default_response)
            .clone()
            .unwrap_or_else(|| MockResponse::error(500, "No mock response configured")))
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        lock(&self.requests).push(RecordedRequest {
            method: request.method,
            url: request.url,
            body: request.body,
            headers: request.headers,
            timeout: request.timeout,
            at: Instant::now(),
        });

        let response = self.next_outcome()?;
        Ok(HttpResponse {
            status: response.status,
            headers: response.headers,
            body: response.body,
        })
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("request_count", &self.request_count())
            .finish()
    }
}

/// Canned upstream payloads.
pub mod payloads {
    use serde_json::{json, Value};

    use crate::types::chat::{AssistantMessage, ChatResponse, Choice, Role, Usage};

    /// A chat completion whose first choice carries `content`.
    pub fn chat_response(content: &str) -> ChatResponse {
        ChatResponse {
            id: "chatcmpl-mock".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            choices: vec![Choice {
                index: 0,
                message: AssistantMessage {
                    role: Role::Assistant,
                    content: Some(content.to_string()),
                },
                finish_reason: Some("stop".to_string()),
            }],
            usage: Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            },
        }
    }

    /// A Vision annotate response with two labels, one object and some text.
    pub fn annotate_response() -> Value {
        json!({
            "responses": [{
                "labelAnnotations": [
                    {"description": "Roof", "score": 0.97},
                    {"description": "Shingle", "score": 0.88}
                ],
                "localizedObjectAnnotations": [
                    {"name": "Gutter", "score": 0.71}
                ],
                "textAnnotations": [
                    {"description": "ACME ROOFING\n"}
                ]
            }]
        })
    }

    /// A Speech recognize response with one result.
    pub fn recognize_response(transcript: &str, confidence: f64) -> Value {
        json!({
            "results": [{
                "alternatives": [
                    {"transcript": transcript, "confidence": confidence}
                ]
            }]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_mock_transport_queue() {
        let transport = MockTransport::new();
        transport.queue_json(&serde_json::json!({"test": "value"}));

        let response = transport
            .send(HttpRequest::get("https://api.test/a"))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert!(String::from_utf8_lossy(&response.body).contains("value"));
    }

    #[tokio::test]
    async fn test_mock_transport_records_requests() {
        let transport = MockTransport::new();
        transport.set_default(MockResponse::json(&serde_json::json!({})));

        transport.send(HttpRequest::get("https://api.test/1")).await.unwrap();
        transport.send(HttpRequest::post("https://api.test/2")).await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].url, "https://api.test/1");
        assert_eq!(requests[1].method, HttpMethod::Post);
    }

    #[tokio::test]
    async fn test_mock_transport_serves_transport_errors_in_order() {
        let transport = MockTransport::new();
        transport.queue_transport_error(TransportError::Timeout {
            timeout: Duration::from_secs(1),
        });
        transport.queue_error(429, "Rate limit exceeded");

        let first = transport.send(HttpRequest::get("https://api.test")).await;
        let second = transport.send(HttpRequest::get("https://api.test")).await.unwrap();

        assert!(matches!(first, Err(TransportError::Timeout { .. })));
        assert_eq!(second.status, 429);
        assert_eq!(transport.request_count(), 2);
    }
}
