//! HTTP transport layer.
//!
//! Provides the transport abstraction the request executor sends through,
//! and a reqwest-backed implementation.

mod http;

pub use http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, HttpTransportImpl};

use std::time::Duration;

/// Transport error types.
///
/// Every variant except [`TransportError::Request`] means no usable response
/// was received from upstream.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// Connection could not be established.
    #[error("Connection error: {message}")]
    Connection {
        /// Error message.
        message: String,
    },

    /// No response within the timeout.
    #[error("Timeout after {timeout:?}")]
    Timeout {
        /// Timeout duration.
        timeout: Duration,
    },

    /// The connection was aborted mid-exchange.
    #[error("Connection aborted: {message}")]
    Aborted {
        /// Error message.
        message: String,
    },

    /// The request could not be built locally.
    #[error("Invalid request: {message}")]
    Request {
        /// Error message.
        message: String,
    },
}
