//! Error types for the marketplace AI layer.
//!
//! Internally every failure is a [`MarketplaceError`], which carries enough
//! context for logging. At the boundary of a feature wrapper it collapses into
//! the closed [`ErrorKind`] taxonomy and a localized [`ErrorInfo`].

mod classify;
mod messages;

pub use classify::{classify_status, classify_transport};
pub use messages::{localized_message, SUPPORTED_MESSAGE_LANGUAGES};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::types::language::LanguageTag;

/// Result type alias for marketplace operations.
pub type MarketplaceResult<T> = Result<T, MarketplaceError>;

/// Closed set of normalized failure categories exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// No response was received (connect failure, abort, timeout).
    NetworkError,
    /// The request was rejected as malformed (HTTP 400 or local validation).
    InvalidRequest,
    /// Credentials missing or rejected (HTTP 401).
    AuthError,
    /// Credentials valid but not permitted (HTTP 403).
    ForbiddenError,
    /// The target resource does not exist (HTTP 404).
    NotFoundError,
    /// Too many requests (HTTP 429 or local limiter).
    RateLimited,
    /// Upstream server failure (HTTP 5xx).
    ServerError,
    /// Anything else, including unparseable upstream output.
    UnknownError,
}

impl ErrorKind {
    /// Every kind, in declaration order.
    pub const ALL: [ErrorKind; 8] = [
        ErrorKind::NetworkError,
        ErrorKind::InvalidRequest,
        ErrorKind::AuthError,
        ErrorKind::ForbiddenError,
        ErrorKind::NotFoundError,
        ErrorKind::RateLimited,
        ErrorKind::ServerError,
        ErrorKind::UnknownError,
    ];

    /// Stable identifier, identical to the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NetworkError => "NetworkError",
            ErrorKind::InvalidRequest => "InvalidRequest",
            ErrorKind::AuthError => "AuthError",
            ErrorKind::ForbiddenError => "ForbiddenError",
            ErrorKind::NotFoundError => "NotFoundError",
            ErrorKind::RateLimited => "RateLimited",
            ErrorKind::ServerError => "ServerError",
            ErrorKind::UnknownError => "UnknownError",
        }
    }

    /// HTTP status the inbound API answers with for this kind.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorKind::InvalidRequest => 400,
            ErrorKind::AuthError => 401,
            ErrorKind::ForbiddenError => 403,
            ErrorKind::NotFoundError => 404,
            ErrorKind::RateLimited => 429,
            ErrorKind::ServerError => 502,
            ErrorKind::NetworkError => 503,
            ErrorKind::UnknownError => 500,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-facing error payload of a failed envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Normalized category.
    pub kind: ErrorKind,
    /// Localized display message.
    pub message: String,
    /// Raw diagnostic (unexpected status, embedded exception message).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorInfo {
    /// Builds an error info with the localized message for `kind`.
    pub fn new(kind: ErrorKind, language: &LanguageTag) -> Self {
        Self {
            kind,
            message: localized_message(kind, language).to_string(),
            detail: None,
        }
    }

    /// Appends the raw upstream status to the message.
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        let base = self.message.trim_end_matches('.');
        self.message = format!("{base} (HTTP {status}).");
        self
    }

    /// Attaches a raw diagnostic.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Comprehensive error type for marketplace operations.
#[derive(Debug, Clone, Error)]
pub enum MarketplaceError {
    /// Configuration error (missing credentials, bad endpoint URL, ...).
    #[error("Configuration error: {message}")]
    Configuration {
        /// What is wrong with the configuration.
        message: String,
    },

    /// Request validation failed before anything was sent.
    #[error("Validation error: {message}")]
    Validation {
        /// What is wrong with the request.
        message: String,
        /// The offending field.
        param: Option<String>,
    },

    /// No response received from upstream.
    #[error("Network error: {message}")]
    Network {
        /// Transport error description.
        message: String,
    },

    /// Upstream answered 400.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Upstream message.
        message: String,
    },

    /// Upstream answered 401.
    #[error("Authentication failed: {message}")]
    Authentication {
        /// Upstream message.
        message: String,
    },

    /// Upstream answered 403.
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Upstream message.
        message: String,
    },

    /// Upstream answered 404.
    #[error("Not found: {message}")]
    NotFound {
        /// Upstream message.
        message: String,
    },

    /// Upstream answered 429, or the local limiter refused the call.
    #[error("Rate limit exceeded: {message}")]
    RateLimited {
        /// Upstream or limiter message.
        message: String,
        /// Suggested wait before trying again.
        retry_after: Option<Duration>,
    },

    /// Upstream answered 5xx.
    #[error("Server error (HTTP {status_code}): {message}")]
    Server {
        /// HTTP status code.
        status_code: u16,
        /// Upstream message.
        message: String,
    },

    /// Upstream output could not be parsed into the expected schema.
    #[error("Parse error: {message}")]
    Parse {
        /// Parser message.
        message: String,
    },

    /// Any other failure.
    #[error("Unknown error: {message}")]
    Unknown {
        /// HTTP status, when the failure came with one.
        status: Option<u16>,
        /// Error message.
        message: String,
    },
}

impl MarketplaceError {
    /// Maps this error onto the closed caller-facing taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MarketplaceError::Network { .. } => ErrorKind::NetworkError,
            MarketplaceError::Validation { .. } | MarketplaceError::InvalidRequest { .. } => {
                ErrorKind::InvalidRequest
            }
            MarketplaceError::Authentication { .. } => ErrorKind::AuthError,
            MarketplaceError::Forbidden { .. } => ErrorKind::ForbiddenError,
            MarketplaceError::NotFound { .. } => ErrorKind::NotFoundError,
            MarketplaceError::RateLimited { .. } => ErrorKind::RateLimited,
            MarketplaceError::Server { .. } => ErrorKind::ServerError,
            MarketplaceError::Configuration { .. }
            | MarketplaceError::Parse { .. }
            | MarketplaceError::Unknown { .. } => ErrorKind::UnknownError,
        }
    }

    /// Raw diagnostic surfaced to callers alongside the localized message.
    ///
    /// Only `UnknownError`-class failures and validation failures carry one;
    /// for the other kinds the localized message says everything needed.
    pub fn detail(&self) -> Option<String> {
        match self {
            MarketplaceError::Unknown {
                status: Some(status),
                message,
            } => Some(format!("HTTP {status}: {message}")),
            MarketplaceError::Unknown {
                status: None,
                message,
            }
            | MarketplaceError::Parse { message }
            | MarketplaceError::Configuration { message }
            | MarketplaceError::Validation { message, .. } => Some(message.clone()),
            _ => None,
        }
    }

    /// Converts into the caller-facing payload, localized to `language`.
    pub fn to_error_info(&self, language: &LanguageTag) -> ErrorInfo {
        let mut info = ErrorInfo::new(self.kind(), language);
        if let MarketplaceError::Unknown {
            status: Some(status),
            ..
        } = self
        {
            info = info.with_status(*status);
        }
        match self.detail() {
            Some(detail) => info.with_detail(detail),
            None => info,
        }
    }

    /// Returns the retry-after hint, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            MarketplaceError::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Creates a validation error for a field.
    pub fn validation(param: impl Into<String>, message: impl Into<String>) -> Self {
        MarketplaceError::Validation {
            message: message.into(),
            param: Some(param.into()),
        }
    }

    /// Creates a validation error for a required field that is empty or absent.
    pub fn missing_field(param: &str) -> Self {
        Self::validation(param, format!("{param} is required"))
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        MarketplaceError::Parse {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        MarketplaceError::Configuration {
            message: message.into(),
        }
    }
}

/// Error body returned by the chat and Google APIs: `{"error": {...}}`.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    /// The error details.
    pub error: ApiErrorDetail,
}

/// Detailed API error information.
#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    /// The error message.
    pub message: String,
    /// Error type (chat API).
    #[serde(rename = "type")]
    pub error_type: Option<String>,
    /// Status name (Google APIs, e.g. `INVALID_ARGUMENT`).
    pub status: Option<String>,
}

impl From<serde_json::Error> for MarketplaceError {
    fn from(err: serde_json::Error) -> Self {
        MarketplaceError::Parse {
            message: err.to_string(),
        }
    }
}

impl From<url::ParseError> for MarketplaceError {
    fn from(err: url::ParseError) -> Self {
        MarketplaceError::Configuration {
            message: format!("Invalid URL: {err}"),
        }
    }
}
