//! Maps raw transport and HTTP failures onto [`MarketplaceError`].

use std::collections::HashMap;
use std::time::Duration;

use super::{ApiErrorResponse, MarketplaceError};
use crate::transport::TransportError;

/// Classifies a non-2xx HTTP response.
///
/// The upstream message is taken from a `{"error": {"message": ...}}` body
/// when present, otherwise a generic message naming the status is used.
pub fn classify_status(
    status: u16,
    headers: &HashMap<String, String>,
    body: &[u8],
) -> MarketplaceError {
    let message = serde_json::from_slice::<ApiErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| format!("Upstream returned HTTP {status}"));

    match status {
        400 => MarketplaceError::InvalidRequest { message },
        401 => MarketplaceError::Authentication { message },
        403 => MarketplaceError::Forbidden { message },
        404 => MarketplaceError::NotFound { message },
        429 => MarketplaceError::RateLimited {
            message,
            retry_after: headers
                .get("retry-after")
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(Duration::from_secs),
        },
        500..=599 => MarketplaceError::Server {
            status_code: status,
            message,
        },
        _ => MarketplaceError::Unknown {
            status: Some(status),
            message,
        },
    }
}

/// Classifies a failure where no usable response was received.
pub fn classify_transport(error: &TransportError) -> MarketplaceError {
    match error {
        TransportError::Request { message } => MarketplaceError::Unknown {
            status: None,
            message: message.clone(),
        },
        other => MarketplaceError::Network {
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::types::language::LanguageTag;
    use test_case::test_case;

    #[test_case(400, ErrorKind::InvalidRequest ; "bad request")]
    #[test_case(401, ErrorKind::AuthError ; "unauthorized")]
    #[test_case(403, ErrorKind::ForbiddenError ; "forbidden")]
    #[test_case(404, ErrorKind::NotFoundError ; "not found")]
    #[test_case(429, ErrorKind::RateLimited ; "too many requests")]
    #[test_case(500, ErrorKind::ServerError ; "internal server error")]
    #[test_case(502, ErrorKind::ServerError ; "bad gateway")]
    #[test_case(503, ErrorKind::ServerError ; "service unavailable")]
    #[test_case(599, ErrorKind::ServerError ; "upper 5xx bound")]
    #[test_case(302, ErrorKind::UnknownError ; "redirect")]
    #[test_case(418, ErrorKind::UnknownError ; "teapot")]
    fn test_status_mapping(status: u16, expected: ErrorKind) {
        let error = classify_status(status, &HashMap::new(), b"");
        assert_eq!(error.kind(), expected);
    }

    #[test_case(TransportError::Connection { message: "refused".into() } ; "connection refused")]
    #[test_case(TransportError::Timeout { timeout: Duration::from_secs(15) } ; "timeout")]
    #[test_case(TransportError::Aborted { message: "reset by peer".into() } ; "aborted")]
    fn test_no_response_is_network_error(error: TransportError) {
        assert_eq!(classify_transport(&error).kind(), ErrorKind::NetworkError);
    }

    #[test]
    fn test_local_request_failure_is_unknown_with_message() {
        let error = classify_transport(&TransportError::Request {
            message: "invalid header value".to_string(),
        });

        assert_eq!(error.kind(), ErrorKind::UnknownError);
        assert!(error.detail().unwrap().contains("invalid header value"));
    }

    #[test]
    fn test_upstream_message_is_extracted() {
        let body = br#"{"error":{"message":"Invalid API Key","type":"invalid_request_error"}}"#;
        let error = classify_status(401, &HashMap::new(), body);

        assert!(error.to_string().contains("Invalid API Key"));
    }

    #[test]
    fn test_unknown_status_keeps_raw_status() {
        let error = classify_status(418, &HashMap::new(), b"short and stout");
        let detail = error.detail().unwrap();

        assert!(detail.contains("418"));
    }

    #[test]
    fn test_unknown_status_is_named_in_message() {
        let error = classify_status(418, &HashMap::new(), b"");

        let english = error.to_error_info(&LanguageTag::default());
        assert_eq!(english.message, "An unexpected error occurred (HTTP 418).");

        let german = error.to_error_info(&LanguageTag::parse("de-AT"));
        assert_eq!(german.message, "Ein unerwarteter Fehler ist aufgetreten (HTTP 418).");
    }

    #[test]
    fn test_unknown_without_status_keeps_plain_message() {
        let error = classify_transport(&TransportError::Request {
            message: "builder error".to_string(),
        });

        let info = error.to_error_info(&LanguageTag::default());
        assert!(!info.message.contains("HTTP"));
    }

    #[test]
    fn test_rate_limit_reads_retry_after() {
        let mut headers = HashMap::new();
        headers.insert("retry-after".to_string(), "7".to_string());

        let error = classify_status(429, &headers, b"{}");
        assert_eq!(error.retry_after(), Some(Duration::from_secs(7)));
    }
}
