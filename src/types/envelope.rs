//! The result envelope returned by every feature operation.
//!
//! On the wire an envelope is `{"success": true, "data": ...}` or
//! `{"success": false, "error": {...}}`. In Rust it is an enum, so a value
//! carrying both `data` and `error` cannot be constructed.

use serde::de::{self, Deserializer};
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, MarketplaceError};
use crate::types::language::LanguageTag;

/// Uniform success/error wrapper.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope<T> {
    /// The operation succeeded.
    Success(T),
    /// The operation failed.
    Failure(ErrorInfo),
}

impl<T> Envelope<T> {
    /// Wraps a successful value.
    pub fn ok(data: T) -> Self {
        Envelope::Success(data)
    }

    /// Wraps an error.
    pub fn err(error: ErrorInfo) -> Self {
        Envelope::Failure(error)
    }

    /// Converts a result, localizing any error to `language`.
    pub fn from_result(result: Result<T, MarketplaceError>, language: &LanguageTag) -> Self {
        match result {
            Ok(data) => Envelope::Success(data),
            Err(error) => Envelope::Failure(error.to_error_info(language)),
        }
    }

    /// Returns true on success.
    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Success(_))
    }

    /// The payload, on success.
    pub fn data(&self) -> Option<&T> {
        match self {
            Envelope::Success(data) => Some(data),
            Envelope::Failure(_) => None,
        }
    }

    /// The error, on failure.
    pub fn error(&self) -> Option<&ErrorInfo> {
        match self {
            Envelope::Success(_) => None,
            Envelope::Failure(error) => Some(error),
        }
    }

    /// Converts into a standard result.
    pub fn into_result(self) -> Result<T, ErrorInfo> {
        match self {
            Envelope::Success(data) => Ok(data),
            Envelope::Failure(error) => Err(error),
        }
    }

    /// Maps the payload, leaving failures untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        match self {
            Envelope::Success(data) => Envelope::Success(f(data)),
            Envelope::Failure(error) => Envelope::Failure(error),
        }
    }
}

impl<T: Serialize> Serialize for Envelope<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Envelope", 2)?;
        match self {
            Envelope::Success(data) => {
                state.serialize_field("success", &true)?;
                state.serialize_field("data", data)?;
            }
            Envelope::Failure(error) => {
                state.serialize_field("success", &false)?;
                state.serialize_field("error", error)?;
            }
        }
        state.end()
    }
}

#[derive(Deserialize)]
struct RawEnvelope<T> {
    success: bool,
    data: Option<T>,
    error: Option<ErrorInfo>,
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Envelope<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawEnvelope::<T>::deserialize(deserializer)?;
        match (raw.success, raw.data, raw.error) {
            (true, Some(data), None) => Ok(Envelope::Success(data)),
            (false, None, Some(error)) => Ok(Envelope::Failure(error)),
            (success, data, error) => Err(de::Error::custom(format!(
                "invalid envelope: success={success} with data {} and error {}",
                if data.is_some() { "present" } else { "absent" },
                if error.is_some() { "present" } else { "absent" },
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_success_shape() {
        let envelope = Envelope::ok(json!({"answer": 42}));
        let value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(value, json!({"success": true, "data": {"answer": 42}}));
    }

    #[test]
    fn test_failure_shape() {
        let envelope: Envelope<()> = Envelope::from_result(
            Err(MarketplaceError::missing_field("query")),
            &LanguageTag::default(),
        );
        let value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(value["success"], json!(false));
        assert_eq!(value["error"]["kind"], json!("InvalidRequest"));
        assert!(value.get("data").is_none());
    }

    #[test]
    fn test_invariant_holds_for_both_variants() {
        let ok: Envelope<u8> = Envelope::ok(1);
        let failed: Envelope<u8> = Envelope::err(ErrorInfo::new(
            ErrorKind::ServerError,
            &LanguageTag::default(),
        ));

        for envelope in [ok, failed] {
            assert_eq!(envelope.is_success(), envelope.data().is_some());
            assert_eq!(envelope.is_success(), envelope.error().is_none());
        }
    }

    #[test]
    fn test_deserialize_rejects_mixed_shape() {
        let mixed = json!({
            "success": true,
            "data": 1,
            "error": {"kind": "UnknownError", "message": "boom"}
        });
        assert!(serde_json::from_value::<Envelope<u8>>(mixed).is_err());

        let empty_failure = json!({"success": false});
        assert!(serde_json::from_value::<Envelope<u8>>(empty_failure).is_err());
    }

    #[test]
    fn test_deserialize_accepts_valid_shapes() {
        let ok: Envelope<u8> = serde_json::from_value(json!({"success": true, "data": 7})).unwrap();
        assert_eq!(ok.data(), Some(&7));

        let failed: Envelope<u8> = serde_json::from_value(json!({
            "success": false,
            "error": {"kind": "RateLimited", "message": "slow down"}
        }))
        .unwrap();
        assert_eq!(failed.error().unwrap().kind, ErrorKind::RateLimited);
    }
}
