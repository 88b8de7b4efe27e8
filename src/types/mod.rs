//! Type definitions shared by the feature wrappers and the HTTP surface.
//!
//! Every feature has an explicit request type (what the HTTP layer accepts)
//! and an explicit result schema (what model output must parse into).

pub mod chat;
pub mod envelope;
pub mod experts;
pub mod language;
pub mod listings;
pub mod materials;
pub mod search;
pub mod speech;
pub mod vision;

use crate::errors::MarketplaceError;
use self::language::LanguageTag;

/// A parsed result whose human-readable strings can be translated in place.
pub trait Translatable {
    /// Mutable references to every field that should be translated, in a
    /// stable order.
    fn text_fields_mut(&mut self) -> Vec<&mut String>;
}

/// A result that stands in for a missing mock fixture.
pub trait Placeholder {
    /// A value that carries `message` in its main text field.
    fn placeholder(message: String, language: &LanguageTag) -> Self;
}

/// Semantic checks applied after model output has been deserialized.
pub trait Validate {
    /// Rejects values that deserialized but violate the schema's ranges.
    fn validate(&self) -> Result<(), MarketplaceError>;
}

/// Returns the trimmed value of a required field, or a validation error.
pub(crate) fn required(field: &str, value: Option<&str>) -> Result<String, MarketplaceError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(MarketplaceError::missing_field(field)),
    }
}

/// Ensures a model-provided score lies within `0..=max`.
pub(crate) fn check_range(field: &str, value: f64, max: f64) -> Result<(), MarketplaceError> {
    if value.is_finite() && (0.0..=max).contains(&value) {
        Ok(())
    } else {
        Err(MarketplaceError::parse(format!(
            "{field} out of range: {value} (expected 0..={max})"
        )))
    }
}
