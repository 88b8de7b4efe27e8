//! Language tags.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default language tag used when a request carries none.
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// A lenient BCP-47 language tag such as `en-US`, `fr-CA` or `es`.
///
/// Only the primary subtag is interpreted; everything after it is carried
/// through verbatim (for `Accept-Language` headers and speech recognition).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct LanguageTag(String);

impl LanguageTag {
    /// Parses a tag, normalizing `_` separators and falling back to
    /// [`DEFAULT_LANGUAGE`] for blank input.
    pub fn parse(tag: &str) -> Self {
        let trimmed = tag.trim();
        if trimmed.is_empty() {
            return Self::default();
        }
        Self(trimmed.replace('_', "-"))
    }

    /// Parses an optional tag.
    pub fn parse_or_default(tag: Option<&str>) -> Self {
        tag.map_or_else(Self::default, Self::parse)
    }

    /// The full tag.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercased primary subtag (`fr-CA` -> `fr`).
    pub fn prefix(&self) -> String {
        self.0
            .split('-')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase()
    }

    /// Returns true for any English variant.
    pub fn is_english(&self) -> bool {
        self.prefix() == "en"
    }

    /// English name of the language, used when prompting for translations.
    pub fn display_name(&self) -> String {
        let name = match self.prefix().as_str() {
            "en" => "English",
            "es" => "Spanish",
            "fr" => "French",
            "de" => "German",
            "it" => "Italian",
            "pt" => "Portuguese",
            "nl" => "Dutch",
            "zh" => "Chinese",
            "ja" => "Japanese",
            "ko" => "Korean",
            "hi" => "Hindi",
            "ar" => "Arabic",
            "ru" => "Russian",
            "pl" => "Polish",
            "tr" => "Turkish",
            "vi" => "Vietnamese",
            _ => return self.0.clone(),
        };
        name.to_string()
    }
}

impl Default for LanguageTag {
    fn default() -> Self {
        Self(DEFAULT_LANGUAGE.to_string())
    }
}

impl From<String> for LanguageTag {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<&str> for LanguageTag {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<LanguageTag> for String {
    fn from(value: LanguageTag) -> Self {
        value.0
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
