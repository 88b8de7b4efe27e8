//! Canned responses served when a feature runs in mock mode.
//!
//! Fixtures are keyed by operation and language. Lookup tries the exact
//! language tag, then its primary subtag, then English.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

use crate::errors::{MarketplaceError, MarketplaceResult};
use crate::types::language::LanguageTag;
use crate::types::Placeholder;

const BUILTIN: &str = include_str!("builtin.json");

/// Language every complete fixture set must contain.
pub const FALLBACK_LANGUAGE: &str = "en";

/// AI-backed operations that have fixtures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Query rewriting for catalog search.
    SearchEnhancement,
    /// Matching a project to kinds of experts.
    ExpertMatching,
    /// Material suggestions for a project.
    MaterialRecommendation,
    /// Photo analysis.
    ImageAnalysis,
    /// Speech to text.
    VoiceTranscription,
}

impl Operation {
    /// Every operation.
    pub const ALL: [Operation; 5] = [
        Operation::SearchEnhancement,
        Operation::ExpertMatching,
        Operation::MaterialRecommendation,
        Operation::ImageAnalysis,
        Operation::VoiceTranscription,
    ];

    /// Fixture table key.
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::SearchEnhancement => "search_enhancement",
            Operation::ExpertMatching => "expert_matching",
            Operation::MaterialRecommendation => "material_recommendation",
            Operation::ImageAnalysis => "image_analysis",
            Operation::VoiceTranscription => "voice_transcription",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message carried by the placeholder served when `operation` has no fixture.
pub fn placeholder_message(operation: Operation) -> String {
    format!("Mock data for '{operation}' is not available yet")
}

/// Nested `operation -> language -> data` table.
#[derive(Debug, Clone, Default)]
pub struct FixtureTable {
    entries: HashMap<String, HashMap<String, Value>>,
}

impl FixtureTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The fixtures shipped with the crate.
    pub fn builtin() -> MarketplaceResult<Self> {
        Self::from_json(BUILTIN)
    }

    /// Parses a `{operation: {language: data}}` document.
    pub fn from_json(raw: &str) -> MarketplaceResult<Self> {
        let parsed: HashMap<String, HashMap<String, Value>> = serde_json::from_str(raw)
            .map_err(|e| MarketplaceError::configuration(format!("Invalid fixture table: {e}")))?;

        let mut table = Self::new();
        for (operation, languages) in parsed {
            for (language, data) in languages {
                table.insert(&operation, &language, data);
            }
        }
        Ok(table)
    }

    /// Adds or replaces one fixture. Language keys are case-insensitive.
    pub fn insert(&mut self, operation: &str, language: &str, data: Value) {
        self.entries
            .entry(operation.to_string())
            .or_default()
            .insert(language.to_ascii_lowercase(), data);
    }

    /// Returns true if any fixture exists for `operation`.
    pub fn knows(&self, operation: &str) -> bool {
        self.entries.contains_key(operation)
    }

    /// Resolves the fixture for `operation` in `language`.
    pub fn resolve(&self, operation: &str, language: &LanguageTag) -> Option<&Value> {
        let by_language = self.entries.get(operation)?;
        by_language
            .get(&language.as_str().to_ascii_lowercase())
            .or_else(|| by_language.get(&language.prefix()))
            .or_else(|| by_language.get(FALLBACK_LANGUAGE))
    }

    /// Resolves and deserializes the fixture for `operation`.
    ///
    /// A missing fixture yields a placeholder carrying a descriptive message
    /// rather than an error. Only a fixture that does not match `T` fails.
    pub fn typed<T: DeserializeOwned + Placeholder>(
        &self,
        operation: Operation,
        language: &LanguageTag,
    ) -> MarketplaceResult<T> {
        let Some(data) = self.resolve(operation.as_str(), language) else {
            debug!(operation = %operation, language = %language, "No fixture, serving placeholder");
            return Ok(T::placeholder(placeholder_message(operation), language));
        };
        serde_json::from_value(data.clone()).map_err(|e| {
            MarketplaceError::parse(format!("Fixture for {operation} does not match schema: {e}"))
        })
    }
}
