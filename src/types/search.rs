//! Search enhancement types.

use serde::{Deserialize, Serialize};

use super::language::LanguageTag;
use super::{required, Placeholder, Translatable, Validate};
use crate::errors::MarketplaceError;

/// Incoming search enhancement request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchEnhancementRequest {
    /// Free-text search query (required).
    pub query: Option<String>,
    /// Caller language, defaults to `en-US`.
    pub language: Option<String>,
}

impl SearchEnhancementRequest {
    /// Creates a request for `query`.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            language: None,
        }
    }

    /// Sets the language.
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Resolved language tag.
    pub fn language_tag(&self) -> LanguageTag {
        LanguageTag::parse_or_default(self.language.as_deref())
    }

    /// Returns the validated query.
    pub fn validated_query(&self) -> Result<String, MarketplaceError> {
        required("query", self.query.as_deref())
    }
}

/// What the user is most likely looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchIntent {
    /// A service provider or contractor.
    Provider,
    /// Building materials or products.
    Material,
    /// A job listing.
    Job,
    /// Anything else.
    General,
}

/// Enhanced search query returned by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchEnhancement {
    /// Rewritten query.
    pub enhanced_query: String,
    /// Keywords to match listings on.
    pub keywords: Vec<String>,
    /// Marketplace categories the query touches.
    pub categories: Vec<String>,
    /// Follow-up suggestions shown to the user.
    #[serde(default)]
    pub suggestions: Vec<String>,
    /// Detected intent.
    pub intent: SearchIntent,
}

impl Translatable for SearchEnhancement {
    // Keywords stay untranslated: they are matched against the catalog.
    fn text_fields_mut(&mut self) -> Vec<&mut String> {
        let mut fields = vec![&mut self.enhanced_query];
        fields.extend(self.categories.iter_mut());
        fields.extend(self.suggestions.iter_mut());
        fields
    }
}

impl Placeholder for SearchEnhancement {
    fn placeholder(message: String, _language: &LanguageTag) -> Self {
        Self {
            enhanced_query: message,
            keywords: Vec::new(),
            categories: Vec::new(),
            suggestions: Vec::new(),
            intent: SearchIntent::General,
        }
    }
}

impl Validate for SearchEnhancement {
    fn validate(&self) -> Result<(), MarketplaceError> {
        if self.enhanced_query.trim().is_empty() {
            return Err(MarketplaceError::parse("enhancedQuery is empty"));
        }
        Ok(())
    }
}
