//! Catalog listings and combined search results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::language::LanguageTag;
use super::required;
use crate::errors::MarketplaceError;

/// Listing category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingCategory {
    /// A service provider.
    Provider,
    /// A material or product from a vendor.
    Material,
    /// A job posted by a homeowner.
    Job,
}

/// A single marketplace listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    /// Listing ID.
    pub id: String,
    /// Category.
    pub category: ListingCategory,
    /// Title.
    pub title: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Price or hourly rate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    /// Average rating, 0 to 5.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// When the listing was posted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posted_at: Option<DateTime<Utc>>,
}

/// Incoming combined search request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSearchRequest {
    /// Search text (required).
    pub query: Option<String>,
    /// Caller language.
    pub language: Option<String>,
    /// Expand the query with search-enhancement keywords.
    #[serde(default)]
    pub enhance: bool,
}

impl CatalogSearchRequest {
    /// Creates a request for `query`.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Self::default()
        }
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

/// Lowercased search terms matched against listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchTerms(Vec<String>);

impl SearchTerms {
    /// Splits `query` on whitespace, dropping duplicates.
    pub fn from_query(query: &str) -> Self {
        let mut terms = Self::default();
        terms.extend(query.split_whitespace().map(str::to_string));
        terms
    }

    /// Adds terms, skipping blanks and duplicates.
    pub fn extend(&mut self, terms: impl IntoIterator<Item = String>) {
        for term in terms {
            let term = term.trim().to_lowercase();
            if !term.is_empty() && !self.0.contains(&term) {
                self.0.push(term);
            }
        }
    }

    /// The terms.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Returns true when there is nothing to match.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Combined search results merged by category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedSearchResults {
    /// The terms that were matched.
    pub terms: Vec<String>,
    /// Matching service providers.
    pub providers: Vec<Listing>,
    /// Matching materials.
    pub materials: Vec<Listing>,
    /// Matching jobs.
    pub jobs: Vec<Listing>,
}

impl CombinedSearchResults {
    /// Total number of listings across categories.
    pub fn total(&self) -> usize {
        self.providers.len() + self.materials.len() + self.jobs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terms_are_normalized_and_deduplicated() {
        let mut terms = SearchTerms::from_query("Roof  roof REPAIR");
        terms.extend(vec!["shingles".to_string(), " ".to_string(), "Repair".to_string()]);

        assert_eq!(terms.as_slice(), ["roof", "repair", "shingles"]);
    }

    #[test]
    fn test_listing_deserializes_with_defaults() {
        let listing: Listing = serde_json::from_str(
            r#"{"id": "p-1", "category": "provider", "title": "Ace Roofing"}"#,
        )
        .unwrap();

        assert_eq!(listing.category, ListingCategory::Provider);
        assert!(listing.tags.is_empty());
        assert!(listing.posted_at.is_none());
    }
}
