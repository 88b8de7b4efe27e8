//! Combined catalog search over provider, material and job listings.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::search::SearchEnhancementService;
use super::run_feature;
use crate::errors::{MarketplaceError, MarketplaceResult};
use crate::observability::MetricsCollector;
use crate::types::envelope::Envelope;
use crate::types::language::LanguageTag;
use crate::types::listings::{
    CatalogSearchRequest, CombinedSearchResults, Listing, ListingCategory, SearchTerms,
};
use crate::types::search::SearchEnhancementRequest;

const BUILTIN_CATALOG: &str = include_str!("../fixtures/catalog.json");

/// Listings returned per category.
pub const MAX_RESULTS_PER_CATEGORY: usize = 20;

const OPERATION: &str = "catalog_search";

/// A searchable set of listings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Returns the listings of `category` matching any of `terms`, best first.
    async fn search(
        &self,
        category: ListingCategory,
        terms: &SearchTerms,
    ) -> MarketplaceResult<Vec<Listing>>;
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    listings: Vec<Listing>,
}

/// In-memory listings.
#[derive(Debug, Clone, Default)]
pub struct StaticListings {
    listings: Vec<Listing>,
}

impl StaticListings {
    /// Wraps `listings`.
    pub fn new(listings: Vec<Listing>) -> Self {
        Self { listings }
    }

    /// The catalog bundled with the crate.
    pub fn builtin() -> MarketplaceResult<Self> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// Parses a `{"listings": [...]}` document.
    pub fn from_json(json: &str) -> MarketplaceResult<Self> {
        let file: CatalogFile = serde_json::from_str(json)
            .map_err(|e| MarketplaceError::configuration(format!("Invalid catalog: {e}")))?;
        Ok(Self::new(file.listings))
    }

    /// Reads a catalog file.
    pub async fn load(path: impl AsRef<Path>) -> MarketplaceResult<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            MarketplaceError::configuration(format!(
                "Cannot read catalog {}: {e}",
                path.display()
            ))
        })?;
        let listings = Self::from_json(&json)?;
        debug!(path = %path.display(), count = listings.len(), "Catalog loaded");
        Ok(listings)
    }

    /// Number of listings.
    pub fn len(&self) -> usize {
        self.listings.len()
    }

    /// Returns true when the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}

/// Number of `terms` found in the title, description or tags.
fn term_hits(listing: &Listing, terms: &SearchTerms) -> usize {
    let title = listing.title.to_lowercase();
    let description = listing.description.to_lowercase();
    let tags: Vec<String> = listing.tags.iter().map(|t| t.to_lowercase()).collect();

    terms
        .as_slice()
        .iter()
        .filter(|term| {
            title.contains(term.as_str())
                || description.contains(term.as_str())
                || tags.iter().any(|tag| tag.contains(term.as_str()))
        })
        .count()
}

#[async_trait]
impl ListingSource for StaticListings {
    async fn search(
        &self,
        category: ListingCategory,
        terms: &SearchTerms,
    ) -> MarketplaceResult<Vec<Listing>> {
        let mut scored: Vec<(usize, &Listing)> = self
            .listings
            .iter()
            .filter(|listing| listing.category == category)
            .map(|listing| (term_hits(listing, terms), listing))
            .filter(|(hits, _)| *hits > 0)
            .collect();
        scored.sort_by(|(a_hits, a), (b_hits, b)| {
            b_hits.cmp(a_hits).then_with(|| a.title.cmp(&b.title))
        });

        Ok(scored
            .into_iter()
            .take(MAX_RESULTS_PER_CATEGORY)
            .map(|(_, listing)| listing.clone())
            .collect())
    }
}

/// Searches every category at once, optionally widening the query with
/// search-enhancement keywords.
pub struct CatalogSearch {
    source: Arc<dyn ListingSource>,
    enhancer: Option<Arc<SearchEnhancementService>>,
    metrics: Arc<dyn MetricsCollector>,
}

impl CatalogSearch {
    /// Creates the search.
    pub fn new(source: Arc<dyn ListingSource>, metrics: Arc<dyn MetricsCollector>) -> Self {
        Self {
            source,
            enhancer: None,
            metrics,
        }
    }

    /// Uses `enhancer` for requests that ask for enhancement.
    #[must_use]
    pub fn with_enhancer(mut self, enhancer: Arc<SearchEnhancementService>) -> Self {
        self.enhancer = Some(enhancer);
        self
    }

    /// Runs a combined search.
    #[instrument(skip_all, fields(operation = OPERATION, enhance = request.enhance))]
    pub async fn search(&self, request: &CatalogSearchRequest) -> Envelope<CombinedSearchResults> {
        let language = request.language_tag();
        run_feature(
            self.metrics.as_ref(),
            OPERATION,
            &language,
            self.search_inner(request, &language),
        )
        .await
    }

    async fn search_inner(
        &self,
        request: &CatalogSearchRequest,
        language: &LanguageTag,
    ) -> MarketplaceResult<CombinedSearchResults> {
        let query = request.validated_query()?;
        let mut terms = SearchTerms::from_query(&query);

        if request.enhance {
            if let Some(enhancer) = &self.enhancer {
                let enhancement = enhancer
                    .enhance(&SearchEnhancementRequest::new(&query).language(language.as_str()))
                    .await;
                match enhancement.into_result() {
                    Ok(enhancement) => terms.extend(enhancement.keywords),
                    Err(error) => warn!(
                        kind = %error.kind,
                        "Search enhancement failed, searching raw terms"
                    ),
                }
            }
        }

        let (providers, materials, jobs) = futures::future::try_join3(
            self.source.search(ListingCategory::Provider, &terms),
            self.source.search(ListingCategory::Material, &terms),
            self.source.search(ListingCategory::Job, &terms),
        )
        .await?;

        Ok(CombinedSearchResults {
            terms: terms.as_slice().to_vec(),
            providers,
            materials,
            jobs,
        })
    }
}

impl std::fmt::Debug for CatalogSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogSearch")
            .field("enhancer", &self.enhancer.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::observability::DefaultMetricsCollector;
    use crate::services::test_support::{mock_switch, Harness};
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;

    fn listing(id: &str, category: ListingCategory, title: &str) -> Listing {
        Listing {
            id: id.to_string(),
            category,
            title: title.to_string(),
            description: String::new(),
            location: None,
            price: None,
            rating: None,
            tags: vec![],
            posted_at: None,
        }
    }

    fn metrics() -> Arc<dyn MetricsCollector> {
        Arc::new(DefaultMetricsCollector::new())
    }

    #[test]
    fn test_builtin_catalog_covers_every_category() {
        let catalog = StaticListings::builtin().unwrap();
        for category in [ListingCategory::Provider, ListingCategory::Material, ListingCategory::Job] {
            assert!(catalog.listings.iter().any(|l| l.category == category));
        }
    }

    #[tokio::test]
    async fn test_static_search_orders_by_hits_then_title() {
        let catalog = StaticListings::builtin().unwrap();

        let providers = catalog
            .search(ListingCategory::Provider, &SearchTerms::from_query("kitchen sink"))
            .await
            .unwrap();

        let titles: Vec<&str> = providers.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["Rivera Plumbing & Drains", "Oak & Iron Carpentry"]);
    }

    #[tokio::test]
    async fn test_static_search_is_case_insensitive() {
        let catalog = StaticListings::new(vec![listing("1", ListingCategory::Job, "Paint FENCE")]);

        let jobs = catalog
            .search(ListingCategory::Job, &SearchTerms::from_query("fence"))
            .await
            .unwrap();

        assert_eq!(jobs.len(), 1);
    }

    #[tokio::test]
    async fn test_load_missing_file_is_configuration_error() {
        let error = StaticListings::load("/nonexistent/catalog.json").await.unwrap_err();
        assert!(matches!(error, MarketplaceError::Configuration { .. }));
    }

    #[tokio::test]
    async fn test_combined_search_merges_categories() {
        let mut source = MockListingSource::new();
        source
            .expect_search()
            .with(eq(ListingCategory::Provider), mockall::predicate::always())
            .returning(|_, _| Ok(vec![listing("p", ListingCategory::Provider, "Roofer")]));
        source
            .expect_search()
            .with(eq(ListingCategory::Material), mockall::predicate::always())
            .returning(|_, _| Ok(vec![listing("m", ListingCategory::Material, "Shingles")]));
        source
            .expect_search()
            .with(eq(ListingCategory::Job), mockall::predicate::always())
            .returning(|_, _| Ok(vec![]));
        let search = CatalogSearch::new(Arc::new(source), metrics());

        let results = search
            .search(&CatalogSearchRequest::new("Roof Repair"))
            .await
            .into_result()
            .unwrap();

        assert_eq!(results.terms, vec!["roof", "repair"]);
        assert_eq!(results.providers[0].id, "p");
        assert_eq!(results.materials[0].id, "m");
        assert_eq!(results.total(), 2);
    }

    #[tokio::test]
    async fn test_source_failure_fails_the_search() {
        let mut source = MockListingSource::new();
        source.expect_search().returning(|category, _| {
            if category == ListingCategory::Job {
                Err(MarketplaceError::Network {
                    message: "catalog offline".to_string(),
                })
            } else {
                Ok(vec![])
            }
        });
        let search = CatalogSearch::new(Arc::new(source), metrics());

        let envelope = search.search(&CatalogSearchRequest::new("deck")).await;

        assert_eq!(envelope.error().unwrap().kind, ErrorKind::NetworkError);
    }

    #[tokio::test]
    async fn test_empty_query_never_reaches_source() {
        let mut source = MockListingSource::new();
        source.expect_search().never();
        let search = CatalogSearch::new(Arc::new(source), metrics());

        let envelope = search.search(&CatalogSearchRequest::new(" ")).await;

        assert_eq!(envelope.error().unwrap().kind, ErrorKind::InvalidRequest);
    }

    #[tokio::test]
    async fn test_enhancement_adds_keywords() {
        let harness = Harness::new();
        let enhancer = Arc::new(SearchEnhancementService::new(
            mock_switch(),
            Arc::clone(&harness.chat),
            harness.metrics(),
        ));
        let search = CatalogSearch::new(Arc::new(StaticListings::builtin().unwrap()), metrics())
            .with_enhancer(enhancer);
        let mut request = CatalogSearchRequest::new("sink");
        request.enhance = true;

        let results = search.search(&request).await.into_result().unwrap();

        assert!(results.terms.contains(&"plumber".to_string()));
        assert!(results.materials.iter().any(|l| l.id == "mat-2004"));
    }

    #[tokio::test]
    async fn test_enhancement_failure_falls_back_to_raw_terms() {
        let harness = Harness::new();
        harness.transport.queue_error(500, "boom");
        let enhancer = Arc::new(SearchEnhancementService::new(
            crate::services::ModeSwitch::live(),
            Arc::clone(&harness.chat),
            harness.metrics(),
        ));
        let search = CatalogSearch::new(Arc::new(StaticListings::builtin().unwrap()), metrics())
            .with_enhancer(enhancer);
        let mut request = CatalogSearchRequest::new("shingles");
        request.enhance = true;

        let results = search.search(&request).await.into_result().unwrap();

        assert_eq!(results.terms, vec!["shingles"]);
        assert_eq!(results.jobs[0].id, "job-3002");
    }
}
