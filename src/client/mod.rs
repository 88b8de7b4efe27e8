//! Marketplace AI client.
//!
//! Wires transport, executor, credentials and per-feature mode switches into
//! the feature wrappers.

use secrecy::SecretString;
use std::sync::Arc;

use crate::auth::{AuthProvider, BearerAuth};
use crate::config::MarketplaceConfig;
use crate::errors::{MarketplaceError, MarketplaceResult};
use crate::executor::RequestExecutor;
use crate::fixtures::FixtureTable;
use crate::observability::{DefaultMetricsCollector, MetricsCollector};
use crate::resilience::{RateLimitTable, RateLimiter, RetryPolicy};
use crate::services::{
    CatalogSearch, ChatService, ExpertMatchingService, GoogleEndpoint, ImageAnalysisService,
    ListingSource, MaterialRecommendationService, ModeSwitch, SearchEnhancementService,
    StaticListings, VoiceTranscriptionService,
};
use crate::transport::{HttpTransport, HttpTransportImpl};

/// Entry point to every AI feature.
///
/// # Example
///
/// ```rust,no_run
/// use marketplace_ai::{MarketplaceClient, MarketplaceConfig};
/// use marketplace_ai::types::search::SearchEnhancementRequest;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = MarketplaceClient::builder()
///         .config(MarketplaceConfig::from_env()?)
///         .build()?;
///
///     let envelope = client
///         .search()
///         .enhance(&SearchEnhancementRequest::new("leaky faucet").language("es"))
///         .await;
///     println!("{}", serde_json::to_string(&envelope)?);
///     Ok(())
/// }
/// ```
pub struct MarketplaceClient {
    config: MarketplaceConfig,
    rate_limits: RateLimitTable,
    search: Arc<SearchEnhancementService>,
    experts: ExpertMatchingService,
    materials: MaterialRecommendationService,
    vision: ImageAnalysisService,
    speech: VoiceTranscriptionService,
    catalog: CatalogSearch,
    metrics: Arc<dyn MetricsCollector>,
}

impl MarketplaceClient {
    /// Creates a new client builder.
    pub fn builder() -> MarketplaceClientBuilder {
        MarketplaceClientBuilder::new()
    }

    /// Creates a client from environment variables with the bundled
    /// catalog.
    pub fn from_env() -> MarketplaceResult<Self> {
        MarketplaceClientBuilder::new()
            .config(MarketplaceConfig::from_env()?)
            .build()
    }

    /// Search enhancement.
    pub fn search(&self) -> &SearchEnhancementService {
        &self.search
    }

    /// Expert matching.
    pub fn experts(&self) -> &ExpertMatchingService {
        &self.experts
    }

    /// Material recommendations.
    pub fn materials(&self) -> &MaterialRecommendationService {
        &self.materials
    }

    /// Image analysis.
    pub fn vision(&self) -> &ImageAnalysisService {
        &self.vision
    }

    /// Voice transcription.
    pub fn speech(&self) -> &VoiceTranscriptionService {
        &self.speech
    }

    /// Combined catalog search.
    pub fn catalog(&self) -> &CatalogSearch {
        &self.catalog
    }

    /// Metrics for every feature call.
    pub fn metrics(&self) -> &Arc<dyn MetricsCollector> {
        &self.metrics
    }

    /// Per-language rate limits, enforced only when configured.
    pub fn rate_limits(&self) -> &RateLimitTable {
        &self.rate_limits
    }

    /// The configuration.
    pub fn config(&self) -> &MarketplaceConfig {
        &self.config
    }
}

fn bearer(secret: Option<&SecretString>) -> MarketplaceResult<Option<Arc<dyn AuthProvider>>> {
    let Some(secret) = secret else {
        return Ok(None);
    };
    let auth = BearerAuth::new(secret.clone());
    auth.validate()?;
    Ok(Some(Arc::new(auth)))
}

impl std::fmt::Debug for MarketplaceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketplaceClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builder for [`MarketplaceClient`].
#[derive(Default)]
pub struct MarketplaceClientBuilder {
    config: Option<MarketplaceConfig>,
    transport: Option<Arc<dyn HttpTransport>>,
    fixtures: Option<Arc<FixtureTable>>,
    listings: Option<Arc<dyn ListingSource>>,
    metrics: Option<Arc<dyn MetricsCollector>>,
    retry_policy: Option<RetryPolicy>,
    rate_limits: Option<RateLimitTable>,
}

impl MarketplaceClientBuilder {
    /// Creates a new client builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration; defaults apply otherwise.
    #[must_use]
    pub fn config(mut self, config: MarketplaceConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets a custom transport.
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replaces the bundled fixtures.
    #[must_use]
    pub fn fixtures(mut self, fixtures: Arc<FixtureTable>) -> Self {
        self.fixtures = Some(fixtures);
        self
    }

    /// Replaces the bundled catalog.
    #[must_use]
    pub fn listings(mut self, listings: Arc<dyn ListingSource>) -> Self {
        self.listings = Some(listings);
        self
    }

    /// Sets a custom metrics collector.
    #[must_use]
    pub fn metrics(mut self, metrics: Arc<dyn MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Replaces the default backoff.
    #[must_use]
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Replaces the built-in rate limits.
    #[must_use]
    pub fn rate_limits(mut self, table: RateLimitTable) -> Self {
        self.rate_limits = Some(table);
        self
    }

    /// Builds the client.
    pub fn build(self) -> MarketplaceResult<MarketplaceClient> {
        let config = match self.config {
            Some(config) => config,
            None => MarketplaceConfig::builder().build()?,
        };

        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(
                HttpTransportImpl::new(config.timeout())
                    .map_err(|e| MarketplaceError::configuration(e.to_string()))?,
            ),
        };

        let rate_limits = self.rate_limits.unwrap_or_default();
        let mut executor = RequestExecutor::new(transport)
            .with_retry_policy(self.retry_policy.unwrap_or_default());
        if config.enforce_rate_limits {
            executor = executor.with_rate_limiter(Arc::new(RateLimiter::new(rate_limits.clone())));
        }
        let executor = Arc::new(executor);

        let metrics: Arc<dyn MetricsCollector> = self
            .metrics
            .unwrap_or_else(|| Arc::new(DefaultMetricsCollector::new()));
        let fixtures = match self.fixtures {
            Some(fixtures) => fixtures,
            None => Arc::new(FixtureTable::builtin()?),
        };
        let listings: Arc<dyn ListingSource> = match self.listings {
            Some(listings) => listings,
            None => Arc::new(StaticListings::builtin()?),
        };

        let chat_auth = bearer(config.groq_api_key())?;
        let google_auth = bearer(config.google_access_token())?;

        let chat = Arc::new(ChatService::new(
            Arc::clone(&executor),
            chat_auth,
            &config.groq_base_url,
            config.groq_model.clone(),
            config.request_options(),
            Arc::clone(&metrics),
        ));

        let switch = |mode| ModeSwitch::for_mode(mode, Arc::clone(&fixtures), config.mock_latency);
        let modes = config.modes;

        let search = Arc::new(SearchEnhancementService::new(
            switch(modes.search),
            Arc::clone(&chat),
            Arc::clone(&metrics),
        ));
        let experts =
            ExpertMatchingService::new(switch(modes.experts), Arc::clone(&chat), Arc::clone(&metrics));
        let materials = MaterialRecommendationService::new(
            switch(modes.materials),
            Arc::clone(&chat),
            Arc::clone(&metrics),
        );
        let vision = ImageAnalysisService::new(
            switch(modes.vision),
            GoogleEndpoint::new(&config.vision_url, google_auth.clone()),
            Arc::clone(&chat),
            Arc::clone(&metrics),
        );
        let speech = VoiceTranscriptionService::new(
            switch(modes.speech),
            GoogleEndpoint::new(&config.speech_url, google_auth),
            Arc::clone(&executor),
            config.request_options(),
            Arc::clone(&metrics),
        );
        let catalog = CatalogSearch::new(listings, Arc::clone(&metrics))
            .with_enhancer(Arc::clone(&search));

        tracing::info!(
            search = %modes.search,
            experts = %modes.experts,
            materials = %modes.materials,
            vision = %modes.vision,
            speech = %modes.speech,
            enforce_rate_limits = config.enforce_rate_limits,
            "Marketplace AI client ready"
        );

        Ok(MarketplaceClient {
            config,
            rate_limits,
            search,
            experts,
            materials,
            vision,
            speech,
            catalog,
            metrics,
        })
    }
}
