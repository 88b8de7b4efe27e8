//! Feature wrappers and the clients they call.
//!
//! Each wrapper validates its request, then either answers from fixtures
//! (mock mode) or calls the live backend through the shared executor. Every
//! outcome is folded into an [`Envelope`] localized to the request language.

mod catalog;
mod chat;
mod experts;
mod json_block;
mod materials;
mod search;
mod speech;
mod translate;
mod vision;

pub use catalog::{CatalogSearch, ListingSource, StaticListings};
pub use chat::ChatService;
pub use experts::ExpertMatchingService;
pub use materials::MaterialRecommendationService;
pub use search::SearchEnhancementService;
pub use speech::VoiceTranscriptionService;
pub use translate::Translator;
pub use vision::ImageAnalysisService;

#[cfg(test)]
pub use catalog::MockListingSource;

use serde::de::DeserializeOwned;
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::auth::AuthProvider;
use crate::errors::{MarketplaceError, MarketplaceResult};
use crate::fixtures::{FixtureTable, Operation};
use crate::observability::{MetricsCollector, RequestTimer};
use crate::types::envelope::Envelope;
use crate::types::language::LanguageTag;
use crate::types::Placeholder;

/// Where a wrapper gets its answers from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ServiceMode {
    /// Canned fixtures, no outbound calls.
    #[default]
    Mock,
    /// The real upstream APIs.
    Live,
}

impl ServiceMode {
    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceMode::Mock => "mock",
            ServiceMode::Live => "live",
        }
    }
}

impl fmt::Display for ServiceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(ServiceMode::Mock),
            "live" => Ok(ServiceMode::Live),
            other => Err(format!("unknown service mode '{other}'")),
        }
    }
}

/// Per-wrapper mock/live switch, fixed at construction.
#[derive(Debug, Clone)]
pub struct ModeSwitch {
    mode: ServiceMode,
    fixtures: Arc<FixtureTable>,
    latency: Duration,
}

impl ModeSwitch {
    /// Answers from `fixtures` after an optional artificial delay.
    pub fn mock(fixtures: Arc<FixtureTable>, latency: Duration) -> Self {
        Self {
            mode: ServiceMode::Mock,
            fixtures,
            latency,
        }
    }

    /// Calls the live backend.
    pub fn live() -> Self {
        Self {
            mode: ServiceMode::Live,
            fixtures: Arc::new(FixtureTable::new()),
            latency: Duration::ZERO,
        }
    }

    /// Builds the switch for `mode`.
    pub fn for_mode(mode: ServiceMode, fixtures: Arc<FixtureTable>, latency: Duration) -> Self {
        match mode {
            ServiceMode::Mock => Self::mock(fixtures, latency),
            ServiceMode::Live => Self::live(),
        }
    }

    /// The selected mode.
    pub fn mode(&self) -> ServiceMode {
        self.mode
    }

    /// Returns true in mock mode.
    pub fn is_mock(&self) -> bool {
        self.mode == ServiceMode::Mock
    }

    /// Resolves the fixture for `operation`.
    pub(crate) async fn fixture<T: DeserializeOwned + Placeholder>(
        &self,
        operation: Operation,
        language: &LanguageTag,
    ) -> MarketplaceResult<T> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.fixtures.typed(operation, language)
    }
}

/// Google Cloud endpoint plus its credentials.
#[derive(Clone)]
pub struct GoogleEndpoint {
    url: String,
    auth: Option<Arc<dyn AuthProvider>>,
}

impl GoogleEndpoint {
    /// Creates an endpoint; without `auth` every call fails with a
    /// configuration error.
    pub fn new(url: impl Into<String>, auth: Option<Arc<dyn AuthProvider>>) -> Self {
        Self {
            url: url.into(),
            auth,
        }
    }

    /// The endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub(crate) fn authorize(
        &self,
        headers: &mut std::collections::HashMap<String, String>,
    ) -> MarketplaceResult<()> {
        let auth = self.auth.as_ref().ok_or_else(|| {
            MarketplaceError::configuration("Google Cloud credentials are not configured")
        })?;
        auth.apply_auth(headers);
        Ok(())
    }
}

impl fmt::Debug for GoogleEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleEndpoint")
            .field("url", &self.url)
            .field("authenticated", &self.auth.is_some())
            .finish()
    }
}

/// Runs one feature call and folds its outcome into an envelope.
pub(crate) async fn run_feature<T, F>(
    metrics: &dyn MetricsCollector,
    operation: &'static str,
    language: &LanguageTag,
    call: F,
) -> Envelope<T>
where
    F: Future<Output = MarketplaceResult<T>>,
{
    let timer = RequestTimer::start(operation);
    let result = call.await;
    metrics.record_request(timer.operation(), result.is_ok(), timer.elapsed());

    if let Err(error) = &result {
        metrics.record_error(error.kind());
        warn!(
            operation = timer.operation(),
            kind = %error.kind(),
            error = %error,
            "Feature call failed"
        );
    }
    Envelope::from_result(result, language)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::auth::BearerAuth;
    use crate::executor::{RequestExecutor, RequestOptions};
    use crate::mocks::MockTransport;
    use crate::observability::DefaultMetricsCollector;
    use crate::transport::HttpTransport;

    pub(crate) struct Harness {
        pub transport: Arc<MockTransport>,
        pub metrics: Arc<DefaultMetricsCollector>,
        pub chat: Arc<ChatService>,
    }

    impl Harness {
        pub(crate) fn new() -> Self {
            let transport = Arc::new(MockTransport::new());
            let metrics = Arc::new(DefaultMetricsCollector::new());
            let executor = Arc::new(RequestExecutor::new(
                Arc::clone(&transport) as Arc<dyn HttpTransport>
            ));
            let auth: Arc<dyn AuthProvider> = Arc::new(BearerAuth::from_string("gsk_test_key"));
            let chat = Arc::new(ChatService::new(
                executor,
                Some(auth),
                "https://api.groq.test/openai/v1",
                "llama-3.3-70b-versatile",
                RequestOptions::new().retries(0),
                Arc::clone(&metrics) as Arc<dyn MetricsCollector>,
            ));
            Self {
                transport,
                metrics,
                chat,
            }
        }

        pub(crate) fn metrics(&self) -> Arc<dyn MetricsCollector> {
            Arc::clone(&self.metrics) as Arc<dyn MetricsCollector>
        }

        pub(crate) fn google(&self, url: &str) -> GoogleEndpoint {
            let auth: Arc<dyn AuthProvider> = Arc::new(BearerAuth::from_string("ya29.test"));
            GoogleEndpoint::new(url, Some(auth))
        }
    }

    pub(crate) fn mock_switch() -> ModeSwitch {
        ModeSwitch::mock(
            Arc::new(FixtureTable::builtin().expect("builtin fixtures")),
            Duration::ZERO,
        )
    }
}
