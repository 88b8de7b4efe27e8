//! HTTP surface.
//!
//! Exposes each feature wrapper as a JSON route plus health, metrics and
//! combined catalog search. Bodies are always envelopes.

mod handlers;

pub use handlers::{ApiResponse, HealthStatus};

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::client::MarketplaceClient;
use crate::config::MarketplaceConfig;
use crate::resilience::RetryPolicy;
use crate::types::language::LanguageTag;

/// Upstream calls in the longest feature chain (annotate, assess, translate).
const MAX_CHAINED_CALLS: u32 = 3;

/// Application state injected into handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    client: Arc<MarketplaceClient>,
}

impl AppState {
    /// Wraps a client.
    pub fn new(client: Arc<MarketplaceClient>) -> Self {
        Self { client }
    }

    /// The client.
    pub fn client(&self) -> &MarketplaceClient {
        &self.client
    }

    fn default_language(&self) -> &LanguageTag {
        &self.client.config().default_language
    }
}

/// Time a request may take before the server answers 408.
///
/// Covers every attempt and backoff of the longest chain of upstream calls,
/// so the executor always gives up first.
pub fn request_deadline(config: &MarketplaceConfig) -> Duration {
    let attempts = config.max_retries.saturating_add(1);
    let backoff = RetryPolicy::default().total_delay(config.max_retries);
    let per_call = config.timeout().saturating_mul(attempts) + backoff;
    per_call.saturating_mul(MAX_CHAINED_CALLS) + config.mock_latency + Duration::from_secs(1)
}

/// Builds the router with all middleware layers.
#[allow(deprecated)]
pub fn router(state: AppState) -> Router {
    let deadline = request_deadline(state.client.config());

    Router::new()
        .route(
            "/api/ai/search/enhance",
            post(handlers::enhance_search).get(handlers::enhance_search_query),
        )
        .route(
            "/api/ai/experts/match",
            post(handlers::match_experts).get(handlers::match_experts_query),
        )
        .route(
            "/api/ai/materials/recommend",
            post(handlers::recommend_materials).get(handlers::recommend_materials_query),
        )
        .route("/api/ai/vision/analyze", post(handlers::analyze_image))
        .route("/api/ai/speech/transcribe", post(handlers::transcribe))
        .route("/api/search", get(handlers::search_catalog))
        .route("/api/health", get(handlers::health))
        .route("/api/metrics", get(handlers::metrics))
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(deadline))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
}

/// Serves `client` on `listener` until Ctrl+C or SIGTERM.
pub async fn run(listener: TcpListener, client: Arc<MarketplaceClient>) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "HTTP server starting");

    axum::serve(listener, router(AppState::new(client)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %error, "Cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!(error = %error, "Cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
