//! Route handlers.
//!
//! Every handler answers with an envelope; the HTTP status follows the
//! envelope's error kind.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use super::AppState;
use crate::config::FeatureModes;
use crate::errors::{ErrorInfo, ErrorKind};
use crate::observability::MetricsSnapshot;
use crate::resilience::RateLimitConfig;
use crate::types::envelope::Envelope;
use crate::types::experts::{ExpertMatchRequest, ExpertMatches};
use crate::types::listings::{CatalogSearchRequest, CombinedSearchResults};
use crate::types::materials::{MaterialRecommendationRequest, MaterialRecommendations};
use crate::types::search::{SearchEnhancement, SearchEnhancementRequest};
use crate::types::speech::{Transcription, TranscriptionRequest};
use crate::types::vision::{ImageAnalysis, ImageAnalysisRequest};

/// An envelope rendered with the status of its error kind.
#[derive(Debug)]
pub struct ApiResponse<T>(pub Envelope<T>);

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = match self.0.error() {
            None => StatusCode::OK,
            Some(error) => StatusCode::from_u16(error.kind.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        };
        (status, Json(self.0)).into_response()
    }
}

fn rejected<T>(state: &AppState, detail: String) -> ApiResponse<T> {
    tracing::debug!(detail = %detail, "Rejected request body");
    ApiResponse(Envelope::err(
        ErrorInfo::new(ErrorKind::InvalidRequest, state.default_language()).with_detail(detail),
    ))
}

/// Fills the language from configuration when the caller sent none.
fn with_default_language(state: &AppState, language: &mut Option<String>) {
    if language.as_deref().map_or(true, |l| l.trim().is_empty()) {
        *language = Some(state.default_language().to_string());
    }
}

pub(super) async fn enhance_search(
    State(state): State<AppState>,
    body: Result<Json<SearchEnhancementRequest>, JsonRejection>,
) -> ApiResponse<SearchEnhancement> {
    match body {
        Ok(Json(request)) => run_enhance_search(&state, request).await,
        Err(rejection) => rejected(&state, rejection.body_text()),
    }
}

pub(super) async fn enhance_search_query(
    State(state): State<AppState>,
    query: Result<Query<SearchEnhancementRequest>, QueryRejection>,
) -> ApiResponse<SearchEnhancement> {
    match query {
        Ok(Query(request)) => run_enhance_search(&state, request).await,
        Err(rejection) => rejected(&state, rejection.body_text()),
    }
}

async fn run_enhance_search(
    state: &AppState,
    mut request: SearchEnhancementRequest,
) -> ApiResponse<SearchEnhancement> {
    with_default_language(state, &mut request.language);
    ApiResponse(state.client.search().enhance(&request).await)
}

pub(super) async fn match_experts(
    State(state): State<AppState>,
    body: Result<Json<ExpertMatchRequest>, JsonRejection>,
) -> ApiResponse<ExpertMatches> {
    match body {
        Ok(Json(request)) => run_match_experts(&state, request).await,
        Err(rejection) => rejected(&state, rejection.body_text()),
    }
}

pub(super) async fn match_experts_query(
    State(state): State<AppState>,
    query: Result<Query<ExpertMatchRequest>, QueryRejection>,
) -> ApiResponse<ExpertMatches> {
    match query {
        Ok(Query(request)) => run_match_experts(&state, request).await,
        Err(rejection) => rejected(&state, rejection.body_text()),
    }
}

async fn run_match_experts(
    state: &AppState,
    mut request: ExpertMatchRequest,
) -> ApiResponse<ExpertMatches> {
    with_default_language(state, &mut request.language);
    ApiResponse(state.client.experts().match_experts(&request).await)
}

pub(super) async fn recommend_materials(
    State(state): State<AppState>,
    body: Result<Json<MaterialRecommendationRequest>, JsonRejection>,
) -> ApiResponse<MaterialRecommendations> {
    match body {
        Ok(Json(request)) => run_recommend_materials(&state, request).await,
        Err(rejection) => rejected(&state, rejection.body_text()),
    }
}

pub(super) async fn recommend_materials_query(
    State(state): State<AppState>,
    query: Result<Query<MaterialRecommendationRequest>, QueryRejection>,
) -> ApiResponse<MaterialRecommendations> {
    match query {
        Ok(Query(request)) => run_recommend_materials(&state, request).await,
        Err(rejection) => rejected(&state, rejection.body_text()),
    }
}

async fn run_recommend_materials(
    state: &AppState,
    mut request: MaterialRecommendationRequest,
) -> ApiResponse<MaterialRecommendations> {
    with_default_language(state, &mut request.language);
    ApiResponse(state.client.materials().recommend(&request).await)
}

pub(super) async fn analyze_image(
    State(state): State<AppState>,
    body: Result<Json<ImageAnalysisRequest>, JsonRejection>,
) -> ApiResponse<ImageAnalysis> {
    match body {
        Ok(Json(mut request)) => {
            with_default_language(&state, &mut request.language);
            ApiResponse(state.client.vision().analyze(&request).await)
        }
        Err(rejection) => rejected(&state, rejection.body_text()),
    }
}

pub(super) async fn transcribe(
    State(state): State<AppState>,
    body: Result<Json<TranscriptionRequest>, JsonRejection>,
) -> ApiResponse<Transcription> {
    match body {
        Ok(Json(mut request)) => {
            with_default_language(&state, &mut request.language_code);
            ApiResponse(state.client.speech().transcribe(&request).await)
        }
        Err(rejection) => rejected(&state, rejection.body_text()),
    }
}

pub(super) async fn search_catalog(
    State(state): State<AppState>,
    query: Result<Query<CatalogSearchRequest>, QueryRejection>,
) -> ApiResponse<CombinedSearchResults> {
    match query {
        Ok(Query(mut request)) => {
            with_default_language(&state, &mut request.language);
            ApiResponse(state.client.catalog().search(&request).await)
        }
        Err(rejection) => rejected(&state, rejection.body_text()),
    }
}

/// Body of `GET /api/health`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    status: &'static str,
    version: &'static str,
    modes: ModeSummary,
    default_language: String,
    rate_limit: RateLimitConfig,
    rate_limits_enforced: bool,
}

#[derive(Debug, Serialize)]
struct ModeSummary {
    search: &'static str,
    experts: &'static str,
    materials: &'static str,
    vision: &'static str,
    speech: &'static str,
}

impl From<FeatureModes> for ModeSummary {
    fn from(modes: FeatureModes) -> Self {
        Self {
            search: modes.search.as_str(),
            experts: modes.experts.as_str(),
            materials: modes.materials.as_str(),
            vision: modes.vision.as_str(),
            speech: modes.speech.as_str(),
        }
    }
}

pub(super) async fn health(State(state): State<AppState>) -> ApiResponse<HealthStatus> {
    let config = state.client.config();
    ApiResponse(Envelope::ok(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        modes: config.modes.into(),
        default_language: config.default_language.to_string(),
        rate_limit: state
            .client
            .rate_limits()
            .for_language(&config.default_language),
        rate_limits_enforced: config.enforce_rate_limits,
    }))
}

pub(super) async fn metrics(State(state): State<AppState>) -> ApiResponse<MetricsSnapshot> {
    ApiResponse(Envelope::ok(state.client.metrics().snapshot()))
}

pub(super) async fn not_found(State(state): State<AppState>) -> ApiResponse<()> {
    ApiResponse(Envelope::err(ErrorInfo::new(
        ErrorKind::NotFoundError,
        state.default_language(),
    )))
}
