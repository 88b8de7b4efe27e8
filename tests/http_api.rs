//! HTTP routes over live upstream calls.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use marketplace_ai::server::{router, AppState};
use marketplace_ai::{FeatureModes, MarketplaceClient, MarketplaceConfig, ServiceMode};

fn chat_reply(content: &str) -> Value {
    json!({
        "id": "chatcmpl-7",
        "model": "llama-3.3-70b-versatile",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 30, "completion_tokens": 12, "total_tokens": 42}
    })
}

fn live_app(server: &MockServer) -> Router {
    let config = MarketplaceConfig::builder()
        .groq_api_key("gsk_http_key")
        .groq_base_url(format!("{}/openai/v1", server.uri()))
        .max_retries(0)
        .modes(FeatureModes {
            search: ServiceMode::Live,
            experts: ServiceMode::Live,
            ..FeatureModes::default()
        })
        .build()
        .unwrap();
    let client = MarketplaceClient::builder().config(config).build().unwrap();
    router(AppState::new(Arc::new(client)))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn empty_query_never_reaches_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (status, body) = send(
        live_app(&server),
        post_json("/api/ai/search/enhance", json!({"query": "   ", "language": "fr"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["kind"], "InvalidRequest");
}

#[tokio::test]
async fn upstream_rate_limit_maps_to_429() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "30"))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = send(
        live_app(&server),
        post_json(
            "/api/ai/experts/match",
            json!({"projectDescription": "Rewire the garage", "budget": 900}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["kind"], "RateLimited");
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn live_experts_are_sorted_by_score() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(
            r#"{"experts": [
                {"specialty": "Drywall installer", "matchScore": 40, "reasoning": "Patch after rewiring"},
                {"specialty": "Licensed electrician", "matchScore": 95, "reasoning": "New circuits"}
            ], "summary": "An electrician leads this job."}"#,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = send(
        live_app(&server),
        post_json("/api/ai/experts/match", json!({"projectDescription": "Rewire the garage"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["experts"][0]["specialty"], "Licensed electrician");
    assert_eq!(body["data"]["experts"][1]["matchScore"], 40.0);
}

#[tokio::test]
async fn catalog_search_uses_enhancement_keywords() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(
            r#"{"enhancedQuery": "electrician for tripping breaker",
                "keywords": ["electrician", "panel"], "categories": ["Electrical"],
                "suggestions": [], "intent": "provider"}"#,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = send(
        live_app(&server),
        Request::get("/api/search?query=breaker%20trips&enhance=true")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["providers"][0]["id"], "prov-1002");
}
