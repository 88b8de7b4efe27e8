//! Live feature calls against a local stand-in for the upstream APIs.

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use marketplace_ai::errors::localized_message;
use marketplace_ai::resilience::{RetryConfig, RetryPolicy};
use marketplace_ai::types::search::SearchEnhancementRequest;
use marketplace_ai::types::speech::TranscriptionRequest;
use marketplace_ai::{
    ErrorKind, FeatureModes, LanguageTag, MarketplaceClient, MarketplaceConfig, ServiceMode,
};

const API_KEY: &str = "gsk_integration_key";
const ACCESS_TOKEN: &str = "ya29.integration";

fn chat_reply(content: &str) -> Value {
    json!({
        "id": "chatcmpl-1",
        "model": "llama-3.3-70b-versatile",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 40, "completion_tokens": 20, "total_tokens": 60}
    })
}

const SEARCH_REPLY: &str = r#"{"enhancedQuery": "licensed plumber for kitchen sink leak",
    "keywords": ["plumber", "sink"], "categories": ["Plumbing"],
    "suggestions": ["Water heater repair"], "intent": "provider"}"#;

fn live_client(server: &MockServer) -> MarketplaceClient {
    let config = MarketplaceConfig::builder()
        .groq_api_key(API_KEY)
        .groq_base_url(format!("{}/openai/v1", server.uri()))
        .google_access_token(ACCESS_TOKEN)
        .speech_url(format!("{}/v1/speech:recognize", server.uri()))
        .vision_url(format!("{}/v1/images:annotate", server.uri()))
        .timeout_ms(2_000)
        .modes(FeatureModes::all(ServiceMode::Live))
        .build()
        .unwrap();

    MarketplaceClient::builder()
        .config(config)
        .retry_policy(RetryPolicy::new(
            RetryConfig::new()
                .initial_delay(Duration::from_millis(10))
                .max_delay(Duration::from_millis(40)),
        ))
        .build()
        .unwrap()
}

#[tokio::test]
async fn live_search_in_english_makes_one_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .and(header("authorization", format!("Bearer {API_KEY}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(SEARCH_REPLY)))
        .expect(1)
        .mount(&server)
        .await;
    let client = live_client(&server);

    let enhancement = client
        .search()
        .enhance(&SearchEnhancementRequest::new("kitchen sink leaking"))
        .await
        .into_result()
        .unwrap();

    assert_eq!(enhancement.enhanced_query, "licensed plumber for kitchen sink leak");
    assert_eq!(enhancement.keywords, vec!["plumber", "sink"]);
    let snapshot = client.metrics().snapshot();
    assert_eq!(snapshot.prompt_tokens, 40);
    assert_eq!(snapshot.completion_tokens, 20);
}

#[tokio::test]
async fn live_search_in_spanish_translates_text_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .and(body_string_contains("search assistant"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(SEARCH_REPLY)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .and(body_string_contains("professional translator"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(
            r#"{"translations": ["plomero con licencia para fuga del fregadero", "Plomería", "Reparación de calentador"]}"#,
        )))
        .expect(1)
        .mount(&server)
        .await;
    let client = live_client(&server);

    let enhancement = client
        .search()
        .enhance(&SearchEnhancementRequest::new("fuga en el fregadero").language("es-MX"))
        .await
        .into_result()
        .unwrap();

    assert_eq!(enhancement.enhanced_query, "plomero con licencia para fuga del fregadero");
    assert_eq!(enhancement.categories, vec!["Plomería"]);
    assert_eq!(enhancement.keywords, vec!["plumber", "sink"]);
}

#[tokio::test]
async fn live_transcription_posts_recognize_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/speech:recognize"))
        .and(header("authorization", format!("Bearer {ACCESS_TOKEN}").as_str()))
        .and(body_string_contains("\"languageCode\":\"pt-BR\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"alternatives": [{"transcript": "preciso de um eletricista", "confidence": 0.9}]},
                {"alternatives": [{"transcript": "para amanhã", "confidence": 0.7}]}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    let client = live_client(&server);

    let transcription = client
        .speech()
        .transcribe(&TranscriptionRequest::new("UklGRiQAAABXQVZF").language_code("pt-BR"))
        .await
        .into_result()
        .unwrap();

    assert_eq!(transcription.transcript, "preciso de um eletricista para amanhã");
    assert!((transcription.confidence - 0.8).abs() < 1e-9);
    assert_eq!(transcription.language_code, "pt-BR");
}

#[tokio::test]
async fn server_errors_are_retried_until_exhausted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .expect(4)
        .mount(&server)
        .await;
    let client = live_client(&server);

    let envelope = client
        .search()
        .enhance(&SearchEnhancementRequest::new("roof leak").language("fr-FR"))
        .await;

    let error = envelope.error().unwrap();
    assert_eq!(error.kind, ErrorKind::ServerError);
    assert_eq!(
        error.message,
        localized_message(ErrorKind::ServerError, &LanguageTag::parse("fr"))
    );
}

#[tokio::test]
async fn server_errors_recover_on_a_later_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(SEARCH_REPLY)))
        .expect(1)
        .mount(&server)
        .await;
    let client = live_client(&server);

    let envelope = client
        .search()
        .enhance(&SearchEnhancementRequest::new("sink"))
        .await;

    assert!(envelope.is_success());
    assert_eq!(client.metrics().snapshot().successful_requests, 1);
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    let client = live_client(&server);

    let envelope = client
        .search()
        .enhance(&SearchEnhancementRequest::new("deck boards"))
        .await;

    assert_eq!(envelope.error().unwrap().kind, ErrorKind::NotFoundError);
}

#[tokio::test]
async fn unauthorized_is_auth_error_without_data() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": {"message": "Invalid API Key"}})),
        )
        .expect(1)
        .mount(&server)
        .await;
    let client = live_client(&server);

    let envelope = client
        .search()
        .enhance(&SearchEnhancementRequest::new("electrician").language("de-AT"))
        .await;

    let body = serde_json::to_value(&envelope).unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["kind"], "AuthError");
    assert!(body.get("data").is_none());
}
