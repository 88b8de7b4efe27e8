//! Chat completions client.

use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, instrument};

use super::json_block::extract_json;
use crate::auth::AuthProvider;
use crate::errors::{MarketplaceError, MarketplaceResult};
use crate::executor::{RequestExecutor, RequestOptions};
use crate::observability::{loggable_body, MetricsCollector};
use crate::transport::HttpRequest;
use crate::types::chat::{ChatRequest, ChatRequestBuilder, ChatResponse};
use crate::types::language::LanguageTag;
use crate::types::Validate;

const CHAT_COMPLETIONS_PATH: &str = "chat/completions";

/// Reply bodies longer than this are cut in debug logs.
const MAX_LOGGED_REPLY: usize = 512;

/// Chat completions service.
pub struct ChatService {
    executor: Arc<RequestExecutor>,
    auth: Option<Arc<dyn AuthProvider>>,
    url: String,
    model: String,
    options: RequestOptions,
    metrics: Arc<dyn MetricsCollector>,
}

impl ChatService {
    /// Creates a new chat service.
    ///
    /// `base_url` is the OpenAI-compatible API root; without `auth` every
    /// call fails with a configuration error.
    pub fn new(
        executor: Arc<RequestExecutor>,
        auth: Option<Arc<dyn AuthProvider>>,
        base_url: &str,
        model: impl Into<String>,
        options: RequestOptions,
        metrics: Arc<dyn MetricsCollector>,
    ) -> Self {
        Self {
            executor,
            auth,
            url: format!("{}/{CHAT_COMPLETIONS_PATH}", base_url.trim_end_matches('/')),
            model: model.into(),
            options,
            metrics,
        }
    }

    /// The model every prompt is sent to.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Starts a request for the configured model.
    pub fn request(&self) -> ChatRequestBuilder {
        ChatRequest::builder().model(&self.model)
    }

    /// The executor calls go through.
    pub(crate) fn executor(&self) -> &Arc<RequestExecutor> {
        &self.executor
    }

    /// Base call options with `language` applied.
    pub(crate) fn options_for(&self, language: &LanguageTag) -> RequestOptions {
        self.options.clone().language(language.clone())
    }

    /// Creates a chat completion.
    #[instrument(skip(self, request), fields(model = %request.model))]
    pub async fn create(
        &self,
        request: &ChatRequest,
        language: &LanguageTag,
    ) -> MarketplaceResult<ChatResponse> {
        request.validate()?;
        let auth = self.auth.as_ref().ok_or_else(|| {
            MarketplaceError::configuration("Chat completions credentials are not configured")
        })?;

        let mut http_request = HttpRequest::post_json(&self.url, request)?;
        auth.apply_auth(&mut http_request.headers);

        let response = self
            .executor
            .execute(http_request, &self.options_for(language))
            .await?;
        debug!(body = %loggable_body(&response.body, MAX_LOGGED_REPLY), "Chat reply");

        let completion: ChatResponse = response.json()?;
        self.metrics.record_model_usage(&completion.model);
        self.metrics.record_tokens(
            completion.usage.prompt_tokens,
            completion.usage.completion_tokens,
        );
        Ok(completion)
    }

    /// Returns the text of the first choice.
    pub async fn complete(
        &self,
        request: &ChatRequest,
        language: &LanguageTag,
    ) -> MarketplaceResult<String> {
        let completion = self.create(request, language).await?;
        completion
            .content()
            .map(str::to_string)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| MarketplaceError::parse("Chat reply has no content"))
    }

    /// Parses the JSON block of the reply into `T` and validates it.
    pub async fn complete_json<T>(
        &self,
        request: &ChatRequest,
        language: &LanguageTag,
    ) -> MarketplaceResult<T>
    where
        T: DeserializeOwned + Validate,
    {
        let content = self.complete(request, language).await?;
        let value: T = serde_json::from_str(extract_json(&content)?)
            .map_err(|e| MarketplaceError::parse(format!("Model reply does not match schema: {e}")))?;
        value.validate()?;
        Ok(value)
    }
}

impl std::fmt::Debug for ChatService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatService")
            .field("url", &self.url)
            .field("model", &self.model)
            .field("authenticated", &self.auth.is_some())
            .finish_non_exhaustive()
    }
}
