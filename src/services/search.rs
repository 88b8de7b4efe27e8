//! Search enhancement.

use std::sync::Arc;
use tracing::instrument;

use super::chat::ChatService;
use super::translate::Translator;
use super::{run_feature, ModeSwitch};
use crate::errors::MarketplaceResult;
use crate::fixtures::Operation;
use crate::observability::MetricsCollector;
use crate::types::envelope::Envelope;
use crate::types::language::LanguageTag;
use crate::types::search::{SearchEnhancement, SearchEnhancementRequest};

const SYSTEM_PROMPT: &str = "You are a search assistant for a home-services marketplace \
that lists service providers, building materials and jobs. Rewrite the user's query into \
a clearer search, extract matching keywords, name the marketplace categories it touches \
and classify the intent. Reply with JSON only: {\"enhancedQuery\": string, \"keywords\": \
[string], \"categories\": [string], \"suggestions\": [string], \"intent\": \
\"provider\" | \"material\" | \"job\" | \"general\"}.";

/// Rewrites free-text queries into structured searches.
#[derive(Debug)]
pub struct SearchEnhancementService {
    switch: ModeSwitch,
    chat: Arc<ChatService>,
    translator: Translator,
    metrics: Arc<dyn MetricsCollector>,
}

impl SearchEnhancementService {
    /// Creates the service.
    pub fn new(
        switch: ModeSwitch,
        chat: Arc<ChatService>,
        metrics: Arc<dyn MetricsCollector>,
    ) -> Self {
        Self {
            switch,
            translator: Translator::new(Arc::clone(&chat)),
            chat,
            metrics,
        }
    }

    /// The mock/live switch.
    pub fn switch(&self) -> &ModeSwitch {
        &self.switch
    }

    /// Enhances `request.query`.
    #[instrument(skip_all, fields(operation = "search_enhancement", mode = %self.switch.mode()))]
    pub async fn enhance(&self, request: &SearchEnhancementRequest) -> Envelope<SearchEnhancement> {
        let language = request.language_tag();
        run_feature(
            self.metrics.as_ref(),
            Operation::SearchEnhancement.as_str(),
            &language,
            self.enhance_inner(request, &language),
        )
        .await
    }

    async fn enhance_inner(
        &self,
        request: &SearchEnhancementRequest,
        language: &LanguageTag,
    ) -> MarketplaceResult<SearchEnhancement> {
        let query = request.validated_query()?;

        if self.switch.is_mock() {
            self.metrics.record_mock_hit(Operation::SearchEnhancement.as_str());
            return self
                .switch
                .fixture(Operation::SearchEnhancement, language)
                .await;
        }

        let prompt = self
            .chat
            .request()
            .system(SYSTEM_PROMPT)
            .user(format!("Search query: {query}"))
            .temperature(0.3)
            .max_tokens(512)
            .json_mode()
            .build()?;

        let mut enhancement: SearchEnhancement = self.chat.complete_json(&prompt, language).await?;
        self.translator.translate(&mut enhancement, language).await?;
        Ok(enhancement)
    }
}
