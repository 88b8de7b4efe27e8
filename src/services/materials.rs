//! Material recommendations.

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
use crate::types::materials::{
    MaterialRecommendationRequest, MaterialRecommendations, ValidMaterialRequest,
};

const SYSTEM_PROMPT: &str = "You are a building-materials specialist for a home-services \
marketplace. Suggest the materials a homeowner needs for the project, with an estimated \
price in US dollars for each, a total estimate and practical buying tips. Prefer options \
within budget when one is given and flag eco-friendly choices. Reply with JSON only: \
{\"materials\": [{\"name\": string, \"category\": string, \"reason\": string, \
\"estimatedPrice\": number, \"quantity\": string, \"ecoFriendly\": boolean}], \
\"totalEstimate\": number, \"tips\": [string]}.";

fn user_prompt(request: &ValidMaterialRequest) -> String {
    let budget = if request.budget > 0.0 {
        format!("${:.0}", request.budget)
    } else {
        "not specified".to_string()
    };
    format!(
        "Project: {}\nBudget: {budget}\nStyle: {}",
        request.project_description, request.style
    )
}

/// Suggests materials for a project.
#[derive(Debug)]
pub struct MaterialRecommendationService {
    switch: ModeSwitch,
    chat: Arc<ChatService>,
    translator: Translator,
    metrics: Arc<dyn MetricsCollector>,
}

impl MaterialRecommendationService {
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

    /// Recommends materials for `request.project_description`.
    #[instrument(skip_all, fields(operation = "material_recommendation", mode = %self.switch.mode()))]
    pub async fn recommend(
        &self,
        request: &MaterialRecommendationRequest,
    ) -> Envelope<MaterialRecommendations> {
        let language = request.language_tag();
        run_feature(
            self.metrics.as_ref(),
            Operation::MaterialRecommendation.as_str(),
            &language,
            self.recommend_inner(request, &language),
        )
        .await
    }

    async fn recommend_inner(
        &self,
        request: &MaterialRecommendationRequest,
        language: &LanguageTag,
    ) -> MarketplaceResult<MaterialRecommendations> {
        let request = request.validated()?;

        if self.switch.is_mock() {
            self.metrics
                .record_mock_hit(Operation::MaterialRecommendation.as_str());
            return self
                .switch
                .fixture(Operation::MaterialRecommendation, language)
                .await;
        }

        let prompt = self
            .chat
            .request()
            .system(SYSTEM_PROMPT)
            .user(user_prompt(&request))
            .temperature(0.4)
            .max_tokens(1024)
            .json_mode()
            .build()?;

        let mut recommendations: MaterialRecommendations =
            self.chat.complete_json(&prompt, language).await?;
        self.translator
            .translate(&mut recommendations, language)
            .await?;
        Ok(recommendations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::mocks::payloads;
    use crate::services::test_support::{mock_switch, Harness};

    const REPLY: &str = r#"{"materials": [
        {"name": "Cedar planks", "category": "Lumber", "reason": "Rot resistant",
         "estimatedPrice": 1200, "quantity": "40 boards", "ecoFriendly": true}
    ], "totalEstimate": 1200, "tips": ["Seal the ends"]}"#;

    #[test]
    fn test_prompt_includes_style_and_budget() {
        let request = MaterialRecommendationRequest::new("Fence")
            .budget(2500.0)
            .style("Rustic")
            .validated()
            .unwrap();
        let prompt = user_prompt(&request);

        assert!(prompt.contains("Budget: $2500"));
        assert!(prompt.contains("Style: Rustic"));
    }

    #[tokio::test]
    async fn test_live_english() {
        let harness = Harness::new();
        harness.transport.queue_json(&payloads::chat_response(REPLY));
        let service = MaterialRecommendationService::new(
            ModeSwitch::live(),
            Arc::clone(&harness.chat),
            harness.metrics(),
        );

        let recommendations = service
            .recommend(&MaterialRecommendationRequest::new("Fence"))
            .await
            .into_result()
            .unwrap();

        assert_eq!(recommendations.materials[0].name, "Cedar planks");
        assert!(recommendations.materials[0].eco_friendly);
    }

    #[tokio::test]
    async fn test_translation_failure_fails_the_call() {
        let harness = Harness::new();
        harness.transport.queue_json(&payloads::chat_response(REPLY));
        harness.transport.queue_error(503, "overloaded");
        let service = MaterialRecommendationService::new(
            ModeSwitch::live(),
            Arc::clone(&harness.chat),
            harness.metrics(),
        );

        let envelope = service
            .recommend(&MaterialRecommendationRequest::new("Fence").language("de-DE"))
            .await;

        let error = envelope.error().unwrap();
        assert_eq!(error.kind, ErrorKind::ServerError);
        assert_eq!(
            error.message,
            crate::errors::localized_message(ErrorKind::ServerError, &LanguageTag::parse("de"))
        );
    }

    #[tokio::test]
    async fn test_missing_description_is_invalid() {
        let harness = Harness::new();
        let service =
            MaterialRecommendationService::new(mock_switch(), Arc::clone(&harness.chat), harness.metrics());

        let envelope = service
            .recommend(&MaterialRecommendationRequest::default())
            .await;

        assert_eq!(envelope.error().unwrap().kind, ErrorKind::InvalidRequest);
    }
}
