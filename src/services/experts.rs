//! Expert matching.

use std::sync::Arc;
use tracing::instrument;

use super::chat::ChatService;
use super::translate::Translator;
use super::{run_feature, ModeSwitch};
use crate::errors::MarketplaceResult;
use crate::fixtures::Operation;
use crate::observability::MetricsCollector;
use crate::types::envelope::Envelope;
use crate::types::experts::{ExpertMatchRequest, ExpertMatches, ValidExpertMatch};
use crate::types::language::LanguageTag;

const SYSTEM_PROMPT: &str = "You are a project advisor for a home-services marketplace. \
Given a homeowner's project, recommend the kinds of professionals to hire, most relevant \
first, with a match score from 0 to 100 and a short reason each. Reply with JSON only: \
{\"experts\": [{\"specialty\": string, \"expertise\": [string], \"matchScore\": number, \
\"reasoning\": string, \"estimatedCost\": string}], \"summary\": string}.";

fn user_prompt(request: &ValidExpertMatch) -> String {
    let budget = if request.budget > 0.0 {
        format!("${:.0}", request.budget)
    } else {
        "not specified".to_string()
    };
    format!(
        "Project: {}\nLocation: {}\nBudget: {budget}",
        request.project_description, request.location
    )
}

/// Recommends kinds of professionals for a project.
#[derive(Debug)]
pub struct ExpertMatchingService {
    switch: ModeSwitch,
    chat: Arc<ChatService>,
    translator: Translator,
    metrics: Arc<dyn MetricsCollector>,
}

impl ExpertMatchingService {
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

    /// Matches experts to `request.project_description`.
    #[instrument(skip_all, fields(operation = "expert_matching", mode = %self.switch.mode()))]
    pub async fn match_experts(&self, request: &ExpertMatchRequest) -> Envelope<ExpertMatches> {
        let language = request.language_tag();
        run_feature(
            self.metrics.as_ref(),
            Operation::ExpertMatching.as_str(),
            &language,
            self.match_inner(request, &language),
        )
        .await
    }

    async fn match_inner(
        &self,
        request: &ExpertMatchRequest,
        language: &LanguageTag,
    ) -> MarketplaceResult<ExpertMatches> {
        let request = request.validated()?;

        if self.switch.is_mock() {
            self.metrics.record_mock_hit(Operation::ExpertMatching.as_str());
            return self.switch.fixture(Operation::ExpertMatching, language).await;
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

        let mut matches: ExpertMatches = self.chat.complete_json(&prompt, language).await?;
        matches
            .experts
            .sort_by(|a, b| b.match_score.total_cmp(&a.match_score));
        self.translator.translate(&mut matches, language).await?;
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::mocks::payloads;
    use crate::services::test_support::{mock_switch, Harness};
    use crate::types::experts::ANY_LOCATION;

    #[test]
    fn test_prompt_uses_neutral_defaults() {
        let request = ExpertMatchRequest::new("Replace deck boards").validated().unwrap();
        let prompt = user_prompt(&request);

        assert!(prompt.contains(&format!("Location: {ANY_LOCATION}")));
        assert!(prompt.contains("Budget: not specified"));
    }

    #[tokio::test]
    async fn test_live_sorts_by_score() {
        let harness = Harness::new();
        harness.transport.queue_json(&payloads::chat_response(
            r#"{"experts": [
                {"specialty": "Carpenter", "expertise": ["Decks"], "matchScore": 70, "reasoning": "Builds decks"},
                {"specialty": "Deck Builder", "expertise": ["Composite"], "matchScore": 95, "reasoning": "Specialist"}
            ], "summary": "Hire a deck builder."}"#,
        ));
        let service =
            ExpertMatchingService::new(ModeSwitch::live(), Arc::clone(&harness.chat), harness.metrics());

        let matches = service
            .match_experts(&ExpertMatchRequest::new("New deck").budget(8000.0))
            .await
            .into_result()
            .unwrap();

        assert_eq!(matches.experts[0].specialty, "Deck Builder");
        let body = harness.transport.last_request().unwrap().body.unwrap();
        assert!(String::from_utf8_lossy(&body).contains("Budget: $8000"));
    }

    #[tokio::test]
    async fn test_score_out_of_range_fails_closed() {
        let harness = Harness::new();
        harness.transport.queue_json(&payloads::chat_response(
            r#"{"experts": [{"specialty": "Roofer", "matchScore": 140, "reasoning": "x"}], "summary": "s"}"#,
        ));
        let service =
            ExpertMatchingService::new(ModeSwitch::live(), Arc::clone(&harness.chat), harness.metrics());

        let envelope = service.match_experts(&ExpertMatchRequest::new("Roof")).await;

        assert_eq!(envelope.error().unwrap().kind, ErrorKind::UnknownError);
    }

    #[tokio::test]
    async fn test_mock_prefix_fallback() {
        let harness = Harness::new();
        let service =
            ExpertMatchingService::new(mock_switch(), Arc::clone(&harness.chat), harness.metrics());

        let matches = service
            .match_experts(&ExpertMatchRequest::new("Kitchen").language("es-MX"))
            .await
            .into_result()
            .unwrap();

        assert_eq!(matches.experts[0].specialty, "Contratista general");
    }

    #[tokio::test]
    async fn test_negative_budget_rejected() {
        let harness = Harness::new();
        let service =
            ExpertMatchingService::new(mock_switch(), Arc::clone(&harness.chat), harness.metrics());

        let envelope = service
            .match_experts(&ExpertMatchRequest::new("Kitchen").budget(-5.0))
            .await;

        assert_eq!(envelope.error().unwrap().kind, ErrorKind::InvalidRequest);
    }
}
