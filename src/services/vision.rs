//! Image analysis: Vision annotations plus a model assessment of the project.

use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{debug, instrument};

use super::chat::ChatService;
use super::translate::Translator;
use super::{run_feature, GoogleEndpoint, ModeSwitch};
use crate::errors::MarketplaceResult;
use crate::fixtures::Operation;
use crate::observability::MetricsCollector;
use crate::transport::HttpRequest;
use crate::types::envelope::Envelope;
use crate::types::language::LanguageTag;
use crate::types::vision::{
    AnnotateRequest, AnnotateResponse, ImageAnalysis, ImageAnalysisRequest, ProjectAssessment,
    VisionFindings,
};
use crate::types::Validate;

const SYSTEM_PROMPT: &str = "You assess home-improvement projects from photo annotations. \
Given the labels, objects and text detected in a homeowner's photo, name the project type, \
describe what needs doing, list the services a homeowner would hire for it and rate the \
complexity. Reply with JSON only: {\"projectType\": string, \"description\": string, \
\"suggestedServices\": [string], \"complexity\": \"low\" | \"medium\" | \"high\"}.";

fn findings_prompt(findings: &VisionFindings) -> String {
    let mut prompt = String::from("Labels:");
    if findings.labels.is_empty() {
        prompt.push_str(" none");
    }
    for label in &findings.labels {
        let _ = write!(prompt, " {} ({:.2});", label.description, label.score);
    }
    let objects = if findings.objects.is_empty() {
        "none".to_string()
    } else {
        findings.objects.join(", ")
    };
    let _ = write!(prompt, "\nObjects: {objects}");
    if let Some(text) = &findings.detected_text {
        let _ = write!(prompt, "\nText: {text}");
    }
    prompt
}

/// Describes the project shown in a photo.
#[derive(Debug)]
pub struct ImageAnalysisService {
    switch: ModeSwitch,
    vision: GoogleEndpoint,
    chat: Arc<ChatService>,
    translator: Translator,
    metrics: Arc<dyn MetricsCollector>,
}

impl ImageAnalysisService {
    /// Creates the service.
    pub fn new(
        switch: ModeSwitch,
        vision: GoogleEndpoint,
        chat: Arc<ChatService>,
        metrics: Arc<dyn MetricsCollector>,
    ) -> Self {
        Self {
            switch,
            vision,
            translator: Translator::new(Arc::clone(&chat)),
            chat,
            metrics,
        }
    }

    /// The mock/live switch.
    pub fn switch(&self) -> &ModeSwitch {
        &self.switch
    }

    /// Analyzes `request.image_base64`.
    #[instrument(skip_all, fields(operation = "image_analysis", mode = %self.switch.mode()))]
    pub async fn analyze(&self, request: &ImageAnalysisRequest) -> Envelope<ImageAnalysis> {
        let language = request.language_tag();
        run_feature(
            self.metrics.as_ref(),
            Operation::ImageAnalysis.as_str(),
            &language,
            self.analyze_inner(request, &language),
        )
        .await
    }

    async fn analyze_inner(
        &self,
        request: &ImageAnalysisRequest,
        language: &LanguageTag,
    ) -> MarketplaceResult<ImageAnalysis> {
        let image = request.validated_image()?;

        if self.switch.is_mock() {
            self.metrics.record_mock_hit(Operation::ImageAnalysis.as_str());
            return self.switch.fixture(Operation::ImageAnalysis, language).await;
        }

        let findings = self.annotate(image, language).await?;
        debug!(
            labels = findings.labels.len(),
            objects = findings.objects.len(),
            "Vision annotations received"
        );

        let prompt = self
            .chat
            .request()
            .system(SYSTEM_PROMPT)
            .user(findings_prompt(&findings))
            .temperature(0.3)
            .max_tokens(512)
            .json_mode()
            .build()?;
        let assessment: ProjectAssessment = self.chat.complete_json(&prompt, language).await?;

        let mut analysis = ImageAnalysis {
            labels: findings.labels,
            objects: findings.objects,
            detected_text: findings.detected_text,
            assessment,
        };
        analysis.validate()?;
        self.translator.translate(&mut analysis, language).await?;
        Ok(analysis)
    }

    async fn annotate(
        &self,
        image: String,
        language: &LanguageTag,
    ) -> MarketplaceResult<VisionFindings> {
        let mut http_request =
            HttpRequest::post_json(self.vision.url(), &AnnotateRequest::for_image(image))?;
        self.vision.authorize(&mut http_request.headers)?;

        let response = self
            .chat
            .executor()
            .execute(http_request, &self.chat.options_for(language))
            .await?;
        let annotations: AnnotateResponse = response.json()?;
        Ok(VisionFindings::from(annotations))
    }
}
