//! Voice transcription through Google Speech.

use std::sync::Arc;
use tracing::{debug, instrument};

use super::{run_feature, GoogleEndpoint, ModeSwitch};
use crate::errors::MarketplaceResult;
use crate::executor::{RequestExecutor, RequestOptions};
use crate::fixtures::Operation;
use crate::observability::MetricsCollector;
use crate::transport::HttpRequest;
use crate::types::envelope::Envelope;
use crate::types::language::LanguageTag;
use crate::types::speech::{RecognizeRequest, RecognizeResponse, Transcription, TranscriptionRequest};

/// Turns recorded speech into text.
///
/// Transcripts come back in the spoken language and are not translated.
#[derive(Debug)]
pub struct VoiceTranscriptionService {
    switch: ModeSwitch,
    speech: GoogleEndpoint,
    executor: Arc<RequestExecutor>,
    options: RequestOptions,
    metrics: Arc<dyn MetricsCollector>,
}

impl VoiceTranscriptionService {
    /// Creates the service.
    pub fn new(
        switch: ModeSwitch,
        speech: GoogleEndpoint,
        executor: Arc<RequestExecutor>,
        options: RequestOptions,
        metrics: Arc<dyn MetricsCollector>,
    ) -> Self {
        Self {
            switch,
            speech,
            executor,
            options,
            metrics,
        }
    }

    /// The mock/live switch.
    pub fn switch(&self) -> &ModeSwitch {
        &self.switch
    }

    /// Transcribes `request.audio_data` in `request.language_code`.
    #[instrument(skip_all, fields(operation = "voice_transcription", mode = %self.switch.mode()))]
    pub async fn transcribe(&self, request: &TranscriptionRequest) -> Envelope<Transcription> {
        let language = request.language_tag();
        run_feature(
            self.metrics.as_ref(),
            Operation::VoiceTranscription.as_str(),
            &language,
            self.transcribe_inner(request, &language),
        )
        .await
    }

    async fn transcribe_inner(
        &self,
        request: &TranscriptionRequest,
        language: &LanguageTag,
    ) -> MarketplaceResult<Transcription> {
        let audio = request.validated_audio()?;

        if self.switch.is_mock() {
            self.metrics
                .record_mock_hit(Operation::VoiceTranscription.as_str());
            return self
                .switch
                .fixture(Operation::VoiceTranscription, language)
                .await;
        }

        let mut http_request =
            HttpRequest::post_json(self.speech.url(), &RecognizeRequest::new(audio, language))?;
        self.speech.authorize(&mut http_request.headers)?;

        let options = self.options.clone().language(language.clone());
        let response = self.executor.execute(http_request, &options).await?;
        let recognized: RecognizeResponse = response.json()?;

        let transcription = recognized.into_transcription(language);
        debug!(
            chars = transcription.transcript.len(),
            confidence = transcription.confidence,
            "Speech recognized"
        );
        Ok(transcription)
    }
}
