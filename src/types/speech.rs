//! Voice transcription types and the Google Speech `speech:recognize` wire format.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use super::language::LanguageTag;
use super::{required, Placeholder};
use crate::errors::MarketplaceError;

/// Incoming voice transcription request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptionRequest {
    /// Base64 audio, optionally as a `data:` URL (required).
    pub audio_data: Option<String>,
    /// Spoken language, defaults to `en-US`.
    pub language_code: Option<String>,
}

impl TranscriptionRequest {
    /// Creates a request for encoded audio.
    pub fn new(audio_data: impl Into<String>) -> Self {
        Self {
            audio_data: Some(audio_data.into()),
            language_code: None,
        }
    }

    /// Sets the spoken language.
    #[must_use]
    pub fn language_code(mut self, language_code: impl Into<String>) -> Self {
        self.language_code = Some(language_code.into());
        self
    }

    /// Resolved language tag.
    pub fn language_tag(&self) -> LanguageTag {
        LanguageTag::parse_or_default(self.language_code.as_deref())
    }

    /// Returns the validated base64 payload without any `data:` prefix.
    pub fn validated_audio(&self) -> Result<String, MarketplaceError> {
        let raw = required("audioData", self.audio_data.as_deref())?;
        strip_and_check_base64("audioData", &raw)
    }
}

/// Strips a `data:<mime>;base64,` prefix and checks the remainder decodes.
pub(crate) fn strip_and_check_base64(field: &str, raw: &str) -> Result<String, MarketplaceError> {
    let payload = match raw.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => raw,
    };
    let payload: String = payload.chars().filter(|c| !c.is_whitespace()).collect();

    if payload.is_empty() {
        return Err(MarketplaceError::missing_field(field));
    }
    STANDARD
        .decode(&payload)
        .map_err(|e| MarketplaceError::validation(field, format!("{field} is not valid base64: {e}")))?;

    Ok(payload)
}

/// Transcription result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcription {
    /// Recognized text; empty when nothing was recognized.
    pub transcript: String,
    /// Confidence, 0 to 1.
    pub confidence: f64,
    /// Language the audio was recognized in.
    pub language_code: String,
}

impl Placeholder for Transcription {
    fn placeholder(message: String, language: &LanguageTag) -> Self {
        Self {
            transcript: message,
            confidence: 0.0,
            language_code: language.as_str().to_string(),
        }
    }
}

/// `speech:recognize` request body.
#[derive(Debug, Clone, Serialize)]
pub struct RecognizeRequest {
    /// Recognition settings.
    pub config: RecognitionConfig,
    /// Audio payload.
    pub audio: RecognitionAudio,
}

impl RecognizeRequest {
    /// Builds a request for browser-recorded WebM/Opus audio.
    pub fn new(content: impl Into<String>, language: &LanguageTag) -> Self {
        Self {
            config: RecognitionConfig {
                encoding: "WEBM_OPUS".to_string(),
                sample_rate_hertz: 48_000,
                language_code: language.as_str().to_string(),
                enable_automatic_punctuation: true,
                model: "default".to_string(),
            },
            audio: RecognitionAudio {
                content: content.into(),
            },
        }
    }
}

/// Recognition settings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionConfig {
    /// Audio encoding.
    pub encoding: String,
    /// Sample rate.
    pub sample_rate_hertz: u32,
    /// BCP-47 language code.
    pub language_code: String,
    /// Insert punctuation.
    pub enable_automatic_punctuation: bool,
    /// Recognition model.
    pub model: String,
}

/// Inline audio content.
#[derive(Debug, Clone, Serialize)]
pub struct RecognitionAudio {
    /// Base64 audio bytes.
    pub content: String,
}

/// `speech:recognize` response body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecognizeResponse {
    /// Consecutive recognized segments.
    #[serde(default)]
    pub results: Vec<RecognitionResult>,
}

/// One recognized segment.
#[derive(Debug, Clone, Deserialize)]
pub struct RecognitionResult {
    /// Alternatives, most likely first.
    #[serde(default)]
    pub alternatives: Vec<RecognitionAlternative>,
}

/// One hypothesis.
#[derive(Debug, Clone, Deserialize)]
pub struct RecognitionAlternative {
    /// Hypothesis text.
    #[serde(default)]
    pub transcript: String,
    /// Confidence.
    #[serde(default)]
    pub confidence: f64,
}

impl RecognizeResponse {
    /// Joins the best alternative of each segment.
    ///
    /// Confidence is the mean over segments; an empty response yields an
    /// empty transcript with zero confidence.
    pub fn into_transcription(self, language: &LanguageTag) -> Transcription {
        let best: Vec<RecognitionAlternative> = self
            .results
            .into_iter()
            .filter_map(|r| r.alternatives.into_iter().next())
            .collect();

        let transcript = best
            .iter()
            .map(|a| a.transcript.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        #[allow(clippy::cast_precision_loss)]
        let confidence = if best.is_empty() {
            0.0
        } else {
            best.iter().map(|a| a.confidence).sum::<f64>() / best.len() as f64
        };

        Transcription {
            transcript,
            confidence: confidence.clamp(0.0, 1.0),
            language_code: language.as_str().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_data_url_prefix_is_stripped() {
        let request = TranscriptionRequest::new("data:audio/webm;base64,aGVsbG8=");
        assert_eq!(request.validated_audio().unwrap(), "aGVsbG8=");
    }

    #[test]
    fn test_invalid_base64_rejected() {
        let request = TranscriptionRequest::new("not base64!!");
        assert!(request.validated_audio().is_err());
    }

    #[test]
    fn test_segments_are_joined() {
        let response: RecognizeResponse = serde_json::from_value(json!({
            "results": [
                {"alternatives": [{"transcript": "I need a plumber", "confidence": 0.9}]},
                {"alternatives": [{"transcript": " for my kitchen sink", "confidence": 0.7}]}
            ]
        }))
        .unwrap();

        let transcription = response.into_transcription(&LanguageTag::parse("en-GB"));
        assert_eq!(transcription.transcript, "I need a plumber for my kitchen sink");
        assert!((transcription.confidence - 0.8).abs() < 1e-9);
        assert_eq!(transcription.language_code, "en-GB");
    }

    #[test]
    fn test_empty_results_yield_empty_transcript() {
        let transcription = RecognizeResponse::default().into_transcription(&LanguageTag::default());
        assert!(transcription.transcript.is_empty());
        assert!(transcription.confidence.abs() < f64::EPSILON);
    }
}
