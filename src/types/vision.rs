//! Image analysis types and the Google Vision `images:annotate` wire format.

use serde::{Deserialize, Serialize};

use super::language::LanguageTag;
use super::{check_range, required, Placeholder, Translatable, Validate};
use crate::errors::MarketplaceError;

/// Incoming image analysis request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAnalysisRequest {
    /// Base64 image, optionally as a `data:` URL (required).
    pub image_base64: Option<String>,
    /// Caller language, defaults to `en-US`.
    pub language: Option<String>,
}

impl ImageAnalysisRequest {
    /// Creates a request for an encoded image.
    pub fn new(image_base64: impl Into<String>) -> Self {
        Self {
            image_base64: Some(image_base64.into()),
            language: None,
        }
    }

    /// Sets the language.
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Resolved language tag.
    pub fn language_tag(&self) -> LanguageTag {
        LanguageTag::parse_or_default(self.language.as_deref())
    }

    /// Returns the validated base64 payload without any `data:` prefix.
    pub fn validated_image(&self) -> Result<String, MarketplaceError> {
        let raw = required("imageBase64", self.image_base64.as_deref())?;
        super::speech::strip_and_check_base64("imageBase64", &raw)
    }
}

/// A label detected in the image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageLabel {
    /// Label text.
    pub description: String,
    /// Confidence, 0 to 1.
    pub score: f64,
}

/// How much work the pictured project looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    /// DIY-friendly.
    Low,
    /// Needs some professional help.
    Medium,
    /// Major professional project.
    High,
}

/// Model assessment of the pictured project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectAssessment {
    /// Project type, e.g. "Bathroom renovation".
    pub project_type: String,
    /// What the model sees.
    pub description: String,
    /// Services the homeowner may need.
    #[serde(default)]
    pub suggested_services: Vec<String>,
    /// Estimated complexity.
    pub complexity: Complexity,
}

/// Image analysis result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAnalysis {
    /// Labels, most confident first.
    pub labels: Vec<ImageLabel>,
    /// Localized object names.
    #[serde(default)]
    pub objects: Vec<String>,
    /// Text found in the image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_text: Option<String>,
    /// Project assessment.
    pub assessment: ProjectAssessment,
}

impl Translatable for ImageAnalysis {
    fn text_fields_mut(&mut self) -> Vec<&mut String> {
        let mut fields = vec![
            &mut self.assessment.project_type,
            &mut self.assessment.description,
        ];
        fields.extend(self.assessment.suggested_services.iter_mut());
        fields
    }
}

impl Placeholder for ImageAnalysis {
    fn placeholder(message: String, _language: &LanguageTag) -> Self {
        Self {
            labels: Vec::new(),
            objects: Vec::new(),
            detected_text: None,
            assessment: ProjectAssessment {
                project_type: "Unknown".to_string(),
                description: message,
                suggested_services: Vec::new(),
                complexity: Complexity::Low,
            },
        }
    }
}

impl Validate for ProjectAssessment {
    fn validate(&self) -> Result<(), MarketplaceError> {
        if self.project_type.trim().is_empty() {
            return Err(MarketplaceError::parse("projectType is empty"));
        }
        Ok(())
    }
}

impl Validate for ImageAnalysis {
    fn validate(&self) -> Result<(), MarketplaceError> {
        for label in &self.labels {
            check_range("label score", label.score, 1.0)?;
        }
        self.assessment.validate()
    }
}

/// `images:annotate` request body.
#[derive(Debug, Clone, Serialize)]
pub struct AnnotateRequest {
    /// One entry per image.
    pub requests: Vec<AnnotateImageRequest>,
}

impl AnnotateRequest {
    /// Requests labels, objects and text for a single image.
    pub fn for_image(content: impl Into<String>) -> Self {
        Self {
            requests: vec![AnnotateImageRequest {
                image: VisionImage {
                    content: content.into(),
                },
                features: vec![
                    VisionFeature::new("LABEL_DETECTION", 10),
                    VisionFeature::new("OBJECT_LOCALIZATION", 10),
                    VisionFeature::new("TEXT_DETECTION", 1),
                ],
            }],
        }
    }
}

/// A single image annotation request.
#[derive(Debug, Clone, Serialize)]
pub struct AnnotateImageRequest {
    /// The image.
    pub image: VisionImage,
    /// Requested detections.
    pub features: Vec<VisionFeature>,
}

/// Inline image content.
#[derive(Debug, Clone, Serialize)]
pub struct VisionImage {
    /// Base64 image bytes.
    pub content: String,
}

/// Requested detection feature.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisionFeature {
    /// Feature type, e.g. `LABEL_DETECTION`.
    #[serde(rename = "type")]
    pub feature_type: String,
    /// Result cap.
    pub max_results: u32,
}

impl VisionFeature {
    fn new(feature_type: &str, max_results: u32) -> Self {
        Self {
            feature_type: feature_type.to_string(),
            max_results,
        }
    }
}

/// `images:annotate` response body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnnotateResponse {
    /// One entry per requested image.
    #[serde(default)]
    pub responses: Vec<AnnotateImageResponse>,
}

/// Annotations for one image.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotateImageResponse {
    /// Label annotations.
    #[serde(default)]
    pub label_annotations: Vec<EntityAnnotation>,
    /// Object annotations.
    #[serde(default)]
    pub localized_object_annotations: Vec<LocalizedObjectAnnotation>,
    /// Text annotations; the first entry holds the full text.
    #[serde(default)]
    pub text_annotations: Vec<EntityAnnotation>,
}

/// Label or text annotation.
#[derive(Debug, Clone, Deserialize)]
pub struct EntityAnnotation {
    /// Entity text.
    pub description: String,
    /// Confidence.
    #[serde(default)]
    pub score: f64,
}

/// Object annotation.
#[derive(Debug, Clone, Deserialize)]
pub struct LocalizedObjectAnnotation {
    /// Object name.
    pub name: String,
    /// Confidence.
    #[serde(default)]
    pub score: f64,
}

/// Labels, objects and text extracted from an annotate response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisionFindings {
    /// Labels, most confident first.
    pub labels: Vec<ImageLabel>,
    /// Distinct object names.
    pub objects: Vec<String>,
    /// Full detected text.
    pub detected_text: Option<String>,
}

impl From<AnnotateResponse> for VisionFindings {
    fn from(response: AnnotateResponse) -> Self {
        let Some(first) = response.responses.into_iter().next() else {
            return Self::default();
        };

        let mut labels: Vec<ImageLabel> = first
            .label_annotations
            .into_iter()
            .map(|a| ImageLabel {
                description: a.description,
                score: a.score.clamp(0.0, 1.0),
            })
            .collect();
        labels.sort_by(|a, b| b.score.total_cmp(&a.score));

        let mut objects: Vec<String> = Vec::new();
        for object in first.localized_object_annotations {
            if !objects.contains(&object.name) {
                objects.push(object.name);
            }
        }

        let detected_text = first
            .text_annotations
            .into_iter()
            .next()
            .map(|t| t.description.trim().to_string())
            .filter(|t| !t.is_empty());

        Self {
            labels,
            objects,
            detected_text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_findings_from_annotate_response() {
        let response: AnnotateResponse = serde_json::from_value(json!({
            "responses": [{
                "labelAnnotations": [
                    {"description": "Tile", "score": 0.71},
                    {"description": "Bathroom", "score": 0.97}
                ],
                "localizedObjectAnnotations": [
                    {"name": "Sink", "score": 0.9},
                    {"name": "Sink", "score": 0.8},
                    {"name": "Mirror", "score": 0.7}
                ],
                "textAnnotations": [{"description": "  KOHLER\n"}]
            }]
        }))
        .unwrap();

        let findings = VisionFindings::from(response);
        assert_eq!(findings.labels[0].description, "Bathroom");
        assert_eq!(findings.objects, vec!["Sink", "Mirror"]);
        assert_eq!(findings.detected_text.as_deref(), Some("KOHLER"));
    }

    #[test]
    fn test_empty_response_yields_no_findings() {
        let findings = VisionFindings::from(AnnotateResponse::default());
        assert!(findings.labels.is_empty());
        assert!(findings.detected_text.is_none());
    }

    #[test]
    fn test_annotate_request_shape() {
        let body = serde_json::to_value(AnnotateRequest::for_image("aGVsbG8=")).unwrap();
        assert_eq!(body["requests"][0]["image"]["content"], "aGVsbG8=");
        assert_eq!(body["requests"][0]["features"][0]["type"], "LABEL_DETECTION");
        assert_eq!(body["requests"][0]["features"][0]["maxResults"], 10);
    }
}
