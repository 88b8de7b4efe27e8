//! Material recommendation types.

use serde::{Deserialize, Serialize};

use super::language::LanguageTag;
use super::{check_range, required, Placeholder, Translatable, Validate};
use crate::errors::MarketplaceError;

/// Placeholder for an unspecified style.
pub const ANY_STYLE: &str = "Any";

/// Incoming material recommendation request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialRecommendationRequest {
    /// Description of the project (required).
    pub project_description: Option<String>,
    /// Budget, defaults to `0` (unspecified).
    pub budget: Option<f64>,
    /// Preferred style, defaults to `Any`.
    pub style: Option<String>,
    /// Caller language, defaults to `en-US`.
    pub language: Option<String>,
}

impl MaterialRecommendationRequest {
    /// Creates a request for a project.
    pub fn new(project_description: impl Into<String>) -> Self {
        Self {
            project_description: Some(project_description.into()),
            ..Self::default()
        }
    }

    /// Sets the budget.
    #[must_use]
    pub fn budget(mut self, budget: f64) -> Self {
        self.budget = Some(budget);
        self
    }

    /// Sets the style.
    #[must_use]
    pub fn style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
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

    /// Validates the request and applies defaults.
    pub fn validated(&self) -> Result<ValidMaterialRequest, MarketplaceError> {
        let budget = self.budget.unwrap_or(0.0);
        if !budget.is_finite() || budget < 0.0 {
            return Err(MarketplaceError::validation(
                "budget",
                "budget must be a non-negative number",
            ));
        }

        Ok(ValidMaterialRequest {
            project_description: required("projectDescription", self.project_description.as_deref())?,
            budget,
            style: self
                .style
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(ANY_STYLE)
                .to_string(),
        })
    }
}

/// A material recommendation request with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidMaterialRequest {
    /// Project description.
    pub project_description: String,
    /// Budget, `0` when unspecified.
    pub budget: f64,
    /// Style or `Any`.
    pub style: String,
}

/// One suggested material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialSuggestion {
    /// Product or material name.
    pub name: String,
    /// Category, e.g. "Flooring".
    pub category: String,
    /// Why it suits the project.
    pub reason: String,
    /// Estimated unit price.
    pub estimated_price: f64,
    /// Quantity hint, free text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
    /// Whether the material is considered eco-friendly.
    #[serde(default)]
    pub eco_friendly: bool,
}

/// Material recommendation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialRecommendations {
    /// Suggested materials.
    pub materials: Vec<MaterialSuggestion>,
    /// Estimated total cost.
    pub total_estimate: f64,
    /// Practical tips.
    #[serde(default)]
    pub tips: Vec<String>,
}

impl Translatable for MaterialRecommendations {
    fn text_fields_mut(&mut self) -> Vec<&mut String> {
        let mut fields = Vec::new();
        for material in &mut self.materials {
            fields.push(&mut material.name);
            fields.push(&mut material.category);
            fields.push(&mut material.reason);
        }
        fields.extend(self.tips.iter_mut());
        fields
    }
}

impl Placeholder for MaterialRecommendations {
    fn placeholder(message: String, _language: &LanguageTag) -> Self {
        Self {
            materials: Vec::new(),
            total_estimate: 0.0,
            tips: vec![message],
        }
    }
}

impl Validate for MaterialRecommendations {
    fn validate(&self) -> Result<(), MarketplaceError> {
        check_range("totalEstimate", self.total_estimate, f64::MAX)?;
        for material in &self.materials {
            check_range("estimatedPrice", material.estimated_price, f64::MAX)?;
        }
        Ok(())
    }
}
