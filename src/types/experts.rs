//! Expert matching types.

use serde::{Deserialize, Serialize};

use super::language::LanguageTag;
use super::{check_range, required, Placeholder, Translatable, Validate};
use crate::errors::MarketplaceError;

/// Placeholder for an unspecified location.
pub const ANY_LOCATION: &str = "Any";

/// Incoming expert matching request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpertMatchRequest {
    /// Description of the homeowner's project (required).
    pub project_description: Option<String>,
    /// Where the work happens, defaults to `Any`.
    pub location: Option<String>,
    /// Budget in the marketplace currency, defaults to `0` (unspecified).
    pub budget: Option<f64>,
    /// Caller language, defaults to `en-US`.
    pub language: Option<String>,
}

impl ExpertMatchRequest {
    /// Creates a request for a project.
    pub fn new(project_description: impl Into<String>) -> Self {
        Self {
            project_description: Some(project_description.into()),
            ..Self::default()
        }
    }

    /// Sets the location.
    #[must_use]
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Sets the budget.
    #[must_use]
    pub fn budget(mut self, budget: f64) -> Self {
        self.budget = Some(budget);
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
    pub fn validated(&self) -> Result<ValidExpertMatch, MarketplaceError> {
        let budget = self.budget.unwrap_or(0.0);
        if !budget.is_finite() || budget < 0.0 {
            return Err(MarketplaceError::validation(
                "budget",
                "budget must be a non-negative number",
            ));
        }

        Ok(ValidExpertMatch {
            project_description: required("projectDescription", self.project_description.as_deref())?,
            location: self
                .location
                .as_deref()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .unwrap_or(ANY_LOCATION)
                .to_string(),
            budget,
        })
    }
}

/// An expert matching request with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidExpertMatch {
    /// Project description.
    pub project_description: String,
    /// Location or `Any`.
    pub location: String,
    /// Budget, `0` when unspecified.
    pub budget: f64,
}

/// A recommended kind of expert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpertRecommendation {
    /// Trade or specialty, e.g. "Licensed Electrician".
    pub specialty: String,
    /// Skills to look for.
    #[serde(default)]
    pub expertise: Vec<String>,
    /// Fit with the project, 0 to 100.
    pub match_score: f64,
    /// Why this expert fits.
    pub reasoning: String,
    /// Rough cost range, free text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<String>,
}

/// Expert matching result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpertMatches {
    /// Ranked recommendations.
    pub experts: Vec<ExpertRecommendation>,
    /// One-paragraph summary.
    pub summary: String,
}

impl Translatable for ExpertMatches {
    fn text_fields_mut(&mut self) -> Vec<&mut String> {
        let mut fields = vec![&mut self.summary];
        for expert in &mut self.experts {
            fields.push(&mut expert.specialty);
            fields.push(&mut expert.reasoning);
            fields.extend(expert.expertise.iter_mut());
        }
        fields
    }
}

impl Placeholder for ExpertMatches {
    fn placeholder(message: String, _language: &LanguageTag) -> Self {
        Self {
            experts: Vec::new(),
            summary: message,
        }
    }
}

impl Validate for ExpertMatches {
    fn validate(&self) -> Result<(), MarketplaceError> {
        for expert in &self.experts {
            check_range("matchScore", expert.match_score, 100.0)?;
        }
        Ok(())
    }
}
