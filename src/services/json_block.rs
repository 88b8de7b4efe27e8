//! Extraction of the JSON portion of a model reply.

use regex::Regex;
use std::sync::OnceLock;

use crate::errors::{MarketplaceError, MarketplaceResult};

fn fence() -> Option<&'static Regex> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    FENCE
        .get_or_init(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").ok())
        .as_ref()
}

/// Returns the JSON object embedded in `content`.
///
/// A fenced code block wins; otherwise the span from the first `{` to the
/// last `}` is used.
pub(crate) fn extract_json(content: &str) -> MarketplaceResult<&str> {
    if let Some(body) = fence()
        .and_then(|re| re.captures(content))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|body| body.starts_with('{'))
    {
        return Ok(body);
    }

    match (content.find('{'), content.rfind('}')) {
        (Some(start), Some(end)) if start < end => Ok(&content[start..=end]),
        _ => Err(MarketplaceError::parse("Model reply contains no JSON object")),
    }
}
