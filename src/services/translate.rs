//! Translation of parsed results into the caller's language.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

use super::chat::ChatService;
use crate::errors::{MarketplaceError, MarketplaceResult};
use crate::types::language::LanguageTag;
use crate::types::{Translatable, Validate};

const SYSTEM_PROMPT: &str = "You are a professional translator for a home-services \
marketplace. Translate every string in the \"texts\" array of the user's JSON into the \
requested language. Keep prices, measurements, brand names and product codes unchanged. \
Reply with JSON only, shaped as {\"translations\": [...]}, with exactly one translation \
per input string, in the same order.";

#[derive(Serialize)]
struct TranslationInput<'a> {
    target_language: String,
    texts: Vec<&'a str>,
}

#[derive(Deserialize)]
struct TranslationReply {
    translations: Vec<String>,
}

impl Validate for TranslationReply {
    fn validate(&self) -> Result<(), MarketplaceError> {
        Ok(())
    }
}

/// Translates [`Translatable`] fields with a nested chat call.
#[derive(Debug, Clone)]
pub struct Translator {
    chat: Arc<ChatService>,
}

impl Translator {
    /// Creates a translator using `chat` for its calls.
    pub fn new(chat: Arc<ChatService>) -> Self {
        Self { chat }
    }

    /// Translates `value` in place. English targets are left untouched.
    ///
    /// A reply with the wrong number of strings is a parse error and leaves
    /// `value` unchanged.
    #[instrument(skip(self, value), fields(language = %language))]
    pub async fn translate<T: Translatable + Send>(
        &self,
        value: &mut T,
        language: &LanguageTag,
    ) -> MarketplaceResult<()> {
        if language.is_english() {
            return Ok(());
        }

        let mut fields: Vec<&mut String> = value
            .text_fields_mut()
            .into_iter()
            .filter(|field| !field.trim().is_empty())
            .collect();
        if fields.is_empty() {
            return Ok(());
        }

        let input = serde_json::to_string(&TranslationInput {
            target_language: language.display_name(),
            texts: fields.iter().map(|field| field.as_str()).collect(),
        })?;
        let request = self
            .chat
            .request()
            .system(SYSTEM_PROMPT)
            .user(input)
            .temperature(0.1)
            .json_mode()
            .build()?;

        let reply: TranslationReply = self.chat.complete_json(&request, language).await?;
        if reply.translations.len() != fields.len() {
            return Err(MarketplaceError::parse(format!(
                "Expected {} translations, got {}",
                fields.len(),
                reply.translations.len()
            )));
        }

        debug!(count = fields.len(), "Translated fields");
        for (field, translation) in fields.iter_mut().zip(reply.translations) {
            **field = translation;
        }
        Ok(())
    }
}
