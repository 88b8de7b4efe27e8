//! Chat completion wire types (OpenAI-compatible, as served by Groq).

use serde::{Deserialize, Serialize};

use crate::errors::MarketplaceError;

/// Chat completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model ID (required).
    pub model: String,

    /// Messages array (required).
    pub messages: Vec<Message>,

    /// Temperature (0.0-2.0).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Max completion tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Response format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

impl ChatRequest {
    /// Creates a new request builder.
    pub fn builder() -> ChatRequestBuilder {
        ChatRequestBuilder::new()
    }

    /// Validates the request.
    pub fn validate(&self) -> Result<(), MarketplaceError> {
        if self.model.is_empty() {
            return Err(MarketplaceError::validation("model", "Model is required"));
        }

        if self.messages.is_empty() {
            return Err(MarketplaceError::validation(
                "messages",
                "At least one message is required",
            ));
        }

        if let Some(temp) = self.temperature {
            if !(0.0..=2.0).contains(&temp) {
                return Err(MarketplaceError::validation(
                    "temperature",
                    "Temperature must be between 0.0 and 2.0",
                ));
            }
        }

        if let Some(index) = self.messages.iter().position(|m| m.content.trim().is_empty()) {
            return Err(MarketplaceError::validation(
                format!("messages[{index}]"),
                "Message content cannot be empty",
            ));
        }

        Ok(())
    }
}

/// Chat request builder.
#[derive(Debug, Default)]
pub struct ChatRequestBuilder {
    model: Option<String>,
    messages: Vec<Message>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    response_format: Option<ResponseFormat>,
}

impl ChatRequestBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the model.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Adds a system message.
    #[must_use]
    pub fn system(mut self, content: impl Into<String>) -> Self {
        self.messages.push(Message::system(content));
        self
    }

    /// Adds a user message.
    #[must_use]
    pub fn user(mut self, content: impl Into<String>) -> Self {
        self.messages.push(Message::user(content));
        self
    }

    /// Sets the temperature.
    #[must_use]
    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    /// Sets the max tokens.
    #[must_use]
    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    /// Enables JSON mode.
    #[must_use]
    pub fn json_mode(mut self) -> Self {
        self.response_format = Some(ResponseFormat {
            type_: ResponseFormatType::JsonObject,
        });
        self
    }

    /// Builds the request.
    pub fn build(self) -> Result<ChatRequest, MarketplaceError> {
        let model = self
            .model
            .ok_or_else(|| MarketplaceError::validation("model", "Model is required"))?;

        let request = ChatRequest {
            model,
            messages: self.messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            response_format: self.response_format,
        };

        request.validate()?;
        Ok(request)
    }
}

/// Chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Message role.
    pub role: Role,
    /// Message content.
    pub content: String,
}

impl Message {
    /// Creates a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System message.
    System,
    /// User message.
    User,
    /// Assistant message.
    Assistant,
}

/// Response format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseFormat {
    /// Format type.
    #[serde(rename = "type")]
    pub type_: ResponseFormatType,
}

/// Response format type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormatType {
    /// Plain text.
    Text,
    /// JSON object.
    JsonObject,
}

/// Chat completion response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Response ID.
    pub id: String,

    /// Model ID.
    pub model: String,

    /// Response choices.
    pub choices: Vec<Choice>,

    /// Token usage.
    #[serde(default)]
    pub usage: Usage,
}

impl ChatResponse {
    /// Gets the first choice content.
    pub fn content(&self) -> Option<&str> {
        self.choices.first().and_then(|c| c.message.content.as_deref())
    }
}

/// Response choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    /// Choice index.
    pub index: u32,

    /// Assistant message.
    pub message: AssistantMessage,

    /// Finish reason.
    pub finish_reason: Option<String>,
}

/// Assistant message in response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantMessage {
    /// Message role.
    pub role: Role,

    /// Message content.
    pub content: Option<String>,
}

/// Token usage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    /// Prompt tokens.
    pub prompt_tokens: u32,

    /// Completion tokens.
    pub completion_tokens: u32,

    /// Total tokens.
    pub total_tokens: u32,
}
