//! OpenAI-compatible chat completions wire types.

use serde::{Deserialize, Serialize};

// ============================================================================
// Request
// ============================================================================

/// Body of `POST /chat/completions`.
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    /// Model identifier.
    pub model: &'a str,
    /// Conversation; always a single user message here.
    pub messages: Vec<ChatMessage<'a>>,
    /// Completion token budget.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

/// One chat message.
#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    /// Speaker role.
    pub role: &'static str,
    /// Plain text or multi-part content.
    pub content: MessageContent<'a>,
}

/// Message content: a bare string for text calls, parts for vision calls.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum MessageContent<'a> {
    /// Text-only content.
    Text(&'a str),
    /// Text and image parts.
    Parts(Vec<ContentPart<'a>>),
}

/// One part of a multi-part message.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart<'a> {
    /// Prompt text.
    Text {
        /// The text.
        text: &'a str,
    },
    /// Inline image.
    ImageUrl {
        /// Data URL wrapper.
        image_url: ImageUrl,
    },
}

/// Image reference; here always a `data:` URL.
#[derive(Debug, Serialize)]
pub struct ImageUrl {
    /// `data:image/<fmt>;base64,...`
    pub url: String,
}

impl<'a> ChatMessage<'a> {
    /// A user message with only text.
    pub fn user_text(text: &'a str) -> Self {
        Self {
            role: "user",
            content: MessageContent::Text(text),
        }
    }

    /// A user message with prompt text followed by an inline image.
    pub fn user_with_image(text: &'a str, data_url: String) -> Self {
        Self {
            role: "user",
            content: MessageContent::Parts(vec![
                ContentPart::Text { text },
                ContentPart::ImageUrl {
                    image_url: ImageUrl { url: data_url },
                },
            ]),
        }
    }
}

// ============================================================================
// Response
// ============================================================================

/// Successful completions response. Only the fields we read.
#[derive(Debug, Default, Deserialize)]
pub struct ChatResponse {
    /// Completion choices.
    #[serde(default)]
    pub choices: Vec<Choice>,
}

/// One completion choice.
#[derive(Debug, Deserialize)]
pub struct Choice {
    /// Assistant message.
    #[serde(default)]
    pub message: Option<ResponseMessage>,
}

/// Assistant message in a choice.
#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    /// Completion text; `null` when the model produced nothing.
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatResponse {
    /// Returns the first choice's text, or `None` if it is missing or blank.
    pub fn into_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|s| !s.trim().is_empty())
    }
}

/// Error body returned by OpenAI-compatible APIs.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    /// Error detail.
    #[serde(default)]
    pub error: Option<ApiErrorDetail>,
}

/// Error detail.
#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    /// Message text.
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiErrorBody {
    /// Extracts the message from an error body, falling back to the raw text.
    pub fn message_from(body: &str) -> String {
        serde_json::from_str::<Self>(body)
            .ok()
            .and_then(|b| b.error)
            .and_then(|e| e.message)
            .unwrap_or_else(|| body.trim().chars().take(300).collect())
    }
}
