//! Model request types and the `VisionModel` trait.
//!
//! A [`VisionModel`] is one named endpoint that turns a [`ModelRequest`]
//! into raw completion text. The HTTP implementation is
//! [`ProviderClient`](crate::ProviderClient); tests substitute their own.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ProviderError;

/// Completion budget for image extraction calls.
pub const VISION_MAX_TOKENS: u32 = 2000;

/// Sampling temperature for image extraction calls.
pub const VISION_TEMPERATURE: f32 = 0.1;

/// Completion budget for text-only calls.
pub const TEXT_MAX_TOKENS: u32 = 1500;

/// Sampling temperature for text-only calls.
pub const TEXT_TEMPERATURE: f32 = 0.3;

// ============================================================================
// Call Kind
// ============================================================================

/// Whether a call carries an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    /// Image plus prompt.
    Vision,
    /// Prompt only.
    Text,
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vision => f.write_str("vision"),
            Self::Text => f.write_str("text"),
        }
    }
}

// ============================================================================
// Request
// ============================================================================

/// Encoded image content.
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePayload {
    /// Raw file bytes.
    pub bytes: Vec<u8>,
    /// Lowercase format name, e.g. `png` or `jpeg`.
    pub format: String,
}

impl ImagePayload {
    /// Creates a payload, normalizing `jpg` to `jpeg`.
    pub fn new(bytes: Vec<u8>, format: impl Into<String>) -> Self {
        let format = format.into().to_ascii_lowercase();
        let format = if format == "jpg" { "jpeg".to_string() } else { format };
        Self { bytes, format }
    }

    /// Returns the MIME type, e.g. `image/png`.
    pub fn mime_type(&self) -> String {
        format!("image/{}", self.format)
    }
}

impl fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagePayload")
            .field("format", &self.format)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// One call to a model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    /// Vision or text.
    pub kind: CallKind,
    /// Prompt text.
    pub prompt: String,
    /// Image, for vision calls.
    pub image: Option<ImagePayload>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Completion token budget.
    pub max_tokens: u32,
}

impl ModelRequest {
    /// Builds an image + prompt request with vision defaults.
    pub fn vision(image: ImagePayload, prompt: impl Into<String>) -> Self {
        Self {
            kind: CallKind::Vision,
            prompt: prompt.into(),
            image: Some(image),
            temperature: VISION_TEMPERATURE,
            max_tokens: VISION_MAX_TOKENS,
        }
    }

    /// Builds a prompt-only request with text defaults.
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            kind: CallKind::Text,
            prompt: prompt.into(),
            image: None,
            temperature: TEXT_TEMPERATURE,
            max_tokens: TEXT_MAX_TOKENS,
        }
    }

    /// Overrides the temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

// ============================================================================
// Vision Model Trait
// ============================================================================

/// A named model endpoint.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Registry name of this provider.
    fn name(&self) -> &str;

    /// Whether the endpoint accepts image input.
    fn supports_images(&self) -> bool {
        true
    }

    /// Sends the request and returns the raw completion text.
    async fn invoke(&self, request: &ModelRequest) -> Result<String, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let v = ModelRequest::vision(ImagePayload::new(vec![1, 2, 3], "png"), "read this");
        assert_eq!(v.kind, CallKind::Vision);
        assert_eq!(v.max_tokens, 2000);
        assert!((v.temperature - 0.1).abs() < f32::EPSILON);

        let t = ModelRequest::text("summarize").with_temperature(0.5);
        assert_eq!(t.kind, CallKind::Text);
        assert_eq!(t.max_tokens, 1500);
        assert!(t.image.is_none());
        assert!((t.temperature - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_payload_mime_type() {
        assert_eq!(ImagePayload::new(vec![], "JPG").mime_type(), "image/jpeg");
        assert_eq!(ImagePayload::new(vec![], "png").mime_type(), "image/png");
    }

    #[test]
    fn test_payload_debug_hides_bytes() {
        let dbg = format!("{:?}", ImagePayload::new(vec![0; 1024], "png"));
        assert!(dbg.contains("len: 1024"));
    }
}
