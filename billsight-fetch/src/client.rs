//! HTTP provider client for OpenAI-compatible chat completions endpoints.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::{ConfigError, ProviderError, ProviderErrorKind};
use crate::host::{HttpClient, ResponseExt, read_credential};
use crate::model::{CallKind, ModelRequest, VisionModel};
use crate::wire::{ApiErrorBody, ChatMessage, ChatRequest, ChatResponse};

/// Path appended to the base URL.
const COMPLETIONS_PATH: &str = "chat/completions";

// ============================================================================
// Endpoint
// ============================================================================

/// Everything a client needs to know about one model endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Registry name, used in logs and results.
    pub name: String,
    /// OpenAI-compatible base URL, e.g. `https://openrouter.ai/api/v1`.
    pub base_url: String,
    /// Model identifier sent in the request body.
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Whether the model accepts images.
    pub supports_images: bool,
    /// Prefix that keys for this service normally start with.
    pub expected_key_prefix: Option<String>,
}

// ============================================================================
// Provider Client
// ============================================================================

/// A [`VisionModel`] backed by an OpenAI-compatible HTTP API.
///
/// The credential is read once at construction.
pub struct ProviderClient {
    endpoint: Endpoint,
    api_key: String,
    completions_url: Url,
    http: HttpClient,
}

impl fmt::Debug for ProviderClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderClient")
            .field("endpoint", &self.endpoint)
            .field("completions_url", &self.completions_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ProviderClient {
    /// Builds a client, reading the API key from `endpoint.api_key_env`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredential`] if the variable is unset or
    /// blank, or another [`ConfigError`] if the endpoint is unusable.
    pub fn from_env(endpoint: Endpoint, timeout: Duration) -> Result<Self, ConfigError> {
        let api_key =
            read_credential(&endpoint.api_key_env).ok_or_else(|| ConfigError::MissingCredential {
                provider: endpoint.name.clone(),
                env_var: endpoint.api_key_env.clone(),
            })?;
        Self::with_api_key(endpoint, api_key, timeout)
    }

    /// Builds a client with an explicit API key.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the key is blank, the base URL does not
    /// parse, or the HTTP client cannot be built.
    pub fn with_api_key(
        endpoint: Endpoint,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let api_key = api_key.into().trim().to_string();
        if api_key.is_empty() {
            return Err(ConfigError::MissingCredential {
                provider: endpoint.name.clone(),
                env_var: endpoint.api_key_env.clone(),
            });
        }

        if let Some(prefix) = endpoint.expected_key_prefix.as_deref() {
            if !api_key.starts_with(prefix) {
                warn!(
                    provider = %endpoint.name,
                    env_var = %endpoint.api_key_env,
                    expected_prefix = prefix,
                    "API key does not have the expected prefix"
                );
            }
        }

        let completions_url = completions_url(&endpoint)?;
        let http = HttpClient::with_timeout(timeout)?;

        debug!(provider = %endpoint.name, model = %endpoint.model, "Provider client ready");

        Ok(Self {
            endpoint,
            api_key,
            completions_url,
            http,
        })
    }

    /// Returns the endpoint description.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn build_body<'a>(&'a self, request: &'a ModelRequest) -> ChatRequest<'a> {
        let message = match &request.image {
            Some(image) => {
                let data_url = format!(
                    "data:{};base64,{}",
                    image.mime_type(),
                    BASE64.encode(&image.bytes)
                );
                ChatMessage::user_with_image(&request.prompt, data_url)
            }
            None => ChatMessage::user_text(&request.prompt),
        };

        ChatRequest {
            model: &self.endpoint.model,
            messages: vec![message],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }

    fn error(&self, kind: ProviderErrorKind, message: impl Into<String>) -> ProviderError {
        ProviderError::new(kind, self.endpoint.name.clone(), message)
    }
}

fn completions_url(endpoint: &Endpoint) -> Result<Url, ConfigError> {
    let base = format!("{}/", endpoint.base_url.trim_end_matches('/'));
    Url::parse(&base)
        .and_then(|u| u.join(COMPLETIONS_PATH))
        .map_err(|e| ConfigError::InvalidEndpoint {
            provider: endpoint.name.clone(),
            reason: e.to_string(),
        })
}

#[async_trait]
impl VisionModel for ProviderClient {
    fn name(&self) -> &str {
        &self.endpoint.name
    }

    fn supports_images(&self) -> bool {
        self.endpoint.supports_images
    }

    #[instrument(skip(self, request), fields(provider = %self.endpoint.name, kind = %request.kind))]
    async fn invoke(&self, request: &ModelRequest) -> Result<String, ProviderError> {
        if request.kind == CallKind::Vision && !self.endpoint.supports_images {
            return Err(self.error(
                ProviderErrorKind::Unknown,
                format!("model {} does not accept image input", self.endpoint.model),
            ));
        }
        if request.kind == CallKind::Vision && request.image.is_none() {
            return Err(self.error(ProviderErrorKind::Unknown, "vision call without an image"));
        }

        let body = self.build_body(request);
        let response = self
            .http
            .post_json_with_auth(&self.completions_url, &self.api_key, &body)
            .await
            .map_err(|e| ProviderError::from_transport(self.endpoint.name.clone(), &e))?;

        let status = response.status();
        if !status.is_success() {
            let kind = ProviderErrorKind::from_status(status);
            let retry_after = response.retry_after_secs();
            let text = response.text().await.unwrap_or_default();
            let mut message = format!("HTTP {}: {}", status.as_u16(), ApiErrorBody::message_from(&text));
            if let Some(secs) = retry_after {
                message.push_str(&format!(" (retry after {secs}s)"));
            }
            warn!(status = %status, kind = %kind, "Provider returned an error");
            return Err(self.error(kind, message));
        }

        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::from_transport(self.endpoint.name.clone(), &e))?;
        let parsed: ChatResponse = serde_json::from_str(&text).map_err(|e| {
            self.error(
                ProviderErrorKind::Unknown,
                format!("invalid completions body: {e}"),
            )
        })?;

        let content = parsed
            .into_text()
            .ok_or_else(|| self.error(ProviderErrorKind::Unknown, "empty completion"))?;

        debug!(chars = content.len(), "Completion received");
        Ok(content)
    }
}

