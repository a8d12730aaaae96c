//! Anthropic implementation of the extraction capability.
//!
//! Calls the Messages API with a schema-derived prompt at temperature 0 and
//! returns the model's text verbatim; tolerant parsing of that text is the
//! pipeline's job.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretBox};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{ExtractError, ExtractResult};
use crate::normalize::NormalizedDocument;
use crate::pipeline::prompts::format_extract_prompt;
use crate::traits::Extractor;
use crate::types::Schema;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
const MAX_TOKENS: u32 = 2048;

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorResponse {
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(rename = "type")]
    error_type: Option<String>,
    message: Option<String>,
}

/// Claude-based extraction capability.
///
/// # Example
///
/// ```rust,ignore
/// use pagesift::extractors::ClaudeExtractor;
///
/// let extractor = ClaudeExtractor::from_env()?;
/// let raw = extractor.extract(&document, &schema, timeout).await?;
/// ```
pub struct ClaudeExtractor {
    client: reqwest::Client,
    api_key: SecretBox<str>,
    model: String,
    base_url: String,
}

impl ClaudeExtractor {
    /// Create an extractor with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: SecretBox::new(api_key.into().into_boxed_str()),
            model: DEFAULT_MODEL.to_string(),
            base_url: ANTHROPIC_API_URL.to_string(),
        }
    }

    /// Create from environment variable `ANTHROPIC_API_KEY`.
    pub fn from_env() -> ExtractResult<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
            ExtractError::Provider("ANTHROPIC_API_KEY environment variable not set".into())
        })?;
        Ok(Self::new(api_key))
    }

    /// Set the model id.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a custom API base URL (for proxies).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Current model id.
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Extractor for ClaudeExtractor {
    async fn extract(
        &self,
        document: &NormalizedDocument,
        schema: &Schema,
        timeout: Duration,
    ) -> ExtractResult<String> {
        let prompt = format_extract_prompt(schema, document);

        debug!(
            url = %document.url,
            model = %self.model,
            prompt_chars = prompt.len(),
            "extraction call starting"
        );

        let request = MessagesRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            // Deterministic for data extraction
            temperature: 0.0,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .timeout(timeout)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %document.url, error = %e, "extraction request failed");
                if e.is_timeout() {
                    ExtractError::Timeout
                } else {
                    ExtractError::Http(Box::new(e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Surface the provider's own message where the body carries one
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .ok()
                .and_then(|e| e.error)
                .map(|e| {
                    format!(
                        "{}: {}",
                        e.error_type.unwrap_or_else(|| "api_error".into()),
                        e.message.unwrap_or_default()
                    )
                })
                .unwrap_or(body);
            return Err(ExtractError::Provider(format!("{}: {}", status, message)));
        }

        let messages: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ExtractError::Http(Box::new(e)))?;

        let text = messages
            .content
            .into_iter()
            .find(|block| block.block_type == "text")
            .and_then(|block| block.text)
            .ok_or_else(|| ExtractError::Provider("response contained no text block".into()))?;

        debug!(url = %document.url, response_chars = text.len(), "extraction call complete");

        Ok(text)
    }

    fn name(&self) -> &str {
        "claude"
    }
}
