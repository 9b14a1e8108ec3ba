//! Anthropic Messages API implementation of [`LlmService`]
//!
//! Used by the prompt decomposer; only text content blocks are read back.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::{CompletionRequest, CompletionResponse, LlmConfig, LlmError, LlmMessage, LlmService};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: &'a [LlmMessage],
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    model: String,
    stop_reason: Option<String>,
    usage: Usage,
}

/// Only `text` blocks carry anything the decomposer reads
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: i32,
    output_tokens: i32,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

impl MessagesResponse {
    fn into_completion(self) -> CompletionResponse {
        let content = self
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect::<String>();

        CompletionResponse {
            content,
            model: self.model,
            input_tokens: self.usage.input_tokens,
            output_tokens: self.usage.output_tokens,
            stop_reason: self.stop_reason.unwrap_or_else(|| "end_turn".to_string()),
        }
    }
}

/// Turn a non-success reply into an error, preferring the API's own message
fn failure(status: StatusCode, body: &str) -> LlmError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return LlmError::RateLimit;
    }
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => LlmError::Response(format!(
            "Anthropic API error ({}): {}",
            envelope.error.kind, envelope.error.message
        )),
        Err(_) => LlmError::Response(format!("Anthropic API returned {}: {}", status, body)),
    }
}

/// Anthropic LLM service
pub struct AnthropicService {
    client: Client,
    config: LlmConfig,
    endpoint: String,
}

impl AnthropicService {
    pub fn new(config: LlmConfig) -> Self {
        let base_url = config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let endpoint = format!("{}/v1/messages", base_url.trim_end_matches('/'));

        Self {
            client: Client::new(),
            config,
            endpoint,
        }
    }
}

#[async_trait::async_trait]
impl LlmService for AnthropicService {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let model = if request.model.is_empty() {
            self.config.default_model.as_str()
        } else {
            request.model.as_str()
        };
        let max_tokens = request.max_tokens.unwrap_or(self.config.max_tokens);

        tracing::debug!(model = %model, max_tokens, turns = request.messages.len(), "Calling Anthropic");

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&MessagesRequest {
                model,
                max_tokens,
                system: request.system_prompt.as_deref(),
                messages: &request.messages,
            })
            .send()
            .await
            .map_err(|e| LlmError::Request(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(failure(status, &body));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Response(format!("Failed to parse response: {}", e)))?;

        Ok(parsed.into_completion())
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }
}
