//! Stencil LLM Service
//!
//! Provides text completion and the prompt decomposition built on top of it:
//! - Anthropic Messages API integration for production
//! - Scriptable mock service for testing and development
//! - `PromptDecomposer`: turns one creative prompt into N drawable sub-prompts

pub mod anthropic;
pub mod decompose;
pub mod mock;

pub use decompose::{DecomposeError, LlmPromptDecomposer, PromptDecomposer};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_MODEL: &str = "claude-3-5-haiku-latest";
const DEFAULT_MAX_TOKENS: u32 = 1024;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("LLM configuration error: {0}")]
    Configuration(String),

    #[error("LLM request error: {0}")]
    Request(String),

    #[error("LLM response error: {0}")]
    Response(String),

    #[error("LLM rate limit exceeded")]
    RateLimit,
}

/// Author of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmRole {
    User,
    Assistant,
}

/// One conversation turn sent to the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmMessage {
    pub role: LlmRole,
    pub content: String,
}

/// A completion request. An empty `model` means "use the service default".
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub system_prompt: Option<String>,
    pub messages: Vec<LlmMessage>,
    pub max_tokens: Option<u32>,
}

/// The model's reply, flattened to text
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    pub input_tokens: i32,
    pub output_tokens: i32,
    pub stop_reason: String,
}

/// LLM service configuration
#[derive(Clone)]
pub struct LlmConfig {
    /// Provider (anthropic, mock)
    pub provider: String,
    pub api_key: String,
    pub default_model: String,
    pub max_tokens: u32,
    /// Override for the provider API base URL
    pub base_url: Option<String>,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("api_key", &"[REDACTED]")
            .field("default_model", &self.default_model)
            .field("max_tokens", &self.max_tokens)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl LlmConfig {
    /// Create LLM config from environment variables
    pub fn from_env() -> Result<Self, LlmError> {
        let provider = std::env::var("LLM_PROVIDER").unwrap_or_else(|_| "mock".to_string());
        let api_key = std::env::var("ANTHROPIC_API_KEY").unwrap_or_default();

        if provider == "anthropic" && api_key.is_empty() {
            return Err(LlmError::Configuration(
                "ANTHROPIC_API_KEY is required for the anthropic provider".to_string(),
            ));
        }

        let default_model =
            std::env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let max_tokens = std::env::var("LLM_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_TOKENS);
        let base_url = std::env::var("LLM_BASE_URL").ok();

        Ok(Self {
            provider,
            api_key,
            default_model,
            max_tokens,
            base_url,
        })
    }
}

/// LLM service trait for different providers
#[async_trait::async_trait]
pub trait LlmService: Send + Sync {
    /// Run a single completion
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Model used when a request leaves `model` empty
    fn default_model(&self) -> &str;
}

/// Factory for creating LlmService implementations
pub struct LlmServiceFactory;

impl LlmServiceFactory {
    pub fn create(config: LlmConfig) -> Result<Box<dyn LlmService>, LlmError> {
        match config.provider.as_str() {
            "anthropic" => {
                tracing::info!(model = %config.default_model, "Creating Anthropic LLM service");
                Ok(Box::new(anthropic::AnthropicService::new(config)))
            }
            "mock" => {
                tracing::info!("Creating mock LLM service");
                Ok(Box::new(mock::MockLlmService::new()))
            }
            provider => Err(LlmError::Configuration(format!(
                "Unknown LLM provider: {}. Supported providers: anthropic, mock",
                provider
            ))),
        }
    }
}
