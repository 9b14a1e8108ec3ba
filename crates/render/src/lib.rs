//! Stencil Render Service
//!
//! Provides the image side of artwork creation:
//! - `StencilGenerator`: one sub-prompt in, one or more generated images out
//! - `ImageFetcher`: downloads the bytes behind a generated image URL
//! - HTTP implementations for a generation endpoint, mocks for tests and development

pub mod http;
pub mod mock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Render configuration error: {0}")]
    Configuration(String),

    #[error("Render request error: {0}")]
    Request(String),

    #[error("Render response error: {0}")]
    Response(String),
}

/// One image as described by the generation service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedImage {
    /// Where the bytes can be downloaded, absolute or relative to the service
    pub url: String,
    #[serde(default)]
    pub orig_name: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub is_stream: bool,
    #[serde(default)]
    pub meta: serde_json::Value,
}

impl GeneratedImage {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            orig_name: None,
            size: None,
            mime_type: None,
            is_stream: false,
            meta: serde_json::Value::Null,
        }
    }
}

/// Downloaded image bytes plus the content type the server declared
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Media type without parameters, lowercased (`"Image/WebP; q=1"` -> `"image/webp"`)
pub fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Render service configuration
#[derive(Clone)]
pub struct RenderConfig {
    /// Provider (http, mock)
    pub provider: String,
    /// Base URL of the generation service
    pub base_url: String,
    pub api_key: Option<String>,
    pub images_per_prompt: u32,
    /// Content type every downloaded image must carry
    pub expected_content_type: String,
}

impl std::fmt::Debug for RenderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderConfig")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("images_per_prompt", &self.images_per_prompt)
            .field("expected_content_type", &self.expected_content_type)
            .finish()
    }
}

impl RenderConfig {
    /// Create render config from environment variables
    pub fn from_env() -> Result<Self, RenderError> {
        let provider = std::env::var("RENDER_PROVIDER").unwrap_or_else(|_| "mock".to_string());
        let base_url = std::env::var("RENDER_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:7860".to_string());
        let api_key = std::env::var("RENDER_API_KEY").ok();
        let images_per_prompt = std::env::var("RENDER_IMAGES_PER_PROMPT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1);
        let expected_content_type = std::env::var("RENDER_EXPECTED_CONTENT_TYPE")
            .map(|v| media_type(&v))
            .unwrap_or_else(|_| "image/webp".to_string());

        if images_per_prompt == 0 {
            return Err(RenderError::Configuration(
                "RENDER_IMAGES_PER_PROMPT must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            provider,
            base_url,
            api_key,
            images_per_prompt,
            expected_content_type,
        })
    }
}

/// Generates stencil images for a single sub-prompt
#[async_trait::async_trait]
pub trait StencilGenerator: Send + Sync {
    /// Returns at least one image description; an empty result is an error
    async fn generate(&self, sub_prompt: &str) -> Result<Vec<GeneratedImage>, RenderError>;
}

/// Downloads generated image bytes
#[async_trait::async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, RenderError>;
}

/// Generator and fetcher built for one provider
pub struct RenderServices {
    pub generator: Box<dyn StencilGenerator>,
    pub fetcher: Box<dyn ImageFetcher>,
}

/// Factory for creating render service implementations
pub struct RenderServiceFactory;

impl RenderServiceFactory {
    pub fn create(config: RenderConfig) -> Result<RenderServices, RenderError> {
        match config.provider.as_str() {
            "http" => {
                tracing::info!(base_url = %config.base_url, "Creating HTTP render services");
                let client = reqwest::Client::new();
                Ok(RenderServices {
                    generator: Box::new(http::HttpStencilGenerator::new(
                        client.clone(),
                        &config,
                    )),
                    fetcher: Box::new(http::HttpImageFetcher::new(client, &config)),
                })
            }
            "mock" => {
                tracing::info!("Creating mock render services");
                Ok(RenderServices {
                    generator: Box::new(mock::MockStencilGenerator::new(
                        config.images_per_prompt,
                    )),
                    fetcher: Box::new(mock::MockImageFetcher::new(
                        &config.expected_content_type,
                    )),
                })
            }
            provider => Err(RenderError::Configuration(format!(
                "Unknown render provider: {}. Supported providers: http, mock",
                provider
            ))),
        }
    }
}
