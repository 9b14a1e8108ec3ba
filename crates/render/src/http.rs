//! HTTP clients for a stencil generation endpoint
//!
//! `POST {base_url}/generate` with `{"prompt", "num_images"}` answers
//! `{"images": [GeneratedImage, ...]}`. Image URLs may be relative to the
//! same base URL.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{
    FetchedImage, GeneratedImage, ImageFetcher, RenderConfig, RenderError, StencilGenerator,
};

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
    num_images: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    images: Vec<GeneratedImage>,
}

fn trim_base(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Calls the generation endpoint once per sub-prompt
pub struct HttpStencilGenerator {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    images_per_prompt: u32,
}

impl HttpStencilGenerator {
    pub fn new(client: Client, config: &RenderConfig) -> Self {
        Self {
            client,
            base_url: trim_base(&config.base_url),
            api_key: config.api_key.clone(),
            images_per_prompt: config.images_per_prompt,
        }
    }
}

#[async_trait::async_trait]
impl StencilGenerator for HttpStencilGenerator {
    async fn generate(&self, sub_prompt: &str) -> Result<Vec<GeneratedImage>, RenderError> {
        let url = format!("{}/generate", self.base_url);

        tracing::debug!(sub_prompt = %sub_prompt, "Requesting stencil generation");

        let mut request = self.client.post(&url).json(&GenerateRequest {
            prompt: sub_prompt,
            num_images: self.images_per_prompt,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RenderError::Request(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(RenderError::Response(format!(
                "Generation service returned {}: {}",
                status, body
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| RenderError::Response(format!("Failed to parse response: {}", e)))?;

        if body.images.is_empty() {
            return Err(RenderError::Response(
                "Generation service returned no images".to_string(),
            ));
        }

        Ok(body.images)
    }
}

/// Downloads image bytes, resolving relative URLs against the generation service
pub struct HttpImageFetcher {
    client: Client,
    base_url: String,
}

impl HttpImageFetcher {
    pub fn new(client: Client, config: &RenderConfig) -> Self {
        Self {
            client,
            base_url: trim_base(&config.base_url),
        }
    }

    fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}/{}", self.base_url, url.trim_start_matches('/'))
        }
    }
}

#[async_trait::async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, RenderError> {
        let url = self.resolve(url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RenderError::Request(format!("Image download failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Response(format!(
                "Image download returned {}",
                status
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RenderError::Response(format!("Failed to read image body: {}", e)))?;

        Ok(FetchedImage {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}
