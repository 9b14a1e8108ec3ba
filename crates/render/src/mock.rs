//! Mock Render Service Implementation
//!
//! Programmable mocks for testing the creation saga:
//! - `MockStencilGenerator`: records sub-prompts, fails chosen prompts
//! - `MockImageFetcher`: serves canned bytes, fails chosen URLs
//! - `SAMPLE_WEBP` / `SAMPLE_PNG`: minimal images with valid signatures

use std::collections::HashSet;
use std::sync::{Arc, Mutex, RwLock};

use crate::{FetchedImage, GeneratedImage, ImageFetcher, RenderError, StencilGenerator};

/// Smallest byte string the artifact store accepts as WEBP
pub const SAMPLE_WEBP: &[u8] = b"RIFF\x1a\x00\x00\x00WEBPVP8L\x0d\x00\x00\x00\x2f\x00\x00\x00\x10\x07\x10\x11\x11\x88\x88\xfe\x07\x00";

/// Smallest byte string the artifact store accepts as PNG
pub const SAMPLE_PNG: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR";

/// Programmable behavior for the mock generator
#[derive(Debug, Clone)]
pub struct MockGeneratorBehavior {
    pub images_per_prompt: Arc<RwLock<u32>>,
    pub failing_prompts: Arc<RwLock<HashSet<String>>>,
    pub delay_ms: Arc<RwLock<u64>>,
}

impl MockGeneratorBehavior {
    pub fn new(images_per_prompt: u32) -> Self {
        Self {
            images_per_prompt: Arc::new(RwLock::new(images_per_prompt)),
            failing_prompts: Arc::new(RwLock::new(HashSet::new())),
            delay_ms: Arc::new(RwLock::new(0)),
        }
    }

    /// Make every call for `sub_prompt` fail
    pub fn fail_prompt(&self, sub_prompt: &str) {
        self.failing_prompts
            .write()
            .unwrap()
            .insert(sub_prompt.to_string());
    }

    pub fn set_images_per_prompt(&self, count: u32) {
        *self.images_per_prompt.write().unwrap() = count;
    }

    pub fn set_delay_ms(&self, delay: u64) {
        *self.delay_ms.write().unwrap() = delay;
    }

    /// Reset to default behavior
    pub fn reset(&self) {
        *self.images_per_prompt.write().unwrap() = 1;
        self.failing_prompts.write().unwrap().clear();
        *self.delay_ms.write().unwrap() = 0;
    }
}

/// Mock generator with programmable behavior and call recording
#[derive(Debug, Clone)]
pub struct MockStencilGenerator {
    behavior: Arc<MockGeneratorBehavior>,
    history: Arc<Mutex<Vec<String>>>,
}

impl MockStencilGenerator {
    pub fn new(images_per_prompt: u32) -> Self {
        Self {
            behavior: Arc::new(MockGeneratorBehavior::new(images_per_prompt)),
            history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn behavior(&self) -> &Arc<MockGeneratorBehavior> {
        &self.behavior
    }

    /// Sub-prompts received, in call order
    pub fn recorded_prompts(&self) -> Vec<String> {
        self.history.lock().unwrap().clone()
    }
}

/// Lowercase, dash-separated form of a sub-prompt for mock URLs
fn slug(sub_prompt: &str) -> String {
    sub_prompt
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

#[async_trait::async_trait]
impl StencilGenerator for MockStencilGenerator {
    async fn generate(&self, sub_prompt: &str) -> Result<Vec<GeneratedImage>, RenderError> {
        tracing::info!(sub_prompt = %sub_prompt, "Mock render: generating stencil");
        self.history.lock().unwrap().push(sub_prompt.to_string());

        let delay_ms = *self.behavior.delay_ms.read().unwrap();
        if delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
        }

        if self
            .behavior
            .failing_prompts
            .read()
            .unwrap()
            .contains(sub_prompt)
        {
            return Err(RenderError::Response(format!(
                "Mock generation failure for '{}'",
                sub_prompt
            )));
        }

        let count = *self.behavior.images_per_prompt.read().unwrap();
        let slug = slug(sub_prompt);
        Ok((0..count)
            .map(|i| {
                let mut image = GeneratedImage::new(format!("mock://stencil/{}/{}.webp", slug, i));
                image.orig_name = Some(format!("{}-{}.webp", slug, i));
                image.mime_type = Some("image/webp".to_string());
                image
            })
            .collect())
    }
}

/// Mock fetcher serving the same bytes for every URL
#[derive(Debug, Clone)]
pub struct MockImageFetcher {
    bytes: Arc<RwLock<Vec<u8>>>,
    content_type: Arc<RwLock<Option<String>>>,
    failing_urls: Arc<RwLock<HashSet<String>>>,
    history: Arc<Mutex<Vec<String>>>,
}

impl MockImageFetcher {
    /// Serves `SAMPLE_WEBP` (or `SAMPLE_PNG` for `image/png`) labelled `content_type`
    pub fn new(content_type: &str) -> Self {
        let bytes = if content_type == "image/png" {
            SAMPLE_PNG
        } else {
            SAMPLE_WEBP
        };
        Self {
            bytes: Arc::new(RwLock::new(bytes.to_vec())),
            content_type: Arc::new(RwLock::new(Some(content_type.to_string()))),
            failing_urls: Arc::new(RwLock::new(HashSet::new())),
            history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn set_bytes(&self, bytes: Vec<u8>) {
        *self.bytes.write().unwrap() = bytes;
    }

    pub fn set_content_type(&self, content_type: Option<&str>) {
        *self.content_type.write().unwrap() = content_type.map(str::to_string);
    }

    pub fn fail_url(&self, url: &str) {
        self.failing_urls.write().unwrap().insert(url.to_string());
    }

    /// URLs requested, in call order
    pub fn recorded_urls(&self) -> Vec<String> {
        self.history.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ImageFetcher for MockImageFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, RenderError> {
        self.history.lock().unwrap().push(url.to_string());

        if self.failing_urls.read().unwrap().contains(url) {
            return Err(RenderError::Request(format!(
                "Mock download failure for {}",
                url
            )));
        }

        Ok(FetchedImage {
            bytes: self.bytes.read().unwrap().clone(),
            content_type: self.content_type.read().unwrap().clone(),
        })
    }
}
