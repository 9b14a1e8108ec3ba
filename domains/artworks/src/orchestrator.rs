//! Artwork creation saga
//!
//! `create` runs decompose → generate → persist. Images are stored before the
//! artwork record is written; when that write fails every stored image is
//! deleted again (best effort) and the caller sees a generic internal error.
//! Decomposition and generation failures end the saga without compensation.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use stencil_artifacts::{ArtifactStorage, STENCIL_BUCKET};
use stencil_common::{Error, Result};
use stencil_llm::PromptDecomposer;
use stencil_render::{media_type, GeneratedImage, ImageFetcher, StencilGenerator};
use uuid::Uuid;

use crate::domain::entities::{
    validate_prompt, validate_title, Artwork, ArtworkDraft, Image, Stencil,
};
use crate::domain::state::{CreationEvent, CreationState, CreationStateMachine};
use crate::repository::ArtworkPersistence;

/// Default number of sub-prompts per artwork
pub const DEFAULT_SUB_PROMPT_COUNT: usize = 3;

/// Default URL prefix the public artifact route is mounted under
pub const DEFAULT_PUBLIC_URL_PREFIX: &str = "/public";

#[derive(Debug, Clone, PartialEq)]
pub struct CreationConfig {
    pub sub_prompt_count: usize,
    /// Bucket generated images are saved into
    pub bucket: String,
    /// Media type every downloaded image must declare
    pub expected_content_type: String,
    pub public_url_prefix: String,
}

impl Default for CreationConfig {
    fn default() -> Self {
        Self {
            sub_prompt_count: DEFAULT_SUB_PROMPT_COUNT,
            bucket: STENCIL_BUCKET.to_string(),
            expected_content_type: "image/webp".to_string(),
            public_url_prefix: DEFAULT_PUBLIC_URL_PREFIX.to_string(),
        }
    }
}

impl CreationConfig {
    /// Create creation config from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let sub_prompt_count = match std::env::var("SUB_PROMPT_COUNT") {
            Ok(value) => value
                .trim()
                .parse::<usize>()
                .map_err(|_| anyhow::anyhow!("SUB_PROMPT_COUNT must be a positive integer"))?,
            Err(_) => defaults.sub_prompt_count,
        };
        if sub_prompt_count == 0 {
            anyhow::bail!("SUB_PROMPT_COUNT must be at least 1");
        }

        let expected_content_type = std::env::var("RENDER_EXPECTED_CONTENT_TYPE")
            .map(|v| media_type(&v))
            .unwrap_or(defaults.expected_content_type);
        if extension_for(&expected_content_type).is_none() {
            anyhow::bail!(
                "RENDER_EXPECTED_CONTENT_TYPE must be image/png, image/jpeg or image/webp, got {}",
                expected_content_type
            );
        }

        Ok(Self {
            sub_prompt_count,
            bucket: std::env::var("STENCIL_BUCKET").unwrap_or(defaults.bucket),
            expected_content_type,
            public_url_prefix: std::env::var("PUBLIC_URL_PREFIX")
                .unwrap_or(defaults.public_url_prefix),
        })
    }

    /// Public URL for a stored `{bucket}/{basename}` path
    pub fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.public_url_prefix.trim_end_matches('/'), path)
    }
}

/// File extension for an accepted image media type
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/webp" => Some("webp"),
        "image/png" => Some("png"),
        "image/jpeg" => Some("jpg"),
        _ => None,
    }
}

/// `{UTC timestamp ms}-{uuid}.{ext}`, unique without coordination
pub fn generate_file_name(extension: &str) -> String {
    format!(
        "{}-{}.{}",
        Utc::now().format("%Y%m%d%H%M%S%3f"),
        Uuid::new_v4().simple(),
        extension
    )
}

pub struct CreationOrchestrator {
    decomposer: Arc<dyn PromptDecomposer>,
    generator: Arc<dyn StencilGenerator>,
    fetcher: Arc<dyn ImageFetcher>,
    storage: Arc<dyn ArtifactStorage>,
    persistence: Arc<dyn ArtworkPersistence>,
    config: CreationConfig,
}

impl CreationOrchestrator {
    pub fn new(
        decomposer: Arc<dyn PromptDecomposer>,
        generator: Arc<dyn StencilGenerator>,
        fetcher: Arc<dyn ImageFetcher>,
        storage: Arc<dyn ArtifactStorage>,
        persistence: Arc<dyn ArtworkPersistence>,
        config: CreationConfig,
    ) -> Self {
        Self {
            decomposer,
            generator,
            fetcher,
            storage,
            persistence,
            config,
        }
    }

    pub fn config(&self) -> &CreationConfig {
        &self.config
    }

    /// Create an artwork from a title and a prompt
    pub async fn create(&self, title: &str, prompt: &str) -> Result<Artwork> {
        self.create_traced(title, prompt).await.1
    }

    /// Like [`Self::create`], also returning the state the saga ended in
    pub async fn create_traced(&self, title: &str, prompt: &str) -> (CreationState, Result<Artwork>) {
        let mut state = CreationState::Decomposing;
        let result = self.run(&mut state, title, prompt).await;

        match &result {
            Ok(artwork) => {
                tracing::info!(artwork_id = %artwork.id, state = %state, "Artwork created")
            }
            Err(e) => tracing::warn!(state = %state, error = %e, "Artwork creation failed"),
        }

        (state, result)
    }

    async fn run(&self, state: &mut CreationState, title: &str, prompt: &str) -> Result<Artwork> {
        if let Err(e) = validate_title(title).and_then(|_| validate_prompt(prompt)) {
            advance(state, CreationEvent::StepFailed)?;
            return Err(e);
        }

        let sub_prompts = match self.decompose(prompt).await {
            Ok(sub_prompts) => sub_prompts,
            Err(e) => {
                advance(state, CreationEvent::StepFailed)?;
                return Err(e);
            }
        };
        advance(state, CreationEvent::Decomposed)?;

        let stencils = match self.generate(&sub_prompts).await {
            Ok(stencils) => stencils,
            Err(e) => {
                advance(state, CreationEvent::StepFailed)?;
                return Err(e);
            }
        };
        advance(state, CreationEvent::Generated)?;

        let draft = ArtworkDraft {
            title: title.to_string(),
            prompt: prompt.to_string(),
            stencils,
            strokes: Vec::new(),
            updated_at: Utc::now(),
        };
        self.persist(state, draft).await
    }

    async fn decompose(&self, prompt: &str) -> Result<Vec<String>> {
        let count = self.config.sub_prompt_count;
        let sub_prompts = self
            .decomposer
            .decompose(prompt, count)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Prompt decomposition failed");
                Error::internal()
            })?;

        if sub_prompts.len() != count {
            tracing::error!(
                expected = count,
                actual = sub_prompts.len(),
                "Prompt decomposition returned the wrong number of sub-prompts"
            );
            return Err(Error::internal());
        }

        tracing::debug!(sub_prompts = ?sub_prompts, "Prompt decomposed");
        Ok(sub_prompts)
    }

    /// One stencil per sub-prompt. Every sub-task runs to completion before
    /// the first error (if any) is returned; images stored by successful
    /// siblings stay in place.
    async fn generate(&self, sub_prompts: &[String]) -> Result<Vec<Stencil>> {
        join_all(sub_prompts.iter().map(|p| self.generate_stencil(p)))
            .await
            .into_iter()
            .collect()
    }

    async fn generate_stencil(&self, sub_prompt: &str) -> Result<Stencil> {
        let generated = self.generator.generate(sub_prompt).await.map_err(|e| {
            tracing::error!(sub_prompt = %sub_prompt, error = %e, "Stencil generation failed");
            Error::internal()
        })?;

        if generated.is_empty() {
            tracing::error!(sub_prompt = %sub_prompt, "Stencil generation returned no images");
            return Err(Error::internal());
        }

        let images = join_all(generated.into_iter().map(|image| self.store_image(image)))
            .await
            .into_iter()
            .collect::<Result<Vec<_>>>()?;

        Ok(Stencil {
            sub_prompt: sub_prompt.to_string(),
            images,
        })
    }

    /// Download, check the declared type, save under a fresh name
    async fn store_image(&self, generated: GeneratedImage) -> Result<Image> {
        let fetched = self.fetcher.fetch(&generated.url).await.map_err(|e| {
            tracing::error!(url = %generated.url, error = %e, "Image download failed");
            Error::internal()
        })?;

        let expected = self.config.expected_content_type.as_str();
        let declared = fetched.content_type.as_deref().map(media_type);
        if declared.as_deref() != Some(expected) {
            tracing::error!(
                url = %generated.url,
                expected = %expected,
                declared = ?declared,
                "Downloaded image has unexpected content type"
            );
            return Err(Error::internal());
        }

        let extension = extension_for(expected).ok_or_else(|| {
            tracing::error!(content_type = %expected, "No file extension for expected content type");
            Error::internal()
        })?;
        let file_name = generate_file_name(extension);

        let path = self
            .storage
            .save(&fetched.bytes, &self.config.bucket, &file_name)
            .await
            .map_err(|e| {
                tracing::error!(bucket = %self.config.bucket, file = %file_name, error = %e, "Storing generated image failed");
                Error::internal()
            })?
            .to_string();

        Ok(Image {
            url: self.config.public_url(&path),
            path,
            size: Some(fetched.bytes.len() as u64),
            original_name: generated.orig_name,
            mime_type: Some(expected.to_string()),
            is_stream: generated.is_stream,
            metadata: generated.meta,
        })
    }

    async fn persist(&self, state: &mut CreationState, draft: ArtworkDraft) -> Result<Artwork> {
        match self.persistence.insert(&draft).await {
            Ok(artwork) => {
                advance(state, CreationEvent::Persisted)?;
                Ok(artwork)
            }
            Err(e) => {
                tracing::error!(error = %e, "Persisting artwork failed, rolling back stored images");
                // Compensation runs before the state error can short-circuit
                self.release_artifacts(&draft.image_paths()).await;
                advance(state, CreationEvent::PersistFailed)?;
                Err(Error::internal())
            }
        }
    }

    /// Delete an artwork, then release its images
    ///
    /// Images are only touched once the record is gone; a failed record
    /// delete leaves everything in place.
    pub async fn delete(&self, id: Uuid) -> Result<Artwork> {
        let artwork = match self.persistence.delete(id).await {
            Ok(Some(artwork)) => artwork,
            Ok(None) => return Err(Error::NotFound("Artwork not found".to_string())),
            Err(e) => {
                tracing::error!(artwork_id = %id, error = %e, "Deleting artwork failed");
                return Err(Error::internal());
            }
        };

        self.release_artifacts(&artwork.image_paths()).await;
        tracing::info!(artwork_id = %id, "Artwork deleted");
        Ok(artwork)
    }

    /// Best-effort concurrent delete of every path. Failures are logged and
    /// never retried.
    async fn release_artifacts(&self, paths: &[String]) {
        let results = join_all(paths.iter().map(|path| async move {
            let result = self.storage.delete(path).await;
            if let Err(e) = &result {
                tracing::warn!(path = %path, error = %e, "Artifact delete failed");
            }
            result
        }))
        .await;

        let failed = results.iter().filter(|r| r.is_err()).count();
        tracing::info!(
            requested = paths.len(),
            failed = failed,
            "Released artwork artifacts"
        );
    }
}

/// Step the saga, treating an illegal transition as an internal bug
fn advance(state: &mut CreationState, event: CreationEvent) -> Result<()> {
    let next = CreationStateMachine::transition(*state, event).map_err(|e| {
        tracing::error!(state = %state, event = %event, error = %e, "Illegal creation transition");
        Error::internal()
    })?;
    tracing::debug!(from = %state, to = %next, "Creation state changed");
    *state = next;
    Ok(())
}
