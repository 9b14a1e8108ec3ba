//! Domain entities for the Artworks domain
//!
//! An [`Artwork`] is a titled prompt, the stencils generated for it and the
//! strokes the user has drawn on top. Serialized field names are the ones the
//! drawing client speaks (camelCase).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stencil_common::{Error, Result};

/// Maximum title length
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum prompt length
pub const MAX_PROMPT_LENGTH: usize = 4000;

/// One stored image of a stencil
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    /// `{bucket}/{basename}` in the artifact store
    pub path: String,
    /// Public URL for `path`
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub is_stream: bool,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Images generated for a single sub-prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stencil {
    pub sub_prompt: String,
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Offset {
    pub dx: f64,
    pub dy: f64,
}

/// A freehand stroke drawn by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    pub points: Vec<Offset>,
    /// ARGB color value
    pub color: i64,
    pub brush_size: f64,
}

/// An artwork before persistence has assigned it an identifier
#[derive(Debug, Clone, PartialEq)]
pub struct ArtworkDraft {
    pub title: String,
    pub prompt: String,
    pub stencils: Vec<Stencil>,
    pub strokes: Vec<Stroke>,
    pub updated_at: DateTime<Utc>,
}

impl ArtworkDraft {
    /// Create a new draft with no strokes
    pub fn new(title: String, prompt: String, stencils: Vec<Stencil>) -> Result<Self> {
        validate_title(&title)?;
        validate_prompt(&prompt)?;

        Ok(ArtworkDraft {
            title,
            prompt,
            stencils,
            strokes: Vec::new(),
            updated_at: Utc::now(),
        })
    }

    /// Every artifact path referenced by the draft
    pub fn image_paths(&self) -> Vec<String> {
        image_paths(&self.stencils)
    }
}

/// A persisted artwork
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artwork {
    pub id: Uuid,
    pub title: String,
    pub prompt: String,
    pub stencils: Vec<Stencil>,
    pub strokes: Vec<Stroke>,
    pub updated_at: DateTime<Utc>,
}

impl Artwork {
    /// Attach an identifier to a draft
    pub fn from_draft(id: Uuid, draft: ArtworkDraft) -> Self {
        Self {
            id,
            title: draft.title,
            prompt: draft.prompt,
            stencils: draft.stencils,
            strokes: draft.strokes,
            updated_at: draft.updated_at,
        }
    }

    /// Every artifact path referenced by the artwork
    pub fn image_paths(&self) -> Vec<String> {
        image_paths(&self.stencils)
    }
}

fn image_paths(stencils: &[Stencil]) -> Vec<String> {
    stencils
        .iter()
        .flat_map(|stencil| stencil.images.iter().map(|image| image.path.clone()))
        .collect()
}

pub fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::Validation("Title is required".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(Error::Validation(format!(
            "Title must be at most {} characters",
            MAX_TITLE_LENGTH
        )));
    }
    Ok(())
}

pub fn validate_prompt(prompt: &str) -> Result<()> {
    if prompt.trim().is_empty() {
        return Err(Error::Validation("Prompt is required".to_string()));
    }
    if prompt.chars().count() > MAX_PROMPT_LENGTH {
        return Err(Error::Validation(format!(
            "Prompt must be at most {} characters",
            MAX_PROMPT_LENGTH
        )));
    }
    Ok(())
}
