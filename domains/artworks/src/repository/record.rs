//! Persisted artwork representation
//!
//! The stored document keeps its identifier under `_id` and uses snake_case
//! field names for stencils and images. [`ArtworkRecord`] is that shape;
//! conversion to and from [`Artwork`] is explicit in both directions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

use crate::domain::entities::{Artwork, ArtworkDraft, Image, Stencil, Stroke};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageDocument {
    pub path: String,
    pub url: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub orig_name: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub is_stream: bool,
    #[serde(default)]
    pub meta: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StencilDocument {
    pub prompt: String,
    pub image_list: Vec<ImageDocument>,
}

/// Row/document form of an artwork
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ArtworkRecord {
    #[serde(rename = "_id")]
    #[sqlx(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub prompt: String,
    pub stencil_list: Json<Vec<StencilDocument>>,
    pub stroke_list: Json<Vec<Stroke>>,
    pub updated_at: DateTime<Utc>,
}

impl ArtworkRecord {
    /// Record for a draft about to be inserted under `id`
    pub fn from_draft(id: Uuid, draft: &ArtworkDraft) -> Self {
        Self {
            id,
            title: draft.title.clone(),
            prompt: draft.prompt.clone(),
            stencil_list: Json(draft.stencils.iter().map(StencilDocument::from).collect()),
            stroke_list: Json(draft.strokes.clone()),
            updated_at: draft.updated_at,
        }
    }
}

impl From<&Image> for ImageDocument {
    fn from(image: &Image) -> Self {
        Self {
            path: image.path.clone(),
            url: image.url.clone(),
            size: image.size,
            orig_name: image.original_name.clone(),
            mime_type: image.mime_type.clone(),
            is_stream: image.is_stream,
            meta: image.metadata.clone(),
        }
    }
}

impl From<ImageDocument> for Image {
    fn from(doc: ImageDocument) -> Self {
        Self {
            path: doc.path,
            url: doc.url,
            size: doc.size,
            original_name: doc.orig_name,
            mime_type: doc.mime_type,
            is_stream: doc.is_stream,
            metadata: doc.meta,
        }
    }
}

impl From<&Stencil> for StencilDocument {
    fn from(stencil: &Stencil) -> Self {
        Self {
            prompt: stencil.sub_prompt.clone(),
            image_list: stencil.images.iter().map(ImageDocument::from).collect(),
        }
    }
}

impl From<StencilDocument> for Stencil {
    fn from(doc: StencilDocument) -> Self {
        Self {
            sub_prompt: doc.prompt,
            images: doc.image_list.into_iter().map(Image::from).collect(),
        }
    }
}

impl From<&Artwork> for ArtworkRecord {
    fn from(artwork: &Artwork) -> Self {
        Self {
            id: artwork.id,
            title: artwork.title.clone(),
            prompt: artwork.prompt.clone(),
            stencil_list: Json(artwork.stencils.iter().map(StencilDocument::from).collect()),
            stroke_list: Json(artwork.strokes.clone()),
            updated_at: artwork.updated_at,
        }
    }
}

impl From<ArtworkRecord> for Artwork {
    fn from(record: ArtworkRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            prompt: record.prompt,
            stencils: record.stencil_list.0.into_iter().map(Stencil::from).collect(),
            strokes: record.stroke_list.0,
            updated_at: record.updated_at,
        }
    }
}
