//! Artwork API handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use stencil_common::{Error, Pagination, Result, ValidatedJson};
use uuid::Uuid;
use validator::Validate;

use crate::api::middleware::ArtworksState;
use crate::domain::entities::{validate_title, Artwork, Stroke};

/// Request for creating an artwork
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateArtworkRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(min = 1, max = 4000))]
    pub prompt: String,
}

/// The editable part of an artwork as sent back by the client.
/// Other fields of the full artwork are accepted and ignored.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SavedArtwork {
    pub id: Uuid,

    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[serde(default)]
    pub strokes: Vec<Stroke>,
}

/// Request for saving an artwork
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SaveArtworkRequest {
    #[validate(nested)]
    pub artwork: SavedArtwork,
}

/// Request for deleting an artwork
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct DeleteArtworkRequest {
    #[serde(alias = "artworkId")]
    pub artwork_id: Uuid,
}

/// Create an artwork: decompose, generate and store stencils, persist
pub async fn create_artwork(
    State(state): State<ArtworksState>,
    ValidatedJson(req): ValidatedJson<CreateArtworkRequest>,
) -> Result<(StatusCode, Json<Artwork>)> {
    let artwork = state.orchestrator.create(&req.title, &req.prompt).await?;
    Ok((StatusCode::CREATED, Json(artwork)))
}

/// List artworks, most recently updated first
pub async fn fetch_all(
    State(state): State<ArtworksState>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<Artwork>>> {
    let artworks = state
        .persistence
        .list(pagination.limit(), pagination.offset())
        .await?;
    Ok(Json(artworks))
}

/// Get a single artwork by ID
pub async fn fetch_artwork(
    State(state): State<ArtworksState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Artwork>> {
    let artwork = state
        .persistence
        .find(id)
        .await?
        .ok_or_else(|| Error::NotFound("Artwork not found".to_string()))?;

    Ok(Json(artwork))
}

/// Save title and strokes of an existing artwork
pub async fn save_artwork(
    State(state): State<ArtworksState>,
    ValidatedJson(req): ValidatedJson<SaveArtworkRequest>,
) -> Result<Json<Artwork>> {
    let saved = req.artwork;
    validate_title(&saved.title)?;

    let mut artwork = state
        .persistence
        .find(saved.id)
        .await?
        .ok_or_else(|| Error::NotFound("Artwork not found".to_string()))?;
    artwork.title = saved.title;
    artwork.strokes = saved.strokes;

    let updated = state
        .persistence
        .update(&artwork)
        .await?
        .ok_or_else(|| Error::NotFound("Artwork not found".to_string()))?;

    tracing::info!(artwork_id = %updated.id, strokes = updated.strokes.len(), "Artwork saved");
    Ok(Json(updated))
}

/// Delete an artwork and release its stored images
pub async fn delete_artwork(
    State(state): State<ArtworksState>,
    ValidatedJson(req): ValidatedJson<DeleteArtworkRequest>,
) -> Result<StatusCode> {
    state.orchestrator.delete(req.artwork_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
