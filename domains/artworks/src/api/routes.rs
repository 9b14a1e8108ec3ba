//! Route definitions for Artworks domain API

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::artworks;
use super::middleware::ArtworksState;

/// Create all Artworks domain API routes
pub fn routes() -> Router<ArtworksState> {
    Router::new()
        .route("/artwork/create", post(artworks::create_artwork))
        .route("/artwork/fetchAll", get(artworks::fetch_all))
        .route("/artwork/fetch/{id}", get(artworks::fetch_artwork))
        .route("/artwork/save", post(artworks::save_artwork))
        .route("/artwork/delete", post(artworks::delete_artwork))
}
