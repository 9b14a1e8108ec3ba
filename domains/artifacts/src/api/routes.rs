//! Route definitions for Artifacts domain API

use axum::{routing::get, Router};

use super::handlers::public;
use super::middleware::ArtifactsState;

/// Create all Artifacts domain API routes
pub fn routes() -> Router<ArtifactsState> {
    Router::new().route("/public/{bucket}/{filename}", get(public::fetch_public))
}
