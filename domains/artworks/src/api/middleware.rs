//! Artworks domain state

use std::sync::Arc;

use crate::orchestrator::CreationOrchestrator;
use crate::repository::ArtworkPersistence;

/// Application state for the Artworks domain
#[derive(Clone)]
pub struct ArtworksState {
    pub orchestrator: Arc<CreationOrchestrator>,
    pub persistence: Arc<dyn ArtworkPersistence>,
}

impl ArtworksState {
    pub fn new(
        orchestrator: Arc<CreationOrchestrator>,
        persistence: Arc<dyn ArtworkPersistence>,
    ) -> Self {
        Self {
            orchestrator,
            persistence,
        }
    }
}
