//! Artifacts domain state

use std::sync::Arc;

use crate::store::ArtifactStore;

/// Application state for the Artifacts domain
#[derive(Clone)]
pub struct ArtifactsState {
    pub store: Arc<ArtifactStore>,
}

impl ArtifactsState {
    pub fn new(store: Arc<ArtifactStore>) -> Self {
        Self { store }
    }
}
