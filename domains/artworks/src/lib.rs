//! Artworks domain: artwork records, the creation saga, artwork routes

pub mod api;
pub mod domain;
pub mod orchestrator;
pub mod repository;

// Re-export domain types at the crate root for convenience
pub use domain::entities::{Artwork, ArtworkDraft, Image, Offset, Stencil, Stroke};
pub use domain::state::{CreationEvent, CreationState, CreationStateMachine, StateError};

// Re-export the saga
pub use orchestrator::{CreationConfig, CreationOrchestrator};

// Re-export repository types
pub use repository::{
    ArtworkPersistence, ArtworkRecord, InMemoryArtworkRepository, PersistenceError,
    PgArtworkRepository,
};

// Re-export API types
pub use api::routes;
pub use api::ArtworksState;
