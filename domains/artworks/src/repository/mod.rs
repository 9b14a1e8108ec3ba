//! Repository implementations for the Artworks domain

pub mod memory;
pub mod postgres;
pub mod record;

use async_trait::async_trait;
use stencil_common::Error;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::{Artwork, ArtworkDraft};

pub use memory::InMemoryArtworkRepository;
pub use postgres::PgArtworkRepository;
pub use record::ArtworkRecord;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Persistence unavailable: {0}")]
    Unavailable(String),
}

impl From<PersistenceError> for Error {
    fn from(err: PersistenceError) -> Self {
        tracing::error!(error = %err, "Artwork persistence failure");
        Error::internal()
    }
}

/// Durable storage for artworks
#[async_trait]
pub trait ArtworkPersistence: Send + Sync {
    /// Store a draft and return it with its assigned identifier
    async fn insert(&self, draft: &ArtworkDraft) -> Result<Artwork, PersistenceError>;

    async fn find(&self, id: Uuid) -> Result<Option<Artwork>, PersistenceError>;

    /// Most recently updated first
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Artwork>, PersistenceError>;

    /// Replace title and strokes, bump `updated_at`. `None` if missing.
    async fn update(&self, artwork: &Artwork) -> Result<Option<Artwork>, PersistenceError>;

    /// Remove and return the artwork so its artifacts can be released
    async fn delete(&self, id: Uuid) -> Result<Option<Artwork>, PersistenceError>;
}
