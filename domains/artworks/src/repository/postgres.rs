//! Postgres artwork repository

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::record::ArtworkRecord;
use super::{ArtworkPersistence, PersistenceError};
use crate::domain::entities::{Artwork, ArtworkDraft};

#[derive(Clone)]
pub struct PgArtworkRepository {
    pool: PgPool,
}

impl PgArtworkRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ArtworkPersistence for PgArtworkRepository {
    async fn insert(&self, draft: &ArtworkDraft) -> Result<Artwork, PersistenceError> {
        let record = ArtworkRecord::from_draft(Uuid::new_v4(), draft);

        let created = sqlx::query_as::<_, ArtworkRecord>(
            r#"
            INSERT INTO artworks (_id, title, prompt, stencil_list, stroke_list, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING _id, title, prompt, stencil_list, stroke_list, updated_at
            "#,
        )
        .bind(record.id)
        .bind(&record.title)
        .bind(&record.prompt)
        .bind(&record.stencil_list)
        .bind(&record.stroke_list)
        .bind(record.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created.into())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Artwork>, PersistenceError> {
        let record = sqlx::query_as::<_, ArtworkRecord>(
            r#"
            SELECT _id, title, prompt, stencil_list, stroke_list, updated_at
            FROM artworks
            WHERE _id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Into::into))
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Artwork>, PersistenceError> {
        let records = sqlx::query_as::<_, ArtworkRecord>(
            r#"
            SELECT _id, title, prompt, stencil_list, stroke_list, updated_at
            FROM artworks
            ORDER BY updated_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(Into::into).collect())
    }

    async fn update(&self, artwork: &Artwork) -> Result<Option<Artwork>, PersistenceError> {
        let updated = sqlx::query_as::<_, ArtworkRecord>(
            r#"
            UPDATE artworks SET
                title = $2,
                stroke_list = $3,
                updated_at = $4
            WHERE _id = $1
            RETURNING _id, title, prompt, stencil_list, stroke_list, updated_at
            "#,
        )
        .bind(artwork.id)
        .bind(&artwork.title)
        .bind(Json(&artwork.strokes))
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated.map(Into::into))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Artwork>, PersistenceError> {
        let deleted = sqlx::query_as::<_, ArtworkRecord>(
            r#"
            DELETE FROM artworks
            WHERE _id = $1
            RETURNING _id, title, prompt, stencil_list, stroke_list, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(deleted.map(Into::into))
    }
}
