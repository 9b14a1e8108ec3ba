//! In-memory artwork repository
//!
//! Used for local development and tests. Inserts and deletes can be made to
//! fail on demand to exercise the saga's compensation paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::record::ArtworkRecord;
use super::{ArtworkPersistence, PersistenceError};
use crate::domain::entities::{Artwork, ArtworkDraft};

#[derive(Debug, Clone, Default)]
pub struct InMemoryArtworkRepository {
    records: Arc<RwLock<HashMap<Uuid, ArtworkRecord>>>,
    fail_inserts: Arc<AtomicBool>,
    fail_deletes: Arc<AtomicBool>,
    insert_attempts: Arc<AtomicUsize>,
}

impl InMemoryArtworkRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following insert fail
    pub fn set_fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    /// Make every following delete fail
    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn insert_attempts(&self) -> usize {
        self.insert_attempts.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<Uuid, ArtworkRecord>> {
        self.records.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<Uuid, ArtworkRecord>> {
        self.records.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ArtworkPersistence for InMemoryArtworkRepository {
    async fn insert(&self, draft: &ArtworkDraft) -> Result<Artwork, PersistenceError> {
        self.insert_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable(
                "insert rejected by in-memory repository".to_string(),
            ));
        }

        let record = ArtworkRecord::from_draft(Uuid::new_v4(), draft);
        self.write().insert(record.id, record.clone());
        Ok(record.into())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Artwork>, PersistenceError> {
        Ok(self.read().get(&id).cloned().map(Into::into))
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Artwork>, PersistenceError> {
        let mut records: Vec<ArtworkRecord> = self.read().values().cloned().collect();
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        Ok(records
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(Into::into)
            .collect())
    }

    async fn update(&self, artwork: &Artwork) -> Result<Option<Artwork>, PersistenceError> {
        let mut records = self.write();
        let Some(record) = records.get_mut(&artwork.id) else {
            return Ok(None);
        };

        record.title = artwork.title.clone();
        record.stroke_list = sqlx::types::Json(artwork.strokes.clone());
        record.updated_at = Utc::now();
        Ok(Some(record.clone().into()))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Artwork>, PersistenceError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable(
                "delete rejected by in-memory repository".to_string(),
            ));
        }
        Ok(self.write().remove(&id).map(Into::into))
    }
}
