//! Filesystem artifact store
//!
//! Writes go through `temp/` and are published into their bucket with an
//! atomic rename. Every path handed to the filesystem is built from a
//! [`SafeBasename`] and a bucket directory that is re-resolved on each call.

pub mod gc;
pub mod layout;
pub mod scan;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::config::StoreConfig;
use crate::domain::basename::SafeBasename;
use crate::domain::path::ArtifactPath;
use crate::domain::signature::validate_signature;
use crate::error::StoreError;

pub use gc::{spawn_garbage_collector, GcReport};
pub use layout::StorageLayout;
pub use scan::{CleanCheck, NoopScanner, ScanVerdict};

/// Save/delete boundary consumed by the artwork saga
#[async_trait]
pub trait ArtifactStorage: Send + Sync {
    async fn save(
        &self,
        bytes: &[u8],
        bucket: &str,
        file_name: &str,
    ) -> Result<ArtifactPath, StoreError>;

    async fn delete(&self, composite_path: &str) -> Result<(), StoreError>;
}

pub struct ArtifactStore {
    layout: StorageLayout,
    scanner: Arc<dyn CleanCheck>,
    temp_max_age: Duration,
}

impl std::fmt::Debug for ArtifactStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactStore")
            .field("layout", &self.layout)
            .field("temp_max_age", &self.temp_max_age)
            .finish_non_exhaustive()
    }
}

impl ArtifactStore {
    /// Verify the configured layout and build a store with the no-op scanner
    pub fn initialize(config: &StoreConfig) -> Result<Self, StoreError> {
        let layout = StorageLayout::verify(config)?;

        tracing::info!(
            root = %layout.root().display(),
            buckets = ?layout.bucket_keys().collect::<Vec<_>>(),
            "Artifact store initialized"
        );

        Ok(Self {
            layout,
            scanner: Arc::new(NoopScanner),
            temp_max_age: config.temp_max_age,
        })
    }

    pub fn with_scanner(mut self, scanner: Arc<dyn CleanCheck>) -> Self {
        self.scanner = scanner;
        self
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    /// Validate, stage, scan and publish `bytes` as `{bucket}/{file_name}`
    pub async fn save_artifact(
        &self,
        bytes: &[u8],
        bucket: &str,
        file_name: &str,
    ) -> Result<ArtifactPath, StoreError> {
        let basename = SafeBasename::parse(file_name)?;
        let format = validate_signature(bytes)?;
        let bucket_dir = self.resolve_bucket(bucket).await?;
        let temp_dir = self.resolve_temp().await?;

        let staged = temp_dir.join(basename.as_str());
        write_new_file(&staged, bytes).await?;

        match self.scanner.check(&staged).await {
            Ok(ScanVerdict::Clean) => {}
            Ok(ScanVerdict::Blocked(reason)) => {
                tracing::warn!(bucket = %bucket, file = %basename, reason = %reason, "Upload blocked by content check");
                discard_staged(&staged).await;
                return Err(StoreError::Validation("upload blocked".to_string()));
            }
            Err(e) => {
                discard_staged(&staged).await;
                return Err(e);
            }
        }

        let destination = bucket_dir.join(basename.as_str());
        if let Err(e) = tokio::fs::rename(&staged, &destination).await {
            discard_staged(&staged).await;
            return Err(e.into());
        }

        let path = ArtifactPath::new(bucket, basename)?;
        tracing::info!(path = %path, format = %format, size = bytes.len(), "Artifact saved");
        Ok(path)
    }

    /// Open a stored artifact for reading
    pub async fn fetch_artifact(
        &self,
        bucket: &str,
        file_name: &str,
    ) -> Result<tokio::fs::File, StoreError> {
        let basename = SafeBasename::parse(file_name)?;
        let bucket_dir = self.resolve_bucket(bucket).await?;
        let file_path = bucket_dir.join(basename.as_str());

        let metadata = match tokio::fs::symlink_metadata(&file_path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(format!("{}/{}", bucket, basename)));
            }
            Err(e) => return Err(e.into()),
        };

        if metadata.file_type().is_symlink() {
            return Err(StoreError::Integrity(format!(
                "{}/{} is a symbolic link",
                bucket, basename
            )));
        }
        if !metadata.is_file() {
            return Err(StoreError::NotFound(format!("{}/{}", bucket, basename)));
        }

        Ok(tokio::fs::File::open(&file_path).await?)
    }

    /// Read a stored artifact fully into memory
    pub async fn read_artifact(&self, bucket: &str, file_name: &str) -> Result<Vec<u8>, StoreError> {
        let mut file = self.fetch_artifact(bucket, file_name).await?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).await?;
        Ok(bytes)
    }

    /// Remove `{bucket}/{basename}`
    pub async fn delete_artifact(&self, composite_path: &str) -> Result<(), StoreError> {
        let path = ArtifactPath::parse(composite_path)?;
        let bucket_dir = self.resolve_bucket(path.bucket()).await?;
        let file_path = bucket_dir.join(path.basename().as_str());

        tokio::fs::remove_file(&file_path)
            .await
            .map_err(|source| StoreError::DeleteFailure {
                path: path.to_string(),
                source,
            })?;

        tracing::info!(path = %path, "Artifact deleted");
        Ok(())
    }

    /// Bucket directory, re-checked against symlinks and the root
    async fn resolve_bucket(&self, bucket: &str) -> Result<PathBuf, StoreError> {
        let dir = self
            .layout
            .bucket(bucket)
            .ok_or_else(|| StoreError::Validation(format!("unknown bucket: {}", bucket)))?;
        self.ensure_contained(dir).await
    }

    async fn resolve_temp(&self) -> Result<PathBuf, StoreError> {
        self.ensure_contained(self.layout.temp()).await
    }

    /// Walk `dir` from the root one segment at a time: every segment must
    /// still be a plain directory, then the real path must stay under the root.
    async fn ensure_contained(&self, dir: &Path) -> Result<PathBuf, StoreError> {
        let root = self.layout.root();
        let relative = dir.strip_prefix(root).map_err(|_| {
            StoreError::Integrity(format!("{} is outside the storage root", dir.display()))
        })?;

        let mut current = root.to_path_buf();
        ensure_plain_directory(&current).await?;
        for segment in relative.components() {
            current.push(segment);
            ensure_plain_directory(&current).await?;
        }

        let resolved = tokio::fs::canonicalize(dir).await?;
        if !resolved.starts_with(root) {
            return Err(StoreError::Integrity(format!(
                "{} resolves outside the storage root",
                dir.display()
            )));
        }
        Ok(resolved)
    }
}

async fn ensure_plain_directory(path: &Path) -> Result<(), StoreError> {
    let metadata = tokio::fs::symlink_metadata(path).await?;
    if metadata.file_type().is_symlink() || !metadata.is_dir() {
        return Err(StoreError::Integrity(format!(
            "{} is no longer a plain directory",
            path.display()
        )));
    }
    Ok(())
}

#[async_trait]
impl ArtifactStorage for ArtifactStore {
    async fn save(
        &self,
        bytes: &[u8],
        bucket: &str,
        file_name: &str,
    ) -> Result<ArtifactPath, StoreError> {
        self.save_artifact(bytes, bucket, file_name).await
    }

    async fn delete(&self, composite_path: &str) -> Result<(), StoreError> {
        self.delete_artifact(composite_path).await
    }
}

async fn write_new_file(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;

    let written = match file.write_all(bytes).await {
        Ok(()) => file.sync_all().await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        drop(file);
        discard_staged(path).await;
        return Err(e.into());
    }
    Ok(())
}

async fn discard_staged(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::warn!(path = %path.display(), error = %e, "Failed to remove staged file");
    }
}
