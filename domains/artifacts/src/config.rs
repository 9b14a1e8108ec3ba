//! Artifact store configuration
//!
//! Loaded once at startup and validated by [`crate::ArtifactStore::initialize`];
//! read-only for the rest of the process lifetime.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::StoreError;

/// Bucket that holds generated stencil images
pub const STENCIL_BUCKET: &str = "stencil";

/// Staging directory name under the root; never an addressable bucket
pub const TEMP_DIR: &str = "temp";

/// Temp files older than this are swept (1 hour)
pub const DEFAULT_TEMP_MAX_AGE: Duration = Duration::from_secs(60 * 60);

/// Time between sweeps (24 hours)
pub const DEFAULT_GC_INTERVAL: Duration = Duration::from_secs(60 * 60 * 24);

#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// Storage root; must already exist
    pub root: PathBuf,
    /// Bucket key -> subdirectory relative to the root
    pub buckets: BTreeMap<String, PathBuf>,
    pub temp_max_age: Duration,
    pub gc_interval: Duration,
}

impl StoreConfig {
    /// Config with the default `stencil` bucket
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let mut buckets = BTreeMap::new();
        buckets.insert(STENCIL_BUCKET.to_string(), PathBuf::from(STENCIL_BUCKET));
        Self {
            root: root.into(),
            buckets,
            temp_max_age: DEFAULT_TEMP_MAX_AGE,
            gc_interval: DEFAULT_GC_INTERVAL,
        }
    }

    pub fn with_bucket(mut self, key: &str, subdirectory: impl Into<PathBuf>) -> Self {
        self.buckets.insert(key.to_string(), subdirectory.into());
        self
    }

    pub fn with_temp_max_age(mut self, max_age: Duration) -> Self {
        self.temp_max_age = max_age;
        self
    }

    pub fn with_gc_interval(mut self, interval: Duration) -> Self {
        self.gc_interval = interval;
        self
    }

    /// Create store config from environment variables
    pub fn from_env() -> Result<Self, StoreError> {
        let root = std::env::var("STORAGE_ROOT").unwrap_or_else(|_| "./volume".to_string());

        let buckets = match std::env::var("STORAGE_BUCKETS") {
            Ok(spec) => parse_buckets(&spec)?,
            Err(_) => Self::new(&root).buckets,
        };

        let temp_max_age = duration_var("TEMP_MAX_AGE_SECS")?.unwrap_or(DEFAULT_TEMP_MAX_AGE);
        let gc_interval = duration_var("GC_INTERVAL_SECS")?.unwrap_or(DEFAULT_GC_INTERVAL);

        if gc_interval.is_zero() {
            return Err(StoreError::Validation(
                "GC_INTERVAL_SECS must be positive".to_string(),
            ));
        }

        Ok(Self {
            root: PathBuf::from(root),
            buckets,
            temp_max_age,
            gc_interval,
        })
    }
}

fn duration_var(name: &str) -> Result<Option<Duration>, StoreError> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<u64>()
            .map(|secs| Some(Duration::from_secs(secs)))
            .map_err(|_| StoreError::Validation(format!("{} must be a number of seconds", name))),
        Err(_) => Ok(None),
    }
}

/// Parse `key=subdir,key2=sub/dir` into a bucket map
pub fn parse_buckets(spec: &str) -> Result<BTreeMap<String, PathBuf>, StoreError> {
    let mut buckets = BTreeMap::new();

    for pair in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (key, subdirectory) = pair.split_once('=').ok_or_else(|| {
            StoreError::Validation(format!("Invalid bucket entry (expected key=subdir): {}", pair))
        })?;
        let key = key.trim();
        let subdirectory = subdirectory.trim();

        if key.is_empty() || subdirectory.is_empty() {
            return Err(StoreError::Validation(format!(
                "Invalid bucket entry (expected key=subdir): {}",
                pair
            )));
        }
        if buckets
            .insert(key.to_string(), PathBuf::from(subdirectory))
            .is_some()
        {
            return Err(StoreError::Validation(format!("Duplicate bucket key: {}", key)));
        }
    }

    if buckets.is_empty() {
        return Err(StoreError::Validation(
            "At least one bucket must be configured".to_string(),
        ));
    }

    Ok(buckets)
}
