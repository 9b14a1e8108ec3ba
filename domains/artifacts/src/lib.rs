//! Artifacts domain: validated image storage on a local volume
//!
//! Images are written into named buckets below a single storage root. Every
//! write is staged in `temp/`, signature-checked and scanned, then published
//! with an atomic rename. A background task sweeps stale staged files.

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod store;

// Re-export domain types at the crate root for convenience
pub use config::{StoreConfig, STENCIL_BUCKET};
pub use domain::basename::SafeBasename;
pub use domain::path::ArtifactPath;
pub use domain::signature::{validate_signature, ImageFormat};
pub use error::StoreError;

// Re-export store types
pub use store::{
    spawn_garbage_collector, ArtifactStorage, ArtifactStore, CleanCheck, GcReport, NoopScanner,
    ScanVerdict, StorageLayout,
};

// Re-export API types
pub use api::routes;
pub use api::ArtifactsState;
