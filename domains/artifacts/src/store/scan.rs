//! Pluggable content check run on staged uploads before they are published

use std::path::Path;

use async_trait::async_trait;

use crate::error::StoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanVerdict {
    Clean,
    Blocked(String),
}

/// Inspects a file sitting in the temp area
#[async_trait]
pub trait CleanCheck: Send + Sync {
    async fn check(&self, staged: &Path) -> Result<ScanVerdict, StoreError>;
}

/// Accepts everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopScanner;

#[async_trait]
impl CleanCheck for NoopScanner {
    async fn check(&self, _staged: &Path) -> Result<ScanVerdict, StoreError> {
        Ok(ScanVerdict::Clean)
    }
}
