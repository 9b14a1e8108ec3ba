//! Composite artifact address: `{bucket}/{basename}`

use std::str::FromStr;

use crate::domain::basename::SafeBasename;
use crate::error::StoreError;

/// A stored artifact's address, exactly one separator
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactPath {
    bucket: String,
    basename: SafeBasename,
}

impl ArtifactPath {
    pub fn new(bucket: &str, basename: SafeBasename) -> Result<Self, StoreError> {
        if bucket.is_empty() || bucket.contains(['/', '\\']) {
            return Err(StoreError::Validation(format!(
                "invalid bucket key: {}",
                bucket
            )));
        }
        Ok(Self {
            bucket: bucket.to_string(),
            basename,
        })
    }

    /// Parse `"{bucket}/{basename}"`
    pub fn parse(composite: &str) -> Result<Self, StoreError> {
        let segments: Vec<&str> = composite.split('/').collect();
        let [bucket, basename] = segments.as_slice() else {
            return Err(StoreError::Validation(format!(
                "path must look like {{bucket}}/{{basename}}, got: {}",
                composite
            )));
        };
        Self::new(bucket, SafeBasename::parse(basename)?)
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn basename(&self) -> &SafeBasename {
        &self.basename
    }
}

impl FromStr for ArtifactPath {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for ArtifactPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.bucket, self.basename)
    }
}
