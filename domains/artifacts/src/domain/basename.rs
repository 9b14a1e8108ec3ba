//! Safe basename policy
//!
//! A raw file name from anywhere is never joined onto a directory until it has
//! passed [`SafeBasename::parse`].

use std::sync::LazyLock;

use crate::error::StoreError;

/// Maximum basename length in characters
pub const MAX_BASENAME_LEN: usize = 255;

/// Extensions accepted by the store, lowercase and without the dot
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// Restricted character set; excludes both path separators (compiled once)
static BASENAME_REGEX: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^[A-Za-z0-9._-]+$").expect("basename regex is valid")
});

/// A file name that is safe to join onto a bucket directory
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SafeBasename(String);

impl SafeBasename {
    /// Validate a raw basename
    pub fn parse(name: &str) -> Result<Self, StoreError> {
        let reject = |reason: &str| {
            Err(StoreError::Validation(format!(
                "file basename was rejected: {}",
                reason
            )))
        };

        let len = name.chars().count();
        if len == 0 || len > MAX_BASENAME_LEN {
            return reject("length must be between 1 and 255 characters");
        }
        if name.contains("..") {
            return reject("contains '..'");
        }
        if !BASENAME_REGEX.is_match(name) {
            return reject("contains characters outside [A-Za-z0-9._-]");
        }

        match extension_of(name) {
            Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) => {
                Ok(Self(name.to_string()))
            }
            _ => reject("extension is not allowed"),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercased extension without the dot
    pub fn extension(&self) -> String {
        extension_of(&self.0)
            .map(str::to_ascii_lowercase)
            .unwrap_or_default()
    }

    /// Content type implied by the extension
    pub fn content_type(&self) -> &'static str {
        match self.extension().as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            _ => "image/webp",
        }
    }
}

/// Extension after the last dot, ignoring a leading dot (".webp" has none)
fn extension_of(name: &str) -> Option<&str> {
    let (stem, ext) = name.rsplit_once('.')?;
    (!stem.is_empty() && !ext.is_empty()).then_some(ext)
}

impl std::fmt::Display for SafeBasename {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SafeBasename {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
