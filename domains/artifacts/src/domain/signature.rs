//! Magic-number check for uploaded image bytes

use crate::error::StoreError;

/// Image formats the store accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Webp,
}

impl ImageFormat {
    /// Detect the format from leading bytes
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            Some(Self::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(Self::Webp)
        } else {
            None
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Png => write!(f, "png"),
            Self::Jpeg => write!(f, "jpeg"),
            Self::Webp => write!(f, "webp"),
        }
    }
}

/// Reject bytes that are not a PNG, JPEG or WEBP image
pub fn validate_signature(bytes: &[u8]) -> Result<ImageFormat, StoreError> {
    ImageFormat::detect(bytes).ok_or_else(|| {
        StoreError::Validation("invalid file signature: expected png, jpeg or webp".to_string())
    })
}
