//! Artifact naming and content rules

pub mod basename;
pub mod path;
pub mod signature;
