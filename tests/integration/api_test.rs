//! Cross-crate integration tests
//!
//! Saga scenarios against a real artifact store in a temp directory, and the
//! HTTP surface driven through `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

mod artifacts;
mod artworks;
mod common;
mod saga;
