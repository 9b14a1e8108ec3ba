//! Shared utilities, configuration, and error handling for Stencil
//!
//! This crate provides common functionality used across the Stencil workspace:
//! - Configuration management following 12-factor principles
//! - The boundary error type and its HTTP mapping
//! - State machine errors shared by domain crates
//! - Request extractors

pub mod config;
pub mod error;
pub mod extractors;
pub mod state;

pub use config::Config;
pub use error::{Error, Result};
pub use extractors::{Pagination, ValidatedJson};
pub use state::StateError;
