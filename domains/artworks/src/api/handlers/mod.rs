//! HTTP handlers for the Artworks domain

pub mod artworks;
