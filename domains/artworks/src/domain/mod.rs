//! Artwork entities and the creation state machine

pub mod entities;
pub mod state;
