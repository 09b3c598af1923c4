//! Core type definitions for causalkv.
//!
//! This crate defines the identifiers shared by every other crate:
//! - Node identifiers, derived deterministically from peer endpoints
//! - Replica message identifiers (UUID v7)
//!
//! Keys and values are plain `String` / `serde_json::Value` and need no
//! wrapper types.

mod ids;

pub use ids::{MessageId, NodeId};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid node endpoint: {0:?}")]
    InvalidEndpoint(String),
}
