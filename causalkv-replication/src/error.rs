//! Error types for the replication layer.

use thiserror::Error;

/// Result type for replication operations.
pub type ReplicationResult<T> = Result<T, ReplicationError>;

/// Errors that can occur in replication operations.
#[derive(Debug, Error)]
pub enum ReplicationError {
    /// Client supplied a missing or unusable key or value.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A replica that can never be delivered (e.g. no entry for its sender).
    #[error("invalid replica: {0}")]
    InvalidReplica(String),

    /// Network error talking to a peer.
    #[error("network error: {0}")]
    Network(String),

    /// Peer answered with a non-success HTTP status.
    #[error("peer {peer} rejected replica with status {status}")]
    PeerRejected { peer: String, status: u16 },

    /// A peer's ack could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Timeout.
    #[error("operation timed out")]
    Timeout,
}
