//! Replication protocol messages and types.
//!
//! Four operations cross the transport boundary:
//! 1. Write: a client stores `key = value` on one node
//! 2. Read: a client fetches the locally visible value of a key
//! 3. Replicate: a node pushes one write to a peer
//! 4. Status: a snapshot of data, clock and buffer depth
//!
//! Values are opaque JSON. Concurrent writes to the same key are not
//! reconciled; whichever is applied last on a node is what that node reads.

use crate::error::{ReplicationError, ReplicationResult};
use causalkv_clock::VectorClock;
use causalkv_types::{MessageId, NodeId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A single write as shipped from its origin node to a peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicaMessage {
    /// Identifier for log correlation. Payloads without one get a fresh id.
    #[serde(default)]
    pub id: MessageId,
    /// Key written.
    pub key: String,
    /// Value written.
    pub value: Value,
    /// Origin node's clock right after the write.
    pub clock: VectorClock,
    /// Origin node.
    pub sender: NodeId,
}

impl ReplicaMessage {
    /// Creates a new replica message.
    pub fn new(key: impl Into<String>, value: Value, clock: VectorClock, sender: NodeId) -> Self {
        Self {
            id: MessageId::new(),
            key: key.into(),
            value,
            clock,
            sender,
        }
    }

    /// The sender's sequence number carried by this write.
    pub fn sequence(&self) -> u64 {
        self.clock.get(&self.sender)
    }
}

/// What a node did with a received replica.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplicaStatus {
    /// Applied to the store and merged into the clock.
    Applied,
    /// Parked until its causal predecessors arrive.
    Buffered,
}

/// Response to a replicate request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicateAck {
    /// Outcome on the receiving node.
    pub status: ReplicaStatus,
}

impl ReplicateAck {
    /// Creates a new ack.
    pub fn new(status: ReplicaStatus) -> Self {
        Self { status }
    }
}

/// Client write request. Both fields are optional on the wire so that
/// missing input is reported as a validation error, not a decode error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WriteRequest {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
}

impl WriteRequest {
    /// Creates a write request.
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: Some(key.into()),
            value: Some(value),
        }
    }

    /// Validates the request, returning the key and value.
    ///
    /// The key must be non-empty and the value present and non-null.
    pub fn into_parts(self) -> ReplicationResult<(String, Value)> {
        let key = self
            .key
            .ok_or_else(|| ReplicationError::InvalidInput("missing key".into()))?;
        validate_key(&key)?;
        match self.value {
            None | Some(Value::Null) => Err(ReplicationError::InvalidInput("missing value".into())),
            Some(value) => Ok((key, value)),
        }
    }
}

/// Rejects keys that cannot be addressed by a read.
pub fn validate_key(key: &str) -> ReplicationResult<()> {
    if key.trim().is_empty() {
        return Err(ReplicationError::InvalidInput("key must not be empty".into()));
    }
    Ok(())
}

/// Response to a successful write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteResponse {
    pub status: String,
    /// The writer's clock right after the write.
    pub clock: VectorClock,
}

impl WriteResponse {
    pub fn success(clock: VectorClock) -> Self {
        Self {
            status: "success".to_string(),
            clock,
        }
    }
}

/// Response to a read of a present key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadResponse {
    pub value: Value,
    /// Clock of the write that produced `value`.
    pub clock: VectorClock,
}

/// Point-in-time view of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub node: NodeId,
    pub data: BTreeMap<String, Value>,
    pub clock: VectorClock,
    pub buffer_depth: usize,
}

/// Error body returned by the HTTP surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub error: String,
}

impl ErrorMessage {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }

    pub fn key_not_found() -> Self {
        Self::new("key not found")
    }
}
