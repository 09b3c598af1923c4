//! Holding area for replicas that are not yet causally deliverable.
//!
//! Messages leave the buffer only by delivery. There is no expiry and no
//! eviction: a replica whose predecessor never arrives stays pending for
//! the life of the process, so depth is reported by the status operation
//! and crosses a warning threshold in the engine.

use crate::protocol::ReplicaMessage;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;

/// A replica waiting for its dependencies.
#[derive(Debug, Clone)]
pub struct BufferedMessage {
    pub message: ReplicaMessage,
    /// When the replica was parked.
    pub received_at: DateTime<Utc>,
}

impl BufferedMessage {
    pub fn new(message: ReplicaMessage) -> Self {
        Self {
            message,
            received_at: Utc::now(),
        }
    }

    /// Milliseconds spent in the buffer so far.
    pub fn waited_ms(&self) -> i64 {
        (Utc::now() - self.received_at).num_milliseconds()
    }
}

/// Arrival-ordered queue of pending replicas.
#[derive(Debug, Default)]
pub struct CausalBuffer {
    pending: VecDeque<BufferedMessage>,
}

impl CausalBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a replica at the back. Returns the new depth.
    pub fn push(&mut self, message: ReplicaMessage) -> usize {
        self.pending.push_back(BufferedMessage::new(message));
        self.pending.len()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Pending replicas in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = &BufferedMessage> {
        self.pending.iter()
    }

    /// One pass over the buffer in arrival order.
    ///
    /// `deliver` is offered each pending replica and returns true if it
    /// applied it. Delivered replicas are removed and returned in delivery
    /// order; the rest keep their relative order. Because `deliver` sees
    /// the effects of earlier deliveries in the same pass, a replica can
    /// unblock the one queued right behind it, but one queued *before* its
    /// dependency waits for the next pass.
    pub fn drain_pass<F>(&mut self, mut deliver: F) -> Vec<BufferedMessage>
    where
        F: FnMut(&ReplicaMessage) -> bool,
    {
        let mut delivered = Vec::new();
        let mut remaining = VecDeque::with_capacity(self.pending.len());

        for entry in std::mem::take(&mut self.pending) {
            if deliver(&entry.message) {
                delivered.push(entry);
            } else {
                remaining.push_back(entry);
            }
        }

        self.pending = remaining;
        delivered
    }
}
