//! Replica state: the vector clock and the store, mutated together.
//!
//! Both live in one struct behind one lock in the engine, so every apply
//! (store write plus clock increment or merge) is a single critical section
//! and no reader ever sees a clock that implies a write the store lacks.

use crate::protocol::ReplicaMessage;
use crate::store::{KeyValueStore, StoredValue};
use causalkv_clock::VectorClock;
use causalkv_types::NodeId;
use serde_json::Value;

/// Clock and store of one node.
#[derive(Debug, Clone)]
pub struct ReplicaState {
    /// Our node ID.
    node_id: NodeId,
    /// What we have observed from every node, including ourselves.
    clock: VectorClock,
    /// Last-applied value per key.
    store: KeyValueStore,
}

impl ReplicaState {
    /// Creates state with every known node's clock entry at 0.
    pub fn new<'a>(node_id: NodeId, nodes: impl IntoIterator<Item = &'a NodeId>) -> Self {
        let mut clock = VectorClock::with_nodes(nodes);
        clock.update(&node_id, 0);
        Self {
            node_id,
            clock,
            store: KeyValueStore::new(),
        }
    }

    /// Gets the local node ID.
    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    /// Current clock.
    pub fn clock(&self) -> &VectorClock {
        &self.clock
    }

    /// Current store.
    pub fn store(&self) -> &KeyValueStore {
        &self.store
    }

    /// Looks up a key.
    pub fn get(&self, key: &str) -> Option<&StoredValue> {
        self.store.get(key)
    }

    /// Applies a local write: ticks our own entry and stores the value
    /// stamped with the resulting clock, which is returned.
    pub fn apply_local(&mut self, key: impl Into<String>, value: Value) -> VectorClock {
        let clock = self.clock.tick(&self.node_id);
        self.store.apply(key, value, clock.clone());
        clock
    }

    /// Applies a replica unconditionally and merges its clock.
    pub fn apply_replica(&mut self, message: &ReplicaMessage) {
        self.store
            .apply(message.key.clone(), message.value.clone(), message.clock.clone());
        self.clock.merge(&message.clock);
    }

    /// Whether `message` may be applied against the current clock.
    pub fn is_ready(&self, message: &ReplicaMessage) -> bool {
        self.clock.is_causally_ready(&message.clock, &message.sender)
    }

    /// Applies `message` if it is causally ready. Returns whether it was
    /// applied.
    pub fn deliver_if_ready(&mut self, message: &ReplicaMessage) -> bool {
        if !self.is_ready(message) {
            return false;
        }
        self.apply_replica(message);
        true
    }
}
