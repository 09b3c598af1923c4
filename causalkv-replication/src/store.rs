//! In-memory key-value store.
//!
//! Every apply is an unconditional overwrite: there is no per-key version
//! check, so the write applied last on a node wins on that node even if a
//! causally concurrent write to the same key carried a "larger" clock.

use causalkv_clock::VectorClock;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Current value of a key plus the clock of the write that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredValue {
    pub value: Value,
    pub clock: VectorClock,
}

/// Mapping from key to last-applied value.
#[derive(Debug, Clone, Default)]
pub struct KeyValueStore {
    entries: HashMap<String, StoredValue>,
}

impl KeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current value of `key`, if any.
    pub fn get(&self, key: &str) -> Option<&StoredValue> {
        self.entries.get(key)
    }

    /// Overwrites `key` unconditionally.
    pub fn apply(&mut self, key: impl Into<String>, value: Value, clock: VectorClock) {
        self.entries.insert(key.into(), StoredValue { value, clock });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copies out every key and value, ordered by key.
    pub fn values(&self) -> BTreeMap<String, Value> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.value.clone()))
            .collect()
    }
}
