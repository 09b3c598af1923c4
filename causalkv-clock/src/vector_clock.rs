//! Vector Clock for causality tracking.
//!
//! A vector clock tracks the logical time across a fixed set of nodes,
//! enabling determination of causality (happens-before relationships)
//! between writes.
//!
//! Use cases:
//! - Deciding when a replicated write may become visible locally
//! - Detecting concurrent writes (diagnostics only; no conflict resolution)

use causalkv_types::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Causality relationship between two vector clocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CausalOrder {
    /// First clock happened before second.
    Before,
    /// First clock happened after second.
    After,
    /// Clocks are concurrent (neither happened before the other).
    Concurrent,
    /// Clocks are identical.
    Equal,
}

/// A Vector Clock for tracking causality across nodes.
///
/// Each node has a logical counter that increments with each local write.
/// Missing entries read as 0, so a clock created with [`VectorClock::with_nodes`]
/// and one that never heard of a node compare the same way.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VectorClock {
    /// Map from node ID to logical time at that node.
    clocks: BTreeMap<NodeId, u64>,
}

impl VectorClock {
    /// Creates a new empty vector clock.
    #[must_use]
    pub fn new() -> Self {
        Self {
            clocks: BTreeMap::new(),
        }
    }

    /// Creates a clock with an explicit 0 entry for every known node.
    #[must_use]
    pub fn with_nodes<'a>(nodes: impl IntoIterator<Item = &'a NodeId>) -> Self {
        Self {
            clocks: nodes.into_iter().map(|n| (n.clone(), 0)).collect(),
        }
    }

    /// Returns the logical time for a node (0 if not present).
    #[must_use]
    pub fn get(&self, node: &NodeId) -> u64 {
        self.clocks.get(node).copied().unwrap_or(0)
    }

    /// Returns all nodes and their times.
    pub fn nodes(&self) -> impl Iterator<Item = (&NodeId, &u64)> {
        self.clocks.iter()
    }

    /// Returns the number of nodes in the clock.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clocks.len()
    }

    /// Returns true if the clock has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clocks.is_empty()
    }

    /// Increments the clock for a node and returns the new time.
    pub fn increment(&mut self, node: &NodeId) -> u64 {
        let entry = self.clocks.entry(node.clone()).or_insert(0);
        *entry += 1;
        *entry
    }

    /// Records a local write: increments `node` by exactly one and returns
    /// a copy of the resulting clock.
    ///
    /// Callers that share a clock between tasks must hold their lock across
    /// this call so every writer observes a distinct self-entry.
    #[must_use = "the returned snapshot is the clock carried by the write"]
    pub fn tick(&mut self, node: &NodeId) -> Self {
        self.increment(node);
        self.snapshot()
    }

    /// Returns an owned copy of the full clock.
    #[must_use]
    pub fn snapshot(&self) -> Self {
        self.clone()
    }

    /// Updates the clock for a node to a specific time.
    ///
    /// Only updates if the new time is greater than the current time.
    pub fn update(&mut self, node: &NodeId, time: u64) {
        let entry = self.clocks.entry(node.clone()).or_insert(0);
        if time > *entry {
            *entry = time;
        }
    }

    /// Merges another vector clock into this one.
    ///
    /// For each node, takes the maximum of the two times.
    /// This operation is commutative, associative, and idempotent.
    pub fn merge(&mut self, other: &Self) {
        for (node, &time) in &other.clocks {
            self.update(node, time);
        }
    }

    /// Creates a new clock that is the merge of this and another.
    #[must_use]
    pub fn merged(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.merge(other);
        result
    }

    /// Decides whether a write stamped `message` by `sender` can be applied
    /// on a replica whose current clock is `self`.
    ///
    /// Two conditions must hold:
    /// 1. `message[sender] == self[sender] + 1`: the write is the very next
    ///    one from its sender. Writes further ahead are missing a
    ///    predecessor; writes at or below are already observed.
    /// 2. `message[k] <= self[k]` for every other node `k`: everything the
    ///    sender had seen when it wrote has been applied here.
    #[must_use]
    pub fn is_causally_ready(&self, message: &Self, sender: &NodeId) -> bool {
        if message.get(sender) != self.get(sender) + 1 {
            return false;
        }

        message
            .clocks
            .iter()
            .filter(|(node, _)| *node != sender)
            .all(|(node, &time)| time <= self.get(node))
    }

    /// Compares this clock with another to determine causal ordering.
    #[must_use]
    pub fn compare(&self, other: &Self) -> CausalOrder {
        let mut dominated_by_self = true; // self >= other for all nodes
        let mut dominated_by_other = true; // other >= self for all nodes

        let all_nodes: BTreeSet<&NodeId> =
            self.clocks.keys().chain(other.clocks.keys()).collect();

        for node in all_nodes {
            let self_time = self.get(node);
            let other_time = other.get(node);

            if self_time < other_time {
                dominated_by_self = false;
            }
            if other_time < self_time {
                dominated_by_other = false;
            }
        }

        match (dominated_by_self, dominated_by_other) {
            (true, true) => CausalOrder::Equal,
            (true, false) => CausalOrder::After,
            (false, true) => CausalOrder::Before,
            (false, false) => CausalOrder::Concurrent,
        }
    }

    /// Returns true if this clock is causally before the other.
    #[must_use]
    pub fn is_before(&self, other: &Self) -> bool {
        self.compare(other) == CausalOrder::Before
    }

    /// Returns true if this clock is causally after the other.
    #[must_use]
    pub fn is_after(&self, other: &Self) -> bool {
        self.compare(other) == CausalOrder::After
    }

    /// Returns true if this clock is concurrent with the other.
    #[must_use]
    pub fn is_concurrent(&self, other: &Self) -> bool {
        self.compare(other) == CausalOrder::Concurrent
    }

    /// Returns true if this clock dominates the other (is >= for all nodes).
    #[must_use]
    pub fn dominates(&self, other: &Self) -> bool {
        matches!(self.compare(other), CausalOrder::After | CausalOrder::Equal)
    }
}

impl PartialEq for VectorClock {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == CausalOrder::Equal
    }
}

impl Eq for VectorClock {}

impl<const N: usize> From<[(NodeId, u64); N]> for VectorClock {
    fn from(entries: [(NodeId, u64); N]) -> Self {
        Self {
            clocks: entries.into_iter().collect(),
        }
    }
}

impl FromIterator<(NodeId, u64)> for VectorClock {
    fn from_iter<I: IntoIterator<Item = (NodeId, u64)>>(iter: I) -> Self {
        Self {
            clocks: iter.into_iter().collect(),
        }
    }
}
