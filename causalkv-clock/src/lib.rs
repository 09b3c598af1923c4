//! Vector clocks for causalkv.
//!
//! [`VectorClock`] tracks, per node, how many writes from that node have
//! been observed. It provides:
//!
//! - **Increment** ([`VectorClock::tick`]) for local writes
//! - **Merge** (pointwise max) on receipt of a replica
//! - **Comparison** ([`CausalOrder`]) for happened-before checks
//! - **Causal readiness** ([`VectorClock::is_causally_ready`]), the gate
//!   that decides whether a replicated write may be applied yet
//!
//! Merge is commutative, associative and idempotent, and never lowers an
//! entry.

mod vector_clock;

pub use vector_clock::{CausalOrder, VectorClock};
