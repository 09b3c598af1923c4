//! Causal replication engine for causalkv.
//!
//! A fixed group of nodes each hold a full copy of a key-value map. Writes
//! are applied locally and pushed to every peer once, best-effort. A peer
//! makes a pushed write visible only when it is causally ready: it is the
//! sender's next write, and everything the sender had seen is already
//! visible here. Writes that arrive early wait in a buffer until a
//! background drainer finds them ready.
//!
//! # Components
//!
//! - **State**: vector clock and store, mutated under one lock
//! - **Buffer**: arrival-ordered queue of not-yet-ready replicas
//! - **Engine**: local write, replica receipt, read and status
//! - **Drainer**: background task re-checking the buffer
//! - **Transport**: outbound replica sends (HTTP, or a mock for tests)
//!
//! # Limitations
//!
//! Concurrent writes to the same key are not reconciled: each node keeps
//! whichever it applied last. A replica whose predecessor is never received
//! stays buffered indefinitely.
//!
//! # Example
//!
//! ```
//! use causalkv_replication::{ReplicationConfig, ReplicationEngine};
//! use causalkv_replication::transport::mock::MockTransport;
//! use causalkv_types::NodeId;
//! use std::sync::Arc;
//!
//! let engine = ReplicationEngine::new(
//!     NodeId::new("n0"),
//!     Vec::new(),
//!     ReplicationConfig::default(),
//!     Arc::new(MockTransport::new()),
//! );
//! assert_eq!(engine.node_id().as_str(), "n0");
//! ```

pub mod buffer;
mod drainer;
mod engine;
mod error;
pub mod http;
pub mod protocol;
pub mod state;
pub mod store;
pub mod transport;

pub use buffer::{BufferedMessage, CausalBuffer};
pub use drainer::{BufferDrainer, DrainerHandle};
pub use engine::{FanOutReport, PeerOutcome, ReplicationConfig, ReplicationEngine, WriteReceipt};
pub use error::{ReplicationError, ReplicationResult};
pub use http::HttpTransport;
pub use protocol::{
    ErrorMessage, ReadResponse, ReplicaMessage, ReplicaStatus, ReplicateAck, StatusResponse,
    WriteRequest, WriteResponse,
};
pub use state::ReplicaState;
pub use store::{KeyValueStore, StoredValue};
pub use transport::{Peer, PeerTransport};
