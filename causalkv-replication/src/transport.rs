//! Transport layer abstraction.
//!
//! The engine only needs one outbound call: push a replica to a peer and
//! get its ack. Implementations decide how (HTTP in production, an
//! in-memory recorder in tests).

use crate::error::ReplicationResult;
use crate::protocol::{ReplicaMessage, ReplicateAck};
use async_trait::async_trait;
use causalkv_types::NodeId;

/// A member of the replication group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    /// Identifier derived from the endpoint.
    pub id: NodeId,
    /// Base URL, always with a scheme.
    pub endpoint: String,
}

impl Peer {
    /// Builds a peer from an endpoint, deriving its node ID.
    ///
    /// Endpoints without a scheme are assumed to be plain HTTP.
    pub fn from_endpoint(endpoint: &str) -> causalkv_types::Result<Self> {
        let id = NodeId::from_endpoint(endpoint)?;
        let trimmed = endpoint.trim().trim_end_matches('/');
        let endpoint = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("http://{trimmed}")
        };
        Ok(Self { id, endpoint })
    }
}

/// Outbound side of replication.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Sends one replica to `peer` and returns its ack.
    async fn send_replica(&self, peer: &Peer, message: &ReplicaMessage)
        -> ReplicationResult<ReplicateAck>;
}

/// A mock transport for testing.
pub mod mock {
    use super::*;
    use crate::error::ReplicationError;
    use crate::protocol::ReplicaStatus;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Records every replica instead of sending it.
    ///
    /// Tests pull the recorded messages per destination and hand them to
    /// other engines in whatever order the scenario needs.
    #[derive(Debug, Default)]
    pub struct MockTransport {
        sent: Mutex<Vec<(NodeId, ReplicaMessage)>>,
        unreachable: Mutex<HashSet<NodeId>>,
        stalled: Mutex<HashSet<NodeId>>,
    }

    impl MockTransport {
        /// Creates a new mock transport.
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes every send to `peer` fail with a network error.
        pub fn set_unreachable(&self, peer: &NodeId) {
            self.unreachable.lock().unwrap().insert(peer.clone());
        }

        /// Undoes [`MockTransport::set_unreachable`].
        pub fn set_reachable(&self, peer: &NodeId) {
            self.unreachable.lock().unwrap().remove(peer);
        }

        /// Makes every send to `peer` hang forever.
        pub fn set_stalled(&self, peer: &NodeId) {
            self.stalled.lock().unwrap().insert(peer.clone());
        }

        /// Removes and returns the replicas recorded for `peer`, oldest first.
        pub fn take_sent_to(&self, peer: &NodeId) -> Vec<ReplicaMessage> {
            let mut sent = self.sent.lock().unwrap();
            let (taken, kept): (Vec<_>, Vec<_>) =
                sent.drain(..).partition(|(dest, _)| dest == peer);
            *sent = kept;
            taken.into_iter().map(|(_, msg)| msg).collect()
        }

        /// Number of replicas recorded and not yet taken.
        pub fn sent_count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl PeerTransport for MockTransport {
        async fn send_replica(
            &self,
            peer: &Peer,
            message: &ReplicaMessage,
        ) -> ReplicationResult<ReplicateAck> {
            if self.unreachable.lock().unwrap().contains(&peer.id) {
                return Err(ReplicationError::Network(format!("{} unreachable", peer.id)));
            }
            let stalled = self.stalled.lock().unwrap().contains(&peer.id);
            if stalled {
                std::future::pending::<()>().await;
            }
            self.sent
                .lock()
                .unwrap()
                .push((peer.id.clone(), message.clone()));
            Ok(ReplicateAck::new(ReplicaStatus::Applied))
        }
    }
}
