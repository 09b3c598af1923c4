//! Replication engine: local writes, replica receipt, reads and status.
//!
//! The engine is transport-agnostic. Inbound operations are plain async
//! methods; the only outbound I/O goes through a [`PeerTransport`].
//!
//! Locking: the clock and store share one `RwLock` ([`ReplicaState`]); the
//! buffer has its own `Mutex`. Whenever both are needed the state lock is
//! taken first.

use crate::buffer::CausalBuffer;
use crate::error::{ReplicationError, ReplicationResult};
use crate::protocol::{
    validate_key, ReadResponse, ReplicaMessage, ReplicaStatus, StatusResponse,
};
use crate::state::ReplicaState;
use crate::transport::{Peer, PeerTransport};
use causalkv_clock::VectorClock;
use causalkv_types::{MessageId, NodeId};
use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Configuration for the replication engine.
#[derive(Debug, Clone)]
pub struct ReplicationConfig {
    /// Upper bound on a single replica send to one peer (ms).
    pub replicate_timeout_ms: u64,
    /// Safety sweep interval of the drainer when nothing wakes it (ms).
    pub drain_idle_interval_ms: u64,
    /// Pause after a drain pass that delivered nothing (ms).
    pub drain_backoff_ms: u64,
    /// Buffer depth at which a warning is logged (0 disables).
    pub buffer_warn_threshold: usize,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            replicate_timeout_ms: 500,
            drain_idle_interval_ms: 100,
            drain_backoff_ms: 50,
            buffer_warn_threshold: 1024,
        }
    }
}

impl ReplicationConfig {
    pub fn replicate_timeout(&self) -> Duration {
        Duration::from_millis(self.replicate_timeout_ms)
    }

    pub fn drain_idle_interval(&self) -> Duration {
        Duration::from_millis(self.drain_idle_interval_ms)
    }

    pub fn drain_backoff(&self) -> Duration {
        Duration::from_millis(self.drain_backoff_ms)
    }
}

/// Outcome of sending one replica to one peer.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerOutcome {
    pub peer: NodeId,
    /// The peer's ack, or the reason the send was dropped.
    pub result: Result<ReplicaStatus, String>,
}

/// Per-peer results of one write's fan-out.
#[derive(Debug, Clone, PartialEq)]
pub struct FanOutReport {
    pub message_id: MessageId,
    pub outcomes: Vec<PeerOutcome>,
}

impl FanOutReport {
    /// Peers that acknowledged the replica.
    pub fn acknowledged(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    /// Peers the replica was dropped for.
    pub fn failed(&self) -> Vec<&NodeId> {
        self.outcomes
            .iter()
            .filter(|o| o.result.is_err())
            .map(|o| &o.peer)
            .collect()
    }
}

/// Result of a local write.
///
/// The write is already applied locally when this is returned; the
/// replication handle only reports on the background fan-out and may be
/// dropped.
#[derive(Debug)]
pub struct WriteReceipt {
    /// Our clock right after the write.
    pub clock: VectorClock,
    /// Background fan-out to every peer.
    pub replication: JoinHandle<FanOutReport>,
}

/// The replication engine for one node.
pub struct ReplicationEngine {
    /// Our node ID.
    node_id: NodeId,
    /// Every other member of the group.
    peers: Arc<Vec<Peer>>,
    /// Configuration.
    config: ReplicationConfig,
    /// Clock and store.
    state: RwLock<ReplicaState>,
    /// Replicas waiting on dependencies.
    buffer: Mutex<CausalBuffer>,
    /// Outbound replica sender.
    transport: Arc<dyn PeerTransport>,
    /// Signaled whenever the clock advances.
    clock_advanced: Notify,
}

impl ReplicationEngine {
    /// Creates an engine.
    ///
    /// `members` is the full ordered member list and may include this node;
    /// every member gets a clock entry, and every member other than
    /// `node_id` receives replicas.
    pub fn new(
        node_id: NodeId,
        members: Vec<Peer>,
        config: ReplicationConfig,
        transport: Arc<dyn PeerTransport>,
    ) -> Self {
        let state = ReplicaState::new(node_id.clone(), members.iter().map(|p| &p.id));
        let peers: Vec<Peer> = members.into_iter().filter(|p| p.id != node_id).collect();

        info!(node = %node_id, peers = peers.len(), "replication engine created");

        Self {
            node_id,
            peers: Arc::new(peers),
            config,
            state: RwLock::new(state),
            buffer: Mutex::new(CausalBuffer::new()),
            transport,
            clock_advanced: Notify::new(),
        }
    }

    /// Returns our node ID.
    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    /// Returns the peers replicas are sent to.
    pub fn peers(&self) -> &[Peer] {
        &self.peers
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ReplicationConfig {
        &self.config
    }

    // ── Client operations ────────────────────────────────────────

    /// Writes `key = value` locally and replicates it to every peer.
    ///
    /// The clock tick and store update happen under one guard. Replication
    /// runs in the background, once per peer, with a bounded timeout;
    /// failures are logged and not retried, and never fail the write.
    pub async fn local_write(
        &self,
        key: impl Into<String>,
        value: Value,
    ) -> ReplicationResult<WriteReceipt> {
        let key = key.into();
        validate_key(&key)?;
        if value.is_null() {
            return Err(ReplicationError::InvalidInput("missing value".into()));
        }

        let clock = self.state.write().await.apply_local(key.clone(), value.clone());
        self.clock_advanced.notify_one();
        info!(key = %key, seq = clock.get(&self.node_id), "applied local write");

        let message = ReplicaMessage::new(key, value, clock.clone(), self.node_id.clone());
        let replication = tokio::spawn(fan_out(
            self.transport.clone(),
            self.peers.clone(),
            message,
            self.config.replicate_timeout(),
        ));

        Ok(WriteReceipt { clock, replication })
    }

    /// Reads the locally visible value of `key` and the clock that wrote it.
    pub async fn read(&self, key: &str) -> Option<ReadResponse> {
        self.state.read().await.get(key).map(|stored| ReadResponse {
            value: stored.value.clone(),
            clock: stored.clock.clone(),
        })
    }

    /// Snapshot of data, clock and buffer depth.
    pub async fn status(&self) -> StatusResponse {
        let state = self.state.read().await;
        let buffer_depth = self.buffer.lock().await.len();
        StatusResponse {
            node: self.node_id.clone(),
            data: state.store().values(),
            clock: state.clock().snapshot(),
            buffer_depth,
        }
    }

    /// Copy of the current clock.
    pub async fn clock(&self) -> VectorClock {
        self.state.read().await.clock().snapshot()
    }

    /// Number of replicas waiting on dependencies.
    pub async fn buffer_depth(&self) -> usize {
        self.buffer.lock().await.len()
    }

    // ── Peer operations ──────────────────────────────────────────

    /// Handles a replica pushed by a peer.
    ///
    /// Applies it if causally ready, otherwise parks it in the buffer. The
    /// readiness decision and the enqueue happen under the same state guard.
    ///
    /// Every replica that fails the readiness test is buffered, including
    /// ones whose sender position was already observed; those can never
    /// become ready and show up in the buffer depth and its alarm.
    pub async fn receive_replica(
        &self,
        message: ReplicaMessage,
    ) -> ReplicationResult<ReplicaStatus> {
        validate_key(&message.key)?;
        if message.sender == self.node_id {
            return Err(ReplicationError::InvalidReplica(format!(
                "replica {} claims to come from this node",
                message.id
            )));
        }

        let mut state = self.state.write().await;

        if state.deliver_if_ready(&message) {
            drop(state);
            self.clock_advanced.notify_one();
            info!(
                key = %message.key,
                sender = %message.sender,
                seq = message.sequence(),
                "applied replica"
            );
            return Ok(ReplicaStatus::Applied);
        }

        let depth = self.buffer.lock().await.push(message.clone());
        drop(state);

        debug!(
            key = %message.key,
            sender = %message.sender,
            seq = message.sequence(),
            depth,
            "buffered replica awaiting dependencies"
        );
        self.check_buffer_depth(depth);
        Ok(ReplicaStatus::Buffered)
    }

    /// Runs one pass over the buffer in arrival order, delivering every
    /// replica that is ready against the clock as it advances during the
    /// pass. Returns how many were delivered.
    pub async fn drain_once(&self) -> usize {
        if self.buffer.lock().await.is_empty() {
            return 0;
        }

        let mut state = self.state.write().await;
        let mut buffer = self.buffer.lock().await;
        if buffer.is_empty() {
            return 0;
        }

        let delivered = buffer.drain_pass(|message| state.deliver_if_ready(message));
        let remaining = buffer.len();
        drop(buffer);
        drop(state);

        for entry in &delivered {
            info!(
                key = %entry.message.key,
                sender = %entry.message.sender,
                seq = entry.message.sequence(),
                waited_ms = entry.waited_ms(),
                "delivered buffered replica"
            );
        }
        if !delivered.is_empty() {
            debug!(delivered = delivered.len(), remaining, "drain pass complete");
        }
        delivered.len()
    }

    /// Resolves once the clock has advanced since the last wake-up.
    pub(crate) async fn clock_advanced(&self) {
        self.clock_advanced.notified().await;
    }

    fn check_buffer_depth(&self, depth: usize) {
        let threshold = self.config.buffer_warn_threshold;
        if threshold > 0 && depth >= threshold && depth % threshold == 0 {
            warn!(
                depth,
                threshold, "causal buffer is growing; a dependency may never arrive"
            );
        }
    }
}

/// Sends `message` to every peer concurrently, each bounded by `timeout`.
async fn fan_out(
    transport: Arc<dyn PeerTransport>,
    peers: Arc<Vec<Peer>>,
    message: ReplicaMessage,
    timeout: Duration,
) -> FanOutReport {
    let sends = peers.iter().map(|peer| {
        let transport = transport.clone();
        let message = &message;
        async move {
            let result = match tokio::time::timeout(timeout, transport.send_replica(peer, message))
                .await
            {
                Ok(Ok(ack)) => {
                    debug!(peer = %peer.id, key = %message.key, status = ?ack.status, "replica acknowledged");
                    Ok(ack.status)
                }
                Ok(Err(e)) => {
                    warn!(peer = %peer.id, key = %message.key, "replication dropped: {}", e);
                    Err(e.to_string())
                }
                Err(_) => {
                    warn!(peer = %peer.id, key = %message.key, "replication dropped: {}", ReplicationError::Timeout);
                    Err(ReplicationError::Timeout.to_string())
                }
            };
            PeerOutcome {
                peer: peer.id.clone(),
                result,
            }
        }
    });

    let outcomes = join_all(sends).await;
    FanOutReport {
        message_id: message.id,
        outcomes,
    }
}
