//! In-memory cluster harness: every node records its outbound replicas in a
//! `MockTransport`, and tests decide when and in what order they arrive.

#![allow(dead_code)]

use causalkv_clock::VectorClock;
use causalkv_replication::transport::mock::MockTransport;
use causalkv_replication::{
    FanOutReport, Peer, ReplicaMessage, ReplicaStatus, ReplicationConfig, ReplicationEngine,
};
use causalkv_types::NodeId;
use serde_json::Value;
use std::sync::Arc;

pub struct Cluster {
    pub ids: Vec<NodeId>,
    pub nodes: Vec<Arc<ReplicationEngine>>,
    pub transports: Vec<Arc<MockTransport>>,
}

pub fn members(n: usize) -> Vec<Peer> {
    (0..n)
        .map(|i| Peer::from_endpoint(&format!("http://n{i}")).unwrap())
        .collect()
}

pub fn cluster(n: usize) -> Cluster {
    cluster_with_config(n, ReplicationConfig::default())
}

pub fn cluster_with_config(n: usize, config: ReplicationConfig) -> Cluster {
    let members = members(n);
    let ids: Vec<NodeId> = members.iter().map(|p| p.id.clone()).collect();
    let mut nodes = Vec::new();
    let mut transports = Vec::new();
    for id in &ids {
        let transport = Arc::new(MockTransport::new());
        nodes.push(Arc::new(ReplicationEngine::new(
            id.clone(),
            members.clone(),
            config.clone(),
            transport.clone(),
        )));
        transports.push(transport);
    }
    Cluster {
        ids,
        nodes,
        transports,
    }
}

pub fn n(id: &str) -> NodeId {
    NodeId::new(id)
}

pub fn clock(entries: &[(&str, u64)]) -> VectorClock {
    entries.iter().map(|(id, t)| (n(id), *t)).collect()
}

impl Cluster {
    /// Writes on `node` and waits for the fan-out to be recorded.
    pub async fn write(&self, node: usize, key: &str, value: Value) -> (VectorClock, FanOutReport) {
        let receipt = self.nodes[node].local_write(key, value).await.unwrap();
        let report = receipt.replication.await.unwrap();
        (receipt.clock, report)
    }

    /// Replicas `from` has sent to `to` and that have not been delivered yet.
    pub fn take(&self, from: usize, to: usize) -> Vec<ReplicaMessage> {
        self.transports[from].take_sent_to(&self.ids[to])
    }

    /// Delivers every pending replica from `from` to `to`, in send order.
    pub async fn deliver(&self, from: usize, to: usize) -> Vec<ReplicaStatus> {
        let mut statuses = Vec::new();
        for msg in self.take(from, to) {
            statuses.push(self.nodes[to].receive_replica(msg).await.unwrap());
        }
        statuses
    }

    /// Reads `key` on `node`, returning just the value.
    pub async fn value(&self, node: usize, key: &str) -> Option<Value> {
        self.nodes[node].read(key).await.map(|r| r.value)
    }
}
