use causalkv_replication::transport::mock::MockTransport;
use causalkv_replication::{ReplicationConfig, ReplicationEngine};
use causalkv_types::NodeId;
use std::sync::Arc;

#[test]
fn replication_engine_creation() {
    let node = NodeId::new("n0");
    let engine = ReplicationEngine::new(
        node.clone(),
        Vec::new(),
        ReplicationConfig::default(),
        Arc::new(MockTransport::new()),
    );

    assert_eq!(engine.node_id(), &node);
    assert!(engine.peers().is_empty());
}
