//! Command-line and environment configuration.
//!
//! Every node is started with the same ordered endpoint list and its own
//! position in it. Node identifiers are derived from the endpoints, so all
//! nodes agree on them without exchanging anything.

use anyhow::{bail, Context, Result};
use causalkv_replication::{Peer, ReplicationConfig};
use causalkv_types::NodeId;
use clap::Parser;
use std::collections::HashSet;

/// Endpoint list used when neither `--nodes` nor `NODES` is given.
pub const DEFAULT_NODES: &str =
    r#"["http://node0:5000", "http://node1:5000", "http://node2:5000"]"#;

#[derive(Parser, Debug, Clone)]
#[command(name = "causalkv-node")]
#[command(about = "Causally consistent replicated key-value node")]
pub struct NodeArgs {
    /// Every node's endpoint, in the same order on every node
    /// (comma separated or a JSON array)
    #[arg(long, env = "NODES", default_value = DEFAULT_NODES)]
    pub nodes: String,

    /// This node's position in the endpoint list
    #[arg(long, env = "NODE_ID", default_value_t = 0)]
    pub node_index: usize,

    /// HTTP port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Give up on a replica send after this many milliseconds
    #[arg(long, default_value_t = 500)]
    pub replicate_timeout_ms: u64,

    /// Warn when this many replicas are waiting on dependencies (0 disables)
    #[arg(long, default_value_t = 1024)]
    pub buffer_warn_threshold: usize,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Fully resolved startup configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub node_id: NodeId,
    pub members: Vec<Peer>,
    pub port: u16,
    pub replication: ReplicationConfig,
}

impl NodeArgs {
    /// Resolves the endpoint list and this node's identity.
    pub fn resolve(&self) -> Result<NodeConfig> {
        let endpoints = parse_endpoints(&self.nodes)?;
        let members = endpoints
            .iter()
            .map(|e| Peer::from_endpoint(e).with_context(|| format!("bad endpoint {e:?}")))
            .collect::<Result<Vec<_>>>()?;

        let mut seen = HashSet::new();
        for member in &members {
            if !seen.insert(&member.id) {
                bail!("endpoint list names node {} twice", member.id);
            }
        }

        let Some(me) = members.get(self.node_index) else {
            bail!(
                "node index {} out of range for {} endpoints",
                self.node_index,
                members.len()
            );
        };

        Ok(NodeConfig {
            node_id: me.id.clone(),
            members: members.clone(),
            port: self.port,
            replication: ReplicationConfig {
                replicate_timeout_ms: self.replicate_timeout_ms,
                buffer_warn_threshold: self.buffer_warn_threshold,
                ..Default::default()
            },
        })
    }
}

/// Parses a comma-separated list or a JSON array of endpoints.
pub fn parse_endpoints(raw: &str) -> Result<Vec<String>> {
    let trimmed = raw.trim();
    let endpoints: Vec<String> = if trimmed.starts_with('[') {
        serde_json::from_str(trimmed).context("endpoint list is not a JSON array of strings")?
    } else {
        trimmed
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    };

    if endpoints.is_empty() {
        bail!("endpoint list is empty");
    }
    Ok(endpoints)
}
