//! causalkv node
//!
//! Serves the key-value HTTP API and replicates every write to the rest of
//! the group with causal delivery.
//!
//! Usage:
//!   NODES=http://node0:5000,http://node1:5000,http://node2:5000 NODE_ID=0 causalkv-node

use std::sync::Arc;
use anyhow::{Context, Result};
use causalkv_node::{build_router, config::NodeArgs};
use causalkv_replication::{BufferDrainer, HttpTransport, ReplicationEngine};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let args = NodeArgs::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    let config = args.resolve().context("invalid node configuration")?;
    info!("causalkv node {} starting...", config.node_id);
    for member in &config.members {
        info!("  member {} at {}", member.id, member.endpoint);
    }

    let transport = Arc::new(HttpTransport::new(config.replication.replicate_timeout())?);
    let engine = Arc::new(ReplicationEngine::new(
        config.node_id.clone(),
        config.members,
        config.replication,
        transport,
    ));
    let drainer = BufferDrainer::spawn(engine.clone());

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("failed to bind HTTP port {}", config.port))?;
    info!("HTTP API listening on 0.0.0.0:{}", config.port);

    axum::serve(listener, build_router(engine))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("shutting down");
    drainer.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler: run until killed.
        std::future::pending::<()>().await;
    }
}
