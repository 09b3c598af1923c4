//! Background task that delivers buffered replicas as the clock advances.
//!
//! Each iteration runs one arrival-order pass over the buffer. A pass that
//! delivered something is followed immediately by another, since each
//! delivery can unblock replicas queued ahead of it. A pass that delivered
//! nothing waits for the next clock advance, bounded by the backoff (buffer
//! non-empty) or the idle interval (buffer empty) as a safety sweep.

use crate::engine::ReplicationEngine;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Spawns and owns the drain task.
pub struct BufferDrainer;

impl BufferDrainer {
    /// Starts draining `engine`'s buffer until the handle is shut down or
    /// dropped.
    pub fn spawn(engine: Arc<ReplicationEngine>) -> DrainerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run(engine, shutdown_rx));
        DrainerHandle { shutdown_tx, task }
    }
}

/// Handle to a running drainer.
pub struct DrainerHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl DrainerHandle {
    /// Stops the drainer and waits for it to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.task.await;
    }

    /// Whether the task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

async fn run(engine: Arc<ReplicationEngine>, mut shutdown: watch::Receiver<bool>) {
    info!(node = %engine.node_id(), "buffer drainer started");
    let idle = engine.config().drain_idle_interval();
    let backoff = engine.config().drain_backoff();

    loop {
        if *shutdown.borrow() {
            break;
        }

        if engine.drain_once().await > 0 {
            tokio::task::yield_now().await;
            continue;
        }

        let wait = if engine.buffer_depth().await == 0 {
            idle
        } else {
            backoff
        };

        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            _ = engine.clock_advanced() => {
                debug!("drainer woken by clock advance");
            }
            _ = tokio::time::sleep(wait) => {}
        }
    }

    info!(node = %engine.node_id(), "buffer drainer stopped");
}
