//! HTTP peer transport.
//!
//! POSTs each replica as JSON to `{endpoint}/replicate`.

use crate::error::{ReplicationError, ReplicationResult};
use crate::protocol::{ReplicaMessage, ReplicateAck};
use crate::transport::{Peer, PeerTransport};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Sends replicas over HTTP with a per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> ReplicationResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ReplicationError::Network(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> ReplicationError {
    if e.is_timeout() {
        ReplicationError::Timeout
    } else {
        ReplicationError::Network(e.to_string())
    }
}

#[async_trait]
impl PeerTransport for HttpTransport {
    async fn send_replica(
        &self,
        peer: &Peer,
        message: &ReplicaMessage,
    ) -> ReplicationResult<ReplicateAck> {
        let url = format!("{}/replicate", peer.endpoint);
        debug!(peer = %peer.id, key = %message.key, "POST {}", url);

        let resp = self
            .client
            .post(&url)
            .json(message)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ReplicationError::PeerRejected {
                peer: peer.id.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp.bytes().await.map_err(map_reqwest_error)?;
        Ok(serde_json::from_slice(&body)?)
    }
}
