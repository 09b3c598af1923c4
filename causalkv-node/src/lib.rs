//! HTTP surface and process configuration for a causalkv node.
//!
//! Routes:
//! - `POST /write`: `{key, value}` → `{status, clock}`
//! - `GET /read/{key}`: `{value, clock}` or 404
//! - `POST /replicate`: replica from a peer → `{status}`
//! - `GET /status`: `{node, data, clock, buffer_depth}`

pub mod config;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use causalkv_replication::{
    ErrorMessage, ReplicaMessage, ReplicateAck, ReplicationEngine, ReplicationError,
    StatusResponse, WriteRequest, WriteResponse,
};
use std::sync::Arc;
use tracing::warn;

/// Maps engine errors onto HTTP responses.
#[derive(Debug)]
pub struct ApiError(ReplicationError);

impl From<ReplicationError> for ApiError {
    fn from(e: ReplicationError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ReplicationError::InvalidInput(_) | ReplicationError::InvalidReplica(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            warn!("request failed: {}", self.0);
        }
        (status, Json(ErrorMessage::new(self.0.to_string()))).into_response()
    }
}

async fn write_handler(
    State(engine): State<Arc<ReplicationEngine>>,
    Json(request): Json<WriteRequest>,
) -> Result<Json<WriteResponse>, ApiError> {
    let (key, value) = request.into_parts()?;
    // The fan-out handle is dropped: replication continues in the background.
    let receipt = engine.local_write(key, value).await?;
    Ok(Json(WriteResponse::success(receipt.clock)))
}

async fn read_handler(
    State(engine): State<Arc<ReplicationEngine>>,
    Path(key): Path<String>,
) -> Response {
    match engine.read(&key).await {
        Some(read) => Json(read).into_response(),
        None => (StatusCode::NOT_FOUND, Json(ErrorMessage::key_not_found())).into_response(),
    }
}

async fn replicate_handler(
    State(engine): State<Arc<ReplicationEngine>>,
    Json(message): Json<ReplicaMessage>,
) -> Result<Json<ReplicateAck>, ApiError> {
    let status = engine.receive_replica(message).await?;
    Ok(Json(ReplicateAck::new(status)))
}

async fn status_handler(State(engine): State<Arc<ReplicationEngine>>) -> Json<StatusResponse> {
    Json(engine.status().await)
}

/// Build the HTTP router over the given engine.
pub fn build_router(engine: Arc<ReplicationEngine>) -> Router {
    Router::new()
        .route("/write", post(write_handler))
        .route("/read/{key}", get(read_handler))
        .route("/replicate", post(replicate_handler))
        .route("/status", get(status_handler))
        .with_state(engine)
}
