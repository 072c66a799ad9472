//! The agent's local HTTP surface: status, manual sync, submit, and queue
//! inspection for foreground clients.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::connectivity::ConnectivityMonitor;
use crate::error::{QueueError, SubmitError};
use crate::events::EventBus;
use crate::mutation::HttpMethod;
use crate::protocol::InboundMessage;
use crate::queue::MutationQueue;
use crate::recorder::{MutationRecorder, SubmitOutcome, WriteRequest};
use crate::sync::engine::{SyncEngine, SyncHandle};

#[derive(Clone)]
pub struct ApiState {
    pub queue: Arc<MutationQueue>,
    pub monitor: Arc<ConnectivityMonitor>,
    pub recorder: Arc<MutationRecorder>,
    pub engine: Arc<SyncEngine>,
    pub sync: SyncHandle,
    pub events: EventBus,
    pub remote_base_url: String,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/sync", post(trigger_sync))
        .route("/submit", post(submit))
        .route("/queue", get(list_pending))
        .route("/queue/failed", get(list_failed))
        .route("/queue/:id", delete(discard))
        .route("/queue/:id/retry", post(retry))
        .route("/message", post(message))
        .route("/events", get(crate::sse::subscribe))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Queue storage failures map to 500 with the error in the body.
struct ApiError(QueueError);

impl From<QueueError> for ApiError {
    fn from(e: QueueError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!("queue error in api handler: {}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}

async fn health() -> &'static str {
    "OK"
}

#[derive(Serialize)]
struct StatusResponse {
    #[serde(rename = "isConnected")]
    is_connected: bool,
    count: u64,
}

async fn status(State(state): State<ApiState>) -> Result<Json<StatusResponse>, ApiError> {
    Ok(Json(StatusResponse {
        is_connected: state.monitor.is_online(),
        count: state.queue.count()?,
    }))
}

#[derive(Serialize)]
struct SyncResponse {
    status: &'static str,
}

async fn trigger_sync(State(state): State<ApiState>) -> Json<SyncResponse> {
    let coalesced = state.engine.is_draining();
    state.sync.request_sync();
    Json(SyncResponse {
        status: if coalesced { "coalesced" } else { "scheduled" },
    })
}

#[derive(Deserialize)]
struct SubmitRequest {
    url: String,
    method: HttpMethod,
    #[serde(default)]
    headers: Vec<(String, String)>,
    #[serde(default)]
    body: Option<String>,
}

async fn submit(State(state): State<ApiState>, Json(request): Json<SubmitRequest>) -> Response {
    let write = WriteRequest {
        url: request.url,
        method: request.method,
        headers: request.headers,
        body: request.body,
    };
    submit_response(state.recorder.submit(write).await)
}

/// Shared mapping from a recorder outcome to an HTTP response.
fn submit_response(outcome: Result<SubmitOutcome, SubmitError>) -> Response {
    match outcome {
        Ok(SubmitOutcome::Delivered(response)) => {
            let data: serde_json::Value =
                serde_json::from_str(&response.body).unwrap_or(serde_json::Value::Null);
            (
                StatusCode::OK,
                Json(json!({ "status": "delivered", "data": data })),
            )
                .into_response()
        }
        Ok(SubmitOutcome::Queued { id, created_at }) => (
            StatusCode::ACCEPTED,
            Json(json!({
                "status": "queued",
                "id": id,
                "timestamp": created_at,
                "message": "Operation queued for sync",
            })),
        )
            .into_response(),
        Err(SubmitError::Rejected { status, body }) => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
            body,
        )
            .into_response(),
        Err(SubmitError::Storage(e)) => ApiError(e).into_response(),
    }
}

async fn list_pending(State(state): State<ApiState>) -> Result<Response, ApiError> {
    Ok(Json(state.queue.list_pending()?).into_response())
}

async fn list_failed(State(state): State<ApiState>) -> Result<Response, ApiError> {
    Ok(Json(state.queue.list_failed()?).into_response())
}

async fn discard(
    State(state): State<ApiState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    state.queue.delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn retry(State(state): State<ApiState>, Path(id): Path<u64>) -> Response {
    match state.queue.requeue(id) {
        Ok(new_id) => {
            state.sync.request_sync();
            (StatusCode::OK, Json(json!({ "id": new_id }))).into_response()
        }
        Err(QueueError::NotFound(_)) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

async fn message(State(state): State<ApiState>, Json(message): Json<InboundMessage>) -> Response {
    match message {
        InboundMessage::TriggerSync => {
            state.sync.request_sync();
            StatusCode::ACCEPTED.into_response()
        }
        InboundMessage::StoreOfflineExpense { expense, token } => {
            match WriteRequest::expense(&state.remote_base_url, &expense, &token) {
                Ok(request) => submit_response(state.recorder.submit(request).await),
                Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
            }
        }
        InboundMessage::SkipWaiting => {
            // Lifecycle message from service-worker clients; nothing to do.
            tracing::debug!("ignoring SKIP_WAITING message");
            StatusCode::ACCEPTED.into_response()
        }
    }
}
