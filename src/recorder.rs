//! Mutation recorder: direct send when online, durable queue when not.

use crate::connectivity::ConnectivityMonitor;
use crate::error::{QueueError, SubmitError};
use crate::mutation::{HttpMethod, NewMutation};
use crate::protocol::ExpensePayload;
use crate::queue::MutationQueue;
use crate::sync::engine::SyncHandle;
use crate::sync::remote::{RemoteApi, RemoteResponse, ReplayRequest};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// A logical write operation as handed to [`MutationRecorder::submit`].
#[derive(Debug, Clone)]
pub struct WriteRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl WriteRequest {
    /// Build an expense-create request, capturing the bearer credential now
    /// so replay does not depend on the session still existing.
    pub fn expense(
        base_url: &str,
        expense: &ExpensePayload,
        token: &str,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            url: format!("{}/api/expenses/add", base_url.trim_end_matches('/')),
            method: HttpMethod::Post,
            headers: vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("Authorization".to_string(), format!("Bearer {}", token)),
            ],
            body: Some(serde_json::to_string(expense)?),
        })
    }
}

/// How a submitted write was resolved.
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// The request reached the server and succeeded.
    Delivered(RemoteResponse),
    /// The request was persisted for replay on a later drain pass.
    Queued { id: u64, created_at: DateTime<Utc> },
}

pub struct MutationRecorder {
    queue: Arc<MutationQueue>,
    monitor: Arc<ConnectivityMonitor>,
    remote: Arc<dyn RemoteApi>,
    sync: SyncHandle,
}

impl MutationRecorder {
    pub fn new(
        queue: Arc<MutationQueue>,
        monitor: Arc<ConnectivityMonitor>,
        remote: Arc<dyn RemoteApi>,
        sync: SyncHandle,
    ) -> Self {
        Self {
            queue,
            monitor,
            remote,
            sync,
        }
    }

    /// Submit a write operation.
    ///
    /// Online requests go straight to the server. Offline requests, and
    /// online requests that die on the wire, are queued. A server-returned
    /// error status is surfaced as `Rejected` and never queued: replaying it
    /// later would reproduce the same error.
    pub async fn submit(&self, request: WriteRequest) -> Result<SubmitOutcome, SubmitError> {
        if self.monitor.is_online() {
            let replay = ReplayRequest {
                url: request.url.clone(),
                method: request.method,
                headers: request.headers.clone(),
                body: request.body.clone(),
            };
            match self.remote.send(&replay).await {
                Ok(response) if response.is_success() => {
                    return Ok(SubmitOutcome::Delivered(response));
                }
                Ok(response) => {
                    return Err(SubmitError::Rejected {
                        status: response.status,
                        body: response.body,
                    });
                }
                Err(failure) => {
                    tracing::warn!("direct send failed ({}), queueing for replay", failure);
                }
            }
        }
        Ok(self.enqueue(request)?)
    }

    fn enqueue(&self, request: WriteRequest) -> Result<SubmitOutcome, QueueError> {
        let created_at = Utc::now();
        let id = self.queue.enqueue(NewMutation {
            url: request.url,
            method: request.method,
            headers: request.headers,
            body: request.body,
            created_at,
        })?;
        tracing::info!(id, "queued mutation for later sync");

        // Ensure a drain happens on the next connectivity restore, or right
        // away if the monitor's online reading was merely stale.
        self.sync.request_sync();

        Ok(SubmitOutcome::Queued { id, created_at })
    }
}
