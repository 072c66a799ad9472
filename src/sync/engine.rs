//! Sync engine: drains the queue against the remote API.
//!
//! A drain pass snapshots the pending entries in insertion order and replays
//! them sequentially, so a queued update never runs before the queued create
//! of the same logical resource. At most one pass is active at a time; a
//! trigger arriving mid-pass is coalesced away. Entries enqueued during a
//! pass are guaranteed to be picked up by the next one.

use crate::connectivity::{ConnectivityMonitor, Transition};
use crate::error::{QueueError, ReplayError};
use crate::events::EventBus;
use crate::mutation::{MutationPatch, QueuedMutation, SyncState};
use crate::protocol::OutboundMessage;
use crate::queue::MutationQueue;
use crate::sync::remote::{RemoteApi, ReplayRequest};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, Mutex};

/// Replay attempts before a retryable failure becomes terminal.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Counters for one completed drain pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrainSummary {
    pub total_processed: u64,
    pub success_count: u64,
    pub failure_count: u64,
}

/// Result of asking the engine to drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// A pass ran to completion.
    Completed(DrainSummary),
    /// Another pass was already active; this trigger was coalesced.
    AlreadyDraining,
}

pub struct SyncEngine {
    queue: Arc<MutationQueue>,
    remote: Arc<dyn RemoteApi>,
    events: EventBus,
    max_retries: u32,
    drain_lock: Mutex<()>,
}

impl SyncEngine {
    pub fn new(
        queue: Arc<MutationQueue>,
        remote: Arc<dyn RemoteApi>,
        events: EventBus,
        max_retries: u32,
    ) -> Self {
        Self {
            queue,
            remote,
            events,
            max_retries,
            drain_lock: Mutex::new(()),
        }
    }

    /// Whether a drain pass is currently active.
    pub fn is_draining(&self) -> bool {
        self.drain_lock.try_lock().is_err()
    }

    /// Run one drain pass. A call while another pass holds the lock does not
    /// start a second pass.
    pub async fn drain(&self) -> Result<DrainOutcome, QueueError> {
        let Ok(_guard) = self.drain_lock.try_lock() else {
            tracing::debug!("drain already in progress, coalescing trigger");
            return Ok(DrainOutcome::AlreadyDraining);
        };

        let pending = self.queue.list_pending()?;
        if pending.is_empty() {
            return Ok(DrainOutcome::Completed(DrainSummary::default()));
        }

        let pass_id = uuid::Uuid::new_v4();
        tracing::info!(%pass_id, pending = pending.len(), "drain pass started");

        let mut summary = DrainSummary::default();
        for entry in pending {
            summary.total_processed += 1;
            match self.replay(&entry).await {
                Ok(data) => {
                    summary.success_count += 1;
                    self.queue.delete(entry.id)?;
                    tracing::info!(%pass_id, id = entry.id, "mutation synced");
                    self.events
                        .publish(OutboundMessage::SyncCompleted { id: entry.id, data });
                }
                Err(error) => {
                    summary.failure_count += 1;
                    tracing::warn!(%pass_id, id = entry.id, "replay failed: {}", error);
                    self.record_failure(&entry, error)?;
                }
            }
        }

        tracing::info!(
            %pass_id,
            processed = summary.total_processed,
            succeeded = summary.success_count,
            failed = summary.failure_count,
            "drain pass finished"
        );
        self.events.publish(OutboundMessage::SyncStatus {
            total_processed: summary.total_processed,
            success_count: summary.success_count,
            failure_count: summary.failure_count,
        });
        Ok(DrainOutcome::Completed(summary))
    }

    /// Reconstruct and send one stored request, classifying the outcome.
    async fn replay(&self, entry: &QueuedMutation) -> Result<Value, ReplayError> {
        // A mutation without a credential can never succeed; don't waste a
        // request on it.
        if entry.authorization().is_none() {
            return Err(ReplayError::MissingCredential);
        }

        let request = ReplayRequest {
            url: entry.url.clone(),
            method: entry.method,
            headers: entry.headers.clone(),
            body: entry.body.clone(),
        };
        let response = self
            .remote
            .send(&request)
            .await
            .map_err(|e| ReplayError::Network(e.to_string()))?;

        match response.status {
            status if (200..300).contains(&status) => {
                Ok(serde_json::from_str(&response.body).unwrap_or(Value::Null))
            }
            401 => Err(ReplayError::Auth(response.body)),
            status if (400..500).contains(&status) => Err(ReplayError::Validation {
                status,
                body: response.body,
            }),
            status => Err(ReplayError::Server {
                status,
                body: response.body,
            }),
        }
    }

    /// Apply retry/terminal bookkeeping for one failed replay.
    ///
    /// Retryable failures bump `retry_count` and go terminal once the retry
    /// limit is reached. Non-retryable ones go terminal immediately with the
    /// counter untouched.
    fn record_failure(&self, entry: &QueuedMutation, error: ReplayError) -> Result<(), QueueError> {
        let (patch, terminal) = if error.is_retryable() {
            let attempts = entry.retry_count + 1;
            if attempts >= self.max_retries {
                (
                    MutationPatch {
                        retry_count: Some(attempts),
                        sync_state: Some(SyncState::Failed),
                        failure_reason: Some(error.to_string()),
                    },
                    true,
                )
            } else {
                (
                    MutationPatch {
                        retry_count: Some(attempts),
                        ..Default::default()
                    },
                    false,
                )
            }
        } else {
            (
                MutationPatch {
                    sync_state: Some(SyncState::Failed),
                    failure_reason: Some(error.to_string()),
                    ..Default::default()
                },
                true,
            )
        };

        match self.queue.update(entry.id, patch) {
            Ok(()) => {}
            // The entry vanished under us (concurrent discard); nothing to record.
            Err(QueueError::NotFound(_)) => return Ok(()),
            Err(e) => return Err(e),
        }

        self.events.publish(OutboundMessage::SyncFailed {
            id: entry.id,
            error: error.to_string(),
            terminal,
        });
        Ok(())
    }
}

/// Handle for requesting a drain from other components (recorder, HTTP
/// surface). Requests are coalesced by the driver and the engine's lock.
#[derive(Clone)]
pub struct SyncHandle {
    tx: mpsc::UnboundedSender<()>,
}

impl SyncHandle {
    pub fn request_sync(&self) {
        let _ = self.tx.send(());
    }
}

/// Drive the engine: drain on connectivity restore, on manual triggers, and
/// on an optional periodic timer.
///
/// Drains only run while the monitor reads online; a trigger received while
/// offline simply waits for the next `WentOnline` (draining offline would
/// burn retry budget on requests that cannot succeed).
pub fn spawn_driver(
    engine: Arc<SyncEngine>,
    monitor: Arc<ConnectivityMonitor>,
    drain_interval: Option<Duration>,
) -> SyncHandle {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = SyncHandle { tx };
    let mut transitions = monitor.subscribe();

    tokio::spawn(async move {
        let mut ticker = drain_interval.map(tokio::time::interval);
        loop {
            let should_drain = tokio::select! {
                transition = transitions.recv() => match transition {
                    Ok(Transition::WentOnline) => true,
                    Ok(Transition::WentOffline) => false,
                    // Missed transitions; the current state decides below.
                    Err(broadcast::error::RecvError::Lagged(_)) => true,
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                request = rx.recv() => match request {
                    Some(()) => true,
                    None => break,
                },
                _ = tick(&mut ticker) => true,
            };

            if should_drain && monitor.is_online() {
                if let Err(e) = engine.drain().await {
                    tracing::error!("drain pass failed: {}", e);
                }
            }
        }
        tracing::debug!("sync driver stopped");
    });

    handle
}

async fn tick(ticker: &mut Option<tokio::time::Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
