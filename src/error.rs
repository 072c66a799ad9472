//! Error taxonomy for the queue, recorder, and sync engine.

use thiserror::Error;

/// Errors from the local durable queue.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The underlying redb store is unavailable or corrupt.
    #[error("queue storage error: {0}")]
    Storage(#[from] redb::Error),
    /// The mutation id does not exist. Benign when it races a concurrent
    /// delete; callers that tolerate the race treat it as a no-op.
    #[error("mutation {0} not found")]
    NotFound(u64),
    /// A record could not be encoded or decoded.
    #[error("mutation codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

impl From<redb::DatabaseError> for QueueError {
    fn from(e: redb::DatabaseError) -> Self {
        QueueError::Storage(e.into())
    }
}

impl From<redb::TransactionError> for QueueError {
    fn from(e: redb::TransactionError) -> Self {
        QueueError::Storage(e.into())
    }
}

impl From<redb::TableError> for QueueError {
    fn from(e: redb::TableError) -> Self {
        QueueError::Storage(e.into())
    }
}

impl From<redb::StorageError> for QueueError {
    fn from(e: redb::StorageError) -> Self {
        QueueError::Storage(e.into())
    }
}

impl From<redb::CommitError> for QueueError {
    fn from(e: redb::CommitError) -> Self {
        QueueError::Storage(e.into())
    }
}

/// Why a single replay attempt failed.
///
/// Only `Network` and `Server` are worth another pass. Auth and validation
/// failures would reproduce on every retry, and a mutation without a stored
/// credential can never succeed (the engine never refreshes tokens).
#[derive(Debug, Clone, Error)]
pub enum ReplayError {
    /// Transport-level failure: DNS, refused connection, timeout.
    #[error("network error: {0}")]
    Network(String),
    /// The server rejected the stored credential (401).
    #[error("authorization rejected: {0}")]
    Auth(String),
    /// The server rejected the request itself (4xx other than 401).
    #[error("request rejected by server ({status}): {body}")]
    Validation { status: u16, body: String },
    /// The server failed transiently (5xx).
    #[error("server error ({status}): {body}")]
    Server { status: u16, body: String },
    /// The stored mutation carries no authorization credential.
    #[error("missing authorization credential")]
    MissingCredential,
}

impl ReplayError {
    /// Whether this failure may succeed on a later drain pass.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ReplayError::Network(_) | ReplayError::Server { .. })
    }
}

/// Errors surfaced by the recorder's direct-send path.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The server answered with an error status while we were online.
    /// Not queued: replaying it later would reproduce the same error.
    #[error("request rejected by server ({status}): {body}")]
    Rejected { status: u16, body: String },
    /// The mutation could not even be queued locally. The write is lost.
    #[error(transparent)]
    Storage(#[from] QueueError),
}
