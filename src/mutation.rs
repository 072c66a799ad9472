//! The queued mutation data model.
//!
//! A `QueuedMutation` is a durable record of one deferred write: enough of
//! the original HTTP request to reconstruct it verbatim at replay time, plus
//! the sync-lifecycle bookkeeping the engine maintains.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// HTTP verbs a mutation may carry. Reads are never queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sync lifecycle of a queued mutation.
///
/// Transitions are one-way: `Pending -> Synced` (then the record is deleted),
/// `Pending -> Pending` (failed attempt, will retry), or `Pending -> Failed`
/// (terminal, retained for user inspection).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    Pending,
    Synced,
    Failed,
}

/// A write operation waiting for replay, as persisted in the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedMutation {
    /// Monotonic id assigned at enqueue time. Doubles as insertion order.
    pub id: u64,
    pub url: String,
    pub method: HttpMethod,
    /// Ordered key-value pairs. Must include the bearer credential captured
    /// at enqueue time; the user's live session may not exist at replay time.
    pub headers: Vec<(String, String)>,
    /// Serialized payload; absent for DELETE.
    pub body: Option<String>,
    pub created_at: DateTime<Utc>,
    pub sync_state: SyncState,
    /// Failed replay attempts so far. Never decreases.
    pub retry_count: u32,
    /// Set when `sync_state` becomes `Failed`.
    pub failure_reason: Option<String>,
}

impl QueuedMutation {
    /// Look up a header value, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// The credential captured at enqueue time, if any non-empty one exists.
    pub fn authorization(&self) -> Option<&str> {
        self.header("authorization").filter(|v| !v.trim().is_empty())
    }
}

/// A mutation as handed to the queue, before an id is assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMutation {
    pub url: String,
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Partial update merged into an existing record by the sync engine.
#[derive(Debug, Clone, Default)]
pub struct MutationPatch {
    pub retry_count: Option<u32>,
    pub sync_state: Option<SyncState>,
    pub failure_reason: Option<String>,
}

impl MutationPatch {
    pub fn apply(&self, record: &mut QueuedMutation) {
        if let Some(retry_count) = self.retry_count {
            record.retry_count = retry_count;
        }
        if let Some(sync_state) = self.sync_state {
            record.sync_state = sync_state;
        }
        if let Some(ref reason) = self.failure_reason {
            record.failure_reason = Some(reason.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> QueuedMutation {
        QueuedMutation {
            id: 1,
            url: "http://localhost:3000/api/expenses/add".to_string(),
            method: HttpMethod::Post,
            headers: vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("Authorization".to_string(), "Bearer tok".to_string()),
            ],
            body: Some(r#"{"amount":12.5}"#.to_string()),
            created_at: Utc::now(),
            sync_state: SyncState::Pending,
            retry_count: 0,
            failure_reason: None,
        }
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let record = sample();
        assert_eq!(record.header("authorization"), Some("Bearer tok"));
        assert_eq!(record.header("AUTHORIZATION"), Some("Bearer tok"));
        assert_eq!(record.header("x-missing"), None);
    }

    #[test]
    fn test_blank_authorization_counts_as_missing() {
        let mut record = sample();
        record.headers = vec![("Authorization".to_string(), "   ".to_string())];
        assert_eq!(record.authorization(), None);
    }

    #[test]
    fn test_patch_merges_only_set_fields() {
        let mut record = sample();
        record.retry_count = 2;

        let patch = MutationPatch {
            sync_state: Some(SyncState::Failed),
            failure_reason: Some("network error".to_string()),
            ..Default::default()
        };
        patch.apply(&mut record);

        assert_eq!(record.retry_count, 2);
        assert_eq!(record.sync_state, SyncState::Failed);
        assert_eq!(record.failure_reason.as_deref(), Some("network error"));
    }

    #[test]
    fn test_method_serializes_as_http_verb() {
        assert_eq!(
            serde_json::to_string(&HttpMethod::Delete).unwrap(),
            r#""DELETE""#
        );
        let method: HttpMethod = serde_json::from_str(r#""PUT""#).unwrap();
        assert_eq!(method, HttpMethod::Put);
    }
}
