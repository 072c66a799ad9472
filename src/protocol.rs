//! Typed message contract between foreground clients and the sync agent.
//!
//! Replaces loose `{ type: "..." }` string switching with closed tagged
//! variants that are matched exhaustively at the dispatch site. Tags are
//! SCREAMING_SNAKE_CASE on the wire to stay compatible with existing clients.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The expense fields captured by the quick-add form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpensePayload {
    pub amount: f64,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Messages a client may send to the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InboundMessage {
    /// Drain the queue now; coalesced with automatic triggers.
    TriggerSync,
    /// Queue (or directly send) an expense write, capturing the bearer
    /// credential for replay.
    StoreOfflineExpense {
        expense: ExpensePayload,
        token: String,
    },
    /// Service-worker lifecycle message accepted for client compatibility.
    /// The agent has no waiting worker, so it is ignored.
    SkipWaiting,
}

/// Events the agent publishes about sync outcomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutboundMessage {
    /// One queue entry was replayed successfully and removed.
    SyncCompleted { id: u64, data: Value },
    /// One replay attempt failed. `terminal` distinguishes "will retry on a
    /// later pass" from "gave up, entry is now Failed".
    SyncFailed {
        id: u64,
        error: String,
        terminal: bool,
    },
    /// Summary of one full drain pass.
    SyncStatus {
        total_processed: u64,
        success_count: u64,
        failure_count: u64,
    },
}

impl OutboundMessage {
    /// The wire tag, used as the SSE event name.
    pub fn tag(&self) -> &'static str {
        match self {
            OutboundMessage::SyncCompleted { .. } => "SYNC_COMPLETED",
            OutboundMessage::SyncFailed { .. } => "SYNC_FAILED",
            OutboundMessage::SyncStatus { .. } => "SYNC_STATUS",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_inbound_tags_round_trip() {
        let trigger: InboundMessage = serde_json::from_value(json!({
            "type": "TRIGGER_SYNC"
        }))
        .unwrap();
        assert_eq!(trigger, InboundMessage::TriggerSync);

        let store: InboundMessage = serde_json::from_value(json!({
            "type": "STORE_OFFLINE_EXPENSE",
            "expense": { "amount": 12.5, "description": "Coffee" },
            "token": "tok-1"
        }))
        .unwrap();
        match store {
            InboundMessage::StoreOfflineExpense { expense, token } => {
                assert_eq!(expense.amount, 12.5);
                assert_eq!(expense.description, "Coffee");
                assert_eq!(expense.category, None);
                assert_eq!(token, "tok-1");
            }
            other => panic!("expected StoreOfflineExpense, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_inbound_type_is_rejected() {
        let result: Result<InboundMessage, _> = serde_json::from_value(json!({
            "type": "CACHE_UPDATED"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_outbound_serializes_with_wire_tag() {
        let event = OutboundMessage::SyncCompleted {
            id: 3,
            data: json!({ "amount": 12.5 }),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "SYNC_COMPLETED");
        assert_eq!(value["id"], 3);
        assert_eq!(value["data"]["amount"], 12.5);
        assert_eq!(event.tag(), "SYNC_COMPLETED");
    }

    #[test]
    fn test_sync_failed_carries_terminal_flag() {
        let event = OutboundMessage::SyncFailed {
            id: 9,
            error: "network error: connection refused".to_string(),
            terminal: false,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "SYNC_FAILED");
        assert_eq!(value["terminal"], false);

        let back: OutboundMessage = serde_json::from_value(value).unwrap();
        assert_eq!(back, event);
    }
}
