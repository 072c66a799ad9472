//! Notification channel: best-effort fan-out of sync outcomes.
//!
//! Delivery is fire-and-forget. Publishing with zero subscribers is fine,
//! and a slow or dropped listener only affects its own receiver. Events are
//! not persisted anywhere; the queue itself is the durable source of truth.

use crate::protocol::OutboundMessage;
use tokio::sync::broadcast;

/// Broadcast bus for sync events.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<OutboundMessage>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Broadcast an event to all current subscribers.
    pub fn publish(&self, message: OutboundMessage) {
        // Err only means nobody is listening right now; events may be lost.
        let _ = self.tx.send(message);
    }

    /// Register a new listener. Dropping the subscription unsubscribes.
    pub fn subscribe(&self) -> EventSubscription {
        EventSubscription {
            receiver: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

/// A live subscription to the event bus.
pub struct EventSubscription {
    receiver: broadcast::Receiver<OutboundMessage>,
}

impl EventSubscription {
    /// Receive the next event, waiting if necessary.
    pub async fn recv(&mut self) -> Result<OutboundMessage, broadcast::error::RecvError> {
        self.receiver.recv().await
    }

    /// Receive without waiting; used by tests and polling consumers.
    pub fn try_recv(&mut self) -> Result<OutboundMessage, broadcast::error::TryRecvError> {
        self.receiver.try_recv()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_publish_without_subscribers_is_fine() {
        let bus = EventBus::default();
        bus.publish(OutboundMessage::SyncStatus {
            total_processed: 0,
            success_count: 0,
            failure_count: 0,
        });
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_all_subscribers_see_each_event() {
        let bus = EventBus::default();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        let event = OutboundMessage::SyncCompleted {
            id: 1,
            data: json!({}),
        };
        bus.publish(event.clone());

        assert_eq!(first.recv().await.unwrap(), event);
        assert_eq!(second.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_dropped_subscriber_does_not_block_others() {
        let bus = EventBus::default();
        let first = bus.subscribe();
        let mut second = bus.subscribe();
        drop(first);

        bus.publish(OutboundMessage::SyncFailed {
            id: 2,
            error: "boom".to_string(),
            terminal: true,
        });

        assert!(second.recv().await.is_ok());
        assert_eq!(bus.subscriber_count(), 1);
    }
}
