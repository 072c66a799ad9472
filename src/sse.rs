//! SSE fan-out of sync events to foreground clients.

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;

use crate::api::ApiState;

/// Stream outbound sync events as SSE. The event name is the message's wire
/// tag and the data its JSON encoding.
pub async fn subscribe(
    State(state): State<ApiState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut subscription = state.events.subscribe();

    let stream = async_stream::stream! {
        loop {
            match subscription.recv().await {
                Ok(message) => match serde_json::to_string(&message) {
                    Ok(data) => yield Ok(Event::default().event(message.tag()).data(data)),
                    Err(e) => tracing::warn!("failed to encode sync event: {}", e),
                },
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    // The queue is the durable truth; dropped events are lost
                    // to this listener only.
                    tracing::warn!(skipped, "sse subscriber lagged, events dropped");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}
