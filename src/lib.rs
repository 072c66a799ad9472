//! spendsync: offline mutation queue and synchronization agent for the
//! expense tracker's remote API.
//!
//! A write that cannot reach the server is persisted as a
//! [`mutation::QueuedMutation`] in the durable [`queue::MutationQueue`]. When
//! the [`connectivity::ConnectivityMonitor`] reports the network back, the
//! [`sync::SyncEngine`] replays queued writes in insertion order, with retry
//! bookkeeping and failure quarantine, and publishes outcomes on the
//! [`events::EventBus`].

pub mod api;
pub mod cli;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod events;
pub mod mutation;
pub mod protocol;
pub mod queue;
pub mod recorder;
pub mod sse;
pub mod sync;

pub use config::AgentConfig;
pub use connectivity::{ConnectivityMonitor, Transition};
pub use error::{QueueError, ReplayError, SubmitError};
pub use events::{EventBus, EventSubscription};
pub use mutation::{HttpMethod, MutationPatch, NewMutation, QueuedMutation, SyncState};
pub use protocol::{ExpensePayload, InboundMessage, OutboundMessage};
pub use queue::MutationQueue;
pub use recorder::{MutationRecorder, SubmitOutcome, WriteRequest};
pub use sync::{
    spawn_driver, DrainOutcome, DrainSummary, HttpRemote, NetworkFailure, RemoteApi,
    RemoteResponse, ReplayRequest, SyncEngine, SyncHandle,
};
