//! Queue draining against the remote expense API.
//!
//! [`engine::SyncEngine`] owns the drain state machine; [`remote::RemoteApi`]
//! is the seam through which reconstructed requests reach the server.

pub mod engine;
pub mod remote;

pub use engine::{spawn_driver, DrainOutcome, DrainSummary, SyncEngine, SyncHandle};
pub use remote::{HttpRemote, NetworkFailure, RemoteApi, RemoteResponse, ReplayRequest};
