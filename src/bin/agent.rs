//! spendsync-agent: offline mutation queue and sync daemon.
//!
//! Opens the durable queue, probes the remote for connectivity, drains the
//! queue on reconnect, and serves a local HTTP surface for clients.

use clap::Parser;
use spendsync::{
    api::{self, ApiState},
    cli::AgentArgs,
    config::AgentConfig,
    connectivity::{self, ConnectivityMonitor},
    events::EventBus,
    queue::MutationQueue,
    recorder::MutationRecorder,
    sync::{spawn_driver, HttpRemote, RemoteApi, SyncEngine},
};
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let args = AgentArgs::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = match &args.config {
        Some(path) => match AgentConfig::load(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!("[agent] Failed to load config {:?}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => match &args.remote {
            Some(remote) => AgentConfig::new(remote.clone()),
            None => {
                tracing::error!("[agent] Either --config or --remote is required");
                std::process::exit(1);
            }
        },
    };
    if let Some(remote) = args.remote {
        config.remote_base_url = remote;
    }
    if let Some(database) = args.database {
        config.database_path = database;
    }
    if let Some(listen) = args.listen {
        config.listen_addr = listen;
    }
    if let Some(max_retries) = args.max_retries {
        config.max_retries = max_retries;
    }

    tracing::info!("[agent] Remote API: {}", config.remote_base_url);
    tracing::info!("[agent] Queue database: {:?}", config.database_path);

    let queue = match MutationQueue::open(&config.database_path) {
        Ok(q) => Arc::new(q),
        Err(e) => {
            tracing::error!("[agent] Failed to open queue database: {}", e);
            std::process::exit(1);
        }
    };
    match queue.count() {
        Ok(count) => tracing::info!("[agent] {} entries in queue at startup", count),
        Err(e) => {
            tracing::error!("[agent] Queue database is unreadable: {}", e);
            std::process::exit(1);
        }
    }

    // Start offline; the first probe tick corrects this within one interval.
    let monitor = Arc::new(ConnectivityMonitor::new(false));
    let events = EventBus::default();
    let remote: Arc<dyn RemoteApi> = match HttpRemote::new(config.request_timeout()) {
        Ok(r) => Arc::new(r),
        Err(e) => {
            tracing::error!("[agent] Failed to build HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    let engine = Arc::new(SyncEngine::new(
        queue.clone(),
        remote.clone(),
        events.clone(),
        config.max_retries,
    ));
    let sync = spawn_driver(engine.clone(), monitor.clone(), config.drain_interval());
    let recorder = Arc::new(MutationRecorder::new(
        queue.clone(),
        monitor.clone(),
        remote,
        sync.clone(),
    ));

    connectivity::spawn_probe(
        monitor.clone(),
        config.remote_base_url.clone(),
        config.probe_interval(),
    );

    let state = ApiState {
        queue,
        monitor,
        recorder,
        engine,
        sync,
        events,
        remote_base_url: config.remote_base_url.clone(),
    };
    let app = api::router(state);

    let listener = match tokio::net::TcpListener::bind(&config.listen_addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("[agent] Failed to bind {}: {}", config.listen_addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("[agent] Listening on {}", config.listen_addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            if let Err(e) = result {
                tracing::error!("[agent] Server error: {}", e);
            }
        }
        _ = signal::ctrl_c() => {
            tracing::info!("[agent] Received Ctrl+C, shutting down");
        }
    }
}
