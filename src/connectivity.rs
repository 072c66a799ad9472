//! Connectivity monitor: tracks the last known network-presence signal.
//!
//! The monitor believes whatever it is fed through [`ConnectivityMonitor::set_online`];
//! it does not verify server reachability itself. A false "online" reading
//! (captive portal, stale probe) is tolerated because the sync engine's own
//! request failures are the backstop.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};

/// One offline-to-online or online-to-offline flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    WentOnline,
    WentOffline,
}

pub struct ConnectivityMonitor {
    state: watch::Sender<bool>,
    transitions: broadcast::Sender<Transition>,
}

impl ConnectivityMonitor {
    pub fn new(initially_online: bool) -> Self {
        let (state, _) = watch::channel(initially_online);
        let (transitions, _) = broadcast::channel(16);
        Self { state, transitions }
    }

    /// Last known reachability.
    pub fn is_online(&self) -> bool {
        *self.state.borrow()
    }

    /// Feed the latest reachability signal.
    ///
    /// Repeated signals of the same state are absorbed; each actual flip
    /// emits exactly one transition event.
    pub fn set_online(&self, online: bool) {
        let changed = self.state.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
        if changed {
            let transition = if online {
                Transition::WentOnline
            } else {
                Transition::WentOffline
            };
            tracing::info!(online, "connectivity transition");
            let _ = self.transitions.send(transition);
        }
    }

    /// Watch the current boolean state (for status reporting).
    pub fn watch(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }

    /// Subscribe to transition events.
    pub fn subscribe(&self) -> broadcast::Receiver<Transition> {
        self.transitions.subscribe()
    }
}

/// Periodically probe the remote host with a TCP connect and feed the result
/// to the monitor.
///
/// This stands in for a platform's network-presence signal: it checks that
/// the host answers on its port, not that the API behaves.
pub fn spawn_probe(
    monitor: Arc<ConnectivityMonitor>,
    remote_url: String,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let Some(target) = probe_target(&remote_url) else {
            tracing::error!(
                "cannot derive probe target from '{}', connectivity probe disabled",
                remote_url
            );
            return;
        };
        tracing::info!("probing connectivity against {}", target);
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let reachable = tokio::time::timeout(
                Duration::from_secs(3),
                tokio::net::TcpStream::connect(&target),
            )
            .await
            .map(|result| result.is_ok())
            .unwrap_or(false);
            monitor.set_online(reachable);
        }
    })
}

/// Derive "host:port" from an http(s) base URL.
fn probe_target(remote_url: &str) -> Option<String> {
    let (rest, default_port) = remote_url
        .strip_prefix("https://")
        .map(|rest| (rest, 443u16))
        .or_else(|| remote_url.strip_prefix("http://").map(|rest| (rest, 80u16)))?;
    let host_port = rest.split('/').next()?;
    if host_port.is_empty() {
        return None;
    }
    if host_port.contains(':') {
        Some(host_port.to_string())
    } else {
        Some(format!("{}:{}", host_port, default_port))
    }
}
