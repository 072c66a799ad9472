//! Agent configuration: JSON file with per-field defaults, overridable from
//! the command line.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Base URL of the remote expense API.
    pub remote_base_url: String,
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    /// Address for the agent's local HTTP surface.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Replay attempts before a retryable failure becomes terminal.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// How often the connectivity probe runs.
    #[serde(default = "default_probe_interval_ms")]
    pub probe_interval_ms: u64,
    /// Periodic drain interval; 0 disables the timer (drains then happen only
    /// on reconnect and manual triggers).
    #[serde(default)]
    pub drain_interval_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./spendsync.redb")
}

fn default_listen_addr() -> String {
    "127.0.0.1:4600".to_string()
}

fn default_max_retries() -> u32 {
    crate::sync::engine::DEFAULT_MAX_RETRIES
}

fn default_probe_interval_ms() -> u64 {
    5000
}

fn default_request_timeout_ms() -> u64 {
    10000
}

impl AgentConfig {
    /// Config with defaults for everything but the remote URL.
    pub fn new(remote_base_url: impl Into<String>) -> Self {
        Self {
            remote_base_url: remote_base_url.into(),
            database_path: default_database_path(),
            listen_addr: default_listen_addr(),
            max_retries: default_max_retries(),
            probe_interval_ms: default_probe_interval_ms(),
            drain_interval_ms: 0,
            request_timeout_ms: default_request_timeout_ms(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }

    /// `None` when the periodic timer is disabled.
    pub fn drain_interval(&self) -> Option<Duration> {
        (self.drain_interval_ms > 0).then(|| Duration::from_millis(self.drain_interval_ms))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let json = r#"{
            "remote_base_url": "http://localhost:3000"
        }"#;
        let config: AgentConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.remote_base_url, "http://localhost:3000");
        assert_eq!(config.listen_addr, "127.0.0.1:4600");
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.drain_interval(), None);
    }

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            "remote_base_url": "https://expenses.example.com",
            "database_path": "/var/lib/spendsync/queue.redb",
            "listen_addr": "0.0.0.0:8080",
            "max_retries": 5,
            "probe_interval_ms": 2000,
            "drain_interval_ms": 60000,
            "request_timeout_ms": 3000
        }"#;
        let config: AgentConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.probe_interval(), Duration::from_secs(2));
        assert_eq!(config.drain_interval(), Some(Duration::from_secs(60)));
        assert_eq!(config.request_timeout(), Duration::from_secs(3));
    }
}
