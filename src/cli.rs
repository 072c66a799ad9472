//! Command-line argument definitions for the spendsync binaries.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Arguments for spendsync-agent.
#[derive(Parser, Debug)]
#[command(
    name = "spendsync-agent",
    about = "Offline mutation queue and sync agent"
)]
pub struct AgentArgs {
    /// Path to a JSON config file
    #[arg(long, env = "SPENDSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base URL of the remote expense API
    #[arg(long, env = "SPENDSYNC_REMOTE")]
    pub remote: Option<String>,

    /// Path to the queue database
    #[arg(long)]
    pub database: Option<PathBuf>,

    /// Address for the agent's HTTP surface
    #[arg(long)]
    pub listen: Option<String>,

    /// Replay attempts before an entry is marked failed
    #[arg(long)]
    pub max_retries: Option<u32>,
}

/// Arguments for spendsync-cmd.
#[derive(Parser, Debug)]
#[command(name = "spendsync-cmd", about = "Talk to a running spendsync agent")]
pub struct CmdArgs {
    /// Agent base URL
    #[arg(long, default_value = "http://127.0.0.1:4600")]
    pub agent: String,

    #[command(subcommand)]
    pub command: CmdCommand,
}

#[derive(Subcommand, Debug)]
pub enum CmdCommand {
    /// Show connectivity and pending-queue status
    Status,
    /// Ask the agent to drain the queue now
    Sync,
    /// List queue entries
    Queue {
        /// Show failed entries instead of pending ones
        #[arg(long)]
        failed: bool,
    },
    /// Re-queue a failed entry for another attempt
    Retry { id: u64 },
    /// Discard a queue entry
    Discard { id: u64 },
}
