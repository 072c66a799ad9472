//! spendsync-cmd: poke a running agent over its HTTP surface.
//!
//! Usage:
//!   spendsync-cmd status
//!   spendsync-cmd sync
//!   spendsync-cmd queue --failed
//!   spendsync-cmd retry 7

use clap::Parser;
use spendsync::cli::{CmdArgs, CmdCommand};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CmdArgs::parse();
    let client = reqwest::Client::new();
    let base = args.agent.trim_end_matches('/').to_string();

    match args.command {
        CmdCommand::Status => {
            let status: serde_json::Value = client
                .get(format!("{}/status", base))
                .send()
                .await?
                .json()
                .await?;
            println!("connected: {}", status["isConnected"]);
            println!("pending:   {}", status["count"]);
        }
        CmdCommand::Sync => {
            let response: serde_json::Value = client
                .post(format!("{}/sync", base))
                .send()
                .await?
                .json()
                .await?;
            println!("sync {}", response["status"].as_str().unwrap_or("?"));
        }
        CmdCommand::Queue { failed } => {
            let path = if failed { "/queue/failed" } else { "/queue" };
            let entries: Vec<serde_json::Value> = client
                .get(format!("{}{}", base, path))
                .send()
                .await?
                .json()
                .await?;
            if entries.is_empty() {
                println!("(empty)");
            }
            for entry in entries {
                println!(
                    "#{} {} {} retries={} state={}",
                    entry["id"],
                    entry["method"].as_str().unwrap_or("?"),
                    entry["url"].as_str().unwrap_or("?"),
                    entry["retry_count"],
                    entry["sync_state"].as_str().unwrap_or("?"),
                );
                if let Some(reason) = entry["failure_reason"].as_str() {
                    println!("    reason: {}", reason);
                }
            }
        }
        CmdCommand::Retry { id } => {
            let response = client
                .post(format!("{}/queue/{}/retry", base, id))
                .send()
                .await?;
            if response.status().is_success() {
                let body: serde_json::Value = response.json().await?;
                println!("requeued #{} as #{}", id, body["id"]);
            } else {
                println!("retry failed: {}", response.status());
            }
        }
        CmdCommand::Discard { id } => {
            client
                .delete(format!("{}/queue/{}", base, id))
                .send()
                .await?
                .error_for_status()?;
            println!("discarded #{}", id);
        }
    }

    Ok(())
}
