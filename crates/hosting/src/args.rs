use clap::Parser;
use commons_core::*;
use commons_gameroom::Settings;
use std::time::Duration;

/// Process configuration for the hosting server.
#[derive(Debug, Clone, Parser)]
#[command(name = "hosting", about = "Hosts live commons classroom sessions")]
pub struct Args {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:4001")]
    pub bind: String,
    /// Minimum spacing between debounced snapshots, in milliseconds.
    #[arg(long, env = "THROTTLE_MS", default_value_t = SNAPSHOT_THROTTLE_MS)]
    pub throttle_ms: u64,
    /// How long a completed session stays reachable, in seconds.
    #[arg(long, env = "LINGER_SECS", default_value_t = COMPLETE_LINGER)]
    pub linger_secs: u64,
    /// HTTP worker threads.
    #[arg(long, default_value_t = 4)]
    pub workers: usize,
}

impl Args {
    pub fn settings(&self) -> Settings {
        Settings {
            throttle: Duration::from_millis(self.throttle_ms),
            linger: Duration::from_secs(self.linger_secs),
        }
    }
}
