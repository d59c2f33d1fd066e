//! Hosting Server Binary
//!
//! Runs the HTTP server for live classroom sessions.
//! Participants connect over WebSocket at `/ws`.

use clap::Parser;
use commons::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    log();
    kys();
    hosting::run(hosting::Args::parse()).await
}
