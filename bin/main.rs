//! BOPS CLI Entry Point
//!
//! This binary replays agent event streams into readable transcripts.

use std::process;

#[tokio::main]
async fn main() {
    if let Err(e) = bops_interface::run_cli().await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
