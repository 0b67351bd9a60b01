//! Take-every vs take-latest
//!
//! Dispatches five requests back to back, then one more after the backend
//! has already served its single success, and prints every state the store
//! goes through.
//!
//! Run with:
//!   cargo run --example take_every_vs_latest -- --policy every
//!   cargo run --example take_every_vs_latest -- --policy latest
//!
//! Set `RUST_LOG=request_saga=debug` to see the sequencer's decisions.

use clap::Parser;
use request_saga::{Policy, RequestState, SequencerConfig, ServedFlag, Store};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "take_every_vs_latest",
    about = "Compare the every and latest request policies"
)]
struct Cli {
    /// Concurrency policy: `every` or `latest`
    #[arg(long, default_value = "every")]
    policy: Policy,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let policy = Cli::parse().policy;

    println!("=== Policy: {policy} ===\n");

    let store = Store::builder()
        .config(SequencerConfig::with_policy(policy))
        .simulated(Arc::new(ServedFlag::new()))
        .subscribe(|state: &RequestState| match serde_json::to_string(state) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("failed to render state: {e}"),
        })
        .build()?;

    for i in 1..=5 {
        store.request(format!("request{i}"))?;
    }

    tokio::time::sleep(Duration::from_millis(1500)).await;
    store.request("hoge")?;

    store.settled().await;

    println!("\nFinal state: {:?}", store.state());
    Ok(())
}
