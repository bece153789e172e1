mod common;
use common::build_screener;
use futures::StreamExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=screener=debug shows per-attempt detail.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let screener = build_screener()?;
    let symbol = std::env::args().nth(1).unwrap_or_else(|| "MSFT".to_string());

    // Every event is one JSON line: task_completed in completion order, then final.
    let mut events = screener.stream(&symbol);
    while let Some(event) = events.next().await {
        println!("{}", serde_json::to_string(&event)?);
    }

    Ok(())
}
