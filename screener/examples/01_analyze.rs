mod common;
use common::build_screener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Build the screener (fixtures in CI when SCREENER_EXAMPLES_USE_MOCK is set).
    let screener = build_screener()?;

    // 2. Run every category agent and wait for the merged answer.
    let symbol = std::env::args().nth(1).unwrap_or_else(|| "AAPL".to_string());
    println!("Analysing {symbol}...");
    let resp = screener.analyze(&symbol).await?;

    // 3. Print the headline fields.
    println!(
        "{} ({}): price={:?} {} change={:?}%",
        resp.symbol,
        resp.company_name.as_deref().unwrap_or("?"),
        resp.price,
        resp.currency.as_deref().unwrap_or(""),
        resp.change_percent.map(|p| (p * 100.0).round() / 100.0),
    );
    println!("consensus: {:?}", resp.consensus_rating);
    println!(
        "sentiment: {:?} (confidence {:.2})",
        resp.sentiment_summary.overall_score, resp.sentiment_summary.confidence
    );
    println!("sources: {}", resp.data_sources.join(", "));

    Ok(())
}
