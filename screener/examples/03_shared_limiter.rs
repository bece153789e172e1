use std::sync::Arc;
use std::time::Duration;

use screener::{Category, FallbackChain, RateLimitConfig, RateLimiter, Screener, SourceAdapter};
use screener_mock::FixtureSource;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // One provider quota of two calls per minute, shared by every request.
    let limiter = Arc::new(RateLimiter::with_quotas([(
        "fixtures",
        RateLimitConfig::per_minute(2),
    )]));
    let primary: Arc<dyn SourceAdapter> = Arc::new(FixtureSource::new());
    let chain = FallbackChain::new(Category::Price).with(primary)?;

    let screener = Screener::builder()
        .with_chain(chain)
        .rate_limiter(Arc::clone(&limiter))
        .request_timeout(Duration::from_secs(5))
        .build()?;

    // Concurrent requests share the bucket: the third one is denied locally.
    let (a, b, c) = tokio::join!(
        screener.analyze("AAPL"),
        screener.analyze("MSFT"),
        screener.analyze("NVDA"),
    );
    for resp in [a?, b?, c?] {
        println!("{:<5} price={:?} sources={:?}", resp.symbol, resp.price, resp.data_sources);
    }
    if let Some(state) = limiter.state("fixtures") {
        println!("fixtures bucket: {state:?}");
    }

    Ok(())
}
