use std::sync::Arc;

use screener::{Category, EngineConfig, FallbackChain, RateLimiter, Screener, Settings, SourceAdapter};

/// Screener wired from the environment, or from fixtures when
/// `SCREENER_EXAMPLES_USE_MOCK` is set.
pub fn build_screener() -> Result<Screener, Box<dyn std::error::Error>> {
    if std::env::var("SCREENER_EXAMPLES_USE_MOCK").is_ok() {
        println!("--- (Using fixture sources for CI) ---");
        let fixtures: Arc<dyn SourceAdapter> = Arc::new(screener_mock::FixtureSource::new());
        let chains = Category::ALL
            .into_iter()
            .map(|c| FallbackChain::new(c).with(Arc::clone(&fixtures)))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Screener::builder()
            .with_chains(chains)
            .config(EngineConfig::default())
            .build()?);
    }

    let _ = dotenvy::dotenv();
    let settings = Settings::from_env()?;
    let limiter = Arc::new(RateLimiter::with_quotas(screener_sources::standard_quotas()));
    Ok(Screener::builder()
        .with_chains(screener_sources::standard_chains(&settings, &limiter)?)
        .rate_limiter(limiter)
        .config(settings.engine_config())
        .build()?)
}
