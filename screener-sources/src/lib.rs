//! screener-sources
//!
//! HTTP adapters for the screener engine.
//!
//! | Adapter            | Categories                                   | Key               |
//! |--------------------|----------------------------------------------|-------------------|
//! | `alpha_vantage`    | price, fundamentals, analyst, company_info   | `ALPHA_VANTAGE_KEY` |
//! | `yahoo_finance`    | price, fundamentals, company_info            | none              |
//! | `finnhub`          | price, fundamentals, analyst, company_info   | `FINNHUB_KEY`     |
//! | `newsapi`          | sentiment                                    | `NEWSAPI_KEY`     |
//! | `openai_sentiment` | sentiment                                    | `OPENAI_API_KEY` + `NEWSAPI_KEY` |
//! | `rss_news`         | sentiment                                    | none              |
//!
//! [`standard_chains`] wires them into the default fallback order and
//! [`standard_quotas`] gives the matching per-provider rate limits.
#![warn(missing_docs)]

use std::sync::Arc;
use std::time::Duration;

use screener_core::{
    Category, FallbackChain, RateLimitConfig, RateLimiter, ScreenerError, Settings, SourceAdapter,
};

mod alpha_vantage;
mod finnhub;
/// Shared HTTP plumbing: client construction and status classification.
pub mod http;
mod newsapi;
mod openai;
mod rss;
/// Offline sentiment scorers.
pub mod scoring;
mod yahoo;

pub use alpha_vantage::AlphaVantage;
pub use finnhub::Finnhub;
pub use newsapi::{NewsApi, NewsArticle};
pub use openai::{OpenAiConfig, OpenAiSentiment};
pub use rss::{DEFAULT_FEEDS, RssNews};
pub use yahoo::YahooFinance;

/// Default per-provider quotas, keyed by adapter provider.
#[must_use]
pub fn standard_quotas() -> Vec<(&'static str, RateLimitConfig)> {
    vec![
        ("alpha_vantage", RateLimitConfig::per_minute(5)),
        ("finnhub", RateLimitConfig::per_minute(60)),
        ("yahoo_finance", RateLimitConfig::per_minute(60)),
        ("newsapi", RateLimitConfig::new(100, Duration::from_secs(86_400))),
        ("openai", RateLimitConfig::per_minute(60)),
    ]
}

/// Fallback chains for every category, built from `settings`.
///
/// Adapters whose key is absent are left out; a category may end up with an
/// empty chain, in which case its agent fails as exhausted. `limiter` must be
/// the one handed to the screener: composite adapters charge their inner
/// calls against it.
///
/// # Errors
/// `Config` when the HTTP client cannot be built.
pub fn standard_chains(
    settings: &Settings,
    limiter: &Arc<RateLimiter>,
) -> Result<Vec<FallbackChain>, ScreenerError> {
    let client = http::build_client(settings.http_timeout)?;

    let yahoo: Arc<dyn SourceAdapter> = Arc::new(YahooFinance::new(client.clone()));
    let alpha: Option<Arc<dyn SourceAdapter>> = settings
        .alpha_vantage_key
        .clone()
        .map(|k| Arc::new(AlphaVantage::new(client.clone(), k)) as Arc<dyn SourceAdapter>);
    let finnhub: Option<Arc<dyn SourceAdapter>> = settings
        .finnhub_key
        .clone()
        .map(|k| Arc::new(Finnhub::new(client.clone(), k)) as Arc<dyn SourceAdapter>);
    let news = settings.newsapi_key.clone().map(|k| {
        NewsApi::new(
            client.clone(),
            k,
            settings.news_days_back,
            settings.max_news_articles,
        )
    });
    let llm: Option<Arc<dyn SourceAdapter>> = match (&news, &settings.openai_api_key) {
        (Some(news), Some(key)) if settings.openai_sentiment_enabled() => {
            Some(Arc::new(OpenAiSentiment::new(
                news.clone(),
                client.clone(),
                key.clone(),
                OpenAiConfig {
                    model: settings.openai_model.clone(),
                    temperature: settings.sentiment_temperature,
                },
            )
            .with_rate_limiter(Arc::clone(limiter))))
        }
        _ => None,
    };
    let news: Option<Arc<dyn SourceAdapter>> =
        news.map(|n| Arc::new(n) as Arc<dyn SourceAdapter>);
    let rss: Arc<dyn SourceAdapter> =
        Arc::new(RssNews::new(client.clone(), settings.max_news_articles));

    let order = |category: Category| -> Vec<Option<Arc<dyn SourceAdapter>>> {
        match category {
            Category::Price => vec![alpha.clone(), Some(yahoo.clone()), finnhub.clone()],
            Category::Fundamentals => vec![Some(yahoo.clone()), alpha.clone(), finnhub.clone()],
            Category::Analyst => vec![finnhub.clone(), alpha.clone()],
            Category::Sentiment => vec![llm.clone(), news.clone(), Some(rss.clone())],
            Category::CompanyInfo => vec![Some(yahoo.clone()), finnhub.clone(), alpha.clone()],
        }
    };

    Category::ALL
        .into_iter()
        .map(|category| {
            order(category)
                .into_iter()
                .flatten()
                .try_fold(FallbackChain::new(category), FallbackChain::with)
        })
        .collect()
}
