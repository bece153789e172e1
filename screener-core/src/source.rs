use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;

use crate::Symbol;
use screener_types::{
    AnalystData, Category, CategoryPayload, CompanyInfo, FinancialMetrics, PriceData,
    SentimentData, SourceError,
};

/// Focused role trait for adapters that provide a price quote.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetch the latest price for the symbol.
    async fn price(&self, symbol: &Symbol) -> Result<PriceData, SourceError>;
}

/// Focused role trait for adapters that provide fundamentals.
#[async_trait]
pub trait FundamentalsSource: Send + Sync {
    /// Fetch valuation and profitability metrics for the symbol.
    async fn fundamentals(&self, symbol: &Symbol) -> Result<FinancialMetrics, SourceError>;
}

/// Focused role trait for adapters that provide analyst ratings and earnings.
#[async_trait]
pub trait AnalystSource: Send + Sync {
    /// Fetch analyst ratings, recommendation counts and earnings for the symbol.
    async fn analyst(&self, symbol: &Symbol) -> Result<AnalystData, SourceError>;
}

/// Focused role trait for adapters that provide scored news sentiment.
#[async_trait]
pub trait SentimentSource: Send + Sync {
    /// Fetch and score recent articles about the symbol.
    async fn sentiment(&self, symbol: &Symbol) -> Result<SentimentData, SourceError>;
}

/// Focused role trait for adapters that provide company identity.
#[async_trait]
pub trait CompanyInfoSource: Send + Sync {
    /// Fetch company name and classification for the symbol.
    async fn company_info(&self, symbol: &Symbol) -> Result<CompanyInfo, SourceError>;
}

/// A single external provider integration.
///
/// An adapter performs exactly one attempt per call: it maps the provider's
/// response into the category shape and classifies every failure into a
/// [`SourceError`]. Retrying, fallback and rate limiting belong to the caller.
///
/// Capabilities are advertised through the `as_*_source` accessors; the
/// defaults report the capability as unsupported.
pub trait SourceAdapter: Send + Sync {
    /// Adapter name, reported in `data_sources` (e.g. `alpha_vantage`).
    fn name(&self) -> &'static str;

    /// Rate-limit key. Adapters hitting the same upstream share a bucket.
    fn provider(&self) -> &'static str {
        self.name()
    }

    /// Advertise price capability.
    fn as_price_source(&self) -> Option<&dyn PriceSource> {
        None
    }
    /// Advertise fundamentals capability.
    fn as_fundamentals_source(&self) -> Option<&dyn FundamentalsSource> {
        None
    }
    /// Advertise analyst capability.
    fn as_analyst_source(&self) -> Option<&dyn AnalystSource> {
        None
    }
    /// Advertise sentiment capability.
    fn as_sentiment_source(&self) -> Option<&dyn SentimentSource> {
        None
    }
    /// Advertise company-info capability.
    fn as_company_info_source(&self) -> Option<&dyn CompanyInfoSource> {
        None
    }

    /// Whether the adapter can serve `category`.
    fn supports(&self, category: Category) -> bool {
        match category {
            Category::Price => self.as_price_source().is_some(),
            Category::Fundamentals => self.as_fundamentals_source().is_some(),
            Category::Analyst => self.as_analyst_source().is_some(),
            Category::Sentiment => self.as_sentiment_source().is_some(),
            Category::CompanyInfo => self.as_company_info_source().is_some(),
        }
    }
}

/// Build the future for one `category` call against `adapter`.
///
/// Returns `None` when the adapter does not advertise the capability.
pub fn fetch_category<'a>(
    adapter: &'a dyn SourceAdapter,
    category: Category,
    symbol: &'a Symbol,
) -> Option<BoxFuture<'a, Result<CategoryPayload, SourceError>>> {
    match category {
        Category::Price => adapter
            .as_price_source()
            .map(|s| async move { s.price(symbol).await.map(CategoryPayload::Price) }.boxed()),
        Category::Fundamentals => adapter.as_fundamentals_source().map(|s| {
            async move {
                s.fundamentals(symbol)
                    .await
                    .map(CategoryPayload::Fundamentals)
            }
            .boxed()
        }),
        Category::Analyst => adapter
            .as_analyst_source()
            .map(|s| async move { s.analyst(symbol).await.map(CategoryPayload::Analyst) }.boxed()),
        Category::Sentiment => adapter.as_sentiment_source().map(|s| {
            async move { s.sentiment(symbol).await.map(CategoryPayload::Sentiment) }.boxed()
        }),
        Category::CompanyInfo => adapter.as_company_info_source().map(|s| {
            async move {
                s.company_info(symbol)
                    .await
                    .map(CategoryPayload::CompanyInfo)
            }
            .boxed()
        }),
    }
}

/// Wrap a source future with the per-call timeout and standardized timeout mapping.
#[tracing::instrument(
    name = "screener::core::call_with_timeout",
    skip(fut),
    fields(
        provider = provider,
        timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
    ),
)]
pub async fn call_with_timeout<T, Fut>(
    provider: &'static str,
    timeout: Duration,
    fut: Fut,
) -> Result<T, SourceError>
where
    Fut: core::future::Future<Output = Result<T, SourceError>>,
{
    (tokio::time::timeout(timeout, fut).await).unwrap_or_else(|_| Err(SourceError::timeout(provider)))
}
