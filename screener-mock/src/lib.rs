//! In-memory source adapters for tests and offline demos.
//!
//! - [`FixtureSource`] serves deterministic data for a handful of symbols.
//! - [`MockSource`] is scripted per category for orchestration tests.

use std::time::Duration;

use async_trait::async_trait;
use screener_core::{
    AnalystData, AnalystSource, CompanyInfo, CompanyInfoSource, FinancialMetrics,
    FundamentalsSource, PriceData, PriceSource, SentimentData, SentimentSource, SourceAdapter,
    SourceError, Symbol,
};

pub mod fixtures;
mod scripted;

pub use scripted::{MockBehavior, MockSource};

/// Fixture-backed adapter for CI-safe demos.
///
/// The symbol `FAIL` yields a retryable server error for every category and
/// `SLOW` answers after a two second stall.
#[derive(Debug, Clone, Copy)]
pub struct FixtureSource {
    name: &'static str,
}

impl Default for FixtureSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FixtureSource {
    /// Adapter named `fixtures`.
    #[must_use]
    pub const fn new() -> Self {
        Self { name: "fixtures" }
    }

    /// Same data under another adapter name.
    #[must_use]
    pub const fn named(name: &'static str) -> Self {
        Self { name }
    }

    async fn gate(&self, symbol: &Symbol, what: &'static str) -> Result<(), SourceError> {
        match symbol.as_str() {
            "FAIL" => Err(SourceError::InvalidResponse {
                provider: self.name.to_string(),
                msg: format!("forced failure: {what}"),
                status: Some(503),
            }),
            "SLOW" => {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn not_found(&self, what: &str, symbol: &Symbol) -> SourceError {
        SourceError::not_found(self.name, format!("{what} for {symbol}"))
    }
}

#[async_trait]
impl PriceSource for FixtureSource {
    async fn price(&self, symbol: &Symbol) -> Result<PriceData, SourceError> {
        self.gate(symbol, "price").await?;
        fixtures::quotes::by_symbol(symbol.as_str()).ok_or_else(|| self.not_found("price", symbol))
    }
}

#[async_trait]
impl FundamentalsSource for FixtureSource {
    async fn fundamentals(&self, symbol: &Symbol) -> Result<FinancialMetrics, SourceError> {
        self.gate(symbol, "fundamentals").await?;
        fixtures::fundamentals::by_symbol(symbol.as_str())
            .ok_or_else(|| self.not_found("fundamentals", symbol))
    }
}

#[async_trait]
impl AnalystSource for FixtureSource {
    async fn analyst(&self, symbol: &Symbol) -> Result<AnalystData, SourceError> {
        self.gate(symbol, "analyst").await?;
        fixtures::analysis::by_symbol(symbol.as_str())
            .ok_or_else(|| self.not_found("analyst data", symbol))
    }
}

#[async_trait]
impl SentimentSource for FixtureSource {
    async fn sentiment(&self, symbol: &Symbol) -> Result<SentimentData, SourceError> {
        self.gate(symbol, "sentiment").await?;
        fixtures::news::by_symbol(symbol.as_str()).ok_or_else(|| self.not_found("news", symbol))
    }
}

#[async_trait]
impl CompanyInfoSource for FixtureSource {
    async fn company_info(&self, symbol: &Symbol) -> Result<CompanyInfo, SourceError> {
        self.gate(symbol, "company_info").await?;
        fixtures::profile::by_symbol(symbol.as_str())
            .ok_or_else(|| self.not_found("profile", symbol))
    }
}

impl SourceAdapter for FixtureSource {
    fn name(&self) -> &'static str {
        self.name
    }

    fn as_price_source(&self) -> Option<&dyn PriceSource> {
        Some(self as &dyn PriceSource)
    }
    fn as_fundamentals_source(&self) -> Option<&dyn FundamentalsSource> {
        Some(self as &dyn FundamentalsSource)
    }
    fn as_analyst_source(&self) -> Option<&dyn AnalystSource> {
        Some(self as &dyn AnalystSource)
    }
    fn as_sentiment_source(&self) -> Option<&dyn SentimentSource> {
        Some(self as &dyn SentimentSource)
    }
    fn as_company_info_source(&self) -> Option<&dyn CompanyInfoSource> {
        Some(self as &dyn CompanyInfoSource)
    }
}
