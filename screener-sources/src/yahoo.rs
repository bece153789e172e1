//! Yahoo Finance chart adapter.
//!
//! One `v8/finance/chart` call over a one-year daily range yields the latest
//! price, the 52-week range and the instrument's identity from `meta`. No key
//! is required.

use async_trait::async_trait;
use reqwest::Client;
use screener_core::{
    CompanyInfo, CompanyInfoSource, FinancialMetrics, FundamentalsSource, PriceData, PriceSource,
    SourceAdapter, SourceError, Symbol,
};
use serde::Deserialize;

use crate::http::{non_empty, send_json};

const BASE_URL: &str = "https://query2.finance.yahoo.com";
const NAME: &str = "yahoo_finance";

/// Yahoo Finance chart adapter.
#[derive(Clone)]
pub struct YahooFinance {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Meta,
    #[serde(default)]
    indicators: Option<Indicators>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Meta {
    currency: Option<String>,
    exchange_name: Option<String>,
    full_exchange_name: Option<String>,
    long_name: Option<String>,
    short_name: Option<String>,
    regular_market_price: Option<f64>,
    previous_close: Option<f64>,
    chart_previous_close: Option<f64>,
    regular_market_volume: Option<u64>,
    fifty_two_week_high: Option<f64>,
    fifty_two_week_low: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteSeries {
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

struct Chart {
    meta: Meta,
    series: QuoteSeries,
}

impl Chart {
    fn closes(&self) -> Vec<f64> {
        self.series.close.iter().flatten().copied().collect()
    }

    /// Prior session close: second-to-last bar, else what `meta` reports.
    fn previous_close(&self) -> Option<f64> {
        let closes = self.closes();
        closes
            .len()
            .checked_sub(2)
            .and_then(|i| closes.get(i).copied())
            .or(self.meta.previous_close)
            .or(self.meta.chart_previous_close)
    }

    fn range(&self) -> (Option<f64>, Option<f64>) {
        let high = self
            .meta
            .fifty_two_week_high
            .or_else(|| self.series.high.iter().flatten().copied().reduce(f64::max));
        let low = self
            .meta
            .fifty_two_week_low
            .or_else(|| self.series.low.iter().flatten().copied().reduce(f64::min));
        (high, low)
    }
}

impl YahooFinance {
    /// Adapter over `client`.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: BASE_URL.to_string(),
        }
    }

    /// Point the adapter at another host (tests, proxies).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[tracing::instrument(
        name = "screener::sources::yahoo::chart",
        skip(self),
        fields(symbol = %symbol),
    )]
    async fn chart(&self, symbol: &Symbol) -> Result<Chart, SourceError> {
        let req = self
            .client
            .get(format!("{}/v8/finance/chart/{}", self.base_url, symbol))
            .query(&[("range", "1y"), ("interval", "1d")]);
        let resp: ChartResponse = send_json(NAME, req).await?;
        parse_chart(symbol, resp)
    }
}

fn parse_chart(symbol: &Symbol, resp: ChartResponse) -> Result<Chart, SourceError> {
    if let Some(err) = resp.chart.error {
        if err.code == "Not Found" {
            return Err(SourceError::not_found(NAME, format!("chart for {symbol}")));
        }
        return Err(SourceError::invalid(
            NAME,
            format!("{}: {}", err.code, err.description.unwrap_or_default()),
        ));
    }
    let data = resp
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| SourceError::not_found(NAME, format!("empty chart for {symbol}")))?;
    let series = data
        .indicators
        .and_then(|i| i.quote.into_iter().next())
        .unwrap_or_default();
    Ok(Chart {
        meta: data.meta,
        series,
    })
}

#[async_trait]
impl PriceSource for YahooFinance {
    async fn price(&self, symbol: &Symbol) -> Result<PriceData, SourceError> {
        let chart = self.chart(symbol).await?;
        let price = chart
            .meta
            .regular_market_price
            .or_else(|| chart.closes().last().copied())
            .ok_or_else(|| SourceError::not_found(NAME, format!("price for {symbol}")))?;
        let previous_close = chart.previous_close();
        let change = previous_close.map(|pc| price - pc);
        let change_percent = previous_close
            .filter(|pc| *pc != 0.0)
            .map(|pc| (price - pc) / pc * 100.0);
        let volume = chart
            .meta
            .regular_market_volume
            .or_else(|| chart.series.volume.iter().rev().flatten().next().copied());
        Ok(PriceData {
            currency: chart.meta.currency.clone(),
            change,
            change_percent,
            previous_close,
            volume,
            ..PriceData::new(price)
        })
    }
}

#[async_trait]
impl FundamentalsSource for YahooFinance {
    async fn fundamentals(&self, symbol: &Symbol) -> Result<FinancialMetrics, SourceError> {
        let (high, low) = self.chart(symbol).await?.range();
        Ok(FinancialMetrics {
            fifty_two_week_high: high,
            fifty_two_week_low: low,
            ..FinancialMetrics::default()
        })
    }
}

#[async_trait]
impl CompanyInfoSource for YahooFinance {
    async fn company_info(&self, symbol: &Symbol) -> Result<CompanyInfo, SourceError> {
        let meta = self.chart(symbol).await?.meta;
        let name = non_empty(meta.long_name)
            .or_else(|| non_empty(meta.short_name))
            .ok_or_else(|| SourceError::not_found(NAME, format!("name for {symbol}")))?;
        Ok(CompanyInfo {
            name,
            exchange: non_empty(meta.full_exchange_name).or_else(|| non_empty(meta.exchange_name)),
            currency: non_empty(meta.currency),
            ..CompanyInfo::default()
        })
    }
}

impl SourceAdapter for YahooFinance {
    fn name(&self) -> &'static str {
        NAME
    }

    fn as_price_source(&self) -> Option<&dyn PriceSource> {
        Some(self as &dyn PriceSource)
    }
    fn as_fundamentals_source(&self) -> Option<&dyn FundamentalsSource> {
        Some(self as &dyn FundamentalsSource)
    }
    fn as_company_info_source(&self) -> Option<&dyn CompanyInfoSource> {
        Some(self as &dyn CompanyInfoSource)
    }
}
