//! Finnhub adapter: quote, basic financials, recommendation trends and profile.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use screener_core::{
    AnalystData, AnalystSource, CompanyInfo, CompanyInfoSource, EarningsData, FinancialMetrics,
    FundamentalsSource, PriceData, PriceSource, RecommendationCounts, Secret, SourceAdapter,
    SourceError, Symbol,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::http::{non_empty, send_json};

const BASE_URL: &str = "https://finnhub.io/api/v1";
const NAME: &str = "finnhub";

/// Finnhub REST adapter.
#[derive(Clone)]
pub struct Finnhub {
    client: Client,
    api_key: Secret,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct Quote {
    c: Option<f64>,
    d: Option<f64>,
    dp: Option<f64>,
    pc: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct MetricEnvelope {
    #[serde(default)]
    metric: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Trend {
    #[serde(default)]
    strong_buy: u32,
    #[serde(default)]
    buy: u32,
    #[serde(default)]
    hold: u32,
    #[serde(default)]
    sell: u32,
    #[serde(default)]
    strong_sell: u32,
    period: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Earning {
    actual: Option<f64>,
    estimate: Option<f64>,
    quarter: Option<u8>,
    year: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Profile {
    name: Option<String>,
    exchange: Option<String>,
    finnhub_industry: Option<String>,
    country: Option<String>,
    currency: Option<String>,
    weburl: Option<String>,
}

/// Pick the first numeric value among `keys`.
fn metric(m: &HashMap<String, serde_json::Value>, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .find_map(|k| m.get(*k).and_then(serde_json::Value::as_f64))
        .filter(|v| v.is_finite())
}

fn metrics_from(m: &HashMap<String, serde_json::Value>) -> FinancialMetrics {
    // Finnhub reports margins and yields in percent, market cap in millions.
    let pct = |keys: &[&str]| metric(m, keys).map(|v| v / 100.0);
    FinancialMetrics {
        market_cap: metric(m, &["marketCapitalization"]).map(|v| v * 1e6),
        pe_ratio: metric(m, &["peTTM", "peBasicExclExtraTTM", "peNormalizedAnnual"]),
        peg_ratio: metric(m, &["pegTTM"]),
        price_to_book: metric(m, &["pbQuarterly", "pbAnnual"]),
        price_to_sales: metric(m, &["psTTM", "psAnnual"]),
        revenue_ttm: metric(m, &["revenueTTM"]).map(|v| v * 1e6),
        gross_margin: pct(&["grossMarginTTM", "grossMarginAnnual"]),
        operating_margin: pct(&["operatingMarginTTM", "operatingMarginAnnual"]),
        profit_margin: pct(&["netProfitMarginTTM", "netProfitMarginAnnual"]),
        return_on_equity: pct(&["roeTTM", "roeRfy"]),
        return_on_assets: pct(&["roaTTM", "roaRfy"]),
        debt_to_equity: metric(m, &["totalDebt/totalEquityQuarterly", "totalDebt/totalEquityAnnual"]),
        current_ratio: metric(m, &["currentRatioQuarterly", "currentRatioAnnual"]),
        quick_ratio: metric(m, &["quickRatioQuarterly", "quickRatioAnnual"]),
        dividend_yield: pct(&["dividendYieldIndicatedAnnual", "currentDividendYieldTTM"]),
        beta: metric(m, &["beta"]),
        fifty_two_week_high: metric(m, &["52WeekHigh"]),
        fifty_two_week_low: metric(m, &["52WeekLow"]),
    }
}

impl Finnhub {
    /// Adapter over `client` authenticated with `api_key`.
    #[must_use]
    pub fn new(client: Client, api_key: Secret) -> Self {
        Self {
            client,
            api_key,
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
        name = "screener::sources::finnhub::get",
        skip(self, extra),
        fields(symbol = %symbol),
    )]
    async fn get<T: DeserializeOwned>(
        &self,
        path: &'static str,
        symbol: &Symbol,
        extra: &[(&str, &str)],
    ) -> Result<T, SourceError> {
        let req = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .header("X-Finnhub-Token", self.api_key.expose())
            .query(&[("symbol", symbol.as_str())])
            .query(extra);
        send_json(NAME, req).await
    }

    async fn earnings(&self, symbol: &Symbol) -> Vec<EarningsData> {
        match self.get::<Vec<Earning>>("/stock/earnings", symbol, &[]).await {
            Ok(rows) => rows
                .into_iter()
                .take(4)
                .map(|e| EarningsData {
                    eps_estimate: e.estimate,
                    eps_actual: e.actual,
                    revenue_estimate: None,
                    revenue_actual: None,
                    quarter: e.quarter,
                    year: e.year,
                })
                .collect(),
            Err(e) => {
                tracing::debug!(error = %e, "earnings unavailable");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl PriceSource for Finnhub {
    async fn price(&self, symbol: &Symbol) -> Result<PriceData, SourceError> {
        let q: Quote = self.get("/quote", symbol, &[]).await?;
        // Unknown symbols come back as an all-zero quote.
        let price = q
            .c
            .filter(|c| *c > 0.0)
            .ok_or_else(|| SourceError::not_found(NAME, format!("quote for {symbol}")))?;
        Ok(PriceData {
            currency: Some("USD".to_string()),
            change: q.d,
            change_percent: q.dp,
            previous_close: q.pc.filter(|pc| *pc > 0.0),
            ..PriceData::new(price)
        })
    }
}

#[async_trait]
impl FundamentalsSource for Finnhub {
    async fn fundamentals(&self, symbol: &Symbol) -> Result<FinancialMetrics, SourceError> {
        let env: MetricEnvelope = self
            .get("/stock/metric", symbol, &[("metric", "all")])
            .await?;
        if env.metric.is_empty() {
            return Err(SourceError::not_found(NAME, format!("metrics for {symbol}")));
        }
        Ok(metrics_from(&env.metric))
    }
}

#[async_trait]
impl AnalystSource for Finnhub {
    async fn analyst(&self, symbol: &Symbol) -> Result<AnalystData, SourceError> {
        let trends: Vec<Trend> = self.get("/stock/recommendation", symbol, &[]).await?;
        let latest = trends
            .into_iter()
            .max_by_key(|t| t.period.as_deref().and_then(parse_period))
            .ok_or_else(|| SourceError::not_found(NAME, format!("recommendations for {symbol}")))?;
        let counts = RecommendationCounts {
            strong_buy: latest.strong_buy,
            buy: latest.buy,
            hold: latest.hold,
            sell: latest.sell,
            strong_sell: latest.strong_sell,
        };
        let earnings = self.earnings(symbol).await;
        Ok(AnalystData {
            recommendation_counts: Some(counts),
            earnings,
            ..AnalystData::default()
        })
    }
}

#[async_trait]
impl CompanyInfoSource for Finnhub {
    async fn company_info(&self, symbol: &Symbol) -> Result<CompanyInfo, SourceError> {
        let p: Profile = self.get("/stock/profile2", symbol, &[]).await?;
        let name = non_empty(p.name)
            .ok_or_else(|| SourceError::not_found(NAME, format!("profile for {symbol}")))?;
        Ok(CompanyInfo {
            name,
            exchange: non_empty(p.exchange),
            sector: None,
            industry: non_empty(p.finnhub_industry),
            country: non_empty(p.country),
            currency: non_empty(p.currency),
            website: non_empty(p.weburl),
        })
    }
}

impl SourceAdapter for Finnhub {
    fn name(&self) -> &'static str {
        NAME
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
    fn as_company_info_source(&self) -> Option<&dyn CompanyInfoSource> {
        Some(self as &dyn CompanyInfoSource)
    }
}

fn parse_period(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}
