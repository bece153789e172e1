//! Alpha Vantage adapter.
//!
//! `GLOBAL_QUOTE` serves prices; `OVERVIEW` serves fundamentals, analyst
//! counts with the consensus target, and company identity. The free tier
//! allows 5 calls per minute.

use async_trait::async_trait;
use reqwest::Client;
use screener_core::{
    AnalystData, AnalystSource, CompanyInfo, CompanyInfoSource, FinancialMetrics,
    FundamentalsSource, PriceData, PriceSource, RecommendationCounts, Secret, SourceAdapter,
    SourceError, Symbol,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::http::{non_empty, parse_num, send_json};

const BASE_URL: &str = "https://www.alphavantage.co";
const NAME: &str = "alpha_vantage";

/// Alpha Vantage REST adapter.
#[derive(Clone)]
pub struct AlphaVantage {
    client: Client,
    api_key: Secret,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct QuoteEnvelope {
    #[serde(rename = "Global Quote")]
    quote: Option<GlobalQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct GlobalQuote {
    #[serde(rename = "05. price")]
    price: Option<String>,
    #[serde(rename = "06. volume")]
    volume: Option<String>,
    #[serde(rename = "08. previous close")]
    previous_close: Option<String>,
    #[serde(rename = "09. change")]
    change: Option<String>,
    #[serde(rename = "10. change percent")]
    change_percent: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Overview {
    symbol: Option<String>,
    name: Option<String>,
    exchange: Option<String>,
    currency: Option<String>,
    country: Option<String>,
    sector: Option<String>,
    industry: Option<String>,
    official_site: Option<String>,
    market_capitalization: Option<String>,
    #[serde(rename = "PERatio")]
    pe_ratio: Option<String>,
    #[serde(rename = "PEGRatio")]
    peg_ratio: Option<String>,
    price_to_book_ratio: Option<String>,
    #[serde(rename = "PriceToSalesRatioTTM")]
    price_to_sales_ttm: Option<String>,
    #[serde(rename = "RevenueTTM")]
    revenue_ttm: Option<String>,
    #[serde(rename = "GrossProfitTTM")]
    gross_profit_ttm: Option<String>,
    #[serde(rename = "OperatingMarginTTM")]
    operating_margin_ttm: Option<String>,
    profit_margin: Option<String>,
    #[serde(rename = "ReturnOnEquityTTM")]
    return_on_equity_ttm: Option<String>,
    #[serde(rename = "ReturnOnAssetsTTM")]
    return_on_assets_ttm: Option<String>,
    dividend_yield: Option<String>,
    beta: Option<String>,
    #[serde(rename = "52WeekHigh")]
    week_52_high: Option<String>,
    #[serde(rename = "52WeekLow")]
    week_52_low: Option<String>,
    analyst_target_price: Option<String>,
    analyst_rating_strong_buy: Option<String>,
    analyst_rating_buy: Option<String>,
    analyst_rating_hold: Option<String>,
    analyst_rating_sell: Option<String>,
    analyst_rating_strong_sell: Option<String>,
}

impl Overview {
    fn num(v: Option<&String>) -> Option<f64> {
        parse_num(v.map(String::as_str))
    }

    fn metrics(&self) -> FinancialMetrics {
        let revenue = Self::num(self.revenue_ttm.as_ref());
        let gross_margin = Self::num(self.gross_profit_ttm.as_ref())
            .zip(revenue)
            .filter(|(_, r)| *r != 0.0)
            .map(|(g, r)| g / r);
        FinancialMetrics {
            market_cap: Self::num(self.market_capitalization.as_ref()),
            pe_ratio: Self::num(self.pe_ratio.as_ref()),
            peg_ratio: Self::num(self.peg_ratio.as_ref()),
            price_to_book: Self::num(self.price_to_book_ratio.as_ref()),
            price_to_sales: Self::num(self.price_to_sales_ttm.as_ref()),
            revenue_ttm: revenue,
            gross_margin,
            operating_margin: Self::num(self.operating_margin_ttm.as_ref()),
            profit_margin: Self::num(self.profit_margin.as_ref()),
            return_on_equity: Self::num(self.return_on_equity_ttm.as_ref()),
            return_on_assets: Self::num(self.return_on_assets_ttm.as_ref()),
            dividend_yield: Self::num(self.dividend_yield.as_ref()),
            beta: Self::num(self.beta.as_ref()),
            fifty_two_week_high: Self::num(self.week_52_high.as_ref()),
            fifty_two_week_low: Self::num(self.week_52_low.as_ref()),
            ..FinancialMetrics::default()
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn counts(&self) -> Option<RecommendationCounts> {
        let c = |v: Option<&String>| Self::num(v).map(|n| n.max(0.0) as u32);
        let counts = RecommendationCounts {
            strong_buy: c(self.analyst_rating_strong_buy.as_ref())?,
            buy: c(self.analyst_rating_buy.as_ref())?,
            hold: c(self.analyst_rating_hold.as_ref())?,
            sell: c(self.analyst_rating_sell.as_ref())?,
            strong_sell: c(self.analyst_rating_strong_sell.as_ref())?,
        };
        (counts.total() > 0).then_some(counts)
    }
}

impl AlphaVantage {
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
        name = "screener::sources::alpha_vantage::query",
        skip(self),
        fields(symbol = %symbol),
    )]
    async fn query<T: DeserializeOwned>(
        &self,
        function: &'static str,
        symbol: &Symbol,
    ) -> Result<T, SourceError> {
        let req = self.client.get(format!("{}/query", self.base_url)).query(&[
            ("function", function),
            ("symbol", symbol.as_str()),
            ("apikey", self.api_key.expose()),
        ]);
        let body: serde_json::Value = send_json(NAME, req).await?;
        check_api_error(&body, symbol)?;
        serde_json::from_value(body)
            .map_err(|e| SourceError::invalid(NAME, format!("{function} shape: {e}")))
    }

    async fn overview(&self, symbol: &Symbol) -> Result<Overview, SourceError> {
        let ov: Overview = self.query("OVERVIEW", symbol).await?;
        if ov.symbol.is_none() && ov.name.is_none() {
            return Err(SourceError::not_found(NAME, format!("overview for {symbol}")));
        }
        Ok(ov)
    }
}

/// Alpha Vantage reports errors and throttling inside 200 responses.
fn check_api_error(body: &serde_json::Value, symbol: &Symbol) -> Result<(), SourceError> {
    let Some(obj) = body.as_object() else {
        return Err(SourceError::invalid(NAME, "expected a JSON object"));
    };
    if obj.is_empty() {
        return Err(SourceError::not_found(NAME, format!("no data for {symbol}")));
    }
    if obj.contains_key("Error Message") {
        return Err(SourceError::not_found(NAME, format!("invalid symbol {symbol}")));
    }
    let notice = obj
        .get("Note")
        .or_else(|| obj.get("Information"))
        .and_then(serde_json::Value::as_str);
    if let Some(msg) = notice {
        let lower = msg.to_lowercase();
        let mentions_key = lower.contains("api key") || lower.contains("apikey");
        if mentions_key && (lower.contains("invalid") || lower.contains("missing")) {
            return Err(SourceError::auth(NAME, msg));
        }
        return Err(SourceError::rate_limited(NAME));
    }
    Ok(())
}

#[async_trait]
impl PriceSource for AlphaVantage {
    async fn price(&self, symbol: &Symbol) -> Result<PriceData, SourceError> {
        let env: QuoteEnvelope = self.query("GLOBAL_QUOTE", symbol).await?;
        let q = env.quote.unwrap_or_default();
        let price = parse_num(q.price.as_deref())
            .ok_or_else(|| SourceError::not_found(NAME, format!("price for {symbol}")))?;
        Ok(PriceData {
            currency: Some("USD".to_string()),
            change: parse_num(q.change.as_deref()),
            change_percent: parse_num(q.change_percent.as_deref()),
            previous_close: parse_num(q.previous_close.as_deref()),
            volume: q.volume.as_deref().and_then(|v| v.trim().parse().ok()),
            ..PriceData::new(price)
        })
    }
}

#[async_trait]
impl FundamentalsSource for AlphaVantage {
    async fn fundamentals(&self, symbol: &Symbol) -> Result<FinancialMetrics, SourceError> {
        Ok(self.overview(symbol).await?.metrics())
    }
}

#[async_trait]
impl AnalystSource for AlphaVantage {
    async fn analyst(&self, symbol: &Symbol) -> Result<AnalystData, SourceError> {
        let ov = self.overview(symbol).await?;
        Ok(AnalystData {
            recommendation_counts: ov.counts(),
            price_target: Overview::num(ov.analyst_target_price.as_ref()),
            ..AnalystData::default()
        })
    }
}

#[async_trait]
impl CompanyInfoSource for AlphaVantage {
    async fn company_info(&self, symbol: &Symbol) -> Result<CompanyInfo, SourceError> {
        let ov = self.overview(symbol).await?;
        Ok(CompanyInfo {
            name: non_empty(ov.name).unwrap_or_default(),
            exchange: non_empty(ov.exchange),
            sector: non_empty(ov.sector),
            industry: non_empty(ov.industry),
            country: non_empty(ov.country),
            currency: non_empty(ov.currency),
            website: non_empty(ov.official_site),
        })
    }
}

impl SourceAdapter for AlphaVantage {
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
