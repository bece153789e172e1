//! Per-category result shapes produced by source adapters, and their validation.
#![allow(missing_docs)]

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::category::Category;

/// Last traded price and daily movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceData {
    /// Last traded price.
    pub price: f64,
    /// ISO currency code of `price`.
    pub currency: Option<String>,
    /// Absolute change against the previous close.
    pub change: Option<f64>,
    /// Percentage change against the previous close.
    pub change_percent: Option<f64>,
    /// Previous session close.
    pub previous_close: Option<f64>,
    /// Session volume.
    pub volume: Option<u64>,
}

impl PriceData {
    /// A bare quote with only the price set.
    #[must_use]
    pub const fn new(price: f64) -> Self {
        Self {
            price,
            currency: None,
            change: None,
            change_percent: None,
            previous_close: None,
            volume: None,
        }
    }
}

/// Valuation, profitability and balance-sheet ratios. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialMetrics {
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub price_to_book: Option<f64>,
    pub price_to_sales: Option<f64>,
    pub revenue_ttm: Option<f64>,
    pub gross_margin: Option<f64>,
    pub operating_margin: Option<f64>,
    pub profit_margin: Option<f64>,
    pub return_on_equity: Option<f64>,
    pub return_on_assets: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub current_ratio: Option<f64>,
    pub quick_ratio: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub beta: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
}

impl FinancialMetrics {
    fn values(&self) -> [Option<f64>; 18] {
        [
            self.market_cap,
            self.pe_ratio,
            self.peg_ratio,
            self.price_to_book,
            self.price_to_sales,
            self.revenue_ttm,
            self.gross_margin,
            self.operating_margin,
            self.profit_margin,
            self.return_on_equity,
            self.return_on_assets,
            self.debt_to_equity,
            self.current_ratio,
            self.quick_ratio,
            self.dividend_yield,
            self.beta,
            self.fifty_two_week_high,
            self.fifty_two_week_low,
        ]
    }

    /// True when no metric is populated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values().iter().all(Option::is_none)
    }
}

/// One analyst (or consensus) rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalystRating {
    pub firm: String,
    pub rating: String,
    pub price_target: Option<f64>,
    pub date: Option<NaiveDate>,
}

/// Aggregate recommendation counts for the latest period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationCounts {
    pub strong_buy: u32,
    pub buy: u32,
    pub hold: u32,
    pub sell: u32,
    pub strong_sell: u32,
}

impl RecommendationCounts {
    /// Total votes.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.strong_buy + self.buy + self.hold + self.sell + self.strong_sell
    }
}

/// One reported (or expected) earnings period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarningsData {
    pub eps_estimate: Option<f64>,
    pub eps_actual: Option<f64>,
    pub revenue_estimate: Option<f64>,
    pub revenue_actual: Option<f64>,
    pub quarter: Option<u8>,
    pub year: Option<i32>,
}

/// Analyst view of the instrument.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalystData {
    pub ratings: Vec<AnalystRating>,
    pub recommendation_counts: Option<RecommendationCounts>,
    /// Consensus price target published by the provider, if any.
    pub price_target: Option<f64>,
    pub earnings: Vec<EarningsData>,
    pub next_earnings_date: Option<NaiveDate>,
}

/// Scores assigned to one article by each scoring method, each in [-1, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MethodScores {
    pub lexicon: Option<f64>,
    pub rule_based: Option<f64>,
    pub llm: Option<f64>,
}

impl MethodScores {
    /// True when no method produced a score.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.lexicon.is_none() && self.rule_based.is_none() && self.llm.is_none()
    }
}

/// One scored news article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentArticle {
    pub source: String,
    pub title: String,
    pub url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub scores: MethodScores,
}

/// Articles and their per-method scores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentData {
    pub articles: Vec<SentimentArticle>,
    /// Free-text summary produced by the source, if any.
    pub summary_text: Option<String>,
}

/// Company identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub name: String,
    pub exchange: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub country: Option<String>,
    pub currency: Option<String>,
    pub website: Option<String>,
}

/// Result of one category, tagged by category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", content = "data", rename_all = "snake_case")]
pub enum CategoryPayload {
    Price(PriceData),
    Fundamentals(FinancialMetrics),
    Analyst(AnalystData),
    Sentiment(SentimentData),
    CompanyInfo(CompanyInfo),
}

/// Outcome of validating a payload against its category's expectations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completeness {
    /// Every expected field is present.
    Complete,
    /// Structurally valid, but the listed expected fields are missing.
    Partial(Vec<&'static str>),
}

impl CategoryPayload {
    /// Category this payload belongs to.
    #[must_use]
    pub const fn category(&self) -> Category {
        match self {
            Self::Price(_) => Category::Price,
            Self::Fundamentals(_) => Category::Fundamentals,
            Self::Analyst(_) => Category::Analyst,
            Self::Sentiment(_) => Category::Sentiment,
            Self::CompanyInfo(_) => Category::CompanyInfo,
        }
    }

    /// Validate the payload for its category.
    ///
    /// # Errors
    /// Returns a description of the violation when the payload is unusable.
    pub fn validate(&self) -> Result<Completeness, String> {
        let mut missing = Vec::new();
        match self {
            Self::Price(p) => {
                if !p.price.is_finite() || p.price <= 0.0 {
                    return Err(format!("price must be a positive number, got {}", p.price));
                }
                if p.volume.is_none() {
                    missing.push("volume");
                }
                if p.change.is_none() && p.previous_close.is_none() {
                    missing.push("change");
                }
            }
            Self::Fundamentals(m) => {
                if m.is_empty() {
                    return Err("no financial metrics present".to_string());
                }
                if m.market_cap.is_none() {
                    missing.push("market_cap");
                }
                if m.pe_ratio.is_none() {
                    missing.push("pe_ratio");
                }
            }
            Self::Analyst(a) => {
                if a.ratings.is_empty() && a.recommendation_counts.is_none() {
                    return Err("no ratings or recommendation counts".to_string());
                }
                if let Some(r) = a
                    .ratings
                    .iter()
                    .find(|r| r.firm.trim().is_empty() || r.rating.trim().is_empty())
                {
                    return Err(format!("rating without firm or label: {r:?}"));
                }
                if a.earnings.is_empty() {
                    missing.push("earnings");
                }
            }
            Self::Sentiment(s) => {
                if s.articles.is_empty() {
                    return Err("no articles".to_string());
                }
                if s.articles.iter().any(|a| a.scores.is_empty()) {
                    return Err("article without any score".to_string());
                }
                if s.articles.iter().any(|a| a.published_at.is_none()) {
                    missing.push("published_at");
                }
            }
            Self::CompanyInfo(c) => {
                if c.name.trim().is_empty() {
                    return Err("company name is empty".to_string());
                }
                if c.industry.is_none() {
                    missing.push("industry");
                }
            }
        }
        if missing.is_empty() {
            Ok(Completeness::Complete)
        } else {
            Ok(Completeness::Partial(missing))
        }
    }
}
