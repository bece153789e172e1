//! The canonical analysis response.
#![allow(missing_docs)]

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::payload::{AnalystRating, EarningsData, FinancialMetrics};

/// Five-level sentiment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentScore {
    VeryPositive,
    Positive,
    Neutral,
    Negative,
    VeryNegative,
}

impl SentimentScore {
    /// Label for a polarity in [-1, 1].
    #[must_use]
    pub fn from_polarity(p: f64) -> Self {
        if p >= 0.5 {
            Self::VeryPositive
        } else if p >= 0.15 {
            Self::Positive
        } else if p <= -0.5 {
            Self::VeryNegative
        } else if p <= -0.15 {
            Self::Negative
        } else {
            Self::Neutral
        }
    }
}

/// Majority analyst stance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsensusRating {
    Buy,
    Hold,
    Sell,
}

/// Article as it appears in the response, with its blended polarity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentItem {
    pub source: String,
    pub title: String,
    pub url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub polarity: f64,
    pub sentiment_score: SentimentScore,
}

/// Roll-up of all scored articles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentSummary {
    pub overall_score: SentimentScore,
    pub confidence: f64,
    pub positive_count: u32,
    pub negative_count: u32,
    pub neutral_count: u32,
    pub summary_text: String,
}

impl SentimentSummary {
    /// Summary used when no sentiment data is available.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            overall_score: SentimentScore::Neutral,
            confidence: 0.0,
            positive_count: 0,
            negative_count: 0,
            neutral_count: 0,
            summary_text: "No sentiment data available".to_string(),
        }
    }
}

/// Canonical merged response for one symbol.
///
/// Every field except `symbol`, `data_sources`, `financial_metrics` and the
/// list fields may be null when the category that feeds it did not contribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedResponse {
    pub symbol: String,
    pub company_name: Option<String>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub change: Option<f64>,
    pub change_percent: Option<f64>,
    pub volume: Option<u64>,
    pub financial_metrics: FinancialMetrics,
    pub analyst_ratings: Vec<AnalystRating>,
    pub consensus_rating: Option<ConsensusRating>,
    pub average_price_target: Option<f64>,
    pub earnings_data: Vec<EarningsData>,
    pub next_earnings_date: Option<NaiveDate>,
    pub sentiment_items: Vec<SentimentItem>,
    pub sentiment_summary: SentimentSummary,
    pub last_updated: DateTime<Utc>,
    pub data_sources: Vec<String>,
}
