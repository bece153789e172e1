use core::fmt;
use serde::{Deserialize, Serialize};

/// The data domains an analysis request fans out to.
///
/// Each category is served by exactly one agent per request, and the
/// declaration order here is the canonical order used when a stable
/// ordering across categories is needed (e.g. `data_sources`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Last traded price, change and volume.
    Price,
    /// Valuation ratios, margins and balance-sheet health.
    Fundamentals,
    /// Analyst ratings, price targets and earnings.
    Analyst,
    /// News sentiment.
    Sentiment,
    /// Company identity (name, exchange, industry).
    CompanyInfo,
}

impl Category {
    /// All categories in canonical order.
    pub const ALL: [Self; 5] = [
        Self::Price,
        Self::Fundamentals,
        Self::Analyst,
        Self::Sentiment,
        Self::CompanyInfo,
    ];

    /// Stable, snake_case identifier for logs, metrics and wire events.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Price => "price",
            Self::Fundamentals => "fundamentals",
            Self::Analyst => "analyst",
            Self::Sentiment => "sentiment",
            Self::CompanyInfo => "company_info",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
