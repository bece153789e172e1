//! Screener data transfer objects, error taxonomy and configuration primitives.
//!
//! Everything that crosses a crate boundary lives here: the category enum,
//! per-category payloads, the agent task lifecycle, the merged response, the
//! wire events and the configuration surface.
#![warn(missing_docs)]

mod category;
mod config;
mod error;
mod event;
mod payload;
mod response;
mod settings;
mod task;

pub use category::Category;
pub use config::{EngineConfig, RateLimitConfig, RateLimitState, RetryConfig, SentimentWeights};
pub use error::{ScreenerError, SourceError};
pub use event::{ErrorBody, EventPayload, EventType, StreamEvent, TaskOutcome};
pub use payload::{
    AnalystData, AnalystRating, CategoryPayload, CompanyInfo, Completeness, EarningsData,
    FinancialMetrics, MethodScores, PriceData, RecommendationCounts, SentimentArticle,
    SentimentData,
};
pub use response::{
    AggregatedResponse, ConsensusRating, SentimentItem, SentimentScore, SentimentSummary,
};
pub use settings::{Secret, Settings};
pub use task::{AdapterAttempts, AgentTask, AttemptError, FailureReason, TaskStatus};
