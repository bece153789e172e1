//! screener-core
//!
//! Building blocks shared by the orchestrator and the source crates.
//!
//! - `source`: the `SourceAdapter` trait and per-category role traits.
//! - `chain`: ordered fallback chains of adapters.
//! - `ratelimit`: the process-wide per-provider token bucket.
//! - `symbol`: ticker validation.
//! - `metrics`: named counters and timers.
//!
//! Async runtime (Tokio)
//! ---------------------
//! Timeouts and the rate limiter clock use `tokio::time`, so callers must run
//! under a Tokio 1.x runtime. Tests can pause and advance that clock.
#![warn(missing_docs)]

/// Fallback chains.
pub mod chain;
/// Metric names and recorders.
pub mod metrics;
/// Token-bucket rate limiting.
pub mod ratelimit;
/// Source adapter traits.
pub mod source;
mod symbol;

pub use chain::{ChainEntry, FallbackChain};
pub use ratelimit::{Acquire, RateLimiter};
pub use source::{
    AnalystSource, CompanyInfoSource, FundamentalsSource, PriceSource, SentimentSource,
    SourceAdapter, call_with_timeout, fetch_category,
};
pub use symbol::{MAX_SYMBOL_LEN, Symbol};

pub use screener_types::*;
