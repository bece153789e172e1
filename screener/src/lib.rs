//! Screener answers "what does the market say about symbol X right now".
//!
//! Overview
//! - One agent per category (price, fundamentals, analyst, sentiment,
//!   company info) runs concurrently under a shared request deadline.
//! - Each agent walks an ordered fallback chain of source adapters, retrying
//!   retryable failures with exponential backoff plus jitter and consulting a
//!   process-wide per-provider rate limiter before every attempt.
//! - Terminal agent results are pushed to the caller in completion order; once
//!   every agent settles or the deadline fires, a pure aggregator merges them
//!   and exactly one `final` event closes the stream.
//!
//! Key behaviors
//! - The first adapter yielding valid data wins; later adapters are never called.
//!   A structurally valid but incomplete payload is `partial` and also stops the chain.
//! - Non-retryable errors (auth, not found, malformed data) skip to the next adapter
//!   at once. A backoff that would pass the deadline skips too.
//! - Stragglers at the deadline are reported as `failed` with reason `timeout`
//!   before the `final` event.
//! - Dropping the [`AnalysisStream`] cancels every agent still working.
//!
//! Examples
//! ```rust,ignore
//! use std::sync::Arc;
//! use futures::StreamExt;
//! use screener::{RateLimiter, Screener, Settings};
//!
//! let settings = Settings::from_env()?;
//! let limiter = Arc::new(RateLimiter::with_quotas(screener_sources::standard_quotas()));
//! let screener = Screener::builder()
//!     .with_chains(screener_sources::standard_chains(&settings, &limiter)?)
//!     .rate_limiter(limiter)
//!     .config(settings.engine_config())
//!     .build()?;
//!
//! let mut events = screener.stream("AAPL");
//! while let Some(event) = events.next().await {
//!     println!("{}", serde_json::to_string(&event)?);
//! }
//! ```
//!
//! See `screener/examples/` for a runnable end-to-end demonstration.
#![warn(missing_docs)]

mod agent;
mod aggregate;
/// Retry delay computation.
pub mod backoff;
pub(crate) mod core;
mod request;
mod stream;

pub use agent::{Agent, AgentContext, Progress};
pub use aggregate::aggregate;
pub use core::{Screener, ScreenerBuilder};
pub use request::Request;
pub use stream::AnalysisStream;

// Re-export core types for convenience
pub use screener_core::*;
