//! Configuration types shared across the orchestrator and its sources.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Retry and exponential backoff policy applied per adapter by each agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Attempts spent on one adapter before falling through (values below 1 act as 1).
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound on a single backoff delay.
    pub max_delay: Duration,
    /// Exponential factor applied per retry (>= 1).
    pub factor: u32,
    /// Random jitter percentage [0, 100] added to each delay.
    pub jitter_percent: u8,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            factor: 2,
            jitter_percent: 20,
        }
    }
}

impl RetryConfig {
    /// Attempts allowed per adapter, never less than one.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }
}

/// Token bucket parameters for one provider.
///
/// At most `capacity` calls are granted within each `refill_interval` window;
/// the bucket refills to capacity at every window boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Tokens available per window.
    pub capacity: u32,
    /// Window length.
    pub refill_interval: Duration,
}

impl RateLimitConfig {
    /// Convenience constructor.
    #[must_use]
    pub const fn new(capacity: u32, refill_interval: Duration) -> Self {
        Self {
            capacity,
            refill_interval,
        }
    }

    /// `capacity` calls per minute.
    #[must_use]
    pub const fn per_minute(capacity: u32) -> Self {
        Self::new(capacity, Duration::from_secs(60))
    }
}

/// Snapshot of a provider bucket at a point in time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateLimitState {
    /// Configured tokens per window.
    pub capacity: u32,
    /// Tokens left in the current window.
    pub available: u32,
    /// Time remaining until the bucket refills.
    pub reset_in: Duration,
}

/// Relative weight of each sentiment scoring method.
///
/// Used both to blend per-article polarity and to combine per-method
/// agreement into the summary confidence. Weights need not sum to one;
/// they are renormalised over the methods that actually produced scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentWeights {
    /// Valence-lexicon scorer.
    pub lexicon: f64,
    /// Keyword-rule scorer.
    pub rule_based: f64,
    /// Language-model scorer.
    pub llm: f64,
}

impl Default for SentimentWeights {
    fn default() -> Self {
        Self {
            lexicon: 0.4,
            rule_based: 0.2,
            llm: 0.4,
        }
    }
}

/// Global configuration for the `Screener` orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Overall deadline for one analysis request.
    pub request_timeout: Duration,
    /// Timeout applied to every individual adapter call.
    pub call_timeout: Duration,
    /// Per-adapter retry policy.
    pub retry: RetryConfig,
    /// Sentiment blend used by the aggregator.
    pub sentiment_weights: SentimentWeights,
    /// Capacity of the per-request event channel.
    pub event_buffer: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            call_timeout: Duration::from_secs(15),
            retry: RetryConfig::default(),
            sentiment_weights: SentimentWeights::default(),
            event_buffer: 16,
        }
    }
}
