//! Environment-style settings.
//!
//! `Settings` is the flat view of the process configuration: provider keys,
//! HTTP and retry knobs, sentiment toggles. It can be parsed from any key
//! lookup, which keeps tests away from the process environment.

use std::fmt;
use std::time::Duration;

use crate::config::{EngineConfig, RetryConfig, SentimentWeights};
use crate::error::ScreenerError;

/// Opaque credential. Only presence is inspected outside of the adapter that uses it.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wrap a raw credential.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw value, for the adapter that sends it.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Flat process settings, one field per configuration key.
#[derive(Debug, Clone)]
pub struct Settings {
    /// `ALPHA_VANTAGE_KEY`
    pub alpha_vantage_key: Option<Secret>,
    /// `NEWSAPI_KEY`
    pub newsapi_key: Option<Secret>,
    /// `OPENAI_API_KEY`
    pub openai_api_key: Option<Secret>,
    /// `FINNHUB_KEY`
    pub finnhub_key: Option<Secret>,
    /// `HTTP_TIMEOUT`, seconds.
    pub http_timeout: Duration,
    /// `REQUEST_TIMEOUT`, seconds.
    pub request_timeout: Duration,
    /// `MAX_RETRIES`
    pub max_retries: u32,
    /// `RETRY_DELAY`, seconds (fractional).
    pub retry_delay: Duration,
    /// `RATE_LIMIT_REQUESTS`; inbound throttling, enforced by the front router.
    pub rate_limit_requests: u32,
    /// `RATE_LIMIT_WINDOW`, seconds.
    pub rate_limit_window: Duration,
    /// `USE_OPENAI_SENTIMENT`
    pub use_openai_sentiment: bool,
    /// `OPENAI_MODEL`
    pub openai_model: String,
    /// `SENTIMENT_TEMPERATURE`
    pub sentiment_temperature: f64,
    /// `NEWS_DAYS_BACK`
    pub news_days_back: u32,
    /// `MAX_NEWS_ARTICLES`
    pub max_news_articles: u32,
    /// `SENTIMENT_WEIGHT_LEXICON`, `SENTIMENT_WEIGHT_RULES`, `SENTIMENT_WEIGHT_LLM`
    pub sentiment_weights: SentimentWeights,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            alpha_vantage_key: None,
            newsapi_key: None,
            openai_api_key: None,
            finnhub_key: None,
            http_timeout: Duration::from_secs(15),
            request_timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            rate_limit_requests: 100,
            rate_limit_window: Duration::from_secs(3600),
            use_openai_sentiment: true,
            openai_model: "gpt-4.1-nano-2025-04-14".to_string(),
            sentiment_temperature: 0.1,
            news_days_back: 7,
            max_news_articles: 20,
            sentiment_weights: SentimentWeights::default(),
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    ///
    /// # Errors
    /// Returns `ScreenerError::Config` naming the first malformed key.
    pub fn from_env() -> Result<Self, ScreenerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup.
    ///
    /// Missing and empty values fall back to defaults.
    ///
    /// # Errors
    /// Returns `ScreenerError::Config` naming the first malformed key.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ScreenerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let d = Self::default();
        let weights = SentimentWeights {
            lexicon: parse_or(&get, "SENTIMENT_WEIGHT_LEXICON", d.sentiment_weights.lexicon)?,
            rule_based: parse_or(&get, "SENTIMENT_WEIGHT_RULES", d.sentiment_weights.rule_based)?,
            llm: parse_or(&get, "SENTIMENT_WEIGHT_LLM", d.sentiment_weights.llm)?,
        };
        for (key, w) in [
            ("SENTIMENT_WEIGHT_LEXICON", weights.lexicon),
            ("SENTIMENT_WEIGHT_RULES", weights.rule_based),
            ("SENTIMENT_WEIGHT_LLM", weights.llm),
        ] {
            if !w.is_finite() || w < 0.0 {
                return Err(ScreenerError::config(key, "weight must be a non-negative number"));
            }
        }

        Ok(Self {
            alpha_vantage_key: get("ALPHA_VANTAGE_KEY").map(Secret::new),
            newsapi_key: get("NEWSAPI_KEY").map(Secret::new),
            openai_api_key: get("OPENAI_API_KEY").map(Secret::new),
            finnhub_key: get("FINNHUB_KEY").map(Secret::new),
            http_timeout: seconds_or(&get, "HTTP_TIMEOUT", d.http_timeout)?,
            request_timeout: seconds_or(&get, "REQUEST_TIMEOUT", d.request_timeout)?,
            max_retries: parse_or(&get, "MAX_RETRIES", d.max_retries)?,
            retry_delay: seconds_or(&get, "RETRY_DELAY", d.retry_delay)?,
            rate_limit_requests: parse_or(&get, "RATE_LIMIT_REQUESTS", d.rate_limit_requests)?,
            rate_limit_window: seconds_or(&get, "RATE_LIMIT_WINDOW", d.rate_limit_window)?,
            use_openai_sentiment: bool_or(&get, "USE_OPENAI_SENTIMENT", d.use_openai_sentiment)?,
            openai_model: get("OPENAI_MODEL").unwrap_or(d.openai_model),
            sentiment_temperature: parse_or(
                &get,
                "SENTIMENT_TEMPERATURE",
                d.sentiment_temperature,
            )?,
            news_days_back: parse_or(&get, "NEWS_DAYS_BACK", d.news_days_back)?,
            max_news_articles: parse_or(&get, "MAX_NEWS_ARTICLES", d.max_news_articles)?,
            sentiment_weights: weights,
        })
    }

    /// Whether the language-model sentiment adapter should be registered.
    #[must_use]
    pub const fn openai_sentiment_enabled(&self) -> bool {
        self.use_openai_sentiment && self.openai_api_key.is_some() && self.newsapi_key.is_some()
    }

    /// Engine configuration derived from these settings.
    #[must_use]
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            request_timeout: self.request_timeout,
            call_timeout: self.http_timeout,
            retry: RetryConfig {
                max_retries: self.max_retries,
                base_delay: self.retry_delay,
                ..RetryConfig::default()
            },
            sentiment_weights: self.sentiment_weights,
            ..EngineConfig::default()
        }
    }
}

fn parse_or<G, T>(get: &G, key: &str, default: T) -> Result<T, ScreenerError>
where
    G: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| ScreenerError::config(key, format!("cannot parse {raw:?}"))),
    }
}

fn seconds_or<G>(get: &G, key: &str, default: Duration) -> Result<Duration, ScreenerError>
where
    G: Fn(&str) -> Option<String>,
{
    let secs: f64 = parse_or(get, key, default.as_secs_f64())?;
    Duration::try_from_secs_f64(secs)
        .map_err(|_| ScreenerError::config(key, format!("{secs} is not a valid duration")))
}

fn bool_or<G>(get: &G, key: &str, default: bool) -> Result<bool, ScreenerError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key).map(|v| v.to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ScreenerError::config(key, format!("cannot parse {v:?} as bool"))),
        },
    }
}
