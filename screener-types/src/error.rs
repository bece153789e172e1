use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::category::Category;

/// Classified failure of a single source adapter attempt.
///
/// Every adapter maps its provider-specific failures into exactly one of these
/// variants. Source errors never reach the caller raw; they are consumed by
/// the agent's fallback loop and retained on the task for diagnostics.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceError {
    /// The call exceeded the per-call timeout.
    #[error("{provider} timed out")]
    Timeout {
        /// Provider that timed out.
        provider: String,
    },

    /// The provider (or the local token bucket) refused the call.
    #[error("{provider} rate limited")]
    RateLimited {
        /// Provider that refused the call.
        provider: String,
        /// Hint for when a retry may succeed, if known.
        retry_after_ms: Option<u64>,
    },

    /// Credentials were missing, invalid or lack access to the resource.
    #[error("{provider} rejected credentials: {msg}")]
    AuthError {
        /// Provider that rejected the credentials.
        provider: String,
        /// Provider message.
        msg: String,
    },

    /// The response could not be mapped or did not pass validation.
    ///
    /// `status` carries the HTTP status when the failure came from a non-success
    /// response; a 5xx status marks the failure as transient.
    #[error("invalid response from {provider}: {msg}")]
    InvalidResponse {
        /// Provider that produced the response.
        provider: String,
        /// What was wrong with it.
        msg: String,
        /// HTTP status, when available.
        status: Option<u16>,
    },

    /// The provider does not know the symbol or has no data for it.
    #[error("not found via {provider}: {what}")]
    NotFound {
        /// Provider that reported the miss.
        provider: String,
        /// Description of the missing resource, e.g. "quote for AAPL".
        what: String,
    },
}

impl SourceError {
    /// Helper: build a `Timeout` error.
    pub fn timeout(provider: impl Into<String>) -> Self {
        Self::Timeout {
            provider: provider.into(),
        }
    }

    /// Helper: build a `RateLimited` error without a retry hint.
    pub fn rate_limited(provider: impl Into<String>) -> Self {
        Self::RateLimited {
            provider: provider.into(),
            retry_after_ms: None,
        }
    }

    /// Helper: build an `AuthError`.
    pub fn auth(provider: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::AuthError {
            provider: provider.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build an `InvalidResponse` that is not tied to an HTTP status.
    pub fn invalid(provider: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            msg: msg.into(),
            status: None,
        }
    }

    /// Helper: build a `NotFound` error.
    pub fn not_found(provider: impl Into<String>, what: impl Into<String>) -> Self {
        Self::NotFound {
            provider: provider.into(),
            what: what.into(),
        }
    }

    /// Whether the agent should spend another attempt on the same adapter.
    ///
    /// Timeouts, rate limiting and 5xx responses are transient; everything else
    /// abandons the adapter immediately.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::RateLimited { .. } => true,
            Self::InvalidResponse {
                status: Some(s), ..
            } => *s >= 500 && *s <= 599,
            Self::AuthError { .. } | Self::InvalidResponse { .. } | Self::NotFound { .. } => {
                false
            }
        }
    }

    /// Stable snake_case label used for metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::RateLimited { .. } => "rate_limited",
            Self::AuthError { .. } => "auth_error",
            Self::InvalidResponse { .. } => "invalid_response",
            Self::NotFound { .. } => "not_found",
        }
    }

    /// Provider the failure is attributed to.
    #[must_use]
    pub fn provider(&self) -> &str {
        match self {
            Self::Timeout { provider }
            | Self::RateLimited { provider, .. }
            | Self::AuthError { provider, .. }
            | Self::InvalidResponse { provider, .. }
            | Self::NotFound { provider, .. } => provider,
        }
    }
}

/// Top-level error type for the screener workspace.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScreenerError {
    /// The requested symbol is not a valid ticker.
    #[error("invalid symbol {symbol:?}: {reason}")]
    InvalidSymbol {
        /// Symbol as supplied by the caller.
        symbol: String,
        /// Which rule it broke.
        reason: String,
    },

    /// An adapter was placed in a chain for a category it cannot serve.
    #[error("adapter {adapter} does not support {category}")]
    Unsupported {
        /// Adapter name.
        adapter: String,
        /// Category the chain serves.
        category: Category,
    },

    /// Invalid input argument.
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// A configuration value could not be parsed.
    #[error("invalid configuration for {key}: {msg}")]
    Config {
        /// Configuration key.
        key: String,
        /// What was wrong with the value.
        msg: String,
    },

    /// Every adapter in a category's chain failed.
    #[error("all sources failed for {category}: {errors:?}")]
    AgentExhausted {
        /// Category whose chain was exhausted.
        category: Category,
        /// Classified failures in attempt order.
        errors: Vec<SourceError>,
    },

    /// The request deadline elapsed before every category settled.
    #[error("request timed out after {elapsed_ms}ms")]
    OrchestratorTimeout {
        /// Time spent before the deadline fired.
        elapsed_ms: u64,
    },

    /// The request was cancelled by the caller.
    #[error("request cancelled")]
    Cancelled,

    /// An individual source error surfaced outside the fallback loop.
    #[error(transparent)]
    Source(#[from] SourceError),
}

impl ScreenerError {
    /// Helper: build an `InvalidSymbol` error.
    pub fn invalid_symbol(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSymbol {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }

    /// Helper: build a `Config` error.
    pub fn config(key: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Config {
            key: key.into(),
            msg: msg.into(),
        }
    }

    /// Stable snake_case code used in `error` events.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidSymbol { .. } => "invalid_symbol",
            Self::Unsupported { .. } => "unsupported",
            Self::InvalidArg(_) => "invalid_argument",
            Self::Config { .. } => "invalid_config",
            Self::AgentExhausted { .. } => "agent_exhausted",
            Self::OrchestratorTimeout { .. } => "timeout",
            Self::Cancelled => "cancelled",
            Self::Source(_) => "source_error",
        }
    }
}
