//! Per-provider token buckets shared by every request in the process.
//!
//! Lifecycle: build one [`RateLimiter`] at startup, configure each provider's
//! published quota, share it behind an `Arc` with every orchestrator, and let it
//! drop at shutdown. Every grant and refill happens under one mutex, so the
//! tokens handed out inside a refill window never exceed the configured capacity
//! regardless of how many requests are in flight.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use screener_types::{RateLimitConfig, RateLimitState};
use tokio::time::Instant;

/// Result of asking for a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquire {
    /// A token was consumed; the call may proceed.
    Granted,
    /// The bucket is empty until the next window boundary.
    Denied {
        /// Time until the bucket refills.
        retry_after: Duration,
    },
}

impl Acquire {
    /// Whether the call may proceed.
    #[must_use]
    pub const fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }
}

struct Bucket {
    config: RateLimitConfig,
    available: u32,
    window_start: Instant,
}

impl Bucket {
    fn new(config: RateLimitConfig, now: Instant) -> Self {
        Self {
            config,
            available: config.capacity,
            window_start: now,
        }
    }

    fn refill(&mut self, now: Instant) {
        let window = self.config.refill_interval;
        let elapsed = now.saturating_duration_since(self.window_start);
        if window.is_zero() || elapsed < window {
            return;
        }
        self.available = self.config.capacity;
        // Keep windows aligned to regular boundaries even after idle gaps.
        let windows_passed = elapsed.as_nanos() / window.as_nanos();
        let offset = Duration::from_nanos(
            (windows_passed * window.as_nanos())
                .try_into()
                .unwrap_or(u64::MAX),
        );
        self.window_start += offset;
    }

    fn reset_in(&self, now: Instant) -> Duration {
        self.config
            .refill_interval
            .saturating_sub(now.saturating_duration_since(self.window_start))
    }
}

/// Process-scoped token-bucket limiter keyed by provider.
///
/// Providers without a configured quota are not limited.
#[derive(Default)]
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl RateLimiter {
    /// Empty limiter; every provider is unlimited until configured.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Limiter pre-configured with the given quotas.
    #[must_use]
    pub fn with_quotas<I, K>(quotas: I) -> Self
    where
        I: IntoIterator<Item = (K, RateLimitConfig)>,
        K: Into<String>,
    {
        let limiter = Self::new();
        for (provider, cfg) in quotas {
            limiter.configure(provider, cfg);
        }
        limiter
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Bucket>> {
        self.buckets.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("rate limiter mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Set (or replace) a provider's quota. The new bucket starts full.
    pub fn configure(&self, provider: impl Into<String>, config: RateLimitConfig) {
        let provider = provider.into();
        tracing::debug!(
            provider = %provider,
            capacity = config.capacity,
            refill_ms = u64::try_from(config.refill_interval.as_millis()).unwrap_or(u64::MAX),
            "configured rate limit"
        );
        self.lock()
            .insert(provider, Bucket::new(config, Instant::now()));
    }

    /// Try to take one token for `provider`.
    pub fn acquire(&self, provider: &str) -> Acquire {
        let now = Instant::now();
        let mut buckets = self.lock();
        let Some(bucket) = buckets.get_mut(provider) else {
            return Acquire::Granted;
        };
        bucket.refill(now);
        if bucket.available > 0 {
            bucket.available -= 1;
            return Acquire::Granted;
        }
        let retry_after = bucket.reset_in(now);
        drop(buckets);
        metrics::counter!(crate::metrics::RATE_LIMIT_DENIED, "provider" => provider.to_string())
            .increment(1);
        tracing::warn!(
            provider,
            retry_after_ms = u64::try_from(retry_after.as_millis()).unwrap_or(u64::MAX),
            "rate limit bucket empty"
        );
        Acquire::Denied { retry_after }
    }

    /// Snapshot of a provider's bucket, if configured.
    #[must_use]
    pub fn state(&self, provider: &str) -> Option<RateLimitState> {
        let now = Instant::now();
        let mut buckets = self.lock();
        let bucket = buckets.get_mut(provider)?;
        bucket.refill(now);
        Some(RateLimitState {
            capacity: bucket.config.capacity,
            available: bucket.available,
            reset_in: bucket.reset_in(now),
        })
    }

    /// Providers with a configured quota, sorted.
    #[must_use]
    pub fn providers(&self) -> Vec<String> {
        let mut out: Vec<String> = self.lock().keys().cloned().collect();
        out.sort();
        out
    }
}

impl core::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("providers", &self.providers())
            .finish()
    }
}
