use std::time::Duration;

use rand::Rng;
use screener_core::RetryConfig;

/// Randomised retry wait: `base_ms` stretched by less than `jitter_percent`
/// percent of itself. [`retry_delay`] applies it to the capped exponential
/// step before an agent re-tries the same adapter.
pub fn jitter_wait(base_ms: u64, jitter_percent: u32) -> u64 {
    let spread = (base_ms.saturating_mul(u64::from(jitter_percent)) / 100).max(1);
    base_ms + rand::rng().random_range(0..spread)
}

/// Wait before retry number `retry` (1-based) on the same adapter.
///
/// `min(base * factor^(retry-1), max)` plus jitter.
pub fn retry_delay(cfg: &RetryConfig, retry: u32) -> Duration {
    let max_ms = u64::try_from(cfg.max_delay.as_millis()).unwrap_or(u64::MAX);
    let factor = u64::from(cfg.factor.max(1));
    let mut base_ms = u64::try_from(cfg.base_delay.as_millis())
        .unwrap_or(u64::MAX)
        .min(max_ms);
    for _ in 1..retry {
        if base_ms >= max_ms {
            break;
        }
        base_ms = base_ms.saturating_mul(factor).min(max_ms);
    }
    Duration::from_millis(jitter_wait(base_ms, u32::from(cfg.jitter_percent.min(100))))
}
