use std::time::Duration;

use chrono::{DateTime, Utc};
use screener_core::Symbol;
use tokio::time::Instant;
use uuid::Uuid;

/// One analysis request. Immutable once created.
#[derive(Debug, Clone)]
pub struct Request {
    /// Correlates log lines and events of this request.
    pub id: Uuid,
    /// Validated ticker.
    pub symbol: Symbol,
    /// Wall-clock creation time.
    pub created_at: DateTime<Utc>,
    /// Monotonic deadline after which stragglers are timed out.
    pub deadline: Instant,
}

impl Request {
    /// New request for `symbol` that must settle within `timeout`.
    #[must_use]
    pub fn new(symbol: Symbol, timeout: Duration) -> Self {
        let now = Instant::now();
        Self {
            id: Uuid::new_v4(),
            symbol,
            created_at: Utc::now(),
            deadline: now.checked_add(timeout).unwrap_or(now + Duration::from_secs(86_400 * 365)),
        }
    }

    /// Time left before the deadline.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}
