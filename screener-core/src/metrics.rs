//! Named counters and timers.
//!
//! Recorded through the `metrics` facade; installing an exporter is up to the
//! embedding application. Without one, every call is a no-op.

use std::time::Duration;

use screener_types::{Category, SourceError, TaskStatus};

/// Requests by outcome (`completed`, `timed_out`, `invalid_symbol`, `cancelled`).
pub const REQUESTS_TOTAL: &str = "screener_requests_total";
/// End-to-end request latency.
pub const REQUEST_DURATION: &str = "screener_request_duration_seconds";
/// Terminal agent tasks by category and status.
pub const AGENT_TASKS_TOTAL: &str = "screener_agent_tasks_total";
/// Adapter calls by provider, adapter and outcome.
pub const SOURCE_CALLS_TOTAL: &str = "screener_source_calls_total";
/// Adapter call latency by provider.
pub const SOURCE_CALL_DURATION: &str = "screener_source_call_duration_seconds";
/// Local token-bucket denials by provider.
pub const RATE_LIMIT_DENIED: &str = "screener_rate_limit_denied_total";

/// Record a finished request.
pub fn record_request(outcome: &'static str, elapsed: Duration) {
    metrics::counter!(REQUESTS_TOTAL, "outcome" => outcome).increment(1);
    metrics::histogram!(REQUEST_DURATION, "outcome" => outcome).record(elapsed.as_secs_f64());
}

/// Record a task reaching a terminal state.
pub fn record_task(category: Category, status: TaskStatus) {
    metrics::counter!(
        AGENT_TASKS_TOTAL,
        "category" => category.as_str(),
        "status" => status.as_str()
    )
    .increment(1);
}

/// Record one adapter call.
pub fn record_source_call<T>(
    provider: &'static str,
    adapter: &'static str,
    result: &Result<T, SourceError>,
    elapsed: Duration,
) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    };
    metrics::counter!(
        SOURCE_CALLS_TOTAL,
        "provider" => provider,
        "adapter" => adapter,
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!(SOURCE_CALL_DURATION, "provider" => provider)
        .record(elapsed.as_secs_f64());
}
