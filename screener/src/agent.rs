use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use screener_core::metrics;
use screener_core::{
    Acquire, AgentTask, Category, ChainEntry, Completeness, EngineConfig, FailureReason,
    FallbackChain, RateLimiter, RetryConfig, SourceError, Symbol, TaskStatus, call_with_timeout,
    fetch_category,
};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::backoff::retry_delay;

/// Everything an agent needs from its request.
#[derive(Clone)]
pub struct AgentContext {
    /// Request identifier, for log correlation.
    pub request_id: Uuid,
    /// Validated ticker.
    pub symbol: Symbol,
    /// Request deadline; no attempt or backoff starts past it.
    pub deadline: Instant,
    /// Fired on caller disconnect or explicit cancellation.
    pub cancel: CancellationToken,
    /// Process-wide provider quotas.
    pub limiter: Arc<RateLimiter>,
    /// Per-adapter retry policy.
    pub retry: RetryConfig,
    /// Timeout for a single adapter call.
    pub call_timeout: Duration,
    /// Where the agent mirrors its task while running.
    pub progress: Progress,
}

/// Last state an agent published, readable after the agent is aborted.
#[derive(Clone, Default)]
pub struct Progress(Arc<Mutex<Option<AgentTask>>>);

impl Progress {
    fn lock(&self) -> MutexGuard<'_, Option<AgentTask>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, task: &AgentTask) {
        *self.lock() = Some(task.clone());
    }

    /// Copy of the last published task.
    #[must_use]
    pub fn snapshot(&self) -> Option<AgentTask> {
        self.lock().clone()
    }
}

impl AgentContext {
    /// Context for a standalone agent run.
    #[must_use]
    pub fn new(
        symbol: Symbol,
        deadline: Instant,
        limiter: Arc<RateLimiter>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            symbol,
            deadline,
            cancel: CancellationToken::new(),
            limiter,
            retry: config.retry,
            call_timeout: config.call_timeout,
            progress: Progress::default(),
        }
    }

    /// Replace the cancellation token.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// One category handler, bound at construction to its fallback chain.
#[derive(Clone, Debug)]
pub enum Agent {
    /// Price quote.
    Price(FallbackChain),
    /// Valuation and profitability metrics.
    Fundamentals(FallbackChain),
    /// Analyst ratings and earnings.
    Analyst(FallbackChain),
    /// News sentiment.
    Sentiment(FallbackChain),
    /// Company identity.
    CompanyInfo(FallbackChain),
}

enum Step {
    Done,
    NextAdapter,
    Stop(FailureReason),
}

impl Agent {
    /// Agent serving `chain`'s category.
    #[must_use]
    pub fn for_chain(chain: FallbackChain) -> Self {
        match chain.category() {
            Category::Price => Self::Price(chain),
            Category::Fundamentals => Self::Fundamentals(chain),
            Category::Analyst => Self::Analyst(chain),
            Category::Sentiment => Self::Sentiment(chain),
            Category::CompanyInfo => Self::CompanyInfo(chain),
        }
    }

    /// The bound chain.
    #[must_use]
    pub const fn chain(&self) -> &FallbackChain {
        match self {
            Self::Price(c)
            | Self::Fundamentals(c)
            | Self::Analyst(c)
            | Self::Sentiment(c)
            | Self::CompanyInfo(c) => c,
        }
    }

    /// Category served.
    #[must_use]
    pub const fn category(&self) -> Category {
        self.chain().category()
    }

    /// Walk the chain until one adapter yields valid data.
    ///
    /// Always returns a terminal task.
    #[tracing::instrument(
        name = "screener::agent::execute",
        skip(self, ctx),
        fields(request_id = %ctx.request_id, symbol = %ctx.symbol, category = %self.category()),
    )]
    pub async fn execute(&self, ctx: &AgentContext) -> AgentTask {
        let mut task = AgentTask::new(self.category());
        if let Some(reason) = interrupted(ctx) {
            settle(&mut task, TaskStatus::Failed, Some(reason));
            return task;
        }
        settle(&mut task, TaskStatus::Running, None);
        ctx.progress.publish(&task);

        for entry in self.chain().entries() {
            match self.try_adapter(entry, ctx, &mut task).await {
                Step::Done => return task,
                Step::NextAdapter => {}
                Step::Stop(reason) => {
                    settle(&mut task, TaskStatus::Failed, Some(reason));
                    return task;
                }
            }
        }

        tracing::debug!(errors = task.errors.len(), "chain exhausted");
        settle(&mut task, TaskStatus::Failed, Some(FailureReason::Exhausted));
        task
    }

    async fn try_adapter(
        &self,
        entry: &ChainEntry,
        ctx: &AgentContext,
        task: &mut AgentTask,
    ) -> Step {
        let adapter = entry.adapter.as_ref();
        let name = adapter.name();
        let provider = adapter.provider();
        let attempts = ctx.retry.attempts();

        for attempt in 1..=attempts {
            if let Some(reason) = interrupted(ctx) {
                return Step::Stop(reason);
            }
            let n = task.record_attempt(name);
            ctx.progress.publish(task);

            let result = match ctx.limiter.acquire(provider) {
                Acquire::Granted => {
                    let Some(fut) = fetch_category(adapter, self.category(), &ctx.symbol) else {
                        tracing::debug!(adapter = name, "capability missing; skipping");
                        return Step::NextAdapter;
                    };
                    let started = Instant::now();
                    let res = tokio::select! {
                        biased;
                        () = ctx.cancel.cancelled() => return Step::Stop(FailureReason::Cancelled),
                        r = call_with_timeout(provider, ctx.call_timeout, fut) => r,
                    };
                    metrics::record_source_call(provider, name, &res, started.elapsed());
                    res
                }
                Acquire::Denied { retry_after } => Err(SourceError::RateLimited {
                    provider: provider.to_string(),
                    retry_after_ms: Some(u64::try_from(retry_after.as_millis()).unwrap_or(u64::MAX)),
                }),
            };

            let err = match result {
                Ok(payload) => match payload.validate() {
                    Ok(completeness) => {
                        let status = match completeness {
                            Completeness::Complete => TaskStatus::Succeeded,
                            Completeness::Partial(missing) => {
                                task.missing_fields =
                                    missing.into_iter().map(str::to_string).collect();
                                TaskStatus::Partial
                            }
                        };
                        tracing::debug!(adapter = name, attempt = n, status = status.as_str(), "adapter answered");
                        task.result = Some(payload);
                        task.contributing_source = Some(name.to_string());
                        settle(task, status, None);
                        return Step::Done;
                    }
                    Err(msg) => SourceError::invalid(provider, msg),
                },
                Err(e) => e,
            };

            let retryable = err.is_retryable();
            if retryable {
                tracing::warn!(adapter = name, attempt = n, error = %err, "retryable failure");
            } else {
                tracing::debug!(adapter = name, attempt = n, error = %err, "adapter abandoned");
            }
            task.record_error(name, n, err);
            ctx.progress.publish(task);
            if !retryable || attempt == attempts {
                return Step::NextAdapter;
            }

            let delay = retry_delay(&ctx.retry, attempt);
            let remaining = ctx.deadline.saturating_duration_since(Instant::now());
            if delay >= remaining {
                tracing::debug!(adapter = name, ?delay, ?remaining, "backoff would pass the deadline");
                return Step::NextAdapter;
            }
            tokio::select! {
                biased;
                () = ctx.cancel.cancelled() => return Step::Stop(FailureReason::Cancelled),
                () = tokio::time::sleep(delay) => {}
            }
        }
        Step::NextAdapter
    }
}

fn interrupted(ctx: &AgentContext) -> Option<FailureReason> {
    if ctx.cancel.is_cancelled() {
        Some(FailureReason::Cancelled)
    } else if Instant::now() >= ctx.deadline {
        Some(FailureReason::Timeout)
    } else {
        None
    }
}

fn settle(task: &mut AgentTask, status: TaskStatus, failure: Option<FailureReason>) {
    if let Err(e) = task.transition(status, Utc::now()) {
        tracing::error!(error = %e, "rejected task transition");
        return;
    }
    if failure.is_some() {
        task.failure = failure;
    }
}
