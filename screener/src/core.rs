use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use screener_core::metrics;
use screener_core::{
    AgentTask, AggregatedResponse, Category, EngineConfig, FailureReason, FallbackChain,
    RateLimiter, RetryConfig, ScreenerError, SentimentWeights, Symbol, TaskStatus,
};
use tokio::sync::mpsc;
use tokio::task::{Id, JoinSet};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::agent::{Agent, AgentContext, Progress};
use crate::aggregate::aggregate;
use crate::request::Request;
use crate::stream::{AnalysisStream, Publisher};

/// Orchestrator running one agent per category for every request.
///
/// Cheap to clone; clones share chains, configuration and the rate limiter.
#[derive(Clone, Debug)]
pub struct Screener {
    agents: Arc<[Agent]>,
    limiter: Arc<RateLimiter>,
    cfg: Arc<EngineConfig>,
}

/// Builder for [`Screener`].
pub struct ScreenerBuilder {
    chains: BTreeMap<Category, FallbackChain>,
    limiter: Option<Arc<RateLimiter>>,
    cfg: EngineConfig,
}

impl Default for ScreenerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreenerBuilder {
    /// Empty builder with default [`EngineConfig`] and an unlimited rate limiter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            chains: BTreeMap::new(),
            limiter: None,
            cfg: EngineConfig::default(),
        }
    }

    /// Register the fallback chain for its category.
    ///
    /// A second chain for the same category replaces the first.
    #[must_use]
    pub fn with_chain(mut self, chain: FallbackChain) -> Self {
        self.chains.insert(chain.category(), chain);
        self
    }

    /// Register several chains at once.
    #[must_use]
    pub fn with_chains(self, chains: impl IntoIterator<Item = FallbackChain>) -> Self {
        chains.into_iter().fold(self, Self::with_chain)
    }

    /// Share a process-wide rate limiter.
    ///
    /// Screeners built with the same limiter draw from the same provider quotas.
    #[must_use]
    pub fn rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Replace the whole engine configuration.
    #[must_use]
    pub fn config(mut self, cfg: EngineConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Overall deadline for each request.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.request_timeout = timeout;
        self
    }

    /// Timeout applied to each adapter call.
    #[must_use]
    pub const fn call_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.call_timeout = timeout;
        self
    }

    /// Per-adapter retry policy.
    #[must_use]
    pub const fn retry(mut self, retry: RetryConfig) -> Self {
        self.cfg.retry = retry;
        self
    }

    /// Sentiment method weights used by the aggregator.
    #[must_use]
    pub const fn sentiment_weights(mut self, weights: SentimentWeights) -> Self {
        self.cfg.sentiment_weights = weights;
        self
    }

    /// Build the orchestrator.
    ///
    /// Categories without a registered chain get an empty one; their agent
    /// fails as exhausted on every request.
    ///
    /// # Errors
    /// `InvalidArg` when no chain holds any adapter or the event buffer is zero.
    pub fn build(mut self) -> Result<Screener, ScreenerError> {
        if self.chains.values().all(FallbackChain::is_empty) {
            return Err(ScreenerError::InvalidArg(
                "no source adapters registered".into(),
            ));
        }
        if self.cfg.event_buffer == 0 {
            return Err(ScreenerError::InvalidArg(
                "event_buffer must be at least 1".into(),
            ));
        }
        let agents: Arc<[Agent]> = Category::ALL
            .into_iter()
            .map(|c| {
                let chain = self.chains.remove(&c).unwrap_or_else(|| FallbackChain::new(c));
                if chain.is_empty() {
                    tracing::warn!(category = %c, "no adapters for category");
                }
                Agent::for_chain(chain)
            })
            .collect();
        Ok(Screener {
            agents,
            limiter: self.limiter.unwrap_or_default(),
            cfg: Arc::new(self.cfg),
        })
    }
}

impl Screener {
    /// Start building a screener.
    #[must_use]
    pub fn builder() -> ScreenerBuilder {
        ScreenerBuilder::new()
    }

    /// The shared rate limiter.
    #[must_use]
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    /// Agents in category order.
    #[must_use]
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Analyse `symbol`, streaming progress.
    ///
    /// Never fails up front: an invalid symbol yields a stream holding a
    /// single `error` event. Must be called within a Tokio runtime.
    #[must_use]
    pub fn stream(&self, symbol: &str) -> AnalysisStream {
        match Symbol::parse(symbol) {
            Ok(symbol) => self.start(symbol),
            Err(err) => {
                tracing::info!(symbol, error = %err, "rejected symbol");
                metrics::record_request("invalid_symbol", Duration::ZERO);
                let (tx, rx) = mpsc::channel(1);
                Publisher::new(tx).fail(&err);
                AnalysisStream::new(None, rx, CancellationToken::new())
            }
        }
    }

    /// Analyse `symbol`, streaming progress.
    ///
    /// # Errors
    /// `InvalidSymbol` when `symbol` is not a ticker; no agent is started.
    pub fn run(&self, symbol: &str) -> Result<AnalysisStream, ScreenerError> {
        let symbol = Symbol::parse(symbol).inspect_err(|_| {
            metrics::record_request("invalid_symbol", Duration::ZERO);
        })?;
        Ok(self.start(symbol))
    }

    /// Analyse `symbol` and wait for the merged response.
    ///
    /// # Errors
    /// `InvalidSymbol` for a malformed ticker.
    pub async fn analyze(&self, symbol: &str) -> Result<AggregatedResponse, ScreenerError> {
        self.run(symbol)?.into_response().await
    }

    fn start(&self, symbol: Symbol) -> AnalysisStream {
        let request = Request::new(symbol, self.cfg.request_timeout);
        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::channel(self.cfg.event_buffer);
        let stream = AnalysisStream::new(Some(request.id), rx, cancel.clone());

        let span = tracing::info_span!(
            "screener::core::request",
            request_id = %request.id,
            symbol = %request.symbol,
        );
        tokio::spawn(
            drive(self.clone(), request, cancel, Publisher::new(tx)).instrument(span),
        );
        stream
    }
}

enum Outcome {
    Completed,
    TimedOut,
    Cancelled,
}

impl Outcome {
    const fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::TimedOut => "timed_out",
            Self::Cancelled => "cancelled",
        }
    }
}

async fn drive(screener: Screener, request: Request, cancel: CancellationToken, publisher: Publisher) {
    let started = Instant::now();
    tracing::info!(timeout = ?screener.cfg.request_timeout, "analysis started");

    let mut set = JoinSet::new();
    let mut pending: HashMap<Id, (Category, Progress)> =
        HashMap::with_capacity(screener.agents.len());
    for agent in screener.agents.iter().cloned() {
        let progress = Progress::default();
        let ctx = AgentContext {
            request_id: request.id,
            symbol: request.symbol.clone(),
            deadline: request.deadline,
            cancel: cancel.child_token(),
            limiter: Arc::clone(&screener.limiter),
            retry: screener.cfg.retry,
            call_timeout: screener.cfg.call_timeout,
            progress: progress.clone(),
        };
        let category = agent.category();
        let handle = set.spawn(async move { agent.execute(&ctx).await }.in_current_span());
        pending.insert(handle.id(), (category, progress));
    }

    let mut tasks: Vec<AgentTask> = Vec::with_capacity(pending.len());
    let outcome = loop {
        if pending.is_empty() {
            break Outcome::Completed;
        }
        let task = tokio::select! {
            biased;
            () = cancel.cancelled() => break Outcome::Cancelled,
            () = publisher.closed() => break Outcome::Cancelled,
            Some(joined) = set.join_next_with_id() => match joined {
                Ok((id, task)) => {
                    pending.remove(&id);
                    task
                }
                Err(e) => {
                    let Some((category, _)) = pending.remove(&e.id()) else {
                        continue;
                    };
                    tracing::error!(%category, error = %e, "agent aborted");
                    abandoned(category, &request)
                }
            },
            () = tokio::time::sleep_until(request.deadline) => break Outcome::TimedOut,
        };
        metrics::record_task(task.category, task.status);
        if publisher.task_completed(&task).await.is_err() {
            break Outcome::Cancelled;
        }
        tasks.push(task);
    };
    set.abort_all();
    cancel.cancel();

    if let Outcome::Cancelled = outcome {
        tracing::info!(settled = tasks.len(), "analysis cancelled");
        metrics::record_request(outcome.as_str(), started.elapsed());
        publisher.fail(&ScreenerError::Cancelled);
        return;
    }

    if let Outcome::TimedOut = outcome {
        let mut stragglers: Vec<(Category, Progress)> = pending.into_values().collect();
        stragglers.sort_unstable_by_key(|(category, _)| *category);
        tracing::warn!(
            stragglers = ?stragglers.iter().map(|(c, _)| *c).collect::<Vec<_>>(),
            "deadline reached"
        );
        for (category, progress) in stragglers {
            // Keep whatever the agent recorded before it was aborted.
            let task = progress
                .snapshot()
                .unwrap_or_else(|| AgentTask::new(category))
                .expire(request.created_at, Utc::now());
            metrics::record_task(task.category, task.status);
            if publisher.task_completed(&task).await.is_err() {
                metrics::record_request(Outcome::Cancelled.as_str(), started.elapsed());
                return;
            }
            tasks.push(task);
        }
    }

    let response = aggregate(
        request.symbol.as_str(),
        &tasks,
        &screener.cfg.sentiment_weights,
    );
    tracing::info!(
        outcome = outcome.as_str(),
        sources = ?response.data_sources,
        elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        "analysis finished"
    );
    metrics::record_request(outcome.as_str(), started.elapsed());
    if publisher.finish(response).await.is_err() {
        tracing::debug!("caller left before the final event");
    }
}

/// Terminal stand-in for an agent whose task panicked.
fn abandoned(category: Category, request: &Request) -> AgentTask {
    let mut task = AgentTask::new(category);
    task.started_at = Some(request.created_at);
    if let Err(e) = task.transition(TaskStatus::Failed, Utc::now()) {
        tracing::error!(error = %e, "rejected task transition");
    }
    task.failure = Some(FailureReason::Exhausted);
    task
}
