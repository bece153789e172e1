use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use screener_core::{
    AnalystData, AnalystSource, Category, CategoryPayload, CompanyInfo, CompanyInfoSource,
    FinancialMetrics, FundamentalsSource, PriceData, PriceSource, SentimentData, SentimentSource,
    SourceAdapter, SourceError, Symbol,
};
use tokio::time::Instant;

/// Instruction for how one call should behave.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Return the payload.
    Return(CategoryPayload),
    /// Fail with the error.
    Fail(SourceError),
    /// Never complete (simulate a stalled upstream).
    Hang,
    /// Sleep, then behave as the inner instruction.
    Delayed(Duration, Box<MockBehavior>),
}

impl MockBehavior {
    /// Wrap `self` behind a delay.
    #[must_use]
    pub fn after(self, delay: Duration) -> Self {
        Self::Delayed(delay, Box::new(self))
    }
}

struct Script {
    steps: VecDeque<MockBehavior>,
    fallback: MockBehavior,
}

#[derive(Default)]
struct State {
    scripts: HashMap<Category, Script>,
    calls: Vec<(Category, Instant)>,
}

/// Scriptable adapter used by integration tests.
///
/// Each category has an optional queue of one-shot steps followed by a
/// fallback behavior repeated forever. Only categories with a configured
/// behavior are advertised as capabilities. Every call is recorded with the
/// tokio clock so tests can assert ordering and backoff spacing.
#[derive(Clone)]
pub struct MockSource {
    name: &'static str,
    provider: &'static str,
    delay: Duration,
    state: Arc<Mutex<State>>,
}

impl MockSource {
    /// New adapter with no capabilities.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            provider: name,
            delay: Duration::ZERO,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Rate-limit key; defaults to the adapter name.
    #[must_use]
    pub const fn with_provider(mut self, provider: &'static str) -> Self {
        self.provider = provider;
        self
    }

    /// Latency applied before every call.
    #[must_use]
    pub const fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Always answer `category` with `behavior`.
    #[must_use]
    pub fn always(self, category: Category, behavior: MockBehavior) -> Self {
        self.lock()
            .scripts
            .entry(category)
            .and_modify(|s| s.fallback = behavior.clone())
            .or_insert_with(|| Script {
                steps: VecDeque::new(),
                fallback: behavior,
            });
        self
    }

    /// Always return `payload` for its category.
    #[must_use]
    pub fn returns(self, payload: CategoryPayload) -> Self {
        let category = payload.category();
        self.always(category, MockBehavior::Return(payload))
    }

    /// Always fail `category` with `error`.
    #[must_use]
    pub fn fails(self, category: Category, error: SourceError) -> Self {
        self.always(category, MockBehavior::Fail(error))
    }

    /// Never answer `category`.
    #[must_use]
    pub fn hangs(self, category: Category) -> Self {
        self.always(category, MockBehavior::Hang)
    }

    /// Queue a one-shot step for `category`, consumed before the fallback.
    ///
    /// A category with steps but no fallback fails with `NotFound` once the
    /// queue is drained.
    #[must_use]
    pub fn then(self, category: Category, behavior: MockBehavior) -> Self {
        let provider = self.provider;
        self.lock()
            .scripts
            .entry(category)
            .or_insert_with(|| Script {
                steps: VecDeque::new(),
                fallback: MockBehavior::Fail(SourceError::not_found(provider, "script drained")),
            })
            .steps
            .push_back(behavior);
        self
    }

    /// Total calls across all categories.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.lock().calls.len()
    }

    /// Calls made for `category`.
    #[must_use]
    pub fn calls_for(&self, category: Category) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|(c, _)| *c == category)
            .count()
    }

    /// Instants at which `category` was called, in order.
    #[must_use]
    pub fn call_times(&self, category: Category) -> Vec<Instant> {
        self.lock()
            .calls
            .iter()
            .filter(|(c, _)| *c == category)
            .map(|(_, t)| *t)
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn next_behavior(&self, category: Category) -> Option<MockBehavior> {
        let mut state = self.lock();
        state.calls.push((category, Instant::now()));
        let script = state.scripts.get_mut(&category)?;
        Some(
            script
                .steps
                .pop_front()
                .unwrap_or_else(|| script.fallback.clone()),
        )
    }

    async fn run(&self, category: Category) -> Result<CategoryPayload, SourceError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let mut behavior = self.next_behavior(category).ok_or_else(|| {
            SourceError::invalid(self.provider, format!("{category} not scripted"))
        })?;
        loop {
            match behavior {
                MockBehavior::Return(p) if p.category() == category => return Ok(p),
                MockBehavior::Return(p) => {
                    return Err(SourceError::invalid(
                        self.provider,
                        format!("scripted {} payload for {category}", p.category()),
                    ));
                }
                MockBehavior::Fail(e) => return Err(e),
                MockBehavior::Hang => return std::future::pending().await,
                MockBehavior::Delayed(d, inner) => {
                    tokio::time::sleep(d).await;
                    behavior = *inner;
                }
            }
        }
    }

    fn has(&self, category: Category) -> bool {
        self.lock().scripts.contains_key(&category)
    }
}

impl core::fmt::Debug for MockSource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MockSource")
            .field("name", &self.name)
            .field("provider", &self.provider)
            .field("calls", &self.calls())
            .finish_non_exhaustive()
    }
}

macro_rules! unwrap_payload {
    ($res:expr, $variant:ident, $provider:expr) => {
        match $res? {
            CategoryPayload::$variant(v) => Ok(v),
            other => Err(SourceError::invalid(
                $provider,
                format!("unexpected {} payload", other.category()),
            )),
        }
    };
}

#[async_trait]
impl PriceSource for MockSource {
    async fn price(&self, _symbol: &Symbol) -> Result<PriceData, SourceError> {
        unwrap_payload!(self.run(Category::Price).await, Price, self.provider)
    }
}

#[async_trait]
impl FundamentalsSource for MockSource {
    async fn fundamentals(&self, _symbol: &Symbol) -> Result<FinancialMetrics, SourceError> {
        unwrap_payload!(
            self.run(Category::Fundamentals).await,
            Fundamentals,
            self.provider
        )
    }
}

#[async_trait]
impl AnalystSource for MockSource {
    async fn analyst(&self, _symbol: &Symbol) -> Result<AnalystData, SourceError> {
        unwrap_payload!(self.run(Category::Analyst).await, Analyst, self.provider)
    }
}

#[async_trait]
impl SentimentSource for MockSource {
    async fn sentiment(&self, _symbol: &Symbol) -> Result<SentimentData, SourceError> {
        unwrap_payload!(self.run(Category::Sentiment).await, Sentiment, self.provider)
    }
}

#[async_trait]
impl CompanyInfoSource for MockSource {
    async fn company_info(&self, _symbol: &Symbol) -> Result<CompanyInfo, SourceError> {
        unwrap_payload!(
            self.run(Category::CompanyInfo).await,
            CompanyInfo,
            self.provider
        )
    }
}

impl SourceAdapter for MockSource {
    fn name(&self) -> &'static str {
        self.name
    }

    fn provider(&self) -> &'static str {
        self.provider
    }

    fn as_price_source(&self) -> Option<&dyn PriceSource> {
        self.has(Category::Price).then_some(self as &dyn PriceSource)
    }
    fn as_fundamentals_source(&self) -> Option<&dyn FundamentalsSource> {
        self.has(Category::Fundamentals)
            .then_some(self as &dyn FundamentalsSource)
    }
    fn as_analyst_source(&self) -> Option<&dyn AnalystSource> {
        self.has(Category::Analyst)
            .then_some(self as &dyn AnalystSource)
    }
    fn as_sentiment_source(&self) -> Option<&dyn SentimentSource> {
        self.has(Category::Sentiment)
            .then_some(self as &dyn SentimentSource)
    }
    fn as_company_info_source(&self) -> Option<&dyn CompanyInfoSource> {
        self.has(Category::CompanyInfo)
            .then_some(self as &dyn CompanyInfoSource)
    }
}
