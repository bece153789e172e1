use std::sync::Arc;
use std::time::Duration;

use screener::{
    Category, EventPayload, EventType, FailureReason, Screener, SourceError, TaskStatus,
};
use screener_mock::{MockBehavior, MockSource};
use tokio::time::Instant;

use crate::helpers::{AAPL, analyst, chain, collect, company, fundamentals, price, retry};

#[tokio::test(start_paused = true)]
async fn straggler_is_timed_out_before_final() {
    let fast = Arc::new(
        MockSource::new("fast")
            .returns(price(196.58))
            .returns(fundamentals())
            .returns(analyst())
            .returns(company()),
    );
    let stalled = Arc::new(MockSource::new("stalled").hangs(Category::Sentiment));

    let screener = Screener::builder()
        .with_chain(chain(Category::Price, &[fast.clone()]))
        .with_chain(chain(Category::Fundamentals, &[fast.clone()]))
        .with_chain(chain(Category::Analyst, &[fast.clone()]))
        .with_chain(chain(Category::CompanyInfo, &[fast]))
        .with_chain(chain(Category::Sentiment, &[stalled.clone()]))
        .request_timeout(Duration::from_secs(5))
        .build()
        .unwrap();

    let started = Instant::now();
    let events = collect(screener.stream(AAPL)).await;
    assert!(started.elapsed() >= Duration::from_secs(5));
    assert!(started.elapsed() < Duration::from_secs(6));

    assert_eq!(events.len(), 6);
    let synthetic = &events[4];
    assert_eq!(synthetic.kind, EventType::TaskCompleted);
    assert_eq!(synthetic.category, Some(Category::Sentiment));
    assert_eq!(synthetic.status, Some(TaskStatus::Failed));
    let Some(EventPayload::Task(outcome)) = &synthetic.payload else {
        panic!("task payload expected");
    };
    assert_eq!(outcome.reason, Some(FailureReason::Timeout));

    let resp = events[5].as_final().unwrap();
    assert_eq!(resp.price, Some(196.58));
    assert_eq!(resp.company_name.as_deref(), Some("Apple Inc."));
    assert_eq!(resp.data_sources, vec!["fast".to_string()]);
    assert!(resp.sentiment_items.is_empty());
    assert_eq!(stalled.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn several_stragglers_are_reported_in_category_order() {
    let stalled = Arc::new(
        MockSource::new("stalled")
            .hangs(Category::CompanyInfo)
            .hangs(Category::Price),
    );
    let quick = Arc::new(MockSource::new("quick").returns(analyst()));

    let screener = Screener::builder()
        .with_chain(chain(Category::CompanyInfo, &[stalled.clone()]))
        .with_chain(chain(Category::Price, &[stalled]))
        .with_chain(chain(Category::Analyst, &[quick]))
        .request_timeout(Duration::from_secs(2))
        .build()
        .unwrap();
    let events = collect(screener.stream(AAPL)).await;

    let tail: Vec<Option<Category>> = events[3..5].iter().map(|e| e.category).collect();
    assert_eq!(tail, [Some(Category::Price), Some(Category::CompanyInfo)]);
    assert!(events[5].is_final());
    assert_eq!(events.len(), 6);
}

#[tokio::test(start_paused = true)]
async fn timed_out_task_keeps_errors_recorded_before_the_deadline() {
    let wobbly = Arc::new(
        MockSource::new("wobbly")
            .hangs(Category::Price)
            .then(Category::Price, MockBehavior::Fail(SourceError::timeout("wobbly"))),
    );
    let screener = Screener::builder()
        .with_chain(chain(Category::Price, &[wobbly.clone()]))
        .retry(retry(3, 100))
        .call_timeout(Duration::from_secs(60))
        .request_timeout(Duration::from_secs(2))
        .build()
        .unwrap();

    let events = collect(screener.stream(AAPL)).await;
    assert!(events.last().unwrap().is_final());
    let price_event = events
        .iter()
        .find(|e| e.category == Some(Category::Price))
        .unwrap();
    assert_eq!(price_event.status, Some(TaskStatus::Failed));
    let Some(EventPayload::Task(outcome)) = &price_event.payload else {
        panic!("task payload expected");
    };
    assert_eq!(outcome.reason, Some(FailureReason::Timeout));
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].adapter, "wobbly");
    assert_eq!(outcome.errors[0].error.kind(), "timeout");
    assert_eq!(wobbly.calls(), 2);
}
