use std::sync::Arc;

use screener::{
    Category, EventPayload, FailureReason, FallbackChain, PriceData, Screener, SourceAdapter,
    SourceError, TaskStatus,
};
use screener_mock::MockSource;

use crate::helpers::{AAPL, chain, collect, price, retry};

fn task_event(events: &[screener::StreamEvent], category: Category) -> &screener::StreamEvent {
    events
        .iter()
        .find(|e| e.category == Some(category))
        .expect("task event for category")
}

#[tokio::test(start_paused = true)]
async fn first_success_stops_the_chain() {
    let a = Arc::new(MockSource::new("a").returns(price(10.0)));
    let b = Arc::new(MockSource::new("b").returns(price(20.0)));
    let c = Arc::new(MockSource::new("c").returns(price(30.0)));

    let screener = Screener::builder()
        .with_chain(chain(Category::Price, &[a.clone(), b.clone(), c.clone()]))
        .build()
        .unwrap();
    let resp = screener.analyze(AAPL).await.unwrap();

    assert_eq!(a.calls(), 1);
    assert_eq!(b.calls(), 0);
    assert_eq!(c.calls(), 0);
    assert_eq!(resp.price, Some(10.0));
    assert_eq!(resp.data_sources, vec!["a".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn non_retryable_error_moves_on_without_retrying() {
    let a = Arc::new(MockSource::new("a").fails(Category::Price, SourceError::auth("a", "bad key")));
    let b = Arc::new(MockSource::new("b").returns(price(20.0)));

    let screener = Screener::builder()
        .with_chain(chain(Category::Price, &[a.clone(), b.clone()]))
        .retry(retry(3, 100))
        .build()
        .unwrap();
    let events = collect(screener.stream(AAPL)).await;

    assert_eq!(a.calls(), 1);
    assert_eq!(b.calls(), 1);
    let ev = task_event(&events, Category::Price);
    assert_eq!(ev.status, Some(TaskStatus::Succeeded));
    let Some(EventPayload::Task(outcome)) = &ev.payload else {
        panic!("task payload expected");
    };
    assert_eq!(outcome.source.as_deref(), Some("b"));
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].error.kind(), "auth_error");
}

#[tokio::test(start_paused = true)]
async fn partial_result_stops_the_chain() {
    let a = Arc::new(MockSource::new("a").returns(screener::CategoryPayload::Price(PriceData::new(5.0))));
    let b = Arc::new(MockSource::new("b").returns(price(20.0)));

    let screener = Screener::builder()
        .with_chain(chain(Category::Price, &[a.clone(), b.clone()]))
        .build()
        .unwrap();
    let events = collect(screener.stream(AAPL)).await;

    assert_eq!(b.calls(), 0);
    let ev = task_event(&events, Category::Price);
    assert_eq!(ev.status, Some(TaskStatus::Partial));
    let Some(EventPayload::Task(outcome)) = &ev.payload else {
        panic!("task payload expected");
    };
    assert_eq!(outcome.missing_fields, vec!["volume", "change"]);

    let resp = events.last().and_then(|e| e.as_final()).unwrap();
    assert_eq!(resp.price, Some(5.0));
    assert_eq!(resp.volume, None);
    assert_eq!(resp.change, None);
    assert_eq!(resp.data_sources, vec!["a".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn exhausted_chain_keeps_errors_in_attempt_order() {
    let a = Arc::new(MockSource::new("a").fails(Category::Analyst, SourceError::not_found("a", "AAPL")));
    let b = Arc::new(MockSource::new("b").fails(Category::Analyst, SourceError::auth("b", "expired")));

    let screener = Screener::builder()
        .with_chain(chain(Category::Analyst, &[a, b]))
        .build()
        .unwrap();
    let events = collect(screener.stream(AAPL)).await;

    let ev = task_event(&events, Category::Analyst);
    assert_eq!(ev.status, Some(TaskStatus::Failed));
    let Some(EventPayload::Task(outcome)) = &ev.payload else {
        panic!("task payload expected");
    };
    assert_eq!(outcome.reason, Some(FailureReason::Exhausted));
    let order: Vec<(&str, &str)> = outcome
        .errors
        .iter()
        .map(|e| (e.adapter.as_str(), e.error.kind()))
        .collect();
    assert_eq!(order, [("a", "not_found"), ("b", "auth_error")]);

    let resp = events.last().and_then(|e| e.as_final()).unwrap();
    assert!(resp.analyst_ratings.is_empty());
    assert_eq!(resp.consensus_rating, None);
    assert!(resp.data_sources.is_empty());
}

#[tokio::test(start_paused = true)]
async fn explicit_priority_wins_over_registration_order() {
    let a = Arc::new(MockSource::new("a").returns(price(10.0)));
    let b = Arc::new(MockSource::new("b").returns(price(20.0)));
    let chain = FallbackChain::new(Category::Price)
        .with_priority(a.clone() as Arc<dyn SourceAdapter>, 10)
        .unwrap()
        .with_priority(b.clone() as Arc<dyn SourceAdapter>, 1)
        .unwrap();
    assert_eq!(chain.adapter_names(), ["b", "a"]);

    let screener = Screener::builder().with_chain(chain).build().unwrap();
    let resp = screener.analyze(AAPL).await.unwrap();
    assert_eq!(a.calls(), 0);
    assert_eq!(resp.data_sources, vec!["b".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn invalid_payload_is_treated_as_non_retryable() {
    let a = Arc::new(MockSource::new("a").returns(screener::CategoryPayload::Price(PriceData::new(-1.0))));
    let b = Arc::new(MockSource::new("b").returns(price(20.0)));

    let screener = Screener::builder()
        .with_chain(chain(Category::Price, &[a.clone(), b]))
        .retry(retry(3, 100))
        .build()
        .unwrap();
    let resp = screener.analyze(AAPL).await.unwrap();
    assert_eq!(a.calls(), 1);
    assert_eq!(resp.price, Some(20.0));
}
