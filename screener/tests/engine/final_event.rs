use std::sync::Arc;

use proptest::prelude::*;
use screener::{Category, EventType, Screener, SentimentScore, SourceError};
use screener_mock::MockSource;

use crate::helpers::{
    AAPL, analyst, chains, collect, company, dead_source, finals, full_source, fundamentals,
    kinds, price, retry, sentiment,
};

fn assert_well_formed(events: &[screener::StreamEvent]) {
    assert_eq!(finals(events), 1, "{:?}", kinds(events));
    assert!(events.last().is_some_and(screener::StreamEvent::is_final));
    let completed = kinds(events)
        .into_iter()
        .filter(|k| *k == EventType::TaskCompleted)
        .count();
    assert_eq!(completed, Category::ALL.len());
}

#[tokio::test(start_paused = true)]
async fn all_success_yields_one_final() {
    let screener = Screener::builder()
        .with_chains(chains(&[full_source("primary")]))
        .build()
        .unwrap();
    let events = collect(screener.stream(AAPL)).await;

    assert_well_formed(&events);
    let resp = events.last().and_then(|e| e.as_final()).unwrap();
    assert_eq!(resp.data_sources, vec!["primary".to_string()]);
    assert_eq!(resp.company_name.as_deref(), Some("Apple Inc."));
    assert_eq!(resp.sentiment_summary.positive_count, 2);
}

#[tokio::test(start_paused = true)]
async fn all_failure_still_yields_one_final() {
    let screener = Screener::builder()
        .with_chains(chains(&[dead_source("x"), dead_source("y")]))
        .build()
        .unwrap();
    let events = collect(screener.stream(AAPL)).await;

    assert_well_formed(&events);
    let resp = events.last().and_then(|e| e.as_final()).unwrap();
    assert_eq!(resp.symbol, AAPL);
    assert!(resp.data_sources.is_empty());
    assert_eq!(resp.price, None);
    assert_eq!(resp.sentiment_summary.overall_score, SentimentScore::Neutral);
    assert!(resp.sentiment_summary.confidence.abs() < f64::EPSILON);
}

#[tokio::test(start_paused = true)]
async fn mixed_outcome_keeps_what_succeeded() {
    let quotes = Arc::new(MockSource::new("quotes").returns(price(50.0)));
    let profile = Arc::new(MockSource::new("profile").returns(company()));
    let dead = dead_source("dead");
    let screener = Screener::builder()
        .with_chain(crate::helpers::chain(Category::Price, &[dead.clone(), quotes]))
        .with_chain(crate::helpers::chain(Category::CompanyInfo, &[profile, dead.clone()]))
        .with_chain(crate::helpers::chain(Category::Analyst, &[dead]))
        .build()
        .unwrap();
    let events = collect(screener.stream(AAPL)).await;

    assert_well_formed(&events);
    let resp = events.last().and_then(|e| e.as_final()).unwrap();
    assert_eq!(resp.data_sources, vec!["quotes".to_string(), "profile".to_string()]);
    assert_eq!(resp.price, Some(50.0));
    assert_eq!(resp.change, Some(1.0));
}

#[derive(Debug, Clone, Copy)]
enum Behavior {
    Ok,
    Retryable,
    Fatal,
}

fn behavior() -> impl Strategy<Value = Behavior> {
    prop_oneof![Just(Behavior::Ok), Just(Behavior::Retryable), Just(Behavior::Fatal)]
}

fn scripted(plan: &[Behavior]) -> Arc<MockSource> {
    let payloads = [price(10.0), fundamentals(), analyst(), sentiment(), company()];
    let source = Category::ALL.into_iter().zip(payloads).zip(plan).fold(
        MockSource::new("scripted"),
        |m, ((category, payload), b)| match b {
            Behavior::Ok => m.returns(payload),
            Behavior::Retryable => m.fails(category, SourceError::rate_limited("scripted")),
            Behavior::Fatal => m.fails(category, SourceError::not_found("scripted", "symbol")),
        },
    );
    Arc::new(source)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn exactly_one_final_for_any_outcome_mix(plan in proptest::collection::vec(behavior(), 5)) {
        tokio_test::block_on(async move {
            let source = scripted(&plan);
            let screener = Screener::builder()
                .with_chains(chains(&[source]))
                .retry(retry(2, 0))
                .build()
                .unwrap();
            let events = collect(screener.stream(AAPL)).await;
            assert_well_formed(&events);

            let ok = plan.iter().filter(|b| matches!(b, Behavior::Ok)).count();
            let resp = events.last().and_then(|e| e.as_final()).unwrap();
            assert_eq!(resp.data_sources.len(), usize::from(ok > 0));
        });
    }
}
