use std::sync::Arc;
use std::time::Duration;

use screener::{Category, Screener, SourceError};
use screener_mock::{MockBehavior, MockSource};
use tokio::time::Instant;

use crate::helpers::{AAPL, analyst, chain, price, retry};

#[tokio::test(start_paused = true)]
async fn timeouts_retry_with_increasing_backoff_then_fall_through() {
    let a = Arc::new(MockSource::new("a").fails(Category::Analyst, SourceError::timeout("a")));
    let b = Arc::new(MockSource::new("b").returns(analyst()));

    let screener = Screener::builder()
        .with_chain(chain(Category::Analyst, &[a.clone(), b.clone()]))
        .retry(retry(3, 100))
        .build()
        .unwrap();
    let resp = screener.analyze(AAPL).await.unwrap();

    let times = a.call_times(Category::Analyst);
    assert_eq!(times.len(), 3);
    let gaps: Vec<Duration> = times.windows(2).map(|w| w[1] - w[0]).collect();
    assert!(gaps[0] >= Duration::from_millis(100), "{gaps:?}");
    assert!(gaps[1] > gaps[0], "{gaps:?}");

    let b_times = b.call_times(Category::Analyst);
    assert_eq!(b_times.len(), 1);
    assert!(b_times[0] >= times[2]);
    assert_eq!(resp.data_sources, vec!["b".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn backoff_that_would_pass_the_deadline_skips_to_next_adapter() {
    let a = Arc::new(MockSource::new("a").fails(Category::Analyst, SourceError::timeout("a")));
    let b = Arc::new(MockSource::new("b").returns(analyst()));

    let screener = Screener::builder()
        .with_chain(chain(Category::Analyst, &[a.clone(), b.clone()]))
        .retry(retry(5, 400))
        .request_timeout(Duration::from_secs(1))
        .build()
        .unwrap();
    let started = Instant::now();
    let resp = screener.analyze(AAPL).await.unwrap();

    // 400ms fits in the budget, the following 800ms does not.
    assert_eq!(a.calls(), 2);
    assert_eq!(b.calls(), 1);
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(resp.data_sources, vec!["b".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn server_error_is_retried_on_the_same_adapter() {
    let a = Arc::new(
        MockSource::new("a")
            .then(
                Category::Price,
                MockBehavior::Fail(SourceError::InvalidResponse {
                    provider: "a".into(),
                    msg: "upstream".into(),
                    status: Some(503),
                }),
            )
            .then(Category::Price, MockBehavior::Return(price(42.0))),
    );
    let b = Arc::new(MockSource::new("b").returns(price(1.0)));

    let screener = Screener::builder()
        .with_chain(chain(Category::Price, &[a.clone(), b.clone()]))
        .retry(retry(3, 50))
        .build()
        .unwrap();
    let resp = screener.analyze(AAPL).await.unwrap();

    assert_eq!(a.calls(), 2);
    assert_eq!(b.calls(), 0);
    assert_eq!(resp.price, Some(42.0));
    assert_eq!(resp.data_sources, vec!["a".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn slow_call_is_cut_by_the_call_timeout() {
    let a = Arc::new(MockSource::new("a").always(
        Category::Price,
        MockBehavior::Return(price(10.0)).after(Duration::from_secs(3)),
    ));
    let b = Arc::new(MockSource::new("b").returns(price(20.0)));

    let screener = Screener::builder()
        .with_chain(chain(Category::Price, &[a.clone(), b]))
        .retry(retry(1, 0))
        .call_timeout(Duration::from_secs(1))
        .build()
        .unwrap();
    let resp = screener.analyze(AAPL).await.unwrap();

    assert_eq!(a.calls(), 1);
    assert_eq!(resp.price, Some(20.0));
    assert_eq!(resp.data_sources, vec!["b".to_string()]);
}
