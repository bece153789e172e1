use std::sync::Arc;
use std::time::Duration;

use screener::{Category, EventPayload, EventType, Screener, ScreenerError, SourceError};
use screener_mock::MockSource;

use crate::helpers::{AAPL, chain, collect, finals, retry};

fn flaky() -> Arc<MockSource> {
    Arc::new(MockSource::new("flaky").fails(Category::Price, SourceError::timeout("flaky")))
}

fn screener(source: &Arc<MockSource>) -> Screener {
    Screener::builder()
        .with_chain(chain(Category::Price, &[source.clone()]))
        .retry(retry(10, 1_000))
        .request_timeout(Duration::from_secs(60))
        .build()
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn dropping_the_stream_stops_agents() {
    let source = flaky();
    let stream = screener(&source).stream(AAPL);

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(source.calls(), 1);
    drop(stream);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(source.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn explicit_cancel_ends_without_final() {
    let source = flaky();
    let stream = screener(&source).stream(AAPL);

    tokio::time::sleep(Duration::from_millis(10)).await;
    stream.cancel();
    let events = collect(stream).await;

    assert_eq!(finals(&events), 0);
    let last = events.last().unwrap();
    assert_eq!(last.kind, EventType::Error);
    let Some(EventPayload::Error(body)) = &last.payload else {
        panic!("error payload expected");
    };
    assert_eq!(body.error, "cancelled");

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(source.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn cancelled_stream_has_no_response() {
    let source = flaky();
    let stream = screener(&source).stream(AAPL);
    stream.cancel();
    assert!(matches!(
        stream.into_response().await,
        Err(ScreenerError::Cancelled)
    ));
}
