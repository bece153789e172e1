use screener::{EventPayload, EventType, Screener, ScreenerError};

use crate::helpers::{chains, collect, full_source};

#[tokio::test]
async fn malformed_symbol_yields_only_an_error_event() {
    let source = full_source("primary");
    let screener = Screener::builder()
        .with_chains(chains(&[source.clone()]))
        .build()
        .unwrap();

    let stream = screener.stream("???");
    assert_eq!(stream.request_id(), None);
    let events = collect(stream).await;

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, EventType::Error);
    let Some(EventPayload::Error(body)) = &events[0].payload else {
        panic!("error payload expected");
    };
    assert_eq!(body.error, "invalid_symbol");
    assert!(body.message.contains("???"), "{}", body.message);
    assert_eq!(source.calls(), 0);

    let json = serde_json::to_value(&events[0]).unwrap();
    assert_eq!(json["type"], "error");
    assert_eq!(json["payload"]["error"], "invalid_symbol");
}

#[tokio::test]
async fn run_and_analyze_reject_before_spawning() {
    let source = full_source("primary");
    let screener = Screener::builder()
        .with_chains(chains(&[source.clone()]))
        .build()
        .unwrap();

    assert!(matches!(
        screener.run("???"),
        Err(ScreenerError::InvalidSymbol { .. })
    ));
    assert!(matches!(
        screener.analyze("TOOLONG").await,
        Err(ScreenerError::InvalidSymbol { .. })
    ));
    assert!(matches!(
        screener.analyze("").await,
        Err(ScreenerError::InvalidSymbol { .. })
    ));
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn ticker_format_is_strict() {
    let source = full_source("primary");
    let screener = Screener::builder()
        .with_chains(chains(&[source.clone()]))
        .build()
        .unwrap();

    for bad in ["aapl", "BRK.B", " AAPL"] {
        assert!(
            matches!(screener.run(bad), Err(ScreenerError::InvalidSymbol { .. })),
            "{bad:?} should be rejected"
        );
    }
    assert_eq!(source.calls(), 0);

    let resp = screener.analyze("AAPL").await.unwrap();
    assert_eq!(resp.symbol, "AAPL");
}
