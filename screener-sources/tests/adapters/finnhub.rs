use httpmock::prelude::*;
use screener_core::{AnalystSource, PriceSource};
use screener_sources::Finnhub;
use serde_json::json;

use crate::{client, key, sym};

#[tokio::test]
async fn quote_sends_token_header() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/quote")
                .query_param("symbol", "MSFT")
                .header("X-Finnhub-Token", "fh");
            then.status(200)
                .json_body(json!({"c": 447.2, "d": -2.1, "dp": -0.47, "pc": 449.3}));
        })
        .await;

    let fh = Finnhub::new(client(), key("fh")).with_base_url(server.base_url());
    let p = fh.price(&sym("MSFT")).await.unwrap();
    m.assert_async().await;
    assert!((p.price - 447.2).abs() < 1e-9);
    assert_eq!(p.currency.as_deref(), Some("USD"));
    assert_eq!(p.previous_close, Some(449.3));
}

#[tokio::test]
async fn zero_quote_is_not_found() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/quote");
            then.status(200)
                .json_body(json!({"c": 0, "d": null, "dp": null, "pc": 0}));
        })
        .await;

    let fh = Finnhub::new(client(), key("fh")).with_base_url(server.base_url());
    let err = fh.price(&sym("ZZZZ")).await.unwrap_err();
    assert_eq!(err.kind(), "not_found");
}

#[tokio::test]
async fn latest_recommendation_period_wins() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/stock/recommendation");
            then.status(200).json_body(json!([
                {"period": "2025-05-01", "strongBuy": 1, "buy": 1, "hold": 1, "sell": 1, "strongSell": 1},
                {"period": "2025-06-01", "strongBuy": 12, "buy": 20, "hold": 8, "sell": 1, "strongSell": 0}
            ]));
        })
        .await;
    // Earnings are best effort; a failure must not fail the category.
    server
        .mock_async(|when, then| {
            when.method(GET).path("/stock/earnings");
            then.status(500);
        })
        .await;

    let fh = Finnhub::new(client(), key("fh")).with_base_url(server.base_url());
    let a = fh.analyst(&sym("AAPL")).await.unwrap();
    let counts = a.recommendation_counts.unwrap();
    assert_eq!(counts.strong_buy, 12);
    assert_eq!(counts.buy, 20);
    assert!(a.earnings.is_empty());
}
