use httpmock::prelude::*;
use screener_core::{AnalystSource, PriceSource, SourceError};
use screener_sources::AlphaVantage;
use serde_json::json;

use crate::{client, key, sym};

#[tokio::test]
async fn global_quote_maps_to_price() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/query")
                .query_param("function", "GLOBAL_QUOTE")
                .query_param("symbol", "AAPL")
                .query_param("apikey", "demo");
            then.status(200).json_body(json!({
                "Global Quote": {
                    "01. symbol": "AAPL",
                    "05. price": "196.5800",
                    "06. volume": "45394700",
                    "08. previous close": "195.2700",
                    "09. change": "1.3100",
                    "10. change percent": "0.6709%"
                }
            }));
        })
        .await;

    let av = AlphaVantage::new(client(), key("demo")).with_base_url(server.base_url());
    let p = av.price(&sym("AAPL")).await.unwrap();
    m.assert_async().await;
    assert!((p.price - 196.58).abs() < 1e-9);
    assert_eq!(p.volume, Some(45_394_700));
    assert_eq!(p.previous_close, Some(195.27));
    assert!((p.change_percent.unwrap() - 0.6709).abs() < 1e-9);
}

#[tokio::test]
async fn throttle_note_is_rate_limited() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/query");
            then.status(200).json_body(json!({
                "Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute."
            }));
        })
        .await;

    let av = AlphaVantage::new(client(), key("demo")).with_base_url(server.base_url());
    let err = av.price(&sym("AAPL")).await.unwrap_err();
    assert!(matches!(err, SourceError::RateLimited { .. }), "{err:?}");
    assert!(err.is_retryable());
}

#[tokio::test]
async fn error_message_is_not_found() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/query");
            then.status(200).json_body(json!({
                "Error Message": "Invalid API call. Please retry or visit the documentation."
            }));
        })
        .await;

    let av = AlphaVantage::new(client(), key("demo")).with_base_url(server.base_url());
    let err = av.analyst(&sym("ZZZZ")).await.unwrap_err();
    assert_eq!(err.kind(), "not_found");
    assert!(!err.is_retryable());
}
