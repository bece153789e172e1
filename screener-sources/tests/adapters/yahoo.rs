use httpmock::prelude::*;
use screener_core::{CompanyInfoSource, PriceSource};
use screener_sources::YahooFinance;
use serde_json::json;

use crate::{client, sym};

fn chart() -> serde_json::Value {
    json!({
        "chart": {
            "result": [{
                "meta": {
                    "currency": "USD",
                    "exchangeName": "NMS",
                    "fullExchangeName": "NasdaqGS",
                    "longName": "Apple Inc.",
                    "shortName": "Apple",
                    "regularMarketPrice": 196.58,
                    "regularMarketVolume": 45394700u64,
                    "fiftyTwoWeekHigh": 260.1,
                    "fiftyTwoWeekLow": 169.21
                },
                "indicators": {"quote": [{
                    "high": [197.0, 198.0],
                    "low": [194.0, 195.0],
                    "close": [195.27, 196.58],
                    "volume": [40000000u64, 45394700u64]
                }]}
            }],
            "error": null
        }
    })
}

#[tokio::test]
async fn chart_feeds_price_and_identity() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v8/finance/chart/AAPL")
                .query_param("range", "1y")
                .query_param("interval", "1d");
            then.status(200).json_body(chart());
        })
        .await;

    let y = YahooFinance::new(client()).with_base_url(server.base_url());
    let p = y.price(&sym("AAPL")).await.unwrap();
    assert_eq!(p.previous_close, Some(195.27));
    assert!((p.change.unwrap() - 1.31).abs() < 1e-9);

    let info = y.company_info(&sym("AAPL")).await.unwrap();
    assert_eq!(info.name, "Apple Inc.");
    assert_eq!(info.exchange.as_deref(), Some("NasdaqGS"));
    m.assert_hits_async(2).await;
}

#[tokio::test]
async fn chart_not_found_body() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v8/finance/chart/ZZZZ");
            then.status(404).json_body(json!({
                "chart": {"result": null, "error": {"code": "Not Found", "description": "No data found"}}
            }));
        })
        .await;

    let y = YahooFinance::new(client()).with_base_url(server.base_url());
    let err = y.price(&sym("ZZZZ")).await.unwrap_err();
    assert_eq!(err.kind(), "not_found");
}
