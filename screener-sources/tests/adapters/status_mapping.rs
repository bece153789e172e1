use httpmock::prelude::*;
use screener_core::{FundamentalsSource, SourceError};
use screener_sources::Finnhub;

use crate::{client, key, sym};

async fn fundamentals_with_status(status: u16) -> SourceError {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/stock/metric");
            then.status(status).body("upstream says no");
        })
        .await;
    let fh = Finnhub::new(client(), key("fh")).with_base_url(server.base_url());
    fh.fundamentals(&sym("AAPL")).await.unwrap_err()
}

#[tokio::test]
async fn too_many_requests_is_retryable_rate_limit() {
    let err = fundamentals_with_status(429).await;
    assert_eq!(err.kind(), "rate_limited");
    assert!(err.is_retryable());
}

#[tokio::test]
async fn unauthorized_is_terminal_auth_error() {
    for status in [401, 403] {
        let err = fundamentals_with_status(status).await;
        assert_eq!(err.kind(), "auth_error");
        assert!(!err.is_retryable());
    }
}

#[tokio::test]
async fn server_errors_carry_status_and_retry() {
    let err = fundamentals_with_status(502).await;
    assert!(matches!(
        err,
        SourceError::InvalidResponse {
            status: Some(502),
            ..
        }
    ));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn client_errors_do_not_retry() {
    let err = fundamentals_with_status(400).await;
    assert!(matches!(
        err,
        SourceError::InvalidResponse {
            status: Some(400),
            ..
        }
    ));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn malformed_json_is_invalid_response() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/stock/metric");
            then.status(200).body("<html>maintenance</html>");
        })
        .await;
    let fh = Finnhub::new(client(), key("fh")).with_base_url(server.base_url());
    let err = fh.fundamentals(&sym("AAPL")).await.unwrap_err();
    assert!(matches!(err, SourceError::InvalidResponse { status: None, .. }));
}
