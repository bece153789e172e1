use httpmock::prelude::*;
use screener_core::SentimentSource;
use screener_sources::NewsApi;
use serde_json::json;

use crate::{client, key, sym};

#[tokio::test]
async fn articles_are_cleaned_deduplicated_and_scored() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v2/everything")
                .header("X-Api-Key", "news")
                .query_param("sortBy", "relevancy")
                .query_param("pageSize", "20");
            then.status(200).json_body(json!({
                "status": "ok",
                "totalResults": 4,
                "articles": [
                    {"source": {"name": "Reuters"}, "title": "Apple beats estimates as iPhone sales surge",
                     "description": "Strong growth in services.", "url": "https://r/1",
                     "publishedAt": "2025-06-02T12:00:00Z"},
                    {"source": {"name": "CNBC"}, "title": "Apple beats estimates as iPhone sales surge!",
                     "description": null, "url": "https://c/1", "publishedAt": "2025-06-02T13:00:00Z"},
                    {"source": {"name": "Yahoo"}, "title": "[Removed]", "description": "[Removed]",
                     "url": "https://removed.com", "publishedAt": "1970-01-01T00:00:00Z"},
                    {"source": {"name": "WSJ"}, "title": "Apple faces lawsuit over App Store fees",
                     "description": "Regulators weigh a decline in margins.", "url": "https://w/1",
                     "publishedAt": "2025-06-01T09:00:00Z"}
                ]
            }));
        })
        .await;

    let news = NewsApi::new(client(), key("news"), 7, 20).with_base_url(server.base_url());
    let data = news.sentiment(&sym("AAPL")).await.unwrap();
    m.assert_async().await;

    assert_eq!(data.articles.len(), 2);
    assert_eq!(data.articles[0].source, "Reuters");
    let up = &data.articles[0].scores;
    let down = &data.articles[1].scores;
    assert!(up.lexicon.unwrap() > 0.0);
    assert!(down.rule_based.unwrap() < 0.0);
    assert!(up.llm.is_none());
    assert!(data.summary_text.is_none());
}

#[tokio::test]
async fn error_status_in_body_is_classified() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/everything");
            then.status(200).json_body(json!({
                "status": "error", "code": "apiKeyInvalid", "message": "Your API key is invalid."
            }));
        })
        .await;

    let news = NewsApi::new(client(), key("bad"), 7, 20).with_base_url(server.base_url());
    let err = news.sentiment(&sym("AAPL")).await.unwrap_err();
    assert_eq!(err.kind(), "auth_error");
}

#[tokio::test]
async fn empty_result_is_not_found() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/everything");
            then.status(200)
                .json_body(json!({"status": "ok", "totalResults": 0, "articles": []}));
        })
        .await;

    let news = NewsApi::new(client(), key("news"), 7, 20).with_base_url(server.base_url());
    let err = news.sentiment(&sym("KO")).await.unwrap_err();
    assert_eq!(err.kind(), "not_found");
}
