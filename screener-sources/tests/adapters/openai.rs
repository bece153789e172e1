use std::sync::Arc;

use httpmock::prelude::*;
use screener_core::{RateLimitConfig, RateLimiter, SentimentSource, SourceAdapter};
use screener_sources::{NewsApi, OpenAiConfig, OpenAiSentiment};
use serde_json::json;

use crate::{client, key, sym};

fn news_body() -> serde_json::Value {
    let titles = [
        "Apple beats estimates",
        "Apple shares surge on record services growth",
        "Analysts upgrade Apple after strong quarter",
        "Apple faces antitrust lawsuit in Europe",
    ];
    json!({
        "status": "ok",
        "articles": titles.iter().map(|t| json!({
            "source": {"name": "Reuters"}, "title": t, "description": null,
            "url": null, "publishedAt": "2025-06-02T12:00:00Z"
        })).collect::<Vec<_>>()
    })
}

fn completion(content: &str) -> serde_json::Value {
    json!({"choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]})
}

fn adapter(server: &MockServer) -> OpenAiSentiment {
    let news = NewsApi::new(client(), key("news"), 7, 20).with_base_url(server.base_url());
    OpenAiSentiment::new(
        news,
        client(),
        key("sk"),
        OpenAiConfig {
            model: "test-model".into(),
            temperature: 0.1,
        },
    )
    .with_base_url(server.base_url())
}

#[tokio::test]
async fn model_scores_and_summary_are_attached() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/everything");
            then.status(200).json_body(news_body());
        })
        .await;
    let scoring = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("authorization", "Bearer sk")
                .body_includes("json_object");
            then.status(200)
                .json_body(completion(r#"{"sentiment_score": 0.6, "confidence": 0.8}"#));
        })
        .await;
    let summary = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .body_includes("summarise market sentiment");
            then.status(200)
                .json_body(completion("Mostly constructive coverage."));
        })
        .await;

    let a = adapter(&server);
    assert_eq!(a.name(), "openai_sentiment");
    assert_eq!(a.provider(), "openai_sentiment");
    let data = a.sentiment(&sym("AAPL")).await.unwrap();
    assert_eq!(data.articles.len(), 4);
    assert!(data.articles.iter().all(|x| x.scores.llm == Some(0.6)));
    assert!(data.articles.iter().all(|x| x.scores.lexicon.is_some()));
    assert_eq!(data.summary_text.as_deref(), Some("Mostly constructive coverage."));
    scoring.assert_hits_async(4).await;
    summary.assert_hits_async(1).await;
}

#[tokio::test]
async fn rejected_key_fails_the_adapter() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/everything");
            then.status(200).json_body(news_body());
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(401)
                .json_body(json!({"error": {"message": "Incorrect API key provided"}}));
        })
        .await;

    let err = adapter(&server).sentiment(&sym("AAPL")).await.unwrap_err();
    assert_eq!(err.kind(), "auth_error");
}

#[tokio::test]
async fn unparsable_verdicts_keep_offline_scores() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/everything");
            then.status(200).json_body(news_body());
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .body_includes("json_object");
            then.status(200).json_body(completion("positive, I think"));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .body_includes("summarise market sentiment");
            then.status(503);
        })
        .await;

    let data = adapter(&server).sentiment(&sym("AAPL")).await.unwrap();
    assert_eq!(data.articles.len(), 4);
    assert!(data.articles.iter().all(|x| x.scores.llm.is_none()));
    assert!(data.articles.iter().all(|x| x.scores.rule_based.is_some()));
    assert!(data.summary_text.is_none());
}

#[tokio::test]
async fn inner_calls_draw_from_provider_buckets() {
    let server = MockServer::start_async().await;
    let news = server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/everything");
            then.status(200).json_body(news_body());
        })
        .await;
    let model = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200)
                .json_body(completion(r#"{"sentiment_score": 0.2}"#));
        })
        .await;
    let limiter = Arc::new(RateLimiter::with_quotas([
        ("openai", RateLimitConfig::per_minute(1)),
        ("newsapi", RateLimitConfig::per_minute(1)),
    ]));

    let err = adapter(&server)
        .with_rate_limiter(Arc::clone(&limiter))
        .sentiment(&sym("AAPL"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "rate_limited");
    news.assert_hits_async(1).await;
    model.assert_hits_async(1).await;
    assert_eq!(limiter.state("newsapi").map(|s| s.available), Some(0));
    assert_eq!(limiter.state("openai").map(|s| s.available), Some(0));
}

#[tokio::test]
async fn news_bucket_is_charged_before_fetching() {
    let server = MockServer::start_async().await;
    let news = server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/everything");
            then.status(200).json_body(news_body());
        })
        .await;
    let limiter = Arc::new(RateLimiter::with_quotas([(
        "newsapi",
        RateLimitConfig::per_minute(0),
    )]));

    let err = adapter(&server)
        .with_rate_limiter(limiter)
        .sentiment(&sym("AAPL"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "rate_limited");
    news.assert_hits_async(0).await;
}

#[tokio::test]
async fn ample_quota_charges_every_model_call() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/everything");
            then.status(200).json_body(news_body());
        })
        .await;
    let model = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200)
                .json_body(completion(r#"{"sentiment_score": 0.2}"#));
        })
        .await;
    let limiter = Arc::new(RateLimiter::with_quotas([
        ("openai", RateLimitConfig::per_minute(60)),
        ("newsapi", RateLimitConfig::per_minute(10)),
    ]));

    let data = adapter(&server)
        .with_rate_limiter(Arc::clone(&limiter))
        .sentiment(&sym("AAPL"))
        .await
        .unwrap();

    assert_eq!(data.articles.len(), 4);
    // Four article scores plus one summary.
    model.assert_hits_async(5).await;
    assert_eq!(limiter.state("openai").map(|s| s.available), Some(55));
    assert_eq!(limiter.state("newsapi").map(|s| s.available), Some(9));
}
