use std::sync::Arc;

use screener::{
    Category, CategoryPayload, EventType, FinancialMetrics, PriceData, Screener, SentimentScore,
    SourceError, TaskStatus,
};
use screener_mock::MockSource;

use crate::helpers::{AAPL, chain, collect};

#[tokio::test(start_paused = true)]
async fn price_only_from_primary_adapter() {
    let alpha_vantage = Arc::new(MockSource::new("alpha_vantage").returns(CategoryPayload::Price(
        PriceData {
            volume: Some(45_394_700),
            ..PriceData::new(196.58)
        },
    )));
    let finnhub = Arc::new(Category::ALL.into_iter().fold(MockSource::new("finnhub"), |m, c| {
        m.fails(c, SourceError::auth("finnhub", "invalid token"))
    }));
    let yahoo = Arc::new(
        MockSource::new("yahoo_finance")
            .fails(Category::Fundamentals, SourceError::not_found("yahoo_finance", AAPL))
            .fails(Category::CompanyInfo, SourceError::not_found("yahoo_finance", AAPL))
            .returns(CategoryPayload::Price(PriceData::new(1.0))),
    );
    let newsapi = Arc::new(
        MockSource::new("newsapi").fails(Category::Sentiment, SourceError::not_found("newsapi", "articles")),
    );

    let screener = Screener::builder()
        .with_chain(chain(
            Category::Price,
            &[alpha_vantage.clone(), yahoo.clone(), finnhub.clone()],
        ))
        .with_chain(chain(Category::Fundamentals, &[yahoo.clone(), finnhub.clone()]))
        .with_chain(chain(Category::Analyst, &[finnhub.clone()]))
        .with_chain(chain(Category::Sentiment, &[newsapi]))
        .with_chain(chain(Category::CompanyInfo, &[yahoo.clone(), finnhub]))
        .build()
        .unwrap();
    let events = collect(screener.stream(AAPL)).await;

    assert_eq!(yahoo.calls_for(Category::Price), 0);
    let price_event = events
        .iter()
        .find(|e| e.kind == EventType::TaskCompleted && e.category == Some(Category::Price))
        .unwrap();
    assert!(matches!(
        price_event.status,
        Some(TaskStatus::Succeeded | TaskStatus::Partial)
    ));

    let resp = events.last().and_then(|e| e.as_final()).unwrap();
    assert_eq!(resp.symbol, "AAPL");
    assert_eq!(resp.price, Some(196.58));
    assert_eq!(resp.volume, Some(45_394_700));
    assert_eq!(resp.financial_metrics, FinancialMetrics::default());
    assert_eq!(resp.data_sources, vec!["alpha_vantage".to_string()]);
    assert_eq!(resp.sentiment_summary.overall_score, SentimentScore::Neutral);
    assert!(resp.sentiment_summary.confidence.abs() < f64::EPSILON);

    let json = serde_json::to_value(resp).unwrap();
    let metrics = json["financial_metrics"].as_object().unwrap();
    assert_eq!(metrics.len(), 18);
    assert!(metrics.values().all(serde_json::Value::is_null));
    assert_eq!(json["sentiment_summary"]["overall_score"], "neutral");
    assert_eq!(json["data_sources"], serde_json::json!(["alpha_vantage"]));
}
