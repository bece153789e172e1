use chrono::{DateTime, TimeZone, Utc};
use screener_core::{MethodScores, SentimentArticle, SentimentData};

pub fn by_symbol(s: &str) -> Option<SentimentData> {
    let name = super::profile::by_symbol(s)?.name;
    Some(SentimentData {
        articles: vec![
            article(
                "Reuters",
                &format!("{name} beats estimates as revenue surges"),
                0.62,
                0.5,
                hours_ago(3),
            ),
            article(
                "Bloomberg",
                &format!("{name} shares steady ahead of product event"),
                0.05,
                0.0,
                hours_ago(9),
            ),
            article(
                "MarketWatch",
                &format!("Analysts warn of slowing growth at {name}"),
                -0.35,
                -0.3,
                hours_ago(20),
            ),
        ],
        summary_text: None,
    })
}

fn hours_ago(h: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 14, 0, 0)
        .single()
        .unwrap_or_default()
        - chrono::Duration::hours(h)
}

fn article(
    source: &str,
    title: &str,
    lexicon: f64,
    rule_based: f64,
    published_at: DateTime<Utc>,
) -> SentimentArticle {
    SentimentArticle {
        source: source.to_string(),
        title: title.to_string(),
        url: Some(format!(
            "https://news.example.com/{}",
            title.to_lowercase().replace(' ', "-")
        )),
        published_at: Some(published_at),
        scores: MethodScores {
            lexicon: Some(lexicon),
            rule_based: Some(rule_based),
            llm: None,
        },
    }
}
