//! NewsAPI adapter: recent articles scored by the offline methods.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use screener_core::{
    MethodScores, Secret, SentimentArticle, SentimentData, SentimentSource, SourceAdapter,
    SourceError, Symbol,
};
use serde::Deserialize;

use crate::http::send_json;
use crate::scoring;

const BASE_URL: &str = "https://newsapi.org";
const NAME: &str = "newsapi";
const DOMAINS: &str = "reuters.com,bloomberg.com,cnbc.com,marketwatch.com,yahoo.com,seekingalpha.com,wsj.com,ft.com,forbes.com,benzinga.com";
const DEDUP_PREFIX: usize = 50;

/// A fetched article before scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct NewsArticle {
    /// Publisher name.
    pub source: String,
    /// Headline.
    pub title: String,
    /// Lead paragraph, when provided.
    pub description: Option<String>,
    /// Canonical link.
    pub url: Option<String>,
    /// Publication time.
    pub published_at: Option<DateTime<Utc>>,
}

impl NewsArticle {
    /// Text the scorers look at.
    #[must_use]
    pub fn text(&self) -> String {
        match &self.description {
            Some(d) => format!("{} {}", self.title, d),
            None => self.title.clone(),
        }
    }

    /// Score with the offline methods.
    #[must_use]
    pub fn scored(&self, llm: Option<f64>) -> SentimentArticle {
        let text = self.text();
        SentimentArticle {
            source: self.source.clone(),
            title: self.title.clone(),
            url: self.url.clone(),
            published_at: self.published_at,
            scores: MethodScores {
                lexicon: Some(scoring::lexicon_score(&text)),
                rule_based: Some(scoring::rule_based(&text)),
                llm,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    status: String,
    code: Option<String>,
    message: Option<String>,
    #[serde(default)]
    articles: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArticle {
    source: Option<RawSource>,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    name: Option<String>,
}

/// NewsAPI `everything` adapter.
#[derive(Clone)]
pub struct NewsApi {
    client: Client,
    api_key: Secret,
    base_url: String,
    days_back: u32,
    max_articles: u32,
}

impl NewsApi {
    /// Adapter looking back `days_back` days for at most `max_articles` articles.
    #[must_use]
    pub fn new(client: Client, api_key: Secret, days_back: u32, max_articles: u32) -> Self {
        Self {
            client,
            api_key,
            base_url: BASE_URL.to_string(),
            days_back,
            max_articles: max_articles.clamp(1, 100),
        }
    }

    /// Point the adapter at another host (tests, proxies).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetch, clean and deduplicate recent articles about `symbol`.
    ///
    /// # Errors
    /// Classified upstream failures; `NotFound` when nothing usable remains.
    #[tracing::instrument(
        name = "screener::sources::newsapi::fetch_articles",
        skip(self),
        fields(symbol = %symbol),
    )]
    pub async fn fetch_articles(&self, symbol: &Symbol) -> Result<Vec<NewsArticle>, SourceError> {
        let from = (Utc::now() - chrono::Duration::days(i64::from(self.days_back)))
            .format("%Y-%m-%dT%H:%M:%S")
            .to_string();
        let query = format!(
            "\"{symbol}\" AND (stock OR shares OR earnings OR revenue OR financial OR investment OR market)"
        );
        let page_size = self.max_articles.to_string();
        let req = self
            .client
            .get(format!("{}/v2/everything", self.base_url))
            .header("X-Api-Key", self.api_key.expose())
            .query(&[
                ("q", query.as_str()),
                ("from", from.as_str()),
                ("sortBy", "relevancy"),
                ("language", "en"),
                ("pageSize", page_size.as_str()),
                ("domains", DOMAINS),
            ]);
        let env: Envelope = send_json(NAME, req).await?;
        if env.status != "ok" {
            return Err(classify_error(env.code.as_deref(), env.message.as_deref()));
        }
        let articles = dedup(env.articles.into_iter().filter_map(clean), self.max_articles);
        tracing::debug!(count = articles.len(), "articles after dedup");
        if articles.is_empty() {
            return Err(SourceError::not_found(NAME, format!("news for {symbol}")));
        }
        Ok(articles)
    }
}

fn classify_error(code: Option<&str>, message: Option<&str>) -> SourceError {
    let msg = message.unwrap_or("unknown error").to_string();
    match code {
        Some("apiKeyInvalid" | "apiKeyMissing" | "apiKeyDisabled" | "apiKeyExhausted") => {
            SourceError::auth(NAME, msg)
        }
        Some("rateLimited") => SourceError::rate_limited(NAME),
        _ => SourceError::invalid(NAME, msg),
    }
}

fn clean(raw: RawArticle) -> Option<NewsArticle> {
    let title = raw.title.map(|t| t.trim().to_string())?;
    if title.is_empty() || title == "[Removed]" {
        return None;
    }
    Some(NewsArticle {
        source: raw
            .source
            .and_then(|s| s.name)
            .unwrap_or_else(|| "Unknown".to_string()),
        title,
        description: raw.description.filter(|d| !d.trim().is_empty()),
        url: raw.url,
        published_at: raw
            .published_at
            .and_then(|p| DateTime::parse_from_rfc3339(&p).ok())
            .map(|d| d.with_timezone(&Utc)),
    })
}

/// Normalised title prefix used as the duplicate key.
fn title_key(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '_')
        .collect::<String>()
        .to_lowercase()
        .chars()
        .take(DEDUP_PREFIX)
        .collect()
}

pub(crate) fn dedup(articles: impl Iterator<Item = NewsArticle>, limit: u32) -> Vec<NewsArticle> {
    let mut seen = HashSet::new();
    articles
        .filter(|a| seen.insert(title_key(&a.title)))
        .take(limit as usize)
        .collect()
}

#[async_trait]
impl SentimentSource for NewsApi {
    async fn sentiment(&self, symbol: &Symbol) -> Result<SentimentData, SourceError> {
        let articles = self.fetch_articles(symbol).await?;
        Ok(SentimentData {
            articles: articles.iter().map(|a| a.scored(None)).collect(),
            summary_text: None,
        })
    }
}

impl SourceAdapter for NewsApi {
    fn name(&self) -> &'static str {
        NAME
    }

    fn as_sentiment_source(&self) -> Option<&dyn SentimentSource> {
        Some(self as &dyn SentimentSource)
    }
}
