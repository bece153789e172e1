//! Key-free news sentiment from public business RSS feeds.
//!
//! Every feed is fetched concurrently; entries mentioning the ticker or the
//! company name are kept, deduplicated and scored by the offline methods.
//! A feed that fails is skipped.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use feed_rs::model::Entry;
use futures::future::join_all;
use regex::Regex;
use reqwest::Client;
use screener_core::{SentimentData, SentimentSource, SourceAdapter, SourceError, Symbol};

use crate::http::send_text;
use crate::newsapi::{NewsArticle, dedup};

const NAME: &str = "rss_news";
const ENTRIES_PER_FEED: usize = 30;
const SHORT_TERM_LEN: usize = 4;

/// Public feeds polled by default.
pub const DEFAULT_FEEDS: &[&str] = &[
    "https://feeds.bloomberg.com/markets/news.rss",
    "https://feeds.npr.org/1006/rss.xml",
    "https://feeds.a.dj.com/rss/RSSMarketsMain.xml",
    "https://feeds.bbci.co.uk/news/business/rss.xml",
    "https://feeds.skynews.com/feeds/rss/business.xml",
    "https://www.investing.com/rss/news_285.rss",
    "https://feeds.feedburner.com/zerohedge/feed",
    "https://www.benzinga.com/feed",
    "https://seekingalpha.com/market_currents.xml",
];

const COMPANY_NAMES: &[(&str, &str)] = &[
    ("AAPL", "Apple Inc."),
    ("GOOGL", "Alphabet Inc."),
    ("GOOG", "Alphabet Inc."),
    ("MSFT", "Microsoft Corporation"),
    ("AMZN", "Amazon.com Inc."),
    ("TSLA", "Tesla Inc."),
    ("META", "Meta Platforms Inc."),
    ("NVDA", "NVIDIA Corporation"),
    ("NFLX", "Netflix Inc."),
    ("AMD", "Advanced Micro Devices"),
    ("INTC", "Intel Corporation"),
    ("ORCL", "Oracle Corporation"),
    ("ADBE", "Adobe Inc."),
    ("CRM", "Salesforce Inc."),
    ("UBER", "Uber Technologies"),
    ("PYPL", "PayPal Holdings"),
    ("SHOP", "Shopify Inc."),
    ("PLTR", "Palantir Technologies"),
    ("COIN", "Coinbase Global"),
    ("BABA", "Alibaba Group"),
    ("JPM", "JPMorgan Chase"),
    ("BAC", "Bank of America"),
    ("WFC", "Wells Fargo"),
    ("GS", "Goldman Sachs"),
    ("MS", "Morgan Stanley"),
    ("JNJ", "Johnson & Johnson"),
    ("PFE", "Pfizer Inc."),
    ("MRK", "Merck & Co."),
    ("UNH", "UnitedHealth Group"),
    ("LLY", "Eli Lilly"),
    ("KO", "Coca-Cola Company"),
    ("WMT", "Walmart Inc."),
    ("DIS", "Walt Disney Company"),
];

const NAME_SUFFIXES: &[&str] = &[
    " Inc.",
    " Corp.",
    " Corporation",
    " Company",
    " Ltd.",
    " Co.",
    " Group",
    " Holdings",
    " Technologies",
    " Systems",
];

/// RSS feed sentiment adapter.
#[derive(Clone)]
pub struct RssNews {
    client: Client,
    feeds: Vec<String>,
    max_articles: u32,
}

/// Lower-cased search terms for `symbol`: the ticker, then the company name
/// with and without its legal suffix, then the brand word.
fn search_terms(symbol: &Symbol) -> Vec<String> {
    let mut terms = vec![symbol.as_str().to_lowercase()];
    let company = COMPANY_NAMES
        .iter()
        .find(|(s, _)| *s == symbol.as_str())
        .map(|(_, n)| *n);
    if let Some(name) = company {
        let clean = NAME_SUFFIXES
            .iter()
            .fold(name.to_string(), |acc, sfx| acc.replace(sfx, ""))
            .trim()
            .to_string();
        let brand = clean
            .split_whitespace()
            .next()
            .map(str::to_lowercase)
            .filter(|w| w.len() > 3);
        for term in [Some(name.to_lowercase()), Some(clean.to_lowercase()), brand]
            .into_iter()
            .flatten()
        {
            if !terms.contains(&term) {
                terms.push(term);
            }
        }
    }
    terms
}

/// Short terms must match as whole words; longer ones anywhere.
fn matchers(terms: &[String]) -> Vec<Regex> {
    terms
        .iter()
        .filter_map(|t| {
            let escaped = regex::escape(t);
            let pattern = if t.chars().count() <= SHORT_TERM_LEN {
                format!(r"(?i)\b{escaped}\b")
            } else {
                format!("(?i){escaped}")
            };
            Regex::new(&pattern).ok()
        })
        .collect()
}

fn text_of(t: Option<&feed_rs::model::Text>) -> Option<String> {
    t.map(|t| t.content.trim().to_string()).filter(|s| !s.is_empty())
}

fn to_article(entry: &Entry, feed_title: &str, matchers: &[Regex]) -> Option<NewsArticle> {
    let title = text_of(entry.title.as_ref())?;
    let description = text_of(entry.summary.as_ref())
        .or_else(|| entry.content.as_ref().and_then(|c| c.body.clone()));
    let haystack = format!("{title} {}", description.as_deref().unwrap_or_default());
    if !matchers.iter().any(|m| m.is_match(&haystack)) {
        return None;
    }
    let published_at: Option<DateTime<Utc>> = entry.published.or(entry.updated);
    Some(NewsArticle {
        source: feed_title.to_string(),
        title,
        description,
        url: entry.links.first().map(|l| l.href.clone()),
        published_at,
    })
}

/// Relevant entries of one parsed feed document.
fn relevant_entries(xml: &str, matchers: &[Regex]) -> Result<Vec<NewsArticle>, SourceError> {
    let feed = feed_rs::parser::parse(xml.as_bytes())
        .map_err(|e| SourceError::invalid(NAME, format!("feed: {e}")))?;
    let feed_title = text_of(feed.title.as_ref()).unwrap_or_else(|| "RSS Feed".to_string());
    Ok(feed
        .entries
        .iter()
        .take(ENTRIES_PER_FEED)
        .filter_map(|e| to_article(e, &feed_title, matchers))
        .collect())
}

impl RssNews {
    /// Adapter polling [`DEFAULT_FEEDS`] for at most `max_articles` articles.
    #[must_use]
    pub fn new(client: Client, max_articles: u32) -> Self {
        Self {
            client,
            feeds: DEFAULT_FEEDS.iter().map(|f| (*f).to_string()).collect(),
            max_articles: max_articles.max(1),
        }
    }

    /// Poll these feed URLs instead of the defaults.
    #[must_use]
    pub fn with_feeds<I, S>(mut self, feeds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.feeds = feeds.into_iter().map(Into::into).collect();
        self
    }

    async fn fetch_feed(&self, url: &str, matchers: &[Regex]) -> Result<Vec<NewsArticle>, SourceError> {
        let xml = send_text(NAME, self.client.get(url)).await?;
        relevant_entries(&xml, matchers)
    }

    /// Relevant, deduplicated articles across every feed, newest first.
    ///
    /// # Errors
    /// The last feed failure when no feed answered; `NotFound` when feeds
    /// answered but nothing mentioned the symbol.
    #[tracing::instrument(
        name = "screener::sources::rss::fetch_articles",
        skip(self),
        fields(symbol = %symbol, feeds = self.feeds.len()),
    )]
    pub async fn fetch_articles(&self, symbol: &Symbol) -> Result<Vec<NewsArticle>, SourceError> {
        let matchers = matchers(&search_terms(symbol));
        let results = join_all(self.feeds.iter().map(|f| self.fetch_feed(f, &matchers))).await;

        let mut found = Vec::new();
        let mut answered = false;
        let mut last_err = None;
        for (url, result) in self.feeds.iter().zip(results) {
            match result {
                Ok(mut articles) => {
                    answered = true;
                    found.append(&mut articles);
                }
                Err(e) => {
                    tracing::warn!(feed = %url, error = %e, "feed skipped");
                    last_err = Some(e);
                }
            }
        }
        found.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        let articles = dedup(found.into_iter(), self.max_articles);
        tracing::debug!(count = articles.len(), "articles after dedup");
        if articles.is_empty() {
            return Err(match last_err {
                Some(e) if !answered => e,
                _ => SourceError::not_found(NAME, format!("feed news for {symbol}")),
            });
        }
        Ok(articles)
    }
}

#[async_trait]
impl SentimentSource for RssNews {
    async fn sentiment(&self, symbol: &Symbol) -> Result<SentimentData, SourceError> {
        let articles = self.fetch_articles(symbol).await?;
        Ok(SentimentData {
            articles: articles.iter().map(|a| a.scored(None)).collect(),
            summary_text: None,
        })
    }
}

impl SourceAdapter for RssNews {
    fn name(&self) -> &'static str {
        NAME
    }

    fn as_sentiment_source(&self) -> Option<&dyn SentimentSource> {
        Some(self as &dyn SentimentSource)
    }
}
