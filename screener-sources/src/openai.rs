//! Language-model assisted news sentiment.
//!
//! Wraps [`NewsApi`]: the same articles, plus a per-article `llm` score and a
//! short model-written summary. The offline scores are always kept so an
//! article that the model could not score still contributes.
//!
//! One attempt fans out into a NewsAPI call and several model calls, so the
//! adapter is not metered as a whole. With a limiter attached every inner
//! call takes its own token from the `newsapi` or `openai` bucket.

use std::sync::Arc;

use async_trait::async_trait;
use futures::{StreamExt, stream};
use reqwest::Client;
use screener_core::{
    Acquire, RateLimiter, Secret, SentimentArticle, SentimentData, SentimentSource, SourceAdapter,
    SourceError, Symbol,
};
use serde::{Deserialize, Serialize};

use crate::http::send_json;
use crate::newsapi::{NewsApi, NewsArticle};

const BASE_URL: &str = "https://api.openai.com";
const NAME: &str = "openai_sentiment";
const PROVIDER: &str = "openai";
const NEWS_PROVIDER: &str = "newsapi";
const CONCURRENCY: usize = 4;
const SUMMARY_MIN_ARTICLES: usize = 4;
const SUMMARY_MAX_ARTICLES: usize = 10;

/// Model settings.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Chat model identifier.
    pub model: String,
    /// Sampling temperature for per-article scoring.
    pub temperature: f64,
}

/// News sentiment enriched by a chat-completions model.
#[derive(Clone)]
pub struct OpenAiSentiment {
    news: NewsApi,
    client: Client,
    api_key: Secret,
    config: OpenAiConfig,
    base_url: String,
    limiter: Option<Arc<RateLimiter>>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 1],
    temperature: f64,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Verdict {
    sentiment_score: f64,
}

fn scoring_prompt(text: &str) -> String {
    format!(
        "Analyze the sentiment of this financial news text.\n\
         Respond in JSON as {{\"sentiment_score\": <float from -1 (very negative) to 1 (very positive)>, \
         \"confidence\": <float 0..1>, \"explanation\": \"<max 50 words>\"}}.\n\nText: \"{text}\""
    )
}

fn summary_prompt(symbol: &Symbol, articles: &[SentimentArticle]) -> String {
    let lines: Vec<String> = articles
        .iter()
        .take(SUMMARY_MAX_ARTICLES)
        .map(|a| {
            let s = a.scores.llm.or(a.scores.lexicon).unwrap_or(0.0);
            format!("Title: {}\nSource: {}\nSentiment: {s:.2}", a.title, a.source)
        })
        .collect();
    format!(
        "As a financial analyst, summarise market sentiment for {symbol} from these articles in \
         at most 150 words: key themes, notable trends, and implications for investors.\n\n{}",
        lines.join("\n\n")
    )
}

/// Parse a model verdict, clamping the score to [-1, 1].
fn parse_verdict(content: &str) -> Result<f64, SourceError> {
    let trimmed = content
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();
    let v: Verdict = serde_json::from_str(trimmed)
        .map_err(|e| SourceError::invalid(PROVIDER, format!("verdict: {e}")))?;
    if !v.sentiment_score.is_finite() {
        return Err(SourceError::invalid(PROVIDER, "non-finite score"));
    }
    Ok(v.sentiment_score.clamp(-1.0, 1.0))
}

impl OpenAiSentiment {
    /// Adapter scoring `news` articles with `config.model`.
    #[must_use]
    pub fn new(news: NewsApi, client: Client, api_key: Secret, config: OpenAiConfig) -> Self {
        Self {
            news,
            client,
            api_key,
            config,
            base_url: BASE_URL.to_string(),
            limiter: None,
        }
    }

    /// Charge every NewsAPI and model call against `limiter`.
    #[must_use]
    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    fn charge(&self, provider: &'static str) -> Result<(), SourceError> {
        let Some(limiter) = &self.limiter else {
            return Ok(());
        };
        match limiter.acquire(provider) {
            Acquire::Granted => Ok(()),
            Acquire::Denied { retry_after } => Err(SourceError::RateLimited {
                provider: provider.to_string(),
                retry_after_ms: Some(u64::try_from(retry_after.as_millis()).unwrap_or(u64::MAX)),
            }),
        }
    }

    /// Point the model calls at another host (tests, proxies).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn complete(
        &self,
        prompt: &str,
        temperature: f64,
        json: bool,
    ) -> Result<String, SourceError> {
        self.charge(PROVIDER)?;
        let body = ChatRequest {
            model: &self.config.model,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
            temperature,
            max_tokens: 200,
            response_format: json.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };
        let req = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose())
            .json(&body);
        let resp: ChatResponse = send_json(PROVIDER, req).await?;
        resp.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| SourceError::invalid(PROVIDER, "empty completion"))
    }

    async fn score(&self, article: &NewsArticle) -> Result<f64, SourceError> {
        let content = self
            .complete(&scoring_prompt(&article.text()), self.config.temperature, true)
            .await?;
        parse_verdict(&content)
    }
}

#[async_trait]
impl SentimentSource for OpenAiSentiment {
    #[tracing::instrument(
        name = "screener::sources::openai::sentiment",
        skip(self),
        fields(symbol = %symbol, model = %self.config.model),
    )]
    async fn sentiment(&self, symbol: &Symbol) -> Result<SentimentData, SourceError> {
        self.charge(NEWS_PROVIDER)?;
        let articles = self.news.fetch_articles(symbol).await?;
        let calls: Vec<_> = articles.iter().map(|a| self.score(a)).collect();
        let verdicts: Vec<Result<f64, SourceError>> =
            stream::iter(calls).buffered(CONCURRENCY).collect().await;

        let mut scored = Vec::with_capacity(articles.len());
        for (article, verdict) in articles.iter().zip(verdicts) {
            let llm = match verdict {
                Ok(s) => Some(s),
                // Credential or quota problems affect every call; let the chain move on.
                Err(e @ (SourceError::AuthError { .. } | SourceError::RateLimited { .. })) => {
                    return Err(e);
                }
                Err(e) => {
                    tracing::debug!(error = %e, title = %article.title, "article not scored by model");
                    None
                }
            };
            scored.push(article.scored(llm));
        }

        let summary_text = if scored.len() >= SUMMARY_MIN_ARTICLES {
            match self.complete(&summary_prompt(symbol, &scored), 0.3, false).await {
                Ok(s) => Some(s),
                Err(e) => {
                    tracing::warn!(error = %e, "summary generation failed");
                    None
                }
            }
        } else {
            None
        };

        Ok(SentimentData {
            articles: scored,
            summary_text,
        })
    }
}

impl SourceAdapter for OpenAiSentiment {
    fn name(&self) -> &'static str {
        NAME
    }

    fn as_sentiment_source(&self) -> Option<&dyn SentimentSource> {
        Some(self as &dyn SentimentSource)
    }
}
