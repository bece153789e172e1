//! Deterministic merge of terminal agent tasks into the canonical response.
//!
//! Inputs are ordered by category before anything else happens, so the output
//! never depends on completion order.

use chrono::{DateTime, Utc};
use screener_core::{
    AgentTask, AggregatedResponse, AnalystData, AnalystRating, Category, CategoryPayload,
    CompanyInfo, ConsensusRating, MethodScores, PriceData, SentimentData,
    SentimentItem, SentimentScore, SentimentSummary, SentimentWeights,
};

const POSITIVE_CUTOFF: f64 = 0.15;

/// Merge terminal tasks for `symbol` into one response.
///
/// Tasks that did not contribute (failed, or still pending) only affect
/// `last_updated`. When several tasks share a category the first contributing
/// one in input order is used.
#[must_use]
pub fn aggregate(
    symbol: &str,
    tasks: &[AgentTask],
    weights: &SentimentWeights,
) -> AggregatedResponse {
    let mut ordered: Vec<&AgentTask> = tasks.iter().collect();
    ordered.sort_by_key(|t| t.category);

    let payload = |category: Category| {
        ordered
            .iter()
            .find(|t| t.category == category && t.status.contributes())
            .and_then(|t| t.result.as_ref())
    };

    let price = match payload(Category::Price) {
        Some(CategoryPayload::Price(p)) => Some(p),
        _ => None,
    };
    let fundamentals = match payload(Category::Fundamentals) {
        Some(CategoryPayload::Fundamentals(f)) => Some(f),
        _ => None,
    };
    let analyst = match payload(Category::Analyst) {
        Some(CategoryPayload::Analyst(a)) => Some(a),
        _ => None,
    };
    let sentiment = match payload(Category::Sentiment) {
        Some(CategoryPayload::Sentiment(s)) => Some(s),
        _ => None,
    };
    let company = match payload(Category::CompanyInfo) {
        Some(CategoryPayload::CompanyInfo(c)) => Some(c),
        _ => None,
    };

    let (change, change_percent) = price.map_or((None, None), derive_change);
    let (sentiment_items, sentiment_summary) =
        sentiment.map_or_else(|| (Vec::new(), SentimentSummary::empty()), |s| summarize(s, weights));

    let mut data_sources: Vec<String> = Vec::new();
    for t in &ordered {
        if t.status.contributes()
            && let Some(src) = &t.contributing_source
            && !data_sources.contains(src)
        {
            data_sources.push(src.clone());
        }
    }

    AggregatedResponse {
        symbol: symbol.to_string(),
        company_name: company.map(|c: &CompanyInfo| c.name.clone()),
        price: price.map(|p| p.price),
        currency: price
            .and_then(|p| p.currency.clone())
            .or_else(|| company.and_then(|c| c.currency.clone())),
        change,
        change_percent,
        volume: price.and_then(|p| p.volume),
        financial_metrics: fundamentals.cloned().unwrap_or_default(),
        analyst_ratings: analyst.map(|a| a.ratings.clone()).unwrap_or_default(),
        consensus_rating: analyst.and_then(consensus),
        average_price_target: analyst.and_then(average_target),
        earnings_data: analyst.map(|a| a.earnings.clone()).unwrap_or_default(),
        next_earnings_date: analyst.and_then(|a| a.next_earnings_date),
        sentiment_items,
        sentiment_summary,
        last_updated: last_updated(&ordered),
        data_sources,
    }
}

fn derive_change(p: &PriceData) -> (Option<f64>, Option<f64>) {
    let change = p
        .change
        .or_else(|| p.previous_close.map(|pc| p.price - pc));
    let percent = p.change_percent.or_else(|| {
        change.and_then(|c| {
            let base = p.price - c;
            (base != 0.0).then(|| c / base * 100.0)
        })
    });
    (change, percent)
}

fn last_updated(tasks: &[&AgentTask]) -> DateTime<Utc> {
    tasks
        .iter()
        .filter_map(|t| t.completed_at.or(t.started_at))
        .max()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

#[derive(Default)]
struct Votes {
    buy: u32,
    hold: u32,
    sell: u32,
}

impl Votes {
    fn winner(&self) -> Option<ConsensusRating> {
        if self.buy + self.hold + self.sell == 0 {
            return None;
        }
        let max = self.buy.max(self.hold).max(self.sell);
        let leaders = [self.buy, self.hold, self.sell]
            .iter()
            .filter(|v| **v == max)
            .count();
        if leaders > 1 {
            return Some(ConsensusRating::Hold);
        }
        Some(if self.buy == max {
            ConsensusRating::Buy
        } else if self.sell == max {
            ConsensusRating::Sell
        } else {
            ConsensusRating::Hold
        })
    }
}

fn classify_label(label: &str) -> Option<ConsensusRating> {
    let l = label.to_ascii_lowercase();
    if ["buy", "outperform", "overweight"].iter().any(|k| l.contains(k)) {
        Some(ConsensusRating::Buy)
    } else if ["sell", "underperform", "underweight"].iter().any(|k| l.contains(k)) {
        Some(ConsensusRating::Sell)
    } else if ["hold", "neutral", "market perform", "equal weight", "equal-weight", "sector perform"]
        .iter()
        .any(|k| l.contains(k))
    {
        Some(ConsensusRating::Hold)
    } else {
        None
    }
}

fn consensus(a: &AnalystData) -> Option<ConsensusRating> {
    if let Some(c) = a.recommendation_counts.filter(|c| c.total() > 0) {
        return Votes {
            buy: c.strong_buy + c.buy,
            hold: c.hold,
            sell: c.sell + c.strong_sell,
        }
        .winner();
    }
    let mut votes = Votes::default();
    for r in &a.ratings {
        match classify_label(&r.rating) {
            Some(ConsensusRating::Buy) => votes.buy += 1,
            Some(ConsensusRating::Hold) => votes.hold += 1,
            Some(ConsensusRating::Sell) => votes.sell += 1,
            None => {}
        }
    }
    votes.winner()
}

#[allow(clippy::cast_precision_loss)]
fn average_target(a: &AnalystData) -> Option<f64> {
    if a.price_target.is_some() {
        return a.price_target;
    }
    let targets: Vec<f64> = a
        .ratings
        .iter()
        .filter_map(|r: &AnalystRating| r.price_target)
        .filter(|t| t.is_finite())
        .collect();
    (!targets.is_empty()).then(|| targets.iter().sum::<f64>() / targets.len() as f64)
}

fn method_pairs(scores: &MethodScores, weights: &SentimentWeights) -> [(Option<f64>, f64); 3] {
    [
        (scores.lexicon, weights.lexicon),
        (scores.rule_based, weights.rule_based),
        (scores.llm, weights.llm),
    ]
}

/// Weighted mean of the methods that scored, renormalised over those present.
#[allow(clippy::cast_precision_loss)]
fn blend(scores: &MethodScores, weights: &SentimentWeights) -> f64 {
    let present: Vec<(f64, f64)> = method_pairs(scores, weights)
        .into_iter()
        .filter_map(|(s, w)| s.filter(|v| v.is_finite()).map(|v| (v, w)))
        .collect();
    if present.is_empty() {
        return 0.0;
    }
    let total_w: f64 = present.iter().map(|(_, w)| w).sum();
    let p = if total_w > 0.0 {
        present.iter().map(|(s, w)| s * w).sum::<f64>() / total_w
    } else {
        present.iter().map(|(s, _)| s).sum::<f64>() / present.len() as f64
    };
    p.clamp(-1.0, 1.0)
}

#[allow(clippy::cast_precision_loss)]
fn std_dev(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

/// Per-method agreement, weighted: `Σ w·clamp(1 − σ/2, 0, 1) / Σ w`.
fn confidence(data: &SentimentData, weights: &SentimentWeights) -> f64 {
    let mut per_method: [Vec<f64>; 3] = [Vec::new(), Vec::new(), Vec::new()];
    for a in &data.articles {
        for (i, (s, _)) in method_pairs(&a.scores, weights).into_iter().enumerate() {
            if let Some(v) = s.filter(|v| v.is_finite()) {
                per_method[i].push(v);
            }
        }
    }
    let ws = [weights.lexicon, weights.rule_based, weights.llm];
    let mut num = 0.0;
    let mut den = 0.0;
    for (values, w) in per_method.iter().zip(ws) {
        if values.is_empty() || w <= 0.0 {
            continue;
        }
        num += w * (1.0 - std_dev(values) / 2.0).clamp(0.0, 1.0);
        den += w;
    }
    if den > 0.0 { num / den } else { 0.0 }
}

#[allow(clippy::cast_precision_loss)]
fn summarize(
    data: &SentimentData,
    weights: &SentimentWeights,
) -> (Vec<SentimentItem>, SentimentSummary) {
    if data.articles.is_empty() {
        return (Vec::new(), SentimentSummary::empty());
    }
    let items: Vec<SentimentItem> = data
        .articles
        .iter()
        .map(|a| {
            let polarity = blend(&a.scores, weights);
            SentimentItem {
                source: a.source.clone(),
                title: a.title.clone(),
                url: a.url.clone(),
                published_at: a.published_at,
                polarity,
                sentiment_score: SentimentScore::from_polarity(polarity),
            }
        })
        .collect();

    let mut positive = 0u32;
    let mut negative = 0u32;
    for i in &items {
        if i.polarity > POSITIVE_CUTOFF {
            positive += 1;
        } else if i.polarity < -POSITIVE_CUTOFF {
            negative += 1;
        }
    }
    let n = u32::try_from(items.len()).unwrap_or(u32::MAX);
    let neutral = n.saturating_sub(positive + negative);
    let mean = items.iter().map(|i| i.polarity).sum::<f64>() / items.len() as f64;

    let summary_text = data.summary_text.clone().unwrap_or_else(|| {
        let head = format!("Based on {n} articles: ");
        let tail = if positive > negative {
            format!("Generally positive sentiment ({positive} positive, {negative} negative)")
        } else if negative > positive {
            format!("Generally negative sentiment ({negative} negative, {positive} positive)")
        } else {
            format!("Mixed sentiment ({positive} positive, {negative} negative, {neutral} neutral)")
        };
        head + &tail
    });

    let summary = SentimentSummary {
        overall_score: SentimentScore::from_polarity(mean),
        confidence: confidence(data, weights),
        positive_count: positive,
        negative_count: negative,
        neutral_count: neutral,
        summary_text,
    };
    (items, summary)
}
