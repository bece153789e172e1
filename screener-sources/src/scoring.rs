//! Offline text polarity scorers used for news articles.
//!
//! Both return a polarity in `[-1, 1]`; 0 means no signal.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

const POSITIVE_PATTERNS: &[&str] = &[
    r"\b(beat|beats|beating|exceeded?|outperformed?|surge|surged|surging|record|records|up|growth|grow|growing|gains?|rally|bullish|optimistic|positive|strong|strength|robust|solid|impressive|excellent|outstanding|breakthrough|success|profit|profits|revenue|earnings|buy|upgrade|target|raised?|increase|increased?|boost|boosted?)\b",
    r"\b(all.?time.?high|new.?high|higher|rising|climbed?|jumped?|soared?|rallied?|gained?|advanced?)\b",
];

const NEGATIVE_PATTERNS: &[&str] = &[
    r"\b(miss|missed?|missing|underperformed?|drop|dropped?|dropping|fell|fall|falling|decline|declined?|declining|crash|crashed?|plunge|plunged?|tumble|tumbled?|loss|losses|lawsuit|lawsuits?|down|bearish|pessimistic|negative|weak|weakness|poor|disappointing|concerning|worried?|fear|fears|sell|downgrade|lowered?|decrease|decreased?|cut|slashed?)\b",
    r"\b(all.?time.?low|new.?low|lower|sinking|slumped?|retreated?|lost|erased?)\b",
];

struct Rules {
    positive: Vec<Regex>,
    negative: Vec<Regex>,
}

fn rules() -> &'static Rules {
    static RULES: OnceLock<Rules> = OnceLock::new();
    RULES.get_or_init(|| {
        let compile = |pats: &[&str]| -> Vec<Regex> {
            pats.iter().filter_map(|p| Regex::new(p).ok()).collect()
        };
        Rules {
            positive: compile(POSITIVE_PATTERNS),
            negative: compile(NEGATIVE_PATTERNS),
        }
    })
}

/// Keyword-rule polarity: `(positive hits − negative hits) / total hits`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn rule_based(text: &str) -> f64 {
    let lower = text.to_lowercase();
    let count = |set: &[Regex]| set.iter().map(|r| r.find_iter(&lower).count()).sum::<usize>();
    let r = rules();
    let pos = count(&r.positive);
    let neg = count(&r.negative);
    let total = pos + neg;
    if total == 0 {
        return 0.0;
    }
    (pos as f64 - neg as f64) / total as f64
}

const LEXICON: &[(&str, f64)] = &[
    ("beat", 1.6),
    ("beats", 1.6),
    ("bullish", 2.1),
    ("boost", 1.7),
    ("breakthrough", 2.0),
    ("gain", 1.7),
    ("gains", 1.7),
    ("good", 1.9),
    ("great", 3.1),
    ("growth", 1.6),
    ("impressive", 2.3),
    ("improve", 1.9),
    ("improved", 2.1),
    ("optimistic", 2.3),
    ("outperform", 1.8),
    ("positive", 2.6),
    ("profit", 1.9),
    ("profitable", 1.9),
    ("rally", 1.6),
    ("record", 1.2),
    ("robust", 1.8),
    ("soar", 2.0),
    ("soars", 2.0),
    ("solid", 1.6),
    ("strong", 2.3),
    ("success", 2.7),
    ("surge", 1.7),
    ("surges", 1.7),
    ("upbeat", 2.0),
    ("upgrade", 1.6),
    ("win", 2.8),
    ("wins", 2.8),
    ("bad", -2.5),
    ("bearish", -2.1),
    ("collapse", -2.4),
    ("concern", -1.4),
    ("concerns", -1.4),
    ("crash", -2.6),
    ("cut", -1.1),
    ("decline", -1.6),
    ("declines", -1.6),
    ("disappointing", -2.2),
    ("downgrade", -1.8),
    ("drop", -1.1),
    ("fail", -2.5),
    ("fear", -2.2),
    ("fears", -2.2),
    ("fraud", -2.9),
    ("lawsuit", -1.8),
    ("loss", -1.3),
    ("losses", -1.7),
    ("miss", -1.5),
    ("misses", -1.5),
    ("negative", -2.7),
    ("plunge", -2.3),
    ("plunges", -2.3),
    ("poor", -2.1),
    ("probe", -1.2),
    ("risk", -1.1),
    ("slump", -2.0),
    ("tumble", -1.9),
    ("warn", -1.6),
    ("warns", -1.6),
    ("weak", -1.9),
    ("worst", -3.1),
];

const NEGATIONS: &[&str] = &["not", "no", "never", "without", "nor", "neither"];

const BOOSTERS: &[(&str, f64)] = &[
    ("very", 0.293),
    ("extremely", 0.293),
    ("sharply", 0.293),
    ("significantly", 0.293),
    ("slightly", -0.293),
    ("somewhat", -0.293),
];

fn lexicon() -> &'static HashMap<&'static str, f64> {
    static LEX: OnceLock<HashMap<&'static str, f64>> = OnceLock::new();
    LEX.get_or_init(|| LEXICON.iter().copied().collect())
}

/// Valence-lexicon polarity with negation and intensity handling.
///
/// Word valences are summed, flipped and damped when one of the three
/// preceding tokens is a negation, then squashed into `[-1, 1]` with
/// `x / sqrt(x² + 15)`.
#[must_use]
pub fn lexicon_score(text: &str) -> f64 {
    let lex = lexicon();
    let tokens: Vec<String> = text
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect();
    let mut sum = 0.0;
    for (i, tok) in tokens.iter().enumerate() {
        let Some(&valence) = lex.get(tok.as_str()) else {
            continue;
        };
        let window = &tokens[i.saturating_sub(3)..i];
        let mut v = valence;
        if let Some(prev) = window.last()
            && let Some((_, b)) = BOOSTERS.iter().find(|(w, _)| *w == prev.as_str())
        {
            v += b * v.signum();
        }
        if window.iter().any(|w| NEGATIONS.contains(&w.as_str()) || w.ends_with("n't")) {
            v *= -0.74;
        }
        sum += v;
    }
    if text.contains('!') && sum != 0.0 {
        sum += 0.292 * sum.signum();
    }
    let norm = sum / (sum * sum + 15.0).sqrt();
    norm.clamp(-1.0, 1.0)
}
