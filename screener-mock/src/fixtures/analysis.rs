use chrono::NaiveDate;
use screener_core::{AnalystData, AnalystRating, EarningsData, RecommendationCounts};

pub fn by_symbol(s: &str) -> Option<AnalystData> {
    let (counts, target) = match s {
        "AAPL" => (counts(12, 20, 9, 1, 0), 228.5),
        "MSFT" => (counts(18, 25, 4, 0, 0), 495.0),
        "NVDA" => (counts(20, 30, 5, 1, 0), 1150.0),
        "KO" => (counts(3, 6, 10, 1, 0), 68.0),
        _ => return None,
    };
    Some(AnalystData {
        ratings: vec![
            rating("Morgan Stanley", "Overweight", target * 1.05),
            rating("Goldman Sachs", "Buy", target),
            rating("Barclays", "Equal Weight", target * 0.9),
        ],
        recommendation_counts: Some(counts),
        price_target: Some(target),
        earnings: vec![EarningsData {
            eps_estimate: Some(1.50),
            eps_actual: Some(1.53),
            revenue_estimate: Some(9.4e10),
            revenue_actual: Some(9.5e10),
            quarter: Some(1),
            year: Some(2025),
        }],
        next_earnings_date: NaiveDate::from_ymd_opt(2025, 7, 31),
    })
}

const fn counts(strong_buy: u32, buy: u32, hold: u32, sell: u32, strong_sell: u32) -> RecommendationCounts {
    RecommendationCounts {
        strong_buy,
        buy,
        hold,
        sell,
        strong_sell,
    }
}

fn rating(firm: &str, label: &str, target: f64) -> AnalystRating {
    AnalystRating {
        firm: firm.to_string(),
        rating: label.to_string(),
        price_target: Some((target * 100.0).round() / 100.0),
        date: NaiveDate::from_ymd_opt(2025, 5, 2),
    }
}
