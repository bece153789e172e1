use screener_core::FinancialMetrics;

pub fn by_symbol(s: &str) -> Option<FinancialMetrics> {
    let (market_cap, pe, high, low) = match s {
        "AAPL" => (2.95e12, 30.6, 237.23, 164.08),
        "MSFT" => (3.12e12, 36.1, 468.35, 309.45),
        "NVDA" => (2.46e12, 72.4, 1140.0, 390.0),
        "KO" => (2.6e11, 24.3, 73.53, 57.93),
        _ => return None,
    };
    Some(FinancialMetrics {
        market_cap: Some(market_cap),
        pe_ratio: Some(pe),
        price_to_book: Some(12.1),
        profit_margin: Some(0.24),
        return_on_equity: Some(0.38),
        beta: Some(1.1),
        fifty_two_week_high: Some(high),
        fifty_two_week_low: Some(low),
        ..FinancialMetrics::default()
    })
}
