use screener_core::PriceData;

pub fn by_symbol(s: &str) -> Option<PriceData> {
    match s {
        "AAPL" => Some(q(196.58, 195.27, 45_394_700)),
        "MSFT" => Some(q(420.00, 418.00, 18_230_100)),
        "NVDA" => Some(q(1000.00, 990.00, 52_000_000)),
        "KO" => Some(q(60.00, 59.50, 12_400_000)),
        _ => None,
    }
}

fn q(price: f64, previous_close: f64, volume: u64) -> PriceData {
    PriceData {
        currency: Some("USD".to_string()),
        previous_close: Some(previous_close),
        volume: Some(volume),
        ..PriceData::new(price)
    }
}
