use screener_core::CompanyInfo;

pub fn by_symbol(s: &str) -> Option<CompanyInfo> {
    let (name, exchange, sector, industry, website) = match s {
        "AAPL" => (
            "Apple Inc.",
            "NASDAQ",
            "Technology",
            "Consumer Electronics",
            "https://www.apple.com",
        ),
        "MSFT" => (
            "Microsoft Corp",
            "NASDAQ",
            "Technology",
            "Software - Infrastructure",
            "https://www.microsoft.com",
        ),
        "NVDA" => (
            "NVIDIA Corp",
            "NASDAQ",
            "Technology",
            "Semiconductors",
            "https://www.nvidia.com",
        ),
        "KO" => (
            "Coca-Cola",
            "NYSE",
            "Consumer Defensive",
            "Beverages - Non-Alcoholic",
            "https://www.coca-colacompany.com",
        ),
        _ => return None,
    };
    Some(CompanyInfo {
        name: name.to_string(),
        exchange: Some(exchange.to_string()),
        sector: Some(sector.to_string()),
        industry: Some(industry.to_string()),
        country: Some("United States".to_string()),
        currency: Some("USD".to_string()),
        website: Some(website.to_string()),
    })
}
