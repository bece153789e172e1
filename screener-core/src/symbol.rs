use core::fmt;
use std::str::FromStr;

use screener_types::ScreenerError;
use serde::Serialize;

/// Longest accepted ticker, in characters.
pub const MAX_SYMBOL_LEN: usize = 5;

/// A validated ticker symbol.
///
/// Accepted: 1 to 5 upper-case ASCII letters (`AAPL`, `F`). Input is taken
/// as given; lower-case, padded or dotted tickers are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Validate a raw ticker.
    ///
    /// # Errors
    /// Returns `ScreenerError::InvalidSymbol` describing the first broken rule.
    pub fn parse(raw: &str) -> Result<Self, ScreenerError> {
        if raw.is_empty() {
            return Err(ScreenerError::invalid_symbol(raw, "symbol is empty"));
        }
        if raw.chars().count() > MAX_SYMBOL_LEN {
            return Err(ScreenerError::invalid_symbol(
                raw,
                format!("symbol is longer than {MAX_SYMBOL_LEN} characters"),
            ));
        }
        if !raw.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ScreenerError::invalid_symbol(
                raw,
                "only upper-case letters A-Z are allowed",
            ));
        }
        Ok(Self(raw.to_string()))
    }

    /// Borrow the ticker.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Symbol {
    type Err = ScreenerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
