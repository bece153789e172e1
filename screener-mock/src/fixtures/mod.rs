//! Deterministic per-symbol payloads.
//!
//! Known symbols: `AAPL`, `MSFT`, `NVDA`, `KO`. Every other symbol has no data.

pub mod analysis;
pub mod fundamentals;
pub mod news;
pub mod profile;
pub mod quotes;
