//! Exchange identifiers and market-type/pair primitives shared across the engine.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Identifies a trading venue.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub enum ExchangeId {
    /// In-memory mock, used for tests and local runs.
    Mock,
    /// Deterministic simulated venue, used for backtests.
    Simulated,
    Binance,
    Bybit,
    Okx,
    Bitmex,
    Kraken,
}

impl ExchangeId {
    /// Returns true for venues that never exist outside a test/dev process.
    pub fn is_test(&self) -> bool {
        matches!(self, ExchangeId::Mock | ExchangeId::Simulated)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeId::Mock => "MOCK",
            ExchangeId::Simulated => "SIMULATED",
            ExchangeId::Binance => "BINANCE",
            ExchangeId::Bybit => "BYBIT",
            ExchangeId::Okx => "OKX",
            ExchangeId::Bitmex => "BITMEX",
            ExchangeId::Kraken => "KRAKEN",
        }
    }
}

impl Display for ExchangeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Spot vs futures, per `Conditions.market_type` (spot=0, futures=1 in the wire format).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketType {
    Spot,
    Futures,
}

impl MarketType {
    pub fn as_i32(self) -> i32 {
        match self {
            MarketType::Spot => 0,
            MarketType::Futures => 1,
        }
    }

    pub fn supports_stop_orders(self) -> bool {
        matches!(self, MarketType::Futures)
    }
}

impl Display for MarketType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketType::Spot => write!(f, "spot"),
            MarketType::Futures => write!(f, "futures"),
        }
    }
}

/// A traded pair, e.g. `BTC_USDT`. Kept as an opaque identifier (matches how
/// strategies reference pairs in `Conditions.pair`), not decomposed into base/quote.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub struct Pair(pub String);

impl Pair {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Mirrors the Go `MODE=Bitcoin`/`Altcoins` string-prefix pair filters.
    pub fn is_bitcoin(&self) -> bool {
        self.0.starts_with("BTC_")
    }
}

impl Display for Pair {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Pair {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Pair {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_type_wire_values_match_conditions_field() {
        assert_eq!(MarketType::Spot.as_i32(), 0);
        assert_eq!(MarketType::Futures.as_i32(), 1);
    }

    #[test]
    fn spot_has_no_stop_orders() {
        assert!(!MarketType::Spot.supports_stop_orders());
        assert!(MarketType::Futures.supports_stop_orders());
    }

    #[test]
    fn pair_recognises_bitcoin_prefix() {
        assert!(Pair::new("BTC_USDT").is_bitcoin());
        assert!(!Pair::new("ETH_USDT").is_bitcoin());
    }
}
