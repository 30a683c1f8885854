//! Market feed adapter (Component A): latest-value caches for OHLCV and spread data.
//!
//! Upstream venue adapters write into these caches; strategies read non-blocking
//! point-in-time snapshots. Each `(pair, venue, market_type)` key behaves as a
//! single-writer latest-value register — there is no ordering guarantee across
//! different keys.

use crate::exchange::{ExchangeId, MarketType, Pair};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::time::SystemTime;

/// A single OHLCV candle/tick snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ohlcv {
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    pub time: SystemTime,
}

/// Bid/ask snapshot for spread-based entry/take-profit logic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spread {
    pub bid: Decimal,
    pub ask: Decimal,
    pub time: SystemTime,
}

impl Spread {
    pub fn mid(&self) -> Decimal {
        (self.bid + self.ask) / Decimal::TWO
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
struct FeedKey {
    pair: Pair,
    venue: ExchangeId,
    market_type: MarketType,
}

/// Concurrent latest-value cache for market data, keyed by `(pair, venue, market_type)`.
///
/// Reads are synchronous snapshots guarded by a `parking_lot::RwLock`; a single
/// writer task per venue overwrites the entry on every tick.
#[derive(Debug, Default)]
pub struct MarketFeed {
    prices: RwLock<HashMap<FeedKey, Ohlcv>>,
    spreads: RwLock<HashMap<FeedKey, Spread>>,
}

impl MarketFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_price(&self, pair: Pair, venue: ExchangeId, market_type: MarketType, ohlcv: Ohlcv) {
        self.prices
            .write()
            .insert(FeedKey { pair, venue, market_type }, ohlcv);
    }

    pub fn update_spread(&self, pair: Pair, venue: ExchangeId, market_type: MarketType, spread: Spread) {
        self.spreads
            .write()
            .insert(FeedKey { pair, venue, market_type }, spread);
    }

    /// Non-blocking read; returns `None` if this key has never been populated.
    pub fn get_price(&self, pair: &Pair, venue: ExchangeId, market_type: MarketType) -> Option<Ohlcv> {
        self.prices
            .read()
            .get(&FeedKey { pair: pair.clone(), venue, market_type })
            .copied()
    }

    pub fn get_spread(&self, pair: &Pair, venue: ExchangeId, market_type: MarketType) -> Option<Spread> {
        self.spreads
            .read()
            .get(&FeedKey { pair: pair.clone(), venue, market_type })
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn tick(close: Decimal) -> Ohlcv {
        Ohlcv {
            open: close,
            high: close,
            low: close,
            close,
            volume: dec!(1),
            time: SystemTime::now(),
        }
    }

    #[test]
    fn unknown_key_returns_none() {
        let feed = MarketFeed::new();
        assert!(feed
            .get_price(&Pair::new("BTC_USDT"), ExchangeId::Mock, MarketType::Spot)
            .is_none());
    }

    #[test]
    fn latest_write_wins_per_key() {
        let feed = MarketFeed::new();
        let pair = Pair::new("BTC_USDT");
        feed.update_price(pair.clone(), ExchangeId::Mock, MarketType::Spot, tick(dec!(100)));
        feed.update_price(pair.clone(), ExchangeId::Mock, MarketType::Spot, tick(dec!(105)));

        let latest = feed
            .get_price(&pair, ExchangeId::Mock, MarketType::Spot)
            .unwrap();
        assert_eq!(latest.close, dec!(105));
    }

    #[test]
    fn distinct_keys_do_not_interfere() {
        let feed = MarketFeed::new();
        let btc = Pair::new("BTC_USDT");
        let eth = Pair::new("ETH_USDT");
        feed.update_price(btc.clone(), ExchangeId::Mock, MarketType::Spot, tick(dec!(100)));
        feed.update_price(eth.clone(), ExchangeId::Mock, MarketType::Spot, tick(dec!(10)));

        assert_eq!(
            feed.get_price(&btc, ExchangeId::Mock, MarketType::Spot).unwrap().close,
            dec!(100)
        );
        assert_eq!(
            feed.get_price(&eth, ExchangeId::Mock, MarketType::Spot).unwrap().close,
            dec!(10)
        );
    }

    #[test]
    fn spread_mid_is_average_of_bid_ask() {
        let spread = Spread { bid: dec!(99), ask: dec!(101), time: SystemTime::now() };
        assert_eq!(spread.mid(), dec!(100));
    }
}
