use rust_decimal::Decimal;
use smarttrade_markets::feed::{Ohlcv, Spread};
use smarttrade_markets::Side;

/// One market observation handed to guards. Most strategies poll OHLCV;
/// spread-hunter mode (`checkSpreadCondition`) polls the bid/ask spread
/// instead, so guards are written against this shared view rather than
/// against `Ohlcv` directly.
#[derive(Debug, Clone, Copy)]
pub enum Tick {
    Ohlcv(Ohlcv),
    Spread(Spread),
}

impl Tick {
    /// The reference price a guard compares against a target: `close` for
    /// candle ticks, mid-price for spread ticks.
    pub fn reference_price(&self) -> Decimal {
        match self {
            Tick::Ohlcv(candle) => candle.close,
            Tick::Spread(spread) => spread.mid(),
        }
    }

    /// The price a resting order of the given side would actually execute
    /// at right now: worst-of for conservative guard evaluation.
    pub fn execution_price(&self, side: Side) -> Decimal {
        match self {
            Tick::Ohlcv(candle) => candle.close,
            Tick::Spread(spread) => match side {
                Side::Buy => spread.ask,
                Side::Sell => spread.bid,
            },
        }
    }

    pub fn as_ohlcv(&self) -> Option<&Ohlcv> {
        match self {
            Tick::Ohlcv(candle) => Some(candle),
            Tick::Spread(_) => None,
        }
    }

    pub fn as_spread(&self) -> Option<&Spread> {
        match self {
            Tick::Spread(spread) => Some(spread),
            Tick::Ohlcv(_) => None,
        }
    }
}
