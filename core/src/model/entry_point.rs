use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use smarttrade_execution::order::OrderKind;
use smarttrade_markets::Side;

/// Replaces the original `activate_price == -1` sentinel ("enter as a market
/// order the instant the strategy starts") with a named variant, per
/// REDESIGN FLAGS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivationMode {
    /// Trailing-entry activation is not in effect; enter at `EntryPoint::price`.
    Disabled,
    /// Enter immediately at market, ignoring `price`.
    Immediate,
    /// Arm the trailing entry once the tick crosses this price.
    AtPrice(Decimal),
}

/// A price used by a ladder level (multi-entry or take-profit), either a
/// fixed price or a percentage offset from the strategy's reference price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceLevel {
    Absolute(Decimal),
    /// Percent offset from the reference price (entry price for averaging
    /// levels, `saved_entry_price` for exit levels).
    Relative(Decimal),
}

impl PriceLevel {
    pub fn resolve(&self, reference: Decimal, side: Side) -> Decimal {
        match self {
            PriceLevel::Absolute(price) => *price,
            PriceLevel::Relative(percent) => {
                let sign = match side {
                    Side::Buy => Decimal::ONE,
                    Side::Sell => -Decimal::ONE,
                };
                reference + reference * percent / dec!(100) * sign
            }
        }
    }
}

/// The first entry order of a strategy: single-shot or trailing, described
/// the same way whether it fires immediately or after an activation move.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryPoint {
    pub price: Decimal,
    pub amount: Decimal,
    pub side: Side,
    pub order_type: OrderKind,
    pub activation: ActivationMode,
    /// Percent the price must retrace from its best-seen extreme before a
    /// trailing entry is placed (`entryDeviation` in the original).
    pub entry_deviation: Decimal,
    pub reduce_only: bool,
    /// Place a break-even ("without loss") stop once this entry fills.
    pub place_without_loss: bool,
}

impl EntryPoint {
    pub fn is_trailing(&self) -> bool {
        !matches!(self.activation, ActivationMode::Disabled)
    }
}

/// One rung of the multi-entry averaging ladder.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EntryLevel {
    pub price: PriceLevel,
    /// Percentage of the base entry amount placed at this level.
    pub amount_percent: Decimal,
}
