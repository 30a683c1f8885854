//! Rounding primitives matching the original `toFixed` helper and its
//! `Nearest` / `Floor` / `Ceil` rounding modes, ported onto
//! [`rust_decimal::Decimal`] instead of floats so ladder math never drifts.

use rust_decimal::{Decimal, RoundingStrategy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundMode {
    Nearest,
    Floor,
    Ceil,
}

/// Per-market tick/lot sizing, looked up from the state store
/// (`get_market_precision` in [`crate::port::StateStorePort`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precision {
    pub price_decimals: u32,
    pub amount_decimals: u32,
}

pub fn round(value: Decimal, decimals: u32, mode: RoundMode) -> Decimal {
    let strategy = match mode {
        RoundMode::Nearest => RoundingStrategy::MidpointAwayFromZero,
        RoundMode::Floor => RoundingStrategy::ToNegativeInfinity,
        RoundMode::Ceil => RoundingStrategy::ToPositiveInfinity,
    };
    value.round_dp_with_strategy(decimals, strategy)
}

pub fn round_price(value: Decimal, precision: Precision, mode: RoundMode) -> Decimal {
    round(value, precision.price_decimals, mode)
}

pub fn round_amount(value: Decimal, precision: Precision, mode: RoundMode) -> Decimal {
    round(value, precision.amount_decimals, mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn nearest_rounds_half_away_from_zero() {
        assert_eq!(round(dec!(1.005), 2, RoundMode::Nearest), dec!(1.01));
        assert_eq!(round(dec!(-1.005), 2, RoundMode::Nearest), dec!(-1.01));
    }

    #[test]
    fn floor_always_rounds_down() {
        assert_eq!(round(dec!(1.009), 2, RoundMode::Floor), dec!(1.00));
        assert_eq!(round(dec!(-1.001), 2, RoundMode::Floor), dec!(-1.01));
    }

    #[test]
    fn ceil_always_rounds_up() {
        assert_eq!(round(dec!(1.001), 2, RoundMode::Ceil), dec!(1.01));
        assert_eq!(round(dec!(-1.009), 2, RoundMode::Ceil), dec!(-1.00));
    }

    #[test]
    fn exact_values_are_unchanged() {
        assert_eq!(round(dec!(1.50), 2, RoundMode::Nearest), dec!(1.50));
    }
}
