//! PnL formulas evaluated inline by the state machine on every fill that closes
//! all or part of a position (spec §4.3.4 "PnL"), plus the `received_profit`
//! accumulators a strategy (and its template, if any) carries across fills.

use rust_decimal::Decimal;
use smarttrade_markets::Side;

/// `side_sign`: +1 for a long (buy-entry) position, -1 for a short.
fn side_sign(side: Side) -> Decimal {
    match side {
        Side::Buy => Decimal::ONE,
        Side::Sell => -Decimal::ONE,
    }
}

/// `profit% = ((exit/entry) × 100 − 100) × leverage × side_sign`.
pub fn profit_percentage(entry_price: Decimal, exit_price: Decimal, leverage: Decimal, entry_side: Side) -> Decimal {
    if entry_price.is_zero() {
        return Decimal::ZERO;
    }
    ((exit_price / entry_price) * Decimal::ONE_HUNDRED - Decimal::ONE_HUNDRED) * leverage * side_sign(entry_side)
}

/// `profit_amount = (filled_amount / leverage) × entry_price × profit%/100`.
pub fn profit_amount(filled_amount: Decimal, leverage: Decimal, entry_price: Decimal, profit_pct: Decimal) -> Decimal {
    if leverage.is_zero() {
        return Decimal::ZERO;
    }
    (filled_amount / leverage) * entry_price * (profit_pct / Decimal::ONE_HUNDRED)
}

/// Running accumulation of realized PnL for a strategy, and optionally its template.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReceivedProfit {
    pub amount: Decimal,
    pub percentage: Decimal,
}

impl ReceivedProfit {
    pub fn accumulate(&mut self, amount: Decimal, percentage: Decimal) {
        self.amount += amount;
        self.percentage += percentage;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn long_profit_percentage_is_positive_on_price_increase() {
        let pct = profit_percentage(dec!(100), dec!(110), dec!(1), Side::Buy);
        assert_eq!(pct, dec!(10));
    }

    #[test]
    fn short_profit_percentage_flips_sign() {
        let pct = profit_percentage(dec!(100), dec!(110), dec!(1), Side::Sell);
        assert_eq!(pct, dec!(-10));
    }

    #[test]
    fn leverage_scales_profit_percentage() {
        let pct = profit_percentage(dec!(100), dec!(105), dec!(3), Side::Buy);
        assert_eq!(pct, dec!(15));
    }

    #[test]
    fn profit_amount_matches_spec_formula() {
        let pct = profit_percentage(dec!(100), dec!(110), dec!(1), Side::Buy);
        let amount = profit_amount(dec!(2), dec!(1), dec!(100), pct);
        // (2/1) * 100 * (10/100) = 20
        assert_eq!(amount, dec!(20));
    }

    #[test]
    fn received_profit_accumulates_across_fills() {
        let mut received = ReceivedProfit::default();
        received.accumulate(dec!(20), dec!(10));
        received.accumulate(dec!(5), dec!(2.5));
        assert_eq!(received.amount, dec!(25));
        assert_eq!(received.percentage, dec!(12.5));
    }
}
