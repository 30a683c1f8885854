//! Multi-entry averaging ladder: `placeMultiEntryOrders` / `enterMultiEntry`
//! / `getAveragingEntryAmount` / `getLastTargetPrice` in the original. Also
//! supplies `getLastTargetAmount`'s remainder-absorption rule, which the
//! take-profit ladder in `actions::enter_take_profit` reuses verbatim.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::warn;

use crate::model::{EntryLevel, PriceLevel, State};
use crate::precision::{round_amount, Precision, RoundMode};
use smarttrade_execution::order::{OrderKind, PlaceOrderStep};
use smarttrade_execution::retry::PlaceOrderContext;
use smarttrade_markets::Side;

use super::place_order::{place_order, PlaceOrderRequest};
use super::SmartOrder;

impl SmartOrder {
    /// Places exactly one resting limit order per configured averaging
    /// level — the original's `placeMultiEntryOrders` has no separate base
    /// order alongside the ladder; the first rung of `entry_levels` *is*
    /// the entry. Prices thread a running value forward through the ladder
    /// (`currentPrice` in the original's loop), starting from the entry
    /// point's own price.
    pub(super) async fn enter_multi_entry(&self) {
        let entry = self.conditions.entry.clone();
        let leverage = self.conditions.leverage.max(Decimal::ONE);
        let levels = self.conditions.entry_levels.clone();

        let mut running_price = entry.price;
        for (idx, level) in levels.iter().enumerate() {
            running_price = entry_ladder_price(running_price, level, entry.side, leverage);
            let amount = averaging_entry_amount(self.state.lock().amount, self.precision, idx, &levels);
            let request = PlaceOrderRequest {
                step: PlaceOrderStep::EntryLevel(idx as u8),
                side: entry.side,
                kind: OrderKind::Limit,
                price: running_price,
                amount,
                reduce_only: false,
                ctx: PlaceOrderContext {
                    is_trailing_entry: false,
                    is_stop_or_forced_loss_with_entry_ladder: true,
                },
            };
            match place_order(self, request).await {
                Ok(order_id) => self.state.lock().entry_level_order_ids.push(order_id),
                Err(err) => {
                    let last = idx == levels.len().saturating_sub(1);
                    warn!(strategy = %self.id, %err, level = idx, last, "averaging level placement failed");
                }
            }
        }

        self.transition_to(State::InMultiEntry).await;
    }
}

/// One ladder rung's price, threaded off the previous rung's resolved price
/// rather than a flat offset from the base entry — an absolute level resets
/// the running price outright, a relative level moves it by
/// `level.price / leverage` percent (sign by side, matching
/// `Conditions.entry.side`'s direction).
fn entry_ladder_price(running: Decimal, level: &EntryLevel, side: Side, leverage: Decimal) -> Decimal {
    match level.price {
        PriceLevel::Absolute(price) => price,
        PriceLevel::Relative(percent) => {
            let sign = match side {
                Side::Buy => -Decimal::ONE,
                Side::Sell => Decimal::ONE,
            };
            running * (Decimal::ONE_HUNDRED + sign * percent / leverage) / Decimal::ONE_HUNDRED
        }
    }
}

/// `getLastTargetPrice`: walks the ladder, substituting the live averaged
/// `entry_price` for every rung up to and including the one currently
/// selected (`filled_entry_level_count`, the original's `SelectedEntryTarget`)
/// and otherwise threading the running-price computation forward for rungs
/// not yet filled. Used by the "immediately trigger" SL/forced-loss retry
/// for a strategy with an active entry ladder (see `place_order.rs`); ported
/// as-is from the original, off-by-one-looking inclusion of the
/// not-yet-filled `SelectedEntryTarget` rung and all (spec.md §9 Open
/// Questions: whether this is intentional isn't derivable from the source).
pub(super) fn last_target_price(sm: &SmartOrder) -> Decimal {
    let levels = &sm.conditions.entry_levels;
    let leverage = sm.conditions.leverage.max(Decimal::ONE);
    let side = sm.conditions.entry.side;
    let (selected, entry_price) = {
        let state = sm.state.lock();
        (
            state.filled_entry_level_count as usize,
            state.entry_price.unwrap_or(sm.conditions.entry.price),
        )
    };

    let mut running_price = Decimal::ZERO;
    for (i, level) in levels.iter().enumerate() {
        running_price = if i <= selected {
            entry_price
        } else {
            entry_ladder_price(running_price, level, side, leverage)
        };
    }
    running_price
}

/// `getAveragingEntryAmount`: each level gets `amount_percent` of the
/// strategy's total target amount, floored to the amount precision; the
/// last level takes whatever remainder keeps the ladder summing exactly to
/// the total, so rounding never strands an unfillable residual. `allocated`
/// only ever accumulates previously-computed *level* shares — there is no
/// separate base order to net out (see `enter_multi_entry`), so seeding it
/// with anything but zero would make the last rung's remainder negative.
fn averaging_entry_amount(total_amount: Decimal, precision: Precision, idx: usize, levels: &[EntryLevel]) -> Decimal {
    let last = levels.len().saturating_sub(1);

    let mut allocated = Decimal::ZERO;
    let mut this_amount = Decimal::ZERO;
    for (i, level) in levels.iter().enumerate() {
        let amount = round_amount(total_amount * level.amount_percent / dec!(100), precision, RoundMode::Floor);
        if i == idx {
            this_amount = amount;
        }
        if i != last {
            allocated += amount;
        }
    }

    if idx == last {
        total_amount - allocated
    } else {
        this_amount
    }
}

/// `getLastTargetAmount`, shared by the take-profit ladder: the last
/// configured exit level absorbs the remainder of `total` left over after
/// flooring every earlier level's percentage share.
pub(super) fn take_profit_level_amount(sm: &SmartOrder, level: usize) -> Decimal {
    let levels = &sm.conditions.exit_levels;
    let total = sm.state.lock().executed_amount;
    let last = levels.len().saturating_sub(1);

    let mut allocated = Decimal::ZERO;
    let mut this_amount = Decimal::ZERO;
    for (i, lvl) in levels.iter().enumerate() {
        let amount = round_amount(
            total * lvl.amount_percent() / dec!(100),
            sm.precision,
            RoundMode::Floor,
        );
        if i == level {
            this_amount = amount;
        }
        if i != last {
            allocated += amount;
        }
    }

    if level == last {
        total - allocated
    } else {
        this_amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::precision::Precision;

    const PRECISION: Precision = Precision { price_decimals: 2, amount_decimals: 4 };

    #[test]
    fn last_level_absorbs_rounding_remainder_against_a_nonzero_entry_amount() {
        // entry.amount = 0.03, same shape as spec.md's scenario-3 multi-entry
        // strategy. Before the `allocated` fix this returned a negative
        // amount for the last rung (`total_amount - (total_amount + sum_of_shares)`).
        let levels = vec![
            EntryLevel { price: PriceLevel::Relative(dec!(-1)), amount_percent: dec!(33.33) },
            EntryLevel { price: PriceLevel::Relative(dec!(-2)), amount_percent: dec!(33.33) },
            EntryLevel { price: PriceLevel::Relative(dec!(-3)), amount_percent: dec!(33.34) },
        ];
        let total = dec!(0.03);

        let a = averaging_entry_amount(total, PRECISION, 0, &levels);
        let b = averaging_entry_amount(total, PRECISION, 1, &levels);
        let c = averaging_entry_amount(total, PRECISION, 2, &levels);

        assert!(a > Decimal::ZERO);
        assert!(b > Decimal::ZERO);
        assert!(c > Decimal::ZERO, "last rung's remainder must not go negative: got {c}");
        assert_eq!(a + b + c, total);
    }

    #[test]
    fn single_level_places_the_whole_amount() {
        let levels = vec![EntryLevel { price: PriceLevel::Absolute(dec!(6000)), amount_percent: dec!(100) }];
        assert_eq!(averaging_entry_amount(dec!(0.03), PRECISION, 0, &levels), dec!(0.03));
    }

    #[test]
    fn ladder_price_threads_through_relative_levels() {
        let buy_level = EntryLevel { price: PriceLevel::Relative(dec!(20)), amount_percent: dec!(50) };
        // buy side moves the running price down as the ladder deepens.
        let next = entry_ladder_price(dec!(6000), &buy_level, Side::Buy, dec!(1));
        assert_eq!(next, dec!(4800));
    }

    #[test]
    fn ladder_price_resets_on_an_absolute_level() {
        let level = EntryLevel { price: PriceLevel::Absolute(dec!(5000)), amount_percent: dec!(100) };
        assert_eq!(entry_ladder_price(dec!(9999), &level, Side::Buy, dec!(1)), dec!(5000));
    }
}
