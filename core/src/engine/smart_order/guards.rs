//! Pure predicates over the current tick, the persisted state and the
//! conditions. Guards decide *whether* a transition fires; they never touch
//! the trading port or the state store — placement happens in the paired
//! entry action once the transition itself is committed.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use smarttrade_markets::Side;

use crate::model::{Conditions, ExitLevel, Tick};

use super::SmartOrder;

/// Whether a resting, non-trailing entry still needs to be placed. Re-armed
/// on every `WaitForEntry` tick so a strategy that skipped instant placement
/// in `on_start` (another active strategy held the pair) still enters once
/// that condition clears.
pub(super) fn should_place_entry(sm: &SmartOrder) -> bool {
    let state = sm.state.lock();
    if sm.conditions.entry_levels.is_empty() {
        state.entry_order_id.is_none()
    } else {
        state.entry_level_order_ids.is_empty()
    }
}

/// One rung of the exit ladder: either a take-profit level or the final
/// stop/forced-loss/without-loss/trailing exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ExitTrigger {
    TakeProfitLevel(usize),
    StopLoss,
    ForcedLoss,
    WithoutLoss,
}

fn side_sign(side: Side) -> Decimal {
    match side {
        Side::Buy => Decimal::ONE,
        Side::Sell => -Decimal::ONE,
    }
}

/// `checkProfit`: has the tick crossed the next unreached take-profit level?
/// Levels are consumed in order; `reached_target_count` tracks progress.
pub(super) fn check_profit(sm: &SmartOrder, tick: &Tick) -> Option<ExitTrigger> {
    let conditions = &sm.conditions;
    let reference = tick.reference_price();
    let sign = side_sign(conditions.entry.side);

    // `take_profit_external`: the exit target is driven by an outside source
    // (e.g. a TradingView alert) rather than computed off `exit_levels`, and
    // arrives as `trailing_exit_price` (refreshed via an `EditConditions`
    // stop/respawn, see `engine::supervisor`). No local ladder exists in this
    // mode, so this always resolves to the single implicit target "level 0".
    if conditions.take_profit_external {
        let target = conditions.trailing_exit_price?;
        let reached = (reference - target) * sign >= Decimal::ZERO;
        return reached.then_some(ExitTrigger::TakeProfitLevel(0));
    }

    let state = sm.state.lock();
    let next = state.reached_target_count as usize;
    let entry_price = state.saved_entry_price?;
    drop(state);

    let level = conditions.exit_levels.get(next)?;
    let target = match level {
        ExitLevel::Fixed { price, .. } => price.resolve(entry_price, conditions.entry.side),
        ExitLevel::Trailing { .. } => return None, // handled by trailing::check_trailing_profit
    };

    let reached = (reference - target) * sign >= Decimal::ZERO;
    reached.then_some(ExitTrigger::TakeProfitLevel(next))
}

/// `checkLoss`: has the tick breached the stop-loss, forced-loss, or
/// break-even ("without loss") price? Forced loss and stop loss are
/// mutually independent — both may be configured and either may fire first.
/// Reads the *resolved* targets off `StrategyState` (computed once the entry
/// fills, see `exit::resolve_loss_targets`) rather than `Conditions`'
/// percent/absolute inputs directly, since a percent-based target can only
/// be resolved once the entry price is known.
pub(super) fn check_loss(sm: &SmartOrder, tick: &Tick) -> Option<ExitTrigger> {
    let conditions = &sm.conditions;
    let state = sm.state.lock();
    let entry_price = state.saved_entry_price?;
    let reference = tick.reference_price();
    let sign = side_sign(conditions.entry.side);

    if conditions.forced_loss && !conditions.stop_loss_external {
        if let Some(price) = state.forced_loss_target {
            if (reference - price) * sign <= Decimal::ZERO {
                return Some(ExitTrigger::ForcedLoss);
            }
        }
    }

    if conditions.stop_loss && !conditions.stop_loss_external {
        if let Some(price) = state.stop_loss_target {
            if (reference - price) * sign <= Decimal::ZERO {
                return Some(ExitTrigger::StopLoss);
            }
        }
    }

    if conditions.without_loss {
        let breakeven = entry_price * (Decimal::ONE + sign * estimated_fee_rate());
        if (reference - breakeven) * sign <= Decimal::ZERO && state.reached_target_count > 0 {
            return Some(ExitTrigger::WithoutLoss);
        }
    }

    None
}

/// Conservative round-trip taker-fee estimate used by the break-even
/// calculation; the original reads this from the exchange fee schedule,
/// which is out of scope here (see `Conditions` — fee schedules are not
/// modeled as a first-class external interface).
fn estimated_fee_rate() -> Decimal {
    dec!(0.0008)
}

/// `checkSpreadCondition`: spread-hunter mode only trades when the
/// bid/ask spread clears the exchange's round-trip taker-fee floor.
pub(super) fn spread_clears_fee_floor(tick: &Tick) -> bool {
    const FEE_FLOOR: Decimal = dec!(0.0012);
    match tick.as_spread() {
        Some(spread) if spread.bid > Decimal::ZERO => {
            (spread.ask / spread.bid - Decimal::ONE) >= FEE_FLOOR
        }
        _ => false,
    }
}

/// Whether every configured exit level has been consumed.
pub(super) fn exit_levels_exhausted(conditions: &Conditions, reached: u32) -> bool {
    reached as usize >= conditions.exit_levels.len()
}
