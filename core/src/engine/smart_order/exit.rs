//! Order-terminal dispatch (`onOrderUpdate`) and the on-tick exit guard
//! cascade (`checkLossTrade` / `checkProfitTrade` / trailing variants).

use rust_decimal::Decimal;
use smarttrade_execution::order::{Order, OrderStatus, PlaceOrderStep};
use tracing::{info, warn};

use crate::model::{ExitLevel, State};
use smarttrade_analytics::pnl;

use super::guards::{self, ExitTrigger};
use super::SmartOrder;

/// Resolves `Conditions.stop_loss_percent`/`forced_loss_percent` (or their
/// absolute overrides) into concrete prices now that the entry price is
/// known, and stores them on `StrategyState` for `guards::check_loss`.
fn resolve_loss_targets(sm: &SmartOrder, entry_price: Decimal) {
    let conditions = &sm.conditions;
    let sign = match conditions.entry.side {
        smarttrade_markets::Side::Buy => -Decimal::ONE,
        smarttrade_markets::Side::Sell => Decimal::ONE,
    };

    let stop_loss_target = conditions.stop_loss_price.or_else(|| {
        conditions
            .stop_loss_percent
            .map(|pct| entry_price + entry_price * pct / Decimal::ONE_HUNDRED * sign)
    });
    let forced_loss_target = conditions.forced_loss_price.or_else(|| {
        conditions
            .forced_loss_percent
            .map(|pct| entry_price + entry_price * pct / Decimal::ONE_HUNDRED * sign)
    });

    let mut state = sm.state.lock();
    state.stop_loss_target = stop_loss_target;
    state.forced_loss_target = forced_loss_target;
}

pub(super) async fn on_order_terminal(sm: &SmartOrder, step: PlaceOrderStep, order: Order) {
    if order.status == OrderStatus::Canceled {
        info!(strategy = %sm.id, ?step, "order canceled");
        return;
    }
    if order.status != OrderStatus::Filled {
        return;
    }

    match step {
        PlaceOrderStep::Entry => on_entry_filled(sm, &order).await,
        PlaceOrderStep::EntryLevel(idx) => on_entry_level_filled(sm, idx, &order).await,
        PlaceOrderStep::TakeProfit(level) => on_take_profit_filled(sm, level as usize, &order).await,
        PlaceOrderStep::StopLoss => on_loss_filled(sm, &order, pnl_side(sm)).await,
        PlaceOrderStep::ForcedLoss => on_loss_filled(sm, &order, pnl_side(sm)).await,
        PlaceOrderStep::WithoutLoss => on_loss_filled(sm, &order, pnl_side(sm)).await,
        PlaceOrderStep::Canceled => {}
    }
}

fn pnl_side(sm: &SmartOrder) -> smarttrade_markets::Side {
    sm.conditions.entry.side
}

/// `enterInEntry` (base case): the single entry order filled. Resolves the
/// stop/forced-loss targets, arms the exit ladder and transitions to
/// `InEntry`.
async fn on_entry_filled(sm: &SmartOrder, order: &Order) {
    resolve_loss_targets(sm, order.average);

    {
        let mut state = sm.state.lock();
        state.entry_price = Some(order.average);
        state.saved_entry_price.get_or_insert(order.average);
        state.executed_amount += order.filled;
        state.position_amount += order.filled;
        state.commission += order.fee_cost;
        state.entry_notional += order.average * order.filled;
        state.lossable_at = Some(chrono::Utc::now());
        state.profitable_at = Some(chrono::Utc::now());
    }

    sm.transition_to(State::InEntry).await;
    arm_exit_orders(sm).await;
}

/// `enterMultiEntry`: an averaging-ladder rung filled. Recomputes the
/// volume-weighted entry price, then re-arms the stop/forced-loss targets
/// and resting order against the new average (`TriggerAveragingEntryOrderExecuted`).
/// Stays in `InMultiEntry` (re-entrant) until the last configured rung has
/// filled, at which point the machine moves on to `InEntry` for good.
async fn on_entry_level_filled(sm: &SmartOrder, _idx: u8, order: &Order) {
    let (average_entry_price, ladder_done) = {
        let mut state = sm.state.lock();
        state.executed_amount += order.filled;
        state.position_amount += order.filled;
        state.commission += order.fee_cost;
        state.entry_notional += order.average * order.filled;
        state.filled_entry_level_count += 1;
        let average = if state.executed_amount.is_zero() {
            order.average
        } else {
            state.entry_notional / state.executed_amount
        };
        state.entry_price = Some(average);
        state.saved_entry_price.get_or_insert(average);
        let done = state.filled_entry_level_count as usize >= sm.conditions.entry_levels.len();
        (average, done)
    };
    resolve_loss_targets(sm, average_entry_price);

    if ladder_done {
        if sm.current_state() != State::InEntry {
            sm.transition_to(State::InEntry).await;
        }
    } else if sm.current_state() != State::InMultiEntry {
        sm.transition_to(State::InMultiEntry).await;
    }
    rearm_stop_orders(sm).await;
    rearm_take_profit(sm).await;
}

/// `enterTakeProfit`'s terminal handler: accumulates realized PnL for the
/// filled rung, then either ends the strategy (ladder exhausted, or
/// `close_strategy_after_first_tap`) or keeps monitoring for the next one.
async fn on_take_profit_filled(sm: &SmartOrder, level: usize, order: &Order) {
    let leverage = sm.conditions.leverage;
    let entry_price = sm.state.lock().saved_entry_price.unwrap_or(order.average);
    let profit_pct = pnl::profit_percentage(entry_price, order.average, leverage, pnl_side(sm));
    let profit_amt = pnl::profit_amount(order.filled, leverage, entry_price, profit_pct);

    let (reached, exhausted) = {
        let mut state = sm.state.lock();
        state.received_profit_amount += profit_amt;
        state.received_profit_percentage += profit_pct;
        state.executed_amount -= order.filled;
        state.position_amount -= order.filled;
        state.reached_target_count += 1;
        let reached = state.reached_target_count;
        let exhausted = guards::exit_levels_exhausted(&sm.conditions, reached);
        (reached, exhausted)
    };
    info!(strategy = %sm.id, level, %profit_pct, %profit_amt, "take-profit level filled");

    if sm.conditions.close_strategy_after_first_tap || exhausted {
        sm.enter_end().await;
        return;
    }

    if sm.conditions.place_entry_after_tap {
        sm.transition_to(State::WaitForEntry).await;
        sm.enter_entry().await;
        return;
    }

    sm.transition_to(State::InEntry).await;
    if let Some(level) = sm.conditions.exit_levels.get(reached as usize) {
        if let ExitLevel::Fixed { price, .. } = level {
            let reference = sm.state.lock().saved_entry_price.unwrap_or(order.average);
            let target = price.resolve(reference, sm.conditions.entry.side);
            sm.enter_take_profit(reached as usize, target).await;
        }
    }
}

/// Stop-loss / forced-loss / without-loss fill: the position is fully (or
/// reduce-only-partially) closed at a loss (or break-even). Accumulates PnL,
/// notifies the hedge twin if configured, and ends the strategy.
async fn on_loss_filled(sm: &SmartOrder, order: &Order, side: smarttrade_markets::Side) {
    let leverage = sm.conditions.leverage;
    let entry_price = sm.state.lock().saved_entry_price.unwrap_or(order.average);
    let profit_pct = pnl::profit_percentage(entry_price, order.average, leverage, side);
    let profit_amt = pnl::profit_amount(order.filled, leverage, entry_price, profit_pct);
    {
        let mut state = sm.state.lock();
        state.received_profit_amount += profit_amt;
        state.received_profit_percentage += profit_pct;
        state.executed_amount -= order.filled;
        state.position_amount -= order.filled;
        state.exit_price = Some(order.average);
    }
    info!(strategy = %sm.id, %profit_pct, %profit_amt, "loss/break-even exit filled");

    if sm.conditions.hedge {
        if let Some(hedge_id) = &sm.conditions.hedge_strategy_id {
            if let Err(err) = sm.store.enable_hedge_loss_strategy(hedge_id).await {
                warn!(strategy = %sm.id, hedge = %hedge_id, %err, "failed to notify hedge twin");
            }
        }
    }

    sm.enter_end().await;
}

/// Places the stop-loss / forced-loss resting orders (and, once the first
/// take-profit level fires, the break-even order) for a freshly-filled
/// entry. Mirrors `checkIfShouldPlaceLoss` / `checkIfShouldPlaceForcedLoss`.
async fn arm_exit_orders(sm: &SmartOrder) {
    let (stop_loss_target, forced_loss_target) = {
        let state = sm.state.lock();
        (state.stop_loss_target, state.forced_loss_target)
    };

    if sm.conditions.stop_loss && !sm.conditions.stop_loss_external {
        if let Some(price) = stop_loss_target {
            sm.enter_stop_loss(price).await;
        }
    }
    if sm.conditions.forced_loss || sm.conditions.mandatory_forced_loss {
        if let Some(price) = forced_loss_target {
            sm.enter_forced_loss(price).await;
        }
    }

    arm_first_take_profit(sm).await;

    if sm.current_state() != State::TakeProfit {
        sm.transition_to(State::InEntry).await;
    }
}

/// Places the first take-profit target once the entry has filled: the
/// configured ladder's first rung, or (absent a ladder) the absolute
/// `take_profit_price` override — unless the exit is externally driven, in
/// which case `guards::check_profit` watches `trailing_exit_price` on every
/// tick instead of a resting order.
async fn arm_first_take_profit(sm: &SmartOrder) {
    if sm.conditions.take_profit_external {
        return;
    }
    if let Some(level) = sm.conditions.exit_levels.first() {
        if let ExitLevel::Fixed { price, .. } = level {
            let reference = sm.state.lock().saved_entry_price.unwrap_or_default();
            let target = price.resolve(reference, sm.conditions.entry.side);
            sm.enter_take_profit(0, target).await;
        }
        return;
    }
    if let Some(price) = sm.conditions.take_profit_price {
        sm.enter_take_profit(0, price).await;
    }
}

/// Re-places the stop-loss / forced-loss resting orders against the new
/// averaged entry price after an averaging-ladder rung fills. The original
/// cancels and re-sends in one call; here that's just firing the actions
/// again, since `place_order` always supersedes the suppression flag once
/// the previous attempt's bridge subscription already resolved.
async fn rearm_stop_orders(sm: &SmartOrder) {
    let (stop_loss_target, forced_loss_target) = {
        let state = sm.state.lock();
        (state.stop_loss_target, state.forced_loss_target)
    };
    if sm.conditions.stop_loss && !sm.conditions.stop_loss_external {
        if let Some(price) = stop_loss_target {
            sm.enter_stop_loss(price).await;
        }
    }
    if sm.conditions.forced_loss || sm.conditions.mandatory_forced_loss {
        if let Some(price) = forced_loss_target {
            sm.enter_forced_loss(price).await;
        }
    }
}

/// Cancels whatever take-profit orders are currently resting and re-places
/// the next unreached target sized against the freshly-averaged
/// `executed_amount`, after an averaging-ladder rung fills. Target prices are
/// resolved off `saved_entry_price` (the first fill), not the recomputed
/// average — only the amount changes as more of the ladder fills, matching
/// `PriceLevel::Relative`'s documented resolution convention for exit levels.
async fn rearm_take_profit(sm: &SmartOrder) {
    if sm.conditions.take_profit_external {
        return;
    }

    let stale_ids: Vec<_> = {
        let mut state = sm.state.lock();
        std::mem::take(&mut state.take_profit_order_ids)
    };
    for order_id in stale_ids {
        let request = smarttrade_execution::order::CancelOrderRequest {
            key_id: sm.key_id.clone(),
            order_id,
            pair: sm.pair.clone(),
            market_type: sm.market_type,
        };
        if let Err(err) = sm.trading.cancel_order(request).await {
            warn!(strategy = %sm.id, %err, "failed to cancel take-profit order for re-averaging");
        }
    }

    let reached = sm.state.lock().reached_target_count as usize;
    if let Some(level) = sm.conditions.exit_levels.get(reached) {
        if let ExitLevel::Fixed { price, .. } = level {
            let reference = sm.state.lock().saved_entry_price.unwrap_or_default();
            let target = price.resolve(reference, sm.conditions.entry.side);
            sm.enter_take_profit(reached, target).await;
        }
    } else if sm.conditions.exit_levels.is_empty() {
        if let Some(price) = sm.conditions.take_profit_price {
            sm.enter_take_profit(0, price).await;
        }
    }
}

impl SmartOrder {
    /// `checkLossTrade` → `checkProfitTrade` → trailing variants, first
    /// guard wins (spec's exit cascade order).
    pub(super) async fn exit_on_tick(&self, tick: &crate::model::Tick) {
        if let Some(trigger) = guards::check_loss(self, tick) {
            self.fire_exit(trigger, tick).await;
            return;
        }
        if let Some(trigger) = guards::check_profit(self, tick) {
            self.fire_exit(trigger, tick).await;
            return;
        }
        if super::trailing::check_trailing_loss(self, tick).await {
            return;
        }
        if super::trailing::check_trailing_profit(self, tick).await {
            return;
        }

        self.check_timeout_when_loss().await;
        self.check_timeout_if_profitable().await;
        self.check_timeout_loss(tick).await;
    }

    async fn fire_exit(&self, trigger: ExitTrigger, tick: &crate::model::Tick) {
        match trigger {
            ExitTrigger::TakeProfitLevel(level) => {
                let reference = tick.reference_price();
                self.enter_take_profit(level, reference).await;
            }
            ExitTrigger::StopLoss => {
                let price = self.state.lock().stop_loss_target.unwrap_or(tick.reference_price());
                self.enter_stop_loss(price).await;
            }
            ExitTrigger::ForcedLoss => {
                let price = self.state.lock().forced_loss_target.unwrap_or(tick.reference_price());
                self.enter_forced_loss(price).await;
            }
            ExitTrigger::WithoutLoss => {
                self.enter_without_loss(tick.reference_price()).await;
            }
        }
    }
}
