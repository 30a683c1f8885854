//! Hedge-twin coordination: a strategy configured with `conditions.hedge`
//! watches its twin (`hedge_strategy_id`) and arms an opposite-side entry
//! once the twin reaches a loss state, mirroring `hedgeCallback` in the
//! original. `WaitLossHedge` is the armed-but-not-yet-triggered state;
//! `HedgeLoss` is entered once this strategy's own deviation threshold
//! against the twin's exit price is crossed.

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::model::{State, Strategy, StrategyId, Tick};
use smarttrade_integration::Snapshot;
use smarttrade_markets::{MarketType, Side};

use super::SmartOrder;

/// `hedgeCallback`'s setup half: on futures, puts the account into hedge
/// mode, then places the twin opposite-side strategy via the trading port's
/// *hedge* action (unless `conditions.hedge_strategy_id` already names an
/// existing twin, e.g. a strategy restarted after a supervisor restart) and
/// subscribes to its state updates. The twin id is recorded on
/// `StrategyState::hedge_order_id` rather than back into `Conditions`, which
/// is treated as immutable for the life of the strategy (see `DESIGN.md`).
pub(super) async fn on_start_hedge(sm: &SmartOrder) {
    if !sm.conditions.hedge {
        return;
    }

    if sm.market_type == MarketType::Futures {
        if let Err(err) = sm
            .trading
            .set_hedge_mode(&sm.key_id, sm.conditions.hedge_mode)
            .await
        {
            warn!(strategy = %sm.id, %err, "failed to set hedge mode on account");
        }
    }

    let twin_id = match &sm.conditions.hedge_strategy_id {
        Some(id) => id.clone(),
        None => match place_twin(sm).await {
            Some(id) => id,
            None => return,
        },
    };

    let tx = sm.hedge_tx.clone();
    let result = sm
        .store
        .subscribe_to_hedge(&twin_id, Box::new(move |snapshot| {
            let _ = tx.send(snapshot);
        }))
        .await;
    if let Err(err) = result {
        warn!(strategy = %sm.id, twin = %twin_id, %err, "failed to subscribe to hedge twin");
    }
}

/// Calls the trading port's hedge action, recording the returned twin
/// strategy id on `StrategyState::hedge_order_id`. A rejected or failed
/// placement is logged and leaves hedging disarmed for this run — it is not
/// escalated to `Error`, since the primary leg's own lifecycle is unaffected.
async fn place_twin(sm: &SmartOrder) -> Option<StrategyId> {
    match sm.trading.place_hedge(sm.id.as_str()).await {
        Ok(response) if response.ok => {
            let order_id = response.order_id?;
            let twin_id = StrategyId::from(order_id.to_string());
            sm.state.lock().hedge_order_id = Some(order_id);
            info!(strategy = %sm.id, twin = %twin_id, "hedge twin placed");
            Some(twin_id)
        }
        Ok(response) => {
            warn!(strategy = %sm.id, error = response.error_text(), "hedge twin placement rejected");
            None
        }
        Err(err) => {
            warn!(strategy = %sm.id, %err, "transport error placing hedge twin");
            None
        }
    }
}

/// A snapshot of the twin strategy arrived. Arms `WaitLossHedge` the moment
/// the twin reaches one of its loss-handling states, provided this strategy
/// hasn't already entered a position of its own.
pub(super) async fn on_hedge_update(sm: &SmartOrder, snapshot: &Snapshot<Strategy>) {
    let primary = &snapshot.value;
    let primary_in_loss = matches!(
        primary.state.state,
        State::StopLoss | State::ForcedLoss | State::WithoutLoss
    );
    if !primary_in_loss {
        return;
    }
    if sm.current_state() != State::WaitForEntry {
        return;
    }

    info!(strategy = %sm.id, primary = %primary.id, "hedge twin entered a loss state, arming hedge watch");
    {
        let mut state = sm.state.lock();
        state.trailing_hedge_exit_price = None;
        state.hedge_exit_price = primary.state.exit_price;
    }
    sm.transition_to(State::WaitLossHedge).await;
}

impl SmartOrder {
    /// Ticked while `WaitLossHedge`: waits for price to retrace
    /// `hedge_loss_deviation` percent away from the twin's exit price (or,
    /// absent a configured deviation, fires immediately) before entering as
    /// the hedge.
    pub(super) async fn check_loss_hedge(&self, tick: &Tick) {
        let should_fire = match self.conditions.hedge_loss_deviation {
            Some(deviation) => self.trailing_hedge_exit_should_fire(tick, deviation),
            None => true,
        };
        if !should_fire {
            return;
        }

        if let Err(err) = self.store.enable_hedge_loss_strategy(&self.id).await {
            warn!(strategy = %self.id, %err, "failed to record hedge-loss activation");
        }
        self.transition_to(State::HedgeLoss).await;
        self.enter_entry().await;
    }

    /// Ticked while `HedgeLoss`: once the hedge entry has filled, checks its
    /// dedicated `take_profit_hedge_price` target first, then falls back to
    /// the normal loss/profit guard cascade. While still unfilled this is a
    /// no-op — `on_order_terminal`'s entry-fill handler moves the machine on.
    pub(super) async fn hedge_loss_tick(&self, tick: &Tick) {
        let entered = self.state.lock().entry_price.is_some();
        if !entered {
            return;
        }

        if let Some(target) = self.conditions.take_profit_hedge_price {
            let reference = tick.reference_price();
            let sign = match self.conditions.entry.side {
                Side::Buy => Decimal::ONE,
                Side::Sell => -Decimal::ONE,
            };
            if (reference - target) * sign >= Decimal::ZERO {
                self.enter_end().await;
                return;
            }
        }

        self.exit_on_tick(tick).await;
    }
}
