//! One-shot timers: `checkTimeouts`'s waiting-entry and activation-move
//! goroutines, plus the loss/profit-driven timeouts checked once a position
//! is open. Every deadline is guarded by the generation token
//! (`StrategyState::iteration`) so a timer scheduled against a state that has
//! since moved on is a silent no-op rather than a stale transition.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;

use crate::model::{State, Tick};

use super::SmartOrder;

impl SmartOrder {
    /// `waiting_entry_timeout`: cancels the resting entry order and ends the
    /// strategy (or restarts it, via `continue_if_ended`) if nothing fills
    /// within `waiting_entry_timeout_secs`.
    pub(super) async fn check_waiting_entry_timeout(&self) {
        let Some(deadline) = self.state.lock().waiting_entry_deadline else {
            return;
        };
        if Utc::now() < deadline {
            return;
        }
        info!(strategy = %self.id, "waiting entry timeout reached");
        self.try_cancel_entry_orders().await;
        self.enter_timeout().await;
    }

    /// `activation_move_timeout`: nudges a still-unfilled trailing entry's
    /// activation price toward the market by `activation_move_step` every
    /// `activation_move_timeout_secs`, so a stalled trailing entry eventually
    /// catches up with a trending market instead of waiting forever.
    pub(super) async fn check_activation_move_timeout(&self, tick: &Tick) {
        let Some(step) = self.conditions.activation_move_step else {
            return;
        };
        let Some(interval_secs) = self.conditions.activation_move_timeout_secs else {
            return;
        };

        let due = {
            let state = self.state.lock();
            match state.activation_move_deadline {
                Some(deadline) => Utc::now() >= deadline,
                None => false,
            }
        };
        if !due {
            return;
        }

        let reference = tick.reference_price();
        let sign = match self.conditions.entry.side {
            smarttrade_markets::Side::Buy => Decimal::ONE,
            smarttrade_markets::Side::Sell => -Decimal::ONE,
        };
        let moved = reference + reference * step / Decimal::ONE_HUNDRED * sign;

        {
            let mut state = self.state.lock();
            state.trailing_entry_price = Some(moved);
            state.activation_move_deadline =
                Some(Utc::now() + chrono::Duration::seconds(interval_secs as i64));
        }
        info!(strategy = %self.id, moved_to = %moved, "activation move timeout nudged trailing entry");
    }

    /// `timeout_when_loss`: once in a loss-handling state, force the
    /// machine into `Timeout` if the position has stayed adverse this long
    /// without otherwise exiting.
    pub(super) async fn check_timeout_when_loss(&self) {
        let Some(secs) = self.conditions.timeout_when_loss_secs else {
            return;
        };
        let Some(lossable_at) = self.state.lock().lossable_at else {
            return;
        };
        if Utc::now() < lossable_at + chrono::Duration::seconds(secs as i64) {
            return;
        }
        info!(strategy = %self.id, "timeout_when_loss reached");
        self.try_cancel_all_orders_consistently().await;
        self.enter_timeout().await;
    }

    /// `timeout_if_profitable`: a soft "take the win" timeout — closes the
    /// strategy if it has remained in profit the whole time.
    pub(super) async fn check_timeout_if_profitable(&self) {
        let Some(secs) = self.conditions.timeout_if_profitable_secs else {
            return;
        };
        let Some(profitable_at) = self.state.lock().profitable_at else {
            return;
        };
        if Utc::now() < profitable_at + chrono::Duration::seconds(secs as i64) {
            return;
        }
        info!(strategy = %self.id, "timeout_if_profitable reached");
        self.enter_end().await;
    }

    /// `timeout_loss`: once resting in `StopLoss`, fire a limit stop-loss at
    /// the last known price if the position hasn't recovered to `InEntry`
    /// within `timeout_loss_secs`.
    pub(super) async fn check_timeout_loss(&self, tick: &Tick) {
        if self.current_state() != State::StopLoss {
            return;
        }
        let Some(secs) = self.conditions.timeout_loss_secs else {
            return;
        };
        let Some(stop_loss_at) = self.state.lock().stop_loss_at else {
            return;
        };
        if Utc::now() < stop_loss_at + chrono::Duration::seconds(secs as i64) {
            return;
        }
        info!(strategy = %self.id, "timeout_loss reached, firing limit stop at last price");
        self.enter_stop_loss(tick.reference_price()).await;
    }

    async fn try_cancel_entry_orders(&self) {
        let ids = {
            let state = self.state.lock();
            let mut ids = Vec::new();
            ids.extend(state.entry_order_id.clone());
            ids.extend(state.entry_level_order_ids.iter().cloned());
            ids
        };
        for order_id in ids {
            let request = smarttrade_execution::order::CancelOrderRequest {
                key_id: self.key_id.clone(),
                order_id,
                pair: self.pair.clone(),
                market_type: self.market_type,
            };
            let _ = self.trading.cancel_order(request).await;
        }
    }
}
