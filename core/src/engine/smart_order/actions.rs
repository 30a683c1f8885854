//! Entry actions: the side effects a committed transition carries out.
//! Each action updates the persisted `state` field first (so a crash mid
//! placement recovers into the new state, never the old one) then fires the
//! order placement as a detached task, mirroring the original's `go
//! sm.PlaceOrder(...)` fire-and-forget calls.

use rust_decimal::Decimal;
use smarttrade_execution::order::PlaceOrderStep;
use smarttrade_execution::retry::PlaceOrderContext;
use tracing::info;

use crate::model::State;

use super::place_order::{place_order, PlaceOrderError, PlaceOrderRequest};
use super::SmartOrder;

impl SmartOrder {
    /// Shared failure handling for every `place_order` call site: an
    /// in-flight suppression hit is a silent no-op, an abandoned placement
    /// cancels the machine, an unrecognized rejection parks it in `Error`
    /// for an operator to inspect. A reduce-only rejection is the odd one
    /// out: the strategy is already disabled (by `place_order` itself,
    /// store-side) as an expected benign race, so no state transition or
    /// error message is recorded here.
    pub(super) async fn handle_place_order_err(&self, err: PlaceOrderError) {
        match err {
            PlaceOrderError::AlreadyInFlight | PlaceOrderError::Disabled(_) => {}
            PlaceOrderError::Cancelled => self.enter_canceled().await,
            PlaceOrderError::Rejected(msg) => self.enter_error(msg).await,
        }
    }
}

impl SmartOrder {
    pub(super) async fn transition_to(&self, next: State) {
        let previous = {
            let mut state = self.state.lock();
            let previous = state.state;
            state.state = next;
            previous
        };
        info!(strategy = %self.id, trigger = "tick", source = %previous, dest = %next, "state transition");
        let snapshot = self.state.lock().clone();
        if let Err(err) = self.store.update_state(&self.id, &snapshot).await {
            tracing::warn!(strategy = %self.id, %err, "failed to persist state transition");
        }
    }

    /// `enterEntry`: dispatches to the trailing-arm action, the averaging
    /// ladder, or a single resting order, depending on how the strategy is
    /// configured.
    pub(super) async fn enter_entry(&self) {
        if self.conditions.entry.is_trailing() {
            self.enter_trailing_entry().await;
            return;
        }
        if !self.conditions.entry_levels.is_empty() {
            self.enter_multi_entry().await;
            return;
        }
        self.place_single_entry_order().await;
    }

    /// Places the single (non-ladder) entry order at `EntryPoint::price`.
    /// Also the fire action for a trailing entry once its retrace threshold
    /// is crossed (see `engine::smart_order::trailing`), which is why this
    /// is split out from `enter_entry`'s dispatch instead of being inlined.
    pub(super) async fn place_single_entry_order(&self) {
        let entry = &self.conditions.entry;
        let request = PlaceOrderRequest {
            step: PlaceOrderStep::Entry,
            side: entry.side,
            kind: entry.order_type,
            price: entry.price,
            amount: entry.amount,
            reduce_only: entry.reduce_only,
            ctx: PlaceOrderContext {
                is_trailing_entry: false,
                is_stop_or_forced_loss_with_entry_ladder: false,
            },
        };
        match place_order(self, request).await {
            Ok(order_id) => {
                let mut state = self.state.lock();
                state.entry_order_id = Some(order_id);
                state.waiting_entry_deadline = self
                    .conditions
                    .waiting_entry_timeout_secs
                    .map(|secs| chrono::Utc::now() + chrono::Duration::seconds(secs as i64));
            }
            Err(err) => {
                tracing::warn!(strategy = %self.id, %err, "entry placement failed");
                self.handle_place_order_err(err).await;
            }
        }
    }

    /// `enterTakeProfit`: places the take-profit order for the next
    /// unreached ladder level, absorbing the rounding remainder into the
    /// last level (`getLastTargetAmount`).
    pub(super) async fn enter_take_profit(&self, level: usize, target_price: Decimal) {
        self.transition_to(State::TakeProfit).await;

        let amount = super::averaging::take_profit_level_amount(self, level);
        let side = self.conditions.entry.side.opposite();
        let request = PlaceOrderRequest {
            step: PlaceOrderStep::TakeProfit(level as u8),
            side,
            kind: smarttrade_execution::order::OrderKind::Limit,
            price: target_price,
            amount,
            reduce_only: true,
            ctx: PlaceOrderContext {
                is_trailing_entry: false,
                is_stop_or_forced_loss_with_entry_ladder: false,
            },
        };
        match place_order(self, request).await {
            Ok(order_id) => self.state.lock().take_profit_order_ids.push(order_id),
            Err(err) => {
                tracing::warn!(strategy = %self.id, %err, level, "take-profit placement failed");
                self.handle_place_order_err(err).await;
            }
        }
    }

    pub(super) async fn enter_stop_loss(&self, price: Decimal) {
        self.state.lock().stop_loss_at.get_or_insert(chrono::Utc::now());
        self.transition_to(State::StopLoss).await;
        self.place_exit_stop(PlaceOrderStep::StopLoss, price).await;
    }

    pub(super) async fn enter_forced_loss(&self, price: Decimal) {
        self.transition_to(State::ForcedLoss).await;
        self.place_exit_stop(PlaceOrderStep::ForcedLoss, price).await;
    }

    pub(super) async fn enter_without_loss(&self, price: Decimal) {
        self.transition_to(State::WithoutLoss).await;
        self.place_exit_stop(PlaceOrderStep::WithoutLoss, price).await;
    }

    async fn place_exit_stop(&self, step: PlaceOrderStep, price: Decimal) {
        let has_entry_ladder = !self.conditions.entry_levels.is_empty();
        let amount = self.amount_remaining();
        let request = PlaceOrderRequest {
            step,
            side: self.conditions.entry.side.opposite(),
            kind: self.stop_order_kind(),
            price,
            amount,
            reduce_only: true,
            ctx: PlaceOrderContext {
                is_trailing_entry: false,
                is_stop_or_forced_loss_with_entry_ladder: has_entry_ladder,
            },
        };
        match place_order(self, request).await {
            Ok(order_id) => {
                let mut state = self.state.lock();
                match step {
                    PlaceOrderStep::StopLoss => state.stop_order_id = Some(order_id),
                    PlaceOrderStep::ForcedLoss => state.forced_loss_order_id = Some(order_id),
                    PlaceOrderStep::WithoutLoss => state.without_loss_order_id = Some(order_id),
                    _ => {}
                }
            }
            Err(err) => {
                tracing::warn!(strategy = %self.id, %err, ?step, "exit stop placement failed");
                self.handle_place_order_err(err).await;
            }
        }
    }

    fn stop_order_kind(&self) -> smarttrade_execution::order::OrderKind {
        use crate::model::StopLossType;
        use smarttrade_execution::order::OrderKind;
        match self.conditions.stop_loss_type {
            StopLossType::Market => OrderKind::Stop,
            StopLossType::Limit => OrderKind::StopLimit,
        }
    }

    /// `enterEnd`: cancels everything still resting and marks the strategy
    /// finished. Terminal — the event loop exits on the next iteration.
    pub(super) async fn enter_end(&self) {
        self.try_cancel_all_orders_consistently().await;
        self.transition_to(State::End).await;
        let _ = self.store.disable_strategy(&self.id).await;
    }

    pub(super) async fn enter_canceled(&self) {
        self.try_cancel_all_orders_consistently().await;
        self.transition_to(State::Canceled).await;
    }

    /// `enterTimeout`: a configured timeout fired with no terminal condition
    /// otherwise reached. Terminal unless `continue_if_ended` restarts the
    /// machine (handled by the outer loop in `run()`).
    pub(super) async fn enter_timeout(&self) {
        self.try_cancel_all_orders_consistently().await;
        self.transition_to(State::Timeout).await;
        if !self.conditions.continue_if_ended {
            let _ = self.store.disable_strategy(&self.id).await;
        }
    }

    /// `enterError`: an unrecoverable gateway rejection
    /// (`RetryAction::DisableAndError`). The strategy is already disabled by
    /// the caller in `place_order`; this just records the message and parks
    /// the machine.
    pub(super) async fn enter_error(&self, message: impl Into<String>) {
        self.try_cancel_all_orders_consistently().await;
        self.state.lock().error_message = Some(message.into());
        self.transition_to(State::Error).await;
    }
}
