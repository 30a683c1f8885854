//! The smart-order state machine: one instance per running strategy,
//! advancing [`State`](crate::model::State) in response to market ticks,
//! order-terminal callbacks and timers. Ported from `smartOrder.go` as a
//! hand-rolled tagged-enum dispatcher rather than a `stateless`-equivalent
//! crate, per the design notes recorded in `DESIGN.md`.

mod actions;
mod averaging;
mod exit;
mod guards;
mod hedge;
mod place_order;
mod timeouts;
mod trailing;

#[cfg(test)]
mod tests;

pub use place_order::PlaceOrderError;

use dashmap::DashSet;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use smarttrade_execution::bridge::OrderBridge;
use smarttrade_execution::order::{Order, PlaceOrderStep};
use smarttrade_execution::port::TradingPort;
use smarttrade_markets::feed::MarketFeed;
use smarttrade_markets::{ExchangeId, MarketType, Pair};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

use smarttrade_integration::Snapshot;

use crate::model::{Conditions, State, Strategy, StrategyId, StrategyState, Tick};
use crate::port::{Lease, StateStorePort, StatsdPort};
use crate::precision::Precision;

/// Emitted through an internal channel whenever a bridge subscription fires;
/// adapts `OrderBridge`'s callback API to the event loop's `select!`.
pub(crate) type OrderEvent = (PlaceOrderStep, Order);

/// One running instance of a strategy's smart-order lifecycle.
pub struct SmartOrder {
    pub id: StrategyId,
    pub account_id: String,
    pub key_id: String,
    pub exchange: ExchangeId,
    pub pair: Pair,
    pub market_type: MarketType,
    pub conditions: Conditions,

    pub(crate) market_feed: Arc<MarketFeed>,
    pub(crate) bridge: Arc<OrderBridge>,
    pub(crate) trading: Arc<dyn TradingPort>,
    pub(crate) store: Arc<dyn StateStorePort>,
    pub(crate) statsd: Arc<dyn StatsdPort>,
    pub(crate) lease: Arc<dyn Lease>,

    pub(crate) state: Mutex<StrategyState>,
    pub(crate) precision: Precision,
    /// Mirrors the original's `isWaitingForOrder` map: suppresses re-entrant
    /// placement of the same order step while one is already in flight.
    pub(crate) waiting_for_order: DashSet<PlaceOrderStep>,

    pub(crate) order_tx: mpsc::UnboundedSender<OrderEvent>,
    order_rx: Mutex<Option<mpsc::UnboundedReceiver<OrderEvent>>>,
    stop_tx: mpsc::Sender<()>,
    stop_rx: Mutex<Option<mpsc::Receiver<()>>>,
    /// Fed by the callback `on_start_hedge` registers with
    /// `StateStorePort::subscribe_to_hedge` whenever the twin strategy this
    /// one hedges updates; drained in the event loop's `select!`.
    hedge_tx: mpsc::UnboundedSender<Snapshot<Strategy>>,
    hedge_rx: Mutex<Option<mpsc::UnboundedReceiver<Snapshot<Strategy>>>>,
}

impl SmartOrder {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        strategy: Strategy,
        key_id: String,
        market_feed: Arc<MarketFeed>,
        bridge: Arc<OrderBridge>,
        trading: Arc<dyn TradingPort>,
        store: Arc<dyn StateStorePort>,
        statsd: Arc<dyn StatsdPort>,
        lease: Arc<dyn Lease>,
        precision: Precision,
    ) -> Self {
        let (order_tx, order_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = mpsc::channel(1);
        let (hedge_tx, hedge_rx) = mpsc::unbounded_channel();
        let conditions = strategy.conditions;
        Self {
            id: strategy.id,
            account_id: strategy.account_id,
            key_id,
            exchange: conditions.exchange,
            pair: conditions.pair.clone(),
            market_type: conditions.market_type,
            conditions,
            market_feed,
            bridge,
            trading,
            store,
            statsd,
            lease,
            state: Mutex::new(strategy.state),
            precision,
            waiting_for_order: DashSet::new(),
            order_tx,
            order_rx: Mutex::new(Some(order_rx)),
            stop_tx,
            stop_rx: Mutex::new(Some(stop_rx)),
            hedge_tx,
            hedge_rx: Mutex::new(Some(hedge_rx)),
        }
    }

    pub fn current_state(&self) -> State {
        self.state.lock().state
    }

    /// Requests the event loop to stop after its current tick; mirrors
    /// `Stop()`'s single cancel-residual-position pass (the original's
    /// double-cancel block is dropped here, see `DESIGN.md`).
    pub async fn stop(&self) {
        let _ = self.stop_tx.send(()).await;
    }

    fn read_tick(&self) -> Option<Tick> {
        let spread_hunter = match self.current_state() {
            State::WaitForEntry | State::TrailingEntry => self.conditions.entry_spread_hunter,
            _ => self.conditions.take_profit_spread_hunter,
        };
        if spread_hunter {
            self.market_feed
                .get_spread(&self.pair, self.exchange, self.market_type)
                .map(Tick::Spread)
        } else {
            self.market_feed
                .get_price(&self.pair, self.exchange, self.market_type)
                .map(Tick::Ohlcv)
        }
    }

    /// The main event loop: ported from `Start()` / `processEventLoop` /
    /// `processSpreadEventLoop`. Polls the market feed on a fixed interval,
    /// drains order-terminal notifications and periodically extends the
    /// strategy's distributed lease. Wraps the inner loop so a `Timeout`
    /// reached with `continue_if_ended` set restarts the machine from
    /// `WaitForEntry` instead of exiting for good.
    pub async fn run(self: Arc<Self>) {
        let mut order_rx = self
            .order_rx
            .lock()
            .take()
            .expect("SmartOrder::run called more than once");
        let mut stop_rx = self
            .stop_rx
            .lock()
            .take()
            .expect("SmartOrder::run called more than once");
        let mut hedge_rx = self
            .hedge_rx
            .lock()
            .take()
            .expect("SmartOrder::run called more than once");

        loop {
            self.on_start().await;

            if !self
                .run_one_generation(&mut order_rx, &mut stop_rx, &mut hedge_rx)
                .await
            {
                break;
            }

            if self.current_state() == State::Timeout && self.conditions.continue_if_ended {
                info!(strategy = %self.id, "timeout reached, restarting for next cycle");
                self.restart_for_next_cycle().await;
                continue;
            }

            break;
        }
    }

    /// Runs ticks until a terminal state is reached or the strategy is
    /// stopped. Returns `false` if the caller should stop `run()` entirely
    /// (explicit stop or lost lease), `true` if the caller may restart.
    async fn run_one_generation(
        &self,
        order_rx: &mut mpsc::UnboundedReceiver<OrderEvent>,
        stop_rx: &mut mpsc::Receiver<()>,
        hedge_rx: &mut mpsc::UnboundedReceiver<Snapshot<Strategy>>,
    ) -> bool {
        let mut poll = tokio::time::interval(Duration::from_millis(60));
        let mut lease_check = tokio::time::interval(Duration::from_secs(2));

        loop {
            if self.current_state().is_terminal() {
                return true;
            }

            tokio::select! {
                _ = poll.tick() => {
                    if let Some(tick) = self.read_tick() {
                        self.on_tick(&tick).await;
                    }
                }
                Some((step, order)) = order_rx.recv() => {
                    self.waiting_for_order.remove(&step);
                    self.on_order_terminal(step, order).await;
                }
                Some(primary) = hedge_rx.recv() => {
                    hedge::on_hedge_update(self, &primary).await;
                }
                _ = lease_check.tick() => {
                    if !self.lease.is_valid().await {
                        warn!(strategy = %self.id, "lease lost mid-run, cancelling");
                        self.try_cancel_all_orders_consistently().await;
                        return false;
                    }
                }
                _ = stop_rx.recv() => {
                    self.try_cancel_all_orders_consistently().await;
                    return false;
                }
            }
        }
    }

    /// Resets the persisted state back to `WaitForEntry` for a fresh cycle,
    /// keeping accumulated PnL counters (`received_profit_*`) and the
    /// generation token (`iteration`) across restarts, so a timer scheduled
    /// against the previous cycle is recognizable as stale.
    async fn restart_for_next_cycle(&self) {
        {
            let mut state = self.state.lock();
            let received_profit_amount = state.received_profit_amount;
            let received_profit_percentage = state.received_profit_percentage;
            let amount = state.amount;
            let next_iteration = state.next_iteration();
            *state = StrategyState::fresh(amount);
            state.received_profit_amount = received_profit_amount;
            state.received_profit_percentage = received_profit_percentage;
            state.iteration = next_iteration;
        }
        let snapshot = self.state.lock().clone();
        if let Err(err) = self.store.update_state(&self.id, &snapshot).await {
            warn!(strategy = %self.id, %err, "failed to persist restart state");
        }
    }

    /// `onStart`: re-enters a resting strategy's state on supervisor
    /// restart, or places the initial entry instantly for cold, non-trailing,
    /// single-entry strategies (`checkIfPlaceOrderInstantlyOnStart`).
    async fn on_start(&self) {
        if self.current_state() != State::WaitForEntry {
            return;
        }
        if !self.conditions.skip_initial_setup {
            use rust_decimal::prelude::ToPrimitive;
            let leverage = self.conditions.leverage.to_u32().unwrap_or(1).max(1);
            if let Err(err) = self.trading.update_leverage(&self.key_id, leverage, self.pair.as_str()).await {
                warn!(strategy = %self.id, %err, "leverage update failed, continuing with entry anyway");
            }
        }
        if self.conditions.entry.is_trailing() || self.conditions.entry_spread_hunter {
            return;
        }
        if self.conditions.cancel_if_any_active
            && self
                .store
                .any_active_strategies(&self.id, &self.pair)
                .await
                .unwrap_or(false)
        {
            info!(strategy = %self.id, "another active strategy already targets this pair, staying idle");
            return;
        }
        hedge::on_start_hedge(self).await;
        self.enter_entry().await;
    }

    async fn on_tick(&self, tick: &Tick) {
        let state = self.current_state();
        match state {
            State::WaitForEntry => {
                if self.conditions.entry.is_trailing() {
                    self.trailing_entry_tick(tick).await;
                } else if guards::should_place_entry(self) {
                    self.enter_entry().await;
                }
                self.check_waiting_entry_timeout().await;
                self.check_activation_move_timeout(tick).await;
            }
            State::TrailingEntry => {
                self.trailing_entry_tick(tick).await;
            }
            State::InMultiEntry | State::InEntry => {
                self.exit_on_tick(tick).await;
            }
            State::TakeProfit | State::StopLoss | State::ForcedLoss | State::WithoutLoss => {
                self.exit_on_tick(tick).await;
            }
            State::HedgeLoss => {
                self.hedge_loss_tick(tick).await;
            }
            State::WaitLossHedge => {
                self.check_loss_hedge(tick).await;
            }
            State::Canceled | State::End | State::Timeout | State::Error => {}
        }
    }

    async fn on_order_terminal(&self, step: PlaceOrderStep, order: Order) {
        exit::on_order_terminal(self, step, order).await;
    }

    /// `TryCancelAllOrdersConsistently`: cancels every order this strategy
    /// still has resting, tolerating individual cancel failures.
    async fn try_cancel_all_orders_consistently(&self) {
        let ids: Vec<_> = {
            let state = self.state.lock();
            let mut ids = Vec::new();
            ids.extend(state.entry_order_id.clone());
            ids.extend(state.entry_level_order_ids.iter().cloned());
            ids.extend(state.take_profit_order_ids.iter().cloned());
            ids.extend(state.stop_order_id.clone());
            ids.extend(state.forced_loss_order_id.clone());
            ids.extend(state.without_loss_order_id.clone());
            ids
        };
        for order_id in ids {
            let request = smarttrade_execution::order::CancelOrderRequest {
                key_id: self.key_id.clone(),
                order_id: order_id.clone(),
                pair: self.pair.clone(),
                market_type: self.market_type,
            };
            if let Err(err) = self.trading.cancel_order(request).await {
                warn!(strategy = %self.id, order_id = %order_id, %err, "cancel failed, continuing");
            }
        }
    }

    pub(crate) fn amount_remaining(&self) -> Decimal {
        let state = self.state.lock();
        state.amount - state.executed_amount
    }
}
