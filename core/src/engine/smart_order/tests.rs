//! Integration coverage for the strategy lifecycle: exercises the dispatcher,
//! guards and entry/exit actions together against a [`MockTradingPort`],
//! rather than each guard/action function in isolation.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex as PlMutex;
use rust_decimal_macros::dec;

use smarttrade_execution::bridge::OrderBridge;
use smarttrade_execution::mock::MockTradingPort;
use smarttrade_execution::order::{Order, OrderId, OrderKind};
use smarttrade_markets::feed::{MarketFeed, Ohlcv};
use smarttrade_markets::{ExchangeId, MarketType, Pair, Side};

use crate::error::EngineError;
use crate::model::{
    ActivationMode, Conditions, EntryPoint, ExitLevel, PriceLevel, State, StopLossType, Strategy,
    StrategyId, StrategyState, StrategyType,
};
use crate::port::{HedgeSubscriber, Lease, StateStorePort, StatsdPort};
use crate::precision::Precision;

use super::{guards, SmartOrder};

struct NullStore {
    disabled: PlMutex<Vec<StrategyId>>,
    hedge_subscriptions: PlMutex<Vec<StrategyId>>,
}

impl NullStore {
    fn new() -> Self {
        Self {
            disabled: PlMutex::new(Vec::new()),
            hedge_subscriptions: PlMutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl StateStorePort for NullStore {
    async fn get_strategy(&self, _id: &StrategyId) -> Result<Option<Strategy>, EngineError> {
        Ok(None)
    }
    async fn update_state(&self, _id: &StrategyId, _state: &StrategyState) -> Result<(), EngineError> {
        Ok(())
    }
    async fn enable_strategy(&self, _id: &StrategyId) -> Result<(), EngineError> {
        Ok(())
    }
    async fn disable_strategy(&self, id: &StrategyId) -> Result<(), EngineError> {
        self.disabled.lock().push(id.clone());
        Ok(())
    }
    async fn enable_hedge_loss_strategy(&self, _id: &StrategyId) -> Result<(), EngineError> {
        Ok(())
    }
    async fn get_order(&self, _order_id: &OrderId) -> Result<Option<Order>, EngineError> {
        Ok(None)
    }
    async fn get_market_precision(&self, _pair: &Pair, _market_type: MarketType) -> Result<Precision, EngineError> {
        Ok(Precision { price_decimals: 2, amount_decimals: 6 })
    }
    async fn any_active_strategies(&self, _excluding: &StrategyId, _pair: &Pair) -> Result<bool, EngineError> {
        Ok(false)
    }
    async fn subscribe_to_hedge(
        &self,
        hedge_strategy_id: &StrategyId,
        _callback: HedgeSubscriber,
    ) -> Result<(), EngineError> {
        self.hedge_subscriptions.lock().push(hedge_strategy_id.clone());
        Ok(())
    }
}

struct AlwaysValidLease;

#[async_trait]
impl Lease for AlwaysValidLease {
    async fn extend(&self, _ttl: std::time::Duration) -> Result<(), EngineError> {
        Ok(())
    }
    async fn is_valid(&self) -> bool {
        true
    }
    async fn release(&self) {}
}

struct NullStatsd;

impl StatsdPort for NullStatsd {
    fn incr(&self, _metric: &str) {}
    fn gauge(&self, _metric: &str, _value: f64) {}
}

/// A cold, single-entry, non-trailing long: one take-profit rung at +10%,
/// a 10% stop-loss, no hedge.
fn long_conditions(pair: Pair) -> Conditions {
    Conditions {
        pair,
        market_type: MarketType::Spot,
        exchange: ExchangeId::Mock,
        leverage: dec!(1),
        entry: EntryPoint {
            price: dec!(7000),
            amount: dec!(0.001),
            side: Side::Buy,
            order_type: OrderKind::Market,
            activation: ActivationMode::Disabled,
            entry_deviation: dec!(0),
            reduce_only: false,
            place_without_loss: false,
        },
        entry_levels: Vec::new(),
        exit_levels: vec![ExitLevel::Fixed {
            price: PriceLevel::Relative(dec!(10)),
            amount_percent: dec!(100),
        }],
        take_profit_price: None,
        stop_loss: true,
        stop_loss_type: StopLossType::Market,
        stop_loss_percent: Some(dec!(10)),
        stop_loss_price: None,
        stop_loss_external: false,
        forced_loss: false,
        mandatory_forced_loss: false,
        forced_loss_percent: None,
        forced_loss_price: None,
        trailing_exit: false,
        trailing_exit_price: None,
        trailing_exit_deviation: dec!(0),
        take_profit_external: false,
        entry_spread_hunter: false,
        take_profit_spread_hunter: false,
        without_loss: false,
        without_loss_after_profit: None,
        hedge: false,
        hedge_mode: false,
        hedge_strategy_id: None,
        hedge_key_id: None,
        hedge_loss_deviation: None,
        take_profit_hedge_price: None,
        waiting_entry_timeout_secs: None,
        activation_move_timeout_secs: None,
        activation_move_step: None,
        timeout_when_loss_secs: None,
        timeout_loss_secs: None,
        timeout_if_profitable_secs: None,
        close_strategy_after_first_tap: true,
        place_entry_after_tap: false,
        cancel_if_any_active: false,
        continue_if_ended: false,
        skip_initial_setup: false,
        position_was_closed: false,
    }
}

fn build(id: &str, conditions: Conditions) -> (Arc<SmartOrder>, Arc<NullStore>) {
    let market_feed = Arc::new(MarketFeed::new());
    market_feed.update_price(
        conditions.pair.clone(),
        conditions.exchange,
        conditions.market_type,
        Ohlcv {
            open: dec!(7000),
            high: dec!(7000),
            low: dec!(7000),
            close: dec!(7000),
            volume: dec!(1),
            time: std::time::SystemTime::now(),
        },
    );

    let bridge = Arc::new(OrderBridge::new());
    let trading = Arc::new(MockTradingPort::new(bridge.clone()));
    let store = Arc::new(NullStore::new());
    let statsd = Arc::new(NullStatsd);
    let lease = Arc::new(AlwaysValidLease);

    let strategy = Strategy {
        id: StrategyId::from(id),
        account_id: "acct".to_string(),
        strategy_type: StrategyType::SmartOrder,
        enabled: true,
        state: StrategyState::fresh(conditions.entry.amount),
        conditions,
    };

    let order = Arc::new(SmartOrder::new(
        strategy,
        "key-1".to_string(),
        market_feed,
        bridge,
        trading,
        store.clone(),
        statsd,
        lease,
        Precision { price_decimals: 2, amount_decimals: 6 },
    ));
    (order, store)
}

#[tokio::test]
async fn simple_long_entry_fills_instantly_and_arms_exits() {
    let (order, _store) = build("scenario-1", long_conditions(Pair::new("BTC_USDT")));

    order.on_start().await;

    // `MockTradingPort::create_order` fills synchronously inside `create_order`,
    // ahead of `place_order`'s own `bridge.subscribe` call, which is what exercises
    // the bridge's late-subscribe-replays-synchronously path (see `bridge.rs`). By
    // the time `on_start` returns, the entry fill event is already queued.
    let (step, filled) = {
        let mut order_rx = order.order_rx.lock().take().expect("order_rx available before run()");
        order_rx.recv().await.expect("entry fill event queued")
    };
    order.waiting_for_order.remove(&step);
    order.on_order_terminal(step, filled).await;

    // `arm_exit_orders` places the stop-loss first, then the take-profit last,
    // so the persisted state ends on `TakeProfit`.
    assert_eq!(order.current_state(), State::TakeProfit);

    let state = order.state.lock();
    assert_eq!(state.saved_entry_price, Some(dec!(7000)));
    assert_eq!(state.executed_amount, dec!(0.001));
    assert_eq!(state.take_profit_order_ids.len(), 1);
    assert!(state.stop_order_id.is_some());
    assert_eq!(state.stop_loss_target, Some(dec!(6300)));
}

/// spec.md §8 scenario 3: three entry levels (6000 absolute, then two -20%
/// relatives), amount=0.03, leverage=125, SL=20%, `skip_initial_setup=true`.
/// Expects all three ladder rungs placed up front, staying in `InMultiEntry`,
/// with the stop-loss re-armed against the running average after each fill.
#[tokio::test]
async fn multi_entry_places_every_ladder_rung_and_stays_in_multi_entry() {
    let mut conditions = long_conditions(Pair::new("BTC_USDT"));
    conditions.leverage = dec!(125);
    conditions.skip_initial_setup = true;
    conditions.entry.amount = dec!(0.03);
    conditions.entry.price = dec!(6000);
    conditions.entry_levels = vec![
        crate::model::EntryLevel { price: PriceLevel::Absolute(dec!(6000)), amount_percent: dec!(33.33) },
        crate::model::EntryLevel { price: PriceLevel::Relative(dec!(-20)), amount_percent: dec!(33.33) },
        crate::model::EntryLevel { price: PriceLevel::Relative(dec!(-20)), amount_percent: dec!(33.34) },
    ];
    conditions.stop_loss_percent = Some(dec!(20));

    let (order, _store) = build("scenario-3", conditions);

    // `on_start` is a no-op on `skip_initial_setup`; the ladder only gets
    // placed once the tick guard sees price cross the entry condition.
    assert!(guards::should_place_entry(&order));
    order.enter_entry().await;

    assert_eq!(order.current_state(), State::InMultiEntry);
    assert_eq!(order.state.lock().entry_level_order_ids.len(), 3);
    assert!(!guards::should_place_entry(&order));

    let mut order_rx = order.order_rx.lock().take().expect("order_rx available before run()");
    for _ in 0..3 {
        let (step, filled) = order_rx.recv().await.expect("ladder fill event queued");
        order.waiting_for_order.remove(&step);
        order.on_order_terminal(step, filled).await;
    }

    assert_eq!(order.current_state(), State::InEntry);
    assert_eq!(order.state.lock().filled_entry_level_count, 3);
    assert!(order.state.lock().stop_order_id.is_some());
}

#[tokio::test]
async fn futures_hedge_places_twin_and_subscribes_to_its_updates() {
    let mut conditions = long_conditions(Pair::new("ETH_USDT"));
    conditions.market_type = MarketType::Futures;
    conditions.hedge = true;
    conditions.hedge_mode = true;

    let (order, store) = build("scenario-hedge", conditions);

    super::hedge::on_start_hedge(&order).await;

    let expected_twin = StrategyId::from("hedge-of-scenario-hedge".to_string());
    assert_eq!(order.state.lock().hedge_order_id, Some(OrderId::from("hedge-of-scenario-hedge")));
    assert_eq!(store.hedge_subscriptions.lock().clone(), vec![expected_twin]);
}

#[tokio::test]
async fn existing_hedge_twin_is_reused_instead_of_placing_a_new_one() {
    let mut conditions = long_conditions(Pair::new("ETH_USDT"));
    conditions.market_type = MarketType::Futures;
    conditions.hedge = true;
    conditions.hedge_strategy_id = Some(StrategyId::from("already-running-twin"));

    let (order, store) = build("scenario-hedge-resume", conditions);

    super::hedge::on_start_hedge(&order).await;

    // A pre-configured twin id is used as-is; no new hedge order is placed,
    // so `hedge_order_id` stays unset on this leg.
    assert_eq!(order.state.lock().hedge_order_id, None);
    assert_eq!(
        store.hedge_subscriptions.lock().clone(),
        vec![StrategyId::from("already-running-twin")]
    );
}
