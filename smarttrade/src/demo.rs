//! Seeds one example strategy so a local run has something to supervise.
//! Not part of the engine proper — a real deployment's strategies come from
//! the strategy store, not a hardcoded constructor.

use rust_decimal_macros::dec;

use smarttrade_core::engine::supervisor::StrategyUpsert;
use smarttrade_core::model::{
    ActivationMode, Conditions, EntryPoint, ExitLevel, PriceLevel, Strategy, StrategyId,
    StrategyState, StrategyType, StopLossType,
};
use smarttrade_core::precision::Precision;
use smarttrade_execution::order::OrderKind;
use smarttrade_markets::feed::{MarketFeed, Ohlcv};
use smarttrade_markets::{ExchangeId, MarketType, Pair, Side};

use crate::memory::InMemoryStore;

const DEMO_PAIR: &str = "BTC_USDT";
const DEMO_ENTRY_PRICE: rust_decimal::Decimal = dec!(60000);

/// Registers a demo market-buy strategy with a 2% take-profit and a 1%
/// stop-loss, and primes the feed with the price it enters at.
pub fn seed_demo_strategy(store: &InMemoryStore, market_feed: &MarketFeed) -> StrategyUpsert {
    let pair = Pair::new(DEMO_PAIR);

    market_feed.update_price(
        pair.clone(),
        ExchangeId::Mock,
        MarketType::Spot,
        Ohlcv {
            open: DEMO_ENTRY_PRICE,
            high: DEMO_ENTRY_PRICE,
            low: DEMO_ENTRY_PRICE,
            close: DEMO_ENTRY_PRICE,
            volume: dec!(1),
            time: std::time::SystemTime::now(),
        },
    );

    let conditions = Conditions {
        pair: pair.clone(),
        market_type: MarketType::Spot,
        exchange: ExchangeId::Mock,
        leverage: dec!(1),
        entry: EntryPoint {
            price: DEMO_ENTRY_PRICE,
            amount: dec!(0.01),
            side: Side::Buy,
            order_type: OrderKind::Market,
            activation: ActivationMode::Immediate,
            entry_deviation: dec!(0),
            reduce_only: false,
            place_without_loss: false,
        },
        entry_levels: Vec::new(),
        exit_levels: vec![ExitLevel::Fixed {
            price: PriceLevel::Relative(dec!(2)),
            amount_percent: dec!(100),
        }],
        take_profit_price: None,
        stop_loss: true,
        stop_loss_type: StopLossType::Market,
        stop_loss_percent: Some(dec!(1)),
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
    };

    let strategy = Strategy {
        id: StrategyId::from("demo-btc-long"),
        account_id: "demo-account".to_string(),
        strategy_type: StrategyType::SmartOrder,
        enabled: true,
        state: StrategyState::fresh(dec!(0.01)),
        conditions,
    };

    store.insert_precision(
        pair,
        MarketType::Spot,
        Precision {
            price_decimals: 2,
            amount_decimals: 6,
        },
    );
    store.insert_strategy(strategy.clone());

    StrategyUpsert {
        strategy,
        key_id: "demo-key".to_string(),
    }
}
