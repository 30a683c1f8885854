//! An in-memory [`TradingPort`] for tests and local runs.

use crate::bridge::OrderBridge;
use crate::error::ExecutionError;
use crate::order::{
    CancelOrderRequest, CreateOrderRequest, Order, OrderId, OrderResponse, OrderStatus, PositionSide,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::port::TradingPort;

/// A trading port that fills every order instantly at its requested price and
/// reports every cancel as successful. Fill notifications are pushed through
/// a caller-supplied [`OrderBridge`], matching how a real gateway's order-update
/// watcher would feed the bridge.
pub struct MockTradingPort {
    bridge: Arc<OrderBridge>,
    next_id: AtomicU64,
    open_orders: Mutex<Vec<OrderId>>,
}

impl MockTradingPort {
    pub fn new(bridge: Arc<OrderBridge>) -> Self {
        Self {
            bridge,
            next_id: AtomicU64::new(1),
            open_orders: Mutex::new(Vec::new()),
        }
    }

    fn fresh_id(&self) -> OrderId {
        OrderId::from(format!("mock-{}", self.next_id.fetch_add(1, Ordering::SeqCst)))
    }
}

#[async_trait]
impl TradingPort for MockTradingPort {
    async fn create_order(&self, request: CreateOrderRequest) -> Result<OrderResponse, ExecutionError> {
        let order_id = self.fresh_id();
        self.open_orders.lock().push(order_id.clone());

        self.bridge.observe(Order {
            order_id: order_id.clone(),
            post_only_initial_id: None,
            post_only_final_id: None,
            status: OrderStatus::Filled,
            side: request.side,
            kind: request.kind,
            pair: request.pair,
            average: request.price,
            filled: request.amount,
            fee_cost: Decimal::ZERO,
            reduce_only: request.reduce_only,
            position_side: PositionSide::Both,
            stop_price: None,
            timestamp: 0,
        });

        Ok(OrderResponse::ok(order_id))
    }

    async fn cancel_order(&self, request: CancelOrderRequest) -> Result<OrderResponse, ExecutionError> {
        self.bridge.observe(Order {
            order_id: request.order_id.clone(),
            post_only_initial_id: None,
            post_only_final_id: None,
            status: OrderStatus::Canceled,
            side: smarttrade_markets::Side::Buy,
            kind: crate::order::OrderKind::Market,
            pair: request.pair,
            average: Decimal::ZERO,
            filled: Decimal::ZERO,
            fee_cost: Decimal::ZERO,
            reduce_only: false,
            position_side: PositionSide::Both,
            stop_price: None,
            timestamp: 0,
        });
        Ok(OrderResponse::ok(request.order_id))
    }

    async fn place_hedge(&self, parent_strategy_id: &str) -> Result<OrderResponse, ExecutionError> {
        Ok(OrderResponse::ok(OrderId::from(format!("hedge-of-{parent_strategy_id}"))))
    }

    async fn update_leverage(&self, _key_id: &str, _leverage: u32, _symbol: &str) -> Result<(), ExecutionError> {
        Ok(())
    }

    async fn set_hedge_mode(&self, _key_id: &str, _hedge_mode: bool) -> Result<OrderResponse, ExecutionError> {
        Ok(OrderResponse::ok(self.fresh_id()))
    }

    async fn transfer(&self, _key_id: &str, _amount: Decimal) -> Result<OrderResponse, ExecutionError> {
        Ok(OrderResponse::ok(self.fresh_id()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{OrderKind, PlaceOrderStep};
    use rust_decimal_macros::dec;
    use smarttrade_markets::{MarketType, Pair, Side};

    #[tokio::test]
    async fn create_order_fills_instantly_and_notifies_bridge() {
        let bridge = Arc::new(OrderBridge::new());
        let port = MockTradingPort::new(bridge.clone());

        let response = port
            .create_order(CreateOrderRequest {
                key_id: "acct".into(),
                pair: Pair::new("BTC_USDT"),
                market_type: MarketType::Spot,
                side: Side::Buy,
                kind: OrderKind::Market,
                price: dec!(100),
                amount: dec!(1),
                reduce_only: false,
                leverage: 1,
                step: PlaceOrderStep::Entry,
            })
            .await
            .unwrap();

        assert!(response.ok);
    }
}
