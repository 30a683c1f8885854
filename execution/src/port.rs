//! The trading port: the contract between the smart-order engine and an exchange gateway.
//!
//! Gateway internals are explicitly out of scope; this crate only models the
//! boundary and ships a [`MockTradingPort`] for tests and local runs.

use crate::error::ExecutionError;
use crate::order::{CancelOrderRequest, CreateOrderRequest, OrderResponse};
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct LeverageUpdate<'a> {
    pub key_id: &'a str,
    pub leverage: u32,
    pub symbol: &'a str,
}

#[async_trait]
pub trait TradingPort: Send + Sync + 'static {
    async fn create_order(&self, request: CreateOrderRequest) -> Result<OrderResponse, ExecutionError>;

    async fn cancel_order(&self, request: CancelOrderRequest) -> Result<OrderResponse, ExecutionError>;

    /// Places a twin opposite-side strategy; the returned order id is the twin strategy id.
    async fn place_hedge(&self, parent_strategy_id: &str) -> Result<OrderResponse, ExecutionError>;

    async fn update_leverage(&self, key_id: &str, leverage: u32, symbol: &str) -> Result<(), ExecutionError>;

    async fn set_hedge_mode(&self, key_id: &str, hedge_mode: bool) -> Result<OrderResponse, ExecutionError>;

    async fn transfer(&self, key_id: &str, amount: rust_decimal::Decimal) -> Result<OrderResponse, ExecutionError>;
}
