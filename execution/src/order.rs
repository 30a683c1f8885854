//! Order types observed from the order-lifecycle bridge and sent to the trading port.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smarttrade_markets::{MarketType, Pair, Side};
use std::fmt;

/// Opaque exchange-assigned order identifier.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct OrderId(pub String);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum OrderStatus {
    Open,
    Filled,
    Canceled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Canceled)
    }
}

/// Order kind, spanning both entry/exit order types and the stop-loss type field.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum OrderKind {
    Market,
    Limit,
    Stop,
    StopLimit,
    TakeProfitLimit,
}

/// Position side, relevant on hedge-mode futures accounts.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum PositionSide {
    Long,
    Short,
    Both,
}

/// An order as observed from the bridge: the shape `Conditions`/state-machine code reads
/// back off a terminal callback or a lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub post_only_initial_id: Option<OrderId>,
    pub post_only_final_id: Option<OrderId>,
    pub status: OrderStatus,
    pub side: Side,
    pub kind: OrderKind,
    pub pair: Pair,
    pub average: Decimal,
    pub filled: Decimal,
    pub fee_cost: Decimal,
    pub reduce_only: bool,
    pub position_side: PositionSide,
    pub stop_price: Option<Decimal>,
    pub timestamp: i64,
}

/// A single step in placing an order: which leg of the state machine requested it.
/// Mirrors the `step` argument to `PlaceOrder` in the source system — used to key the
/// `is_waiting_for_order` suppression flag and to pick retry/fallback behavior.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum PlaceOrderStep {
    Entry,
    EntryLevel(u8),
    TakeProfit(u8),
    StopLoss,
    ForcedLoss,
    WithoutLoss,
    Canceled,
}

/// A create-order request as dispatched to the [`crate::port::TradingPort`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub key_id: String,
    pub pair: Pair,
    pub market_type: MarketType,
    pub side: Side,
    pub kind: OrderKind,
    pub price: Decimal,
    pub amount: Decimal,
    pub reduce_only: bool,
    pub leverage: u32,
    pub step: PlaceOrderStep,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelOrderRequest {
    pub key_id: String,
    pub order_id: OrderId,
    pub pair: Pair,
    pub market_type: MarketType,
}

/// The `{status: OK|ERR, data: {...}}` response shape every trading-port call returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResponse {
    pub ok: bool,
    pub order_id: Option<OrderId>,
    pub msg: Option<String>,
    pub status: Option<OrderStatus>,
    pub kind: Option<OrderKind>,
    pub price: Option<Decimal>,
    pub average: Option<Decimal>,
    pub amount: Option<Decimal>,
    pub filled: Option<Decimal>,
    pub code: Option<String>,
}

impl OrderResponse {
    pub fn ok(order_id: OrderId) -> Self {
        Self {
            ok: true,
            order_id: Some(order_id),
            msg: None,
            status: Some(OrderStatus::Open),
            kind: None,
            price: None,
            average: None,
            amount: None,
            filled: None,
            code: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            ok: false,
            order_id: None,
            msg: Some(msg.into()),
            status: None,
            kind: None,
            price: None,
            average: None,
            amount: None,
            filled: None,
            code: None,
        }
    }

    /// The literal error-message text, used by the retry policy's substring matching.
    pub fn error_text(&self) -> &str {
        self.msg.as_deref().unwrap_or("")
    }
}
