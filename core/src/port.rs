//! External collaborators the core depends on but does not implement:
//! persistence, distributed locking, and metrics. Implementations live
//! outside this crate (the `smarttrade` binary wires mock/in-memory ones for
//! local runs); the core only ever sees these trait objects.

use async_trait::async_trait;
use smarttrade_execution::order::{Order, OrderId};
use smarttrade_markets::{MarketType, Pair};
use std::time::Duration;

use smarttrade_integration::Snapshot;

use crate::error::EngineError;
use crate::model::{Strategy, StrategyId, StrategyState};
use crate::precision::Precision;

/// Subscriber installed on a hedge strategy; fires once per state update of
/// the strategy being watched (its exit price moving, in particular), timed
/// so a stale update arriving after a faster one can be told apart.
/// Mirrors `execution::bridge::Subscriber`'s boxed-closure shape.
pub type HedgeSubscriber = Box<dyn Fn(Snapshot<Strategy>) + Send + Sync>;

#[async_trait]
pub trait StateStorePort: Send + Sync + 'static {
    async fn get_strategy(&self, id: &StrategyId) -> Result<Option<Strategy>, EngineError>;

    async fn update_state(
        &self,
        id: &StrategyId,
        state: &StrategyState,
    ) -> Result<(), EngineError>;

    async fn enable_strategy(&self, id: &StrategyId) -> Result<(), EngineError>;

    async fn disable_strategy(&self, id: &StrategyId) -> Result<(), EngineError>;

    /// Flips the twin hedge strategy into `HedgeLoss` and enables it
    /// (`hedgeCallback` in the original).
    async fn enable_hedge_loss_strategy(&self, id: &StrategyId) -> Result<(), EngineError>;

    async fn get_order(&self, order_id: &OrderId) -> Result<Option<Order>, EngineError>;

    async fn get_market_precision(
        &self,
        pair: &Pair,
        market_type: MarketType,
    ) -> Result<Precision, EngineError>;

    /// Whether any other enabled strategy already targets this pair
    /// (`checkIfShouldCancelIfAnyActive`'s `any_active_strats` lookup).
    async fn any_active_strategies(&self, excluding: &StrategyId, pair: &Pair) -> Result<bool, EngineError>;

    async fn subscribe_to_hedge(
        &self,
        hedge_strategy_id: &StrategyId,
        callback: HedgeSubscriber,
    ) -> Result<(), EngineError>;
}

/// A held distributed lease. Extended periodically by the supervisor's
/// lease-extension loop (see `engine::supervisor::LEASE_EXTEND_SPAN_NAME`)
/// and checked for validity before any order placement.
#[async_trait]
pub trait Lease: Send + Sync {
    async fn extend(&self, ttl: Duration) -> Result<(), EngineError>;
    async fn is_valid(&self) -> bool;
    async fn release(&self);
}

#[async_trait]
pub trait DistributedLockPort: Send + Sync + 'static {
    async fn acquire(&self, key: &str, ttl: Duration) -> Result<Box<dyn Lease>, EngineError>;
}

/// Fire-and-forget counters/gauges; a failed emit is never fatal to the
/// strategy it instruments.
pub trait StatsdPort: Send + Sync + 'static {
    fn incr(&self, metric: &str);
    fn gauge(&self, metric: &str, value: f64);
}
