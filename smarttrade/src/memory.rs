//! In-memory [`StateStorePort`]/[`DistributedLockPort`] implementations for
//! local runs and demos. A real deployment backs these with whatever the
//! account-watcher/strategy-store infrastructure actually is (out of scope,
//! spec.md §1) — these adapters exist only so the binary crate has something
//! concrete to hand the supervisor. Keyed concurrent maps follow the same
//! `dashmap` convention `engine::smart_order`'s `waiting_for_order` set uses.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use smarttrade_core::error::EngineError;
use smarttrade_core::model::{Strategy, StrategyId, StrategyState};
use smarttrade_core::port::{DistributedLockPort, HedgeSubscriber, Lease, StateStorePort};
use smarttrade_core::precision::Precision;
use smarttrade_execution::order::{Order, OrderId};
use smarttrade_integration::Snapshot;
use smarttrade_markets::{MarketType, Pair};

#[derive(Default)]
pub struct InMemoryStore {
    strategies: DashMap<StrategyId, Strategy>,
    orders: DashMap<OrderId, Order>,
    hedge_subscribers: DashMap<StrategyId, Vec<HedgeSubscriber>>,
    /// Falls back to 2 price / 4 amount decimals for any `(pair, market_type)`
    /// with no explicit entry.
    precisions: DashMap<(Pair, MarketType), Precision>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a strategy for an `initial_intake` pass or a demo run.
    pub fn insert_strategy(&self, strategy: Strategy) {
        self.strategies.insert(strategy.id.clone(), strategy);
    }

    pub fn insert_precision(&self, pair: Pair, market_type: MarketType, precision: Precision) {
        self.precisions.insert((pair, market_type), precision);
    }

    fn notify_hedge_watchers(&self, strategy: &Strategy) {
        if let Some(callbacks) = self.hedge_subscribers.get(&strategy.id) {
            for callback in callbacks.iter() {
                callback(Snapshot::now(strategy.clone()));
            }
        }
    }
}

#[async_trait]
impl StateStorePort for InMemoryStore {
    async fn get_strategy(&self, id: &StrategyId) -> Result<Option<Strategy>, EngineError> {
        Ok(self.strategies.get(id).map(|entry| entry.value().clone()))
    }

    async fn update_state(&self, id: &StrategyId, state: &StrategyState) -> Result<(), EngineError> {
        let updated = {
            let mut strategy = self
                .strategies
                .get_mut(id)
                .ok_or_else(|| EngineError::StrategyNotFound(id.to_string()))?;
            strategy.state = state.clone();
            strategy.value().clone()
        };
        self.notify_hedge_watchers(&updated);
        Ok(())
    }

    async fn enable_strategy(&self, id: &StrategyId) -> Result<(), EngineError> {
        let mut strategy = self
            .strategies
            .get_mut(id)
            .ok_or_else(|| EngineError::StrategyNotFound(id.to_string()))?;
        strategy.enabled = true;
        Ok(())
    }

    async fn disable_strategy(&self, id: &StrategyId) -> Result<(), EngineError> {
        let mut strategy = self
            .strategies
            .get_mut(id)
            .ok_or_else(|| EngineError::StrategyNotFound(id.to_string()))?;
        strategy.enabled = false;
        Ok(())
    }

    async fn enable_hedge_loss_strategy(&self, id: &StrategyId) -> Result<(), EngineError> {
        let updated = {
            let mut strategy = self
                .strategies
                .get_mut(id)
                .ok_or_else(|| EngineError::StrategyNotFound(id.to_string()))?;
            strategy.enabled = true;
            strategy.state.state = smarttrade_core::model::State::HedgeLoss;
            strategy.value().clone()
        };
        self.notify_hedge_watchers(&updated);
        Ok(())
    }

    async fn get_order(&self, order_id: &OrderId) -> Result<Option<Order>, EngineError> {
        Ok(self.orders.get(order_id).map(|entry| entry.value().clone()))
    }

    async fn get_market_precision(&self, pair: &Pair, market_type: MarketType) -> Result<Precision, EngineError> {
        Ok(self
            .precisions
            .get(&(pair.clone(), market_type))
            .map(|entry| *entry.value())
            .unwrap_or(Precision {
                price_decimals: 2,
                amount_decimals: 4,
            }))
    }

    async fn any_active_strategies(&self, excluding: &StrategyId, pair: &Pair) -> Result<bool, EngineError> {
        Ok(self
            .strategies
            .iter()
            .any(|entry| &entry.id != excluding && entry.enabled && &entry.conditions.pair == pair))
    }

    async fn subscribe_to_hedge(
        &self,
        hedge_strategy_id: &StrategyId,
        callback: HedgeSubscriber,
    ) -> Result<(), EngineError> {
        if let Some(strategy) = self.strategies.get(hedge_strategy_id) {
            callback(Snapshot::now(strategy.value().clone()));
        }
        self.hedge_subscribers
            .entry(hedge_strategy_id.clone())
            .or_default()
            .push(callback);
        Ok(())
    }
}

/// A lease held in [`InMemoryLock`]'s registry. Valid until `expires_at`,
/// which `extend` pushes forward; `release` deletes the registry entry
/// outright so a later `acquire` on the same key doesn't have to wait it out.
struct LeaseRecord {
    expires_at: Instant,
}

pub struct InMemoryLock {
    leases: Arc<DashMap<String, LeaseRecord>>,
}

impl InMemoryLock {
    pub fn new() -> Self {
        Self {
            leases: Arc::new(DashMap::new()),
        }
    }
}

impl Default for InMemoryLock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DistributedLockPort for InMemoryLock {
    async fn acquire(&self, key: &str, ttl: Duration) -> Result<Box<dyn Lease>, EngineError> {
        let now = Instant::now();
        if let Some(existing) = self.leases.get(key) {
            if existing.expires_at > now {
                return Err(EngineError::Lock(format!("{key} already held")));
            }
        }
        self.leases.insert(
            key.to_string(),
            LeaseRecord {
                expires_at: now + ttl,
            },
        );
        Ok(Box::new(InMemoryLease {
            key: key.to_string(),
            registry: self.leases.clone(),
        }))
    }
}

struct InMemoryLease {
    key: String,
    registry: Arc<DashMap<String, LeaseRecord>>,
}

#[async_trait]
impl Lease for InMemoryLease {
    async fn extend(&self, ttl: Duration) -> Result<(), EngineError> {
        match self.registry.get_mut(&self.key) {
            Some(mut record) => {
                record.expires_at = Instant::now() + ttl;
                Ok(())
            }
            None => Err(EngineError::Lock(format!("{} no longer held", self.key))),
        }
    }

    async fn is_valid(&self) -> bool {
        self.registry
            .get(&self.key)
            .is_some_and(|record| record.expires_at > Instant::now())
    }

    async fn release(&self) {
        self.registry.remove(&self.key);
    }
}
