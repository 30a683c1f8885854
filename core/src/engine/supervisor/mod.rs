//! Runtime supervisor (Component D): owns the registry of running
//! [`SmartOrder`] instances, binds each to a distributed lease, and gates
//! intake on a pair/account filter and resource pressure.
//!
//! The teacher crate is a single-account broker client with no multi-strategy
//! runtime of its own, so this module is grounded on the conventions the
//! `engine::smart_order` state machine already establishes in this crate
//! (`tokio::select!`-driven tasks, `parking_lot`/`dashmap` for shared state,
//! `tracing` spans per background loop) rather than a direct teacher
//! counterpart — see `DESIGN.md`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn, Instrument};

use smarttrade_execution::bridge::OrderBridge;
use smarttrade_execution::port::TradingPort;
use smarttrade_markets::feed::MarketFeed;
use smarttrade_markets::{ExchangeId, MarketType, Pair};
use smarttrade_risk::admission::{next_full_state, ResourceSampler};

use crate::engine::smart_order::SmartOrder;
use crate::model::{Strategy, StrategyId};
use crate::port::{DistributedLockPort, Lease, StateStorePort, StatsdPort};
use crate::precision::Precision;

/// Span name the lease-extension task logs under. `logging::init_logging`
/// filters events tagged with this span so its 3 s cadence doesn't flood
/// default output.
pub const LEASE_EXTEND_SPAN_NAME: &str = "lease_extend";

const LEASE_TTL: Duration = Duration::from_secs(10);
const LEASE_EXTEND_INTERVAL: Duration = Duration::from_secs(3);
const LEASE_ACQUIRE_ATTEMPTS: u32 = 2;
const LEASE_ACQUIRE_DELAY: Duration = Duration::from_secs(1);
const ADMISSION_SAMPLE_INTERVAL: Duration = Duration::from_secs(1);
const REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// `MODE` env filter (spec §6.4, §4.4): restricts which pairs this instance
/// intakes from initial and change-stream discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairFilter {
    All,
    Bitcoin,
    Altcoins,
    Exact(Pair),
}

impl PairFilter {
    pub fn matches(&self, pair: &Pair) -> bool {
        match self {
            PairFilter::All => true,
            PairFilter::Bitcoin => pair.is_bitcoin(),
            PairFilter::Altcoins => !pair.is_bitcoin(),
            PairFilter::Exact(exact) => pair == exact,
        }
    }
}

/// A strategy create/edit observation from the change-stream watcher
/// (external collaborator, out of scope — see spec.md §1). `key_id` is the
/// exchange API-key identifier the strategy trades under; it isn't part of
/// `Conditions` so it travels alongside the strategy here.
#[derive(Debug, Clone)]
pub struct StrategyUpsert {
    pub strategy: Strategy,
    pub key_id: String,
}

#[derive(Debug, Clone)]
pub enum StrategyChangeEvent {
    Upserted(StrategyUpsert),
    Disabled(StrategyId),
}

/// An externally-observed position update (spec §4.4.3).
#[derive(Debug, Clone)]
pub struct PositionEvent {
    pub account_id: String,
    pub pair: Pair,
    pub exchange: ExchangeId,
    pub market_type: MarketType,
    pub amount: Decimal,
}

struct RunningStrategy {
    order: Arc<SmartOrder>,
    run_handle: JoinHandle<()>,
    lease_handle: JoinHandle<()>,
}

pub struct Supervisor {
    registry: DashMap<StrategyId, RunningStrategy>,
    market_feed: Arc<MarketFeed>,
    bridge: Arc<OrderBridge>,
    trading: Arc<dyn TradingPort>,
    store: Arc<dyn StateStorePort>,
    lock: Arc<dyn DistributedLockPort>,
    statsd: Arc<dyn StatsdPort>,
    pair_filter: PairFilter,
    /// `LOCAL=true` restricts intake to a single account (spec §4.4, §6.4).
    account_id: Option<String>,
    full: AtomicBool,
}

impl Supervisor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        market_feed: Arc<MarketFeed>,
        bridge: Arc<OrderBridge>,
        trading: Arc<dyn TradingPort>,
        store: Arc<dyn StateStorePort>,
        lock: Arc<dyn DistributedLockPort>,
        statsd: Arc<dyn StatsdPort>,
        pair_filter: PairFilter,
        account_id: Option<String>,
    ) -> Self {
        Self {
            registry: DashMap::new(),
            market_feed,
            bridge,
            trading,
            store,
            lock,
            statsd,
            pair_filter,
            account_id,
            full: AtomicBool::new(false),
        }
    }

    pub fn is_full(&self) -> bool {
        self.full.load(Ordering::Relaxed)
    }

    pub fn active_count(&self) -> usize {
        self.registry.len()
    }

    fn admitted(&self, strategy: &Strategy) -> bool {
        if let Some(account_id) = &self.account_id {
            if &strategy.account_id != account_id {
                return false;
            }
        }
        self.pair_filter.matches(&strategy.conditions.pair)
    }

    /// `checkIfShouldCancelIfAnyActive`'s `any_active_strats` lookup, exposed
    /// for `SmartOrder::on_start`'s `cancel_if_any_active` guard. Delegates to
    /// the state store (authoritative across process instances) rather than
    /// the in-process registry, which only reflects what this instance runs.
    pub async fn any_active_strategies(&self, excluding: &StrategyId, pair: &Pair) -> bool {
        self.store
            .any_active_strategies(excluding, pair)
            .await
            .unwrap_or(false)
    }

    /// §4.4.1: on process start, read all enabled strategies matching this
    /// instance's pair/account filter and try to start each. Lease failures
    /// (already held elsewhere, or unreachable) are skipped, not retried
    /// beyond `acquire_lease`'s bounded attempts.
    pub async fn initial_intake(self: &Arc<Self>, strategies: Vec<StrategyUpsert>) {
        for upsert in strategies {
            if !upsert.strategy.enabled {
                continue;
            }
            if !self.admitted(&upsert.strategy) {
                continue;
            }
            self.try_start(upsert).await;
        }
    }

    /// §4.4.2: drains the strategy-change-stream channel for the
    /// supervisor's lifetime.
    ///
    /// The original's field-level `EditConditions` diff (cancel+re-place only
    /// what changed: entry, SL, TP ladder, trailing activation) is collapsed
    /// here to a stop-then-respawn of the whole machine against the new
    /// `Conditions` — every placement path the diff would selectively re-run
    /// is already idempotent per `PlaceOrderStep` key, so a wholesale restart
    /// produces the same resting orders without a second diffing engine (see
    /// DESIGN.md).
    pub async fn run_change_stream_intake(self: Arc<Self>, mut rx: mpsc::Receiver<StrategyChangeEvent>) {
        while let Some(event) = rx.recv().await {
            match event {
                StrategyChangeEvent::Disabled(id) => self.evict(&id).await,
                StrategyChangeEvent::Upserted(upsert) => self.handle_upsert(upsert).await,
            }
        }
    }

    async fn handle_upsert(self: &Arc<Self>, upsert: StrategyUpsert) {
        let id = upsert.strategy.id.clone();
        if !upsert.strategy.enabled {
            self.evict(&id).await;
            return;
        }
        if !self.admitted(&upsert.strategy) {
            return;
        }

        let already_running = self.registry.contains_key(&id);
        if !already_running && self.is_full() {
            info!(strategy = %id, "admission control full, ignoring new strategy");
            return;
        }
        if already_running {
            info!(strategy = %id, "conditions changed, restarting with new conditions");
            self.evict(&id).await;
        }
        self.try_start(upsert).await;
    }

    /// §4.4.3: disables a strategy whose watched position was externally
    /// closed, provided it opted in via `conditions.position_was_closed`.
    pub async fn run_position_close_intake(self: Arc<Self>, mut rx: mpsc::Receiver<PositionEvent>) {
        while let Some(event) = rx.recv().await {
            if !event.amount.is_zero() {
                continue;
            }
            for entry in self.registry.iter() {
                let order = &entry.value().order;
                if order.account_id != event.account_id
                    || order.pair != event.pair
                    || order.exchange != event.exchange
                    || order.market_type != event.market_type
                {
                    continue;
                }
                if order.conditions.position_was_closed {
                    if let Err(err) = self.store.disable_strategy(&order.id).await {
                        warn!(strategy = %order.id, %err, "failed to disable strategy after external position close");
                    }
                }
            }
        }
    }

    /// §4.4.4: 1 s resource sampler backing the `full` admission flag, with
    /// hysteresis between the set and clear thresholds (`risk::admission`).
    pub async fn run_admission_control(self: Arc<Self>) {
        let mut sampler = ResourceSampler::new();
        let mut ticker = tokio::time::interval(ADMISSION_SAMPLE_INTERVAL);
        loop {
            ticker.tick().await;
            let sample = sampler.sample();
            let was_full = self.is_full();
            let now_full = next_full_state(sample, was_full);
            self.full.store(now_full, Ordering::Relaxed);
            if now_full != was_full {
                info!(
                    full = now_full,
                    load5 = sample.scaled_load5,
                    free_mem_bytes = sample.free_mem_bytes,
                    "admission control state changed"
                );
            }
        }
    }

    /// `runReporting`: periodic gauge emission, same 1 s cadence as
    /// admission-control sampling.
    pub async fn run_reporting(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(REPORT_INTERVAL);
        loop {
            ticker.tick().await;
            self.statsd
                .gauge("smarttrade.active_strategies", self.active_count() as f64);
            self.statsd
                .gauge("smarttrade.full", if self.is_full() { 1.0 } else { 0.0 });
        }
    }

    async fn try_start(self: &Arc<Self>, upsert: StrategyUpsert) {
        let StrategyUpsert { strategy, key_id } = upsert;
        let id = strategy.id.clone();
        if self.registry.contains_key(&id) {
            return;
        }

        let lease_key = strategy.lease_key();
        let Some(lease) = self.acquire_lease(&lease_key).await else {
            info!(strategy = %id, "lease unavailable, skipping");
            return;
        };

        let precision = match self
            .store
            .get_market_precision(&strategy.conditions.pair, strategy.conditions.market_type)
            .await
        {
            Ok(precision) => precision,
            Err(err) => {
                warn!(strategy = %id, %err, "precision lookup failed, skipping");
                lease.release().await;
                return;
            }
        };

        self.spawn(strategy, key_id, lease, precision);
    }

    /// Bounded-retry lease acquisition (spec: "2 acquire attempts with 1 s
    /// delay"). Returns `None` on exhausted attempts — the caller skips this
    /// strategy for this intake pass rather than blocking on it.
    async fn acquire_lease(&self, key: &str) -> Option<Arc<dyn Lease>> {
        for attempt in 1..=LEASE_ACQUIRE_ATTEMPTS {
            match self.lock.acquire(key, LEASE_TTL).await {
                Ok(lease) => return Some(Arc::from(lease)),
                Err(err) => {
                    warn!(key, attempt, %err, "lease acquisition failed");
                    if attempt < LEASE_ACQUIRE_ATTEMPTS {
                        tokio::time::sleep(LEASE_ACQUIRE_DELAY).await;
                    }
                }
            }
        }
        None
    }

    fn spawn(self: &Arc<Self>, strategy: Strategy, key_id: String, lease: Arc<dyn Lease>, precision: Precision) {
        let id = strategy.id.clone();
        let order = Arc::new(SmartOrder::new(
            strategy,
            key_id,
            self.market_feed.clone(),
            self.bridge.clone(),
            self.trading.clone(),
            self.store.clone(),
            self.statsd.clone(),
            lease.clone(),
            precision,
        ));

        let run_handle = tokio::spawn(order.clone().run());
        let lease_handle = tokio::spawn(
            Self::extend_lease_loop(id.clone(), lease)
                .instrument(tracing::debug_span!(target: "smarttrade_core", "lease_extend", strategy = %id)),
        );

        info!(strategy = %id, "strategy admitted and started");
        self.registry.insert(
            id,
            RunningStrategy {
                order,
                run_handle,
                lease_handle,
            },
        );
    }

    /// §4.4.5: extends the lease every 3 s (TTL 10 s) until it's invalidated
    /// or extension itself fails; the state-machine loop independently
    /// detects the lost lease within its own 2 s validity check and stops
    /// placing orders.
    async fn extend_lease_loop(id: StrategyId, lease: Arc<dyn Lease>) {
        let mut ticker = tokio::time::interval(LEASE_EXTEND_INTERVAL);
        loop {
            ticker.tick().await;
            if !lease.is_valid().await {
                info!(strategy = %id, "lease no longer valid, stopping extender");
                break;
            }
            if let Err(err) = lease.extend(LEASE_TTL).await {
                warn!(strategy = %id, %err, "lease extension failed, stopping extender");
                break;
            }
        }
    }

    async fn evict(&self, id: &StrategyId) {
        let Some((_, running)) = self.registry.remove(id) else {
            return;
        };
        running.lease_handle.abort();
        running.order.stop().await;
        let _ = running.run_handle.await;
        running.order.lease.release().await;
        info!(strategy = %id, "strategy evicted");
    }

    /// Stops every running strategy, cancelling resting orders and releasing
    /// leases. Called on process shutdown.
    pub async fn stop_all(&self) {
        let ids: Vec<StrategyId> = self.registry.iter().map(|entry| entry.key().clone()).collect();
        for id in ids {
            self.evict(&id).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_filter_bitcoin_matches_btc_prefix() {
        assert!(PairFilter::Bitcoin.matches(&Pair::new("BTC_USDT")));
        assert!(!PairFilter::Bitcoin.matches(&Pair::new("ETH_USDT")));
    }

    #[test]
    fn pair_filter_altcoins_excludes_btc_prefix() {
        assert!(!PairFilter::Altcoins.matches(&Pair::new("BTC_USDT")));
        assert!(PairFilter::Altcoins.matches(&Pair::new("ETH_USDT")));
    }

    #[test]
    fn pair_filter_exact_matches_only_that_pair() {
        let filter = PairFilter::Exact(Pair::new("ADA_USDT"));
        assert!(filter.matches(&Pair::new("ADA_USDT")));
        assert!(!filter.matches(&Pair::new("BTC_USDT")));
    }

    #[test]
    fn pair_filter_all_matches_everything() {
        assert!(PairFilter::All.matches(&Pair::new("ADA_USDT")));
    }
}
