//! Runtime entry point: wires the [`smarttrade_core::engine::supervisor::Supervisor`]
//! to its external collaborators and runs until a shutdown signal arrives.
//!
//! Market data ingest, the exchange gateway, the strategy-change-stream
//! watcher and the position-close watcher are all external collaborators out
//! of scope for this engine (spec.md §1); this binary only demonstrates the
//! wiring a real deployment would plug its own implementations of those into.

mod config;
mod demo;
mod memory;
mod statsd;

use std::sync::Arc;

use tokio::sync::mpsc;

use smarttrade_core::engine::supervisor::Supervisor;
use smarttrade_core::logging::init_logging;
use smarttrade_execution::bridge::OrderBridge;
use smarttrade_execution::mock::MockTradingPort;
use smarttrade_markets::feed::MarketFeed;

use crate::config::EnvConfig;
use crate::memory::{InMemoryLock, InMemoryStore};
use crate::statsd::UdpStatsdPort;

/// Channel depth for the change-stream and position-close intake queues;
/// large enough to absorb a burst of upserts without the watcher blocking.
const INTAKE_CHANNEL_CAPACITY: usize = 256;

#[tokio::main]
async fn main() {
    let config = EnvConfig::from_env();
    init_logging();

    tracing::info!(
        local = config.local,
        account_id = ?config.account_id,
        pair_filter = ?config.pair_filter,
        "smart-trade engine starting"
    );

    let market_feed = Arc::new(MarketFeed::new());
    let bridge = Arc::new(OrderBridge::new());
    let trading = Arc::new(MockTradingPort::new(bridge.clone()));
    let store = Arc::new(InMemoryStore::new());
    let lock = Arc::new(InMemoryLock::new());
    let statsd = Arc::new(UdpStatsdPort::connect(&config.statsd_host, config.statsd_port));

    let account_id = if config.local { config.account_id.clone() } else { None };

    let seeded = crate::demo::seed_demo_strategy(&store, &market_feed);

    let supervisor = Arc::new(Supervisor::new(
        market_feed,
        bridge,
        trading,
        store,
        lock,
        statsd,
        config.pair_filter,
        account_id,
    ));

    // A real deployment feeds these from its own strategy-change-stream and
    // position watchers; here the senders just keep the intake loops alive.
    let (_change_tx, change_rx) = mpsc::channel(INTAKE_CHANNEL_CAPACITY);
    let (_position_tx, position_rx) = mpsc::channel(INTAKE_CHANNEL_CAPACITY);

    supervisor.initial_intake(vec![seeded]).await;

    tokio::spawn(supervisor.clone().run_change_stream_intake(change_rx));
    tokio::spawn(supervisor.clone().run_position_close_intake(position_rx));
    tokio::spawn(supervisor.clone().run_admission_control());
    tokio::spawn(supervisor.clone().run_reporting());

    if tokio::signal::ctrl_c().await.is_err() {
        tracing::warn!("failed to install ctrl-c handler, shutting down immediately");
    }

    tracing::info!("shutdown signal received, stopping all strategies");
    supervisor.stop_all().await;
}
