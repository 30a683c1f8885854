#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    unused_crate_dependencies,
    unused_extern_crates,
    clippy::unused_self,
    clippy::useless_let_if_seq,
    missing_debug_implementations,
    rust_2018_idioms
)]
#![allow(clippy::type_complexity, clippy::too_many_arguments)]

//! # Core
//!
//! The smart-order state machine ([`engine::smart_order`]) and the runtime
//! supervisor ([`engine::supervisor`]) that instantiates one per active
//! strategy: the data model ([`model`]), the external collaborator traits it
//! depends on ([`port`]), and the money/percentage rounding primitives
//! ([`precision`]) shared by both.
//!
//! The persistent strategy/order store, its change-stream watcher, the
//! exchange gateway and the HTTP admin surface are external collaborators
//! modeled only as trait objects here — their implementations live in the
//! `smarttrade` binary crate (or a real deployment's infrastructure).

/// The smart-order state machine and the runtime supervisor.
pub mod engine;

/// Aggregated fallible outcomes of the engine.
pub mod error;

/// Human-readable and JSON logging initialisers.
pub mod logging;

/// Shared data model: `Strategy`, `Conditions`, `EntryPoint`, `StrategyState`, `Tick`.
pub mod model;

/// External collaborator traits: persistence, distributed locking, metrics.
pub mod port;

/// Decimal rounding primitives shared by the smart-order state machine.
pub mod precision;

/// Graceful-shutdown signal shared with the `smarttrade` binary.
pub mod shutdown;
