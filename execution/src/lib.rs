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

//! # Execution
//!
//! The trading-port contract (Component B's far side) and the order-lifecycle
//! bridge that dispatches exactly-once terminal order callbacks back to whichever
//! state machine placed the order.
//!
//! Exchange gateway internals are out of scope: this crate models the boundary
//! ([`port::TradingPort`]) and ships a [`mock::MockTradingPort`] for tests and
//! local runs.

pub mod bridge;
pub mod error;
pub mod mock;
pub mod order;
pub mod port;
pub mod retry;

pub use bridge::OrderBridge;
pub use error::ExecutionError;
pub use port::TradingPort;
