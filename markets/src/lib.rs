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

//! # Markets
//!
//! Venue and instrument identifiers, and the market feed adapter: a concurrent
//! latest-value cache for OHLCV and spread data that upstream venue adapters
//! write into and the smart-order engine reads from non-blockingly.

pub mod exchange;
pub mod feed;
pub mod side;

pub use exchange::{ExchangeId, MarketType, Pair};
pub use feed::{MarketFeed, Ohlcv, Spread};
pub use side::Side;
