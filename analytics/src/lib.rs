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

//! # Analytics
//!
//! PnL formulas evaluated inline by the state machine ([`pnl`]), plus reporting-level
//! metrics computed over a strategy's closed-trade history ([`metric`]).

pub mod metric;
pub mod pnl;

pub use metric::{ProfitFactor, WinRate};
pub use pnl::{profit_amount, profit_percentage, ReceivedProfit};
