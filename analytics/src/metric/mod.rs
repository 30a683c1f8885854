//! Reporting-level metrics computed from closed trades.
//!
//! These are post-hoc statistics over a strategy's history, distinct from the
//! [`crate::pnl`] formulas the state machine evaluates inline on every fill.

pub mod profit_factor;
pub mod win_rate;

pub use profit_factor::ProfitFactor;
pub use win_rate::WinRate;
