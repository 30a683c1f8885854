//! Data model shared by the smart-order state machine and the supervisor:
//! a [`Strategy`] pairs immutable [`Conditions`] with the mutable
//! [`StrategyState`] that the state machine advances tick by tick.

mod conditions;
mod entry_point;
mod state;
mod strategy;
mod tick;

pub use conditions::{Conditions, ExitLevel, StopLossType};
pub use entry_point::{ActivationMode, EntryLevel, EntryPoint, PriceLevel};
pub use state::{State, StrategyState};
pub use strategy::{Strategy, StrategyId, StrategyType};
pub use tick::Tick;
