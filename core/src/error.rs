//! # Core error types
//!
//! Aggregates the fallible outcomes of the smart-order state machine and the
//! runtime supervisor into one `thiserror` enum. Guards and entry actions
//! never propagate a `Result` to the transition dispatcher: internal
//! fallibility is caught here and translated into a `tracing::error!` log or
//! a terminal state transition, never a panic.

use smarttrade_execution::ExecutionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("state store error: {0}")]
    StateStore(String),

    #[error("distributed lock error: {0}")]
    Lock(String),

    #[error("statsd error: {0}")]
    Statsd(String),

    #[error("precision lookup failed for {0}")]
    PrecisionUnavailable(String),

    #[error("strategy {0} not found")]
    StrategyNotFound(String),

    #[error("join error: {0}")]
    JoinError(String),

    #[error("channel receiver dropped: {0}")]
    RxDropped(String),
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for EngineError {
    fn from(value: tokio::sync::mpsc::error::SendError<T>) -> Self {
        Self::RxDropped(value.to_string())
    }
}

impl From<tokio::task::JoinError> for EngineError {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::JoinError(value.to_string())
    }
}
