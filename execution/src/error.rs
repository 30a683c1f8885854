//! Errors surfaced at the trading-port boundary.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ExecutionError {
    /// The gateway returned `{status: "ERR", ...}` with this message.
    #[error("gateway rejected request: {0}")]
    Rejected(String),

    /// The underlying transport (HTTP/websocket) call failed before a gateway
    /// response was received at all.
    #[error("transport failure: {0}")]
    Transport(String),
}
