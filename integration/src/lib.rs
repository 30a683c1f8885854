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

//! # Integration
//!
//! Small, dependency-light utilities shared by every other crate in the
//! smart-trade workspace: the [`Validator`]/[`Unrecoverable`]/[`Terminal`]
//! marker traits and the [`snapshot::Snapshot`] timed-value wrapper. The
//! teacher's low-level websocket/REST integration framework (subscription
//! ids, stream parsers, exchange protocol glue) has no counterpart in this
//! engine — market-data ingest and order transport are out of scope (see
//! `DESIGN.md`) — so only the handful of generic traits those crates
//! actually consume survive here.

use serde::{Deserialize, Serialize};

pub mod error;
pub mod snapshot;

pub use error::IntegrationError;
pub use snapshot::Snapshot;

/// [`Validator`]s are capable of determining if their internal state is
/// satisfactory to fulfill some use case defined by the implementor.
pub trait Validator {
    fn validate(self) -> Result<Self, IntegrationError>
    where
        Self: Sized;
}

/// Determines if something is considered "unrecoverable", such as an
/// unrecoverable error. The meaning of [`Unrecoverable`] varies by context.
pub trait Unrecoverable {
    fn is_unrecoverable(&self) -> bool;
}

/// Communicates if something is terminal (eg/ requires shutdown or restart).
pub trait Terminal {
    fn is_terminal(&self) -> bool;
}

/// Indicates an iterator or stream has ended.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize, Serialize,
)]
pub struct FeedEnded;
