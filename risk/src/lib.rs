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

//! # Risk
//!
//! Generic risk-check primitives ([`check::RiskCheck`]) and the admission-control
//! resource sampler the runtime supervisor polls to gate intake of new strategies
//! under load or memory pressure.

pub mod admission;
pub mod check;

pub use admission::{next_full_state, ResourceSample, ResourceSampler};
pub use check::{CheckHigherThan, RiskCheck};
