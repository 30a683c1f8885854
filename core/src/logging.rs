//! # Logging configuration
//!
//! Structured logging for the smart-trade engine, with a filter to suppress the
//! high-frequency lease-extension span so it doesn't flood output at `INFO`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use smarttrade_core::logging::init_logging;
//!
//! fn main() {
//!     init_logging();
//!     tracing::info!("smart-trade engine started");
//! }
//! ```
//!
//! ### Environment configuration
//! ```bash
//! export RUST_LOG=info
//! export RUST_LOG=smarttrade_core=debug,smarttrade_execution=warn
//! ```

use crate::engine::supervisor::LEASE_EXTEND_SPAN_NAME;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initializes human-readable logging, defaulting to `INFO` when `RUST_LOG` is unset.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(LeaseExtendSpanFilter)
        .init()
}

/// Initializes JSON logging for log aggregators.
pub fn init_json_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
        .with(LeaseExtendSpanFilter)
        .init()
}

struct LeaseExtendSpanFilter;

impl<S> tracing_subscriber::layer::Layer<S> for LeaseExtendSpanFilter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fn event_enabled(
        &self,
        _: &tracing::Event<'_>,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) -> bool {
        if let Some(span) = ctx.lookup_current() {
            span.name() != LEASE_EXTEND_SPAN_NAME
        } else {
            true
        }
    }
}
