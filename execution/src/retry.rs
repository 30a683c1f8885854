//! Retry policy for `create_order` failures, keyed on literal substrings in the
//! gateway's error message — ported directly from the original `PlaceOrder` retry
//! table. The substrings and delays below are load-bearing, not illustrative.

use std::time::Duration;

/// What `PlaceOrder` should do next, given a failed `create_order` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAction {
    /// Retry the same request after the given delay, up to `max_attempts` total tries.
    Retry { delay: Duration, max_attempts: u32 },
    /// Downgrade a trailing-entry stop order to a market order and retry once.
    DowngradeToMarketAndRetry,
    /// Recompute price from the last executed target (entry-ladder SL/forced-loss case).
    RecomputeFromLastTargetAndRetry,
    /// Abandon this placement; transition the state machine to `Canceled`.
    Cancel,
    /// Disable the strategy (`enabled = false`) without changing state.
    DisableStrategy,
    /// Disable the strategy and transition to `Error` with the message.
    DisableAndError,
    /// Retry forever with a fixed backoff — used only for network-level failures,
    /// not gateway-rejection responses. An accepted design risk (see DESIGN.md).
    RetryForever { delay: Duration },
}

/// Whether the failing request came from a trailing-entry order, and whether it is
/// an SL/forced-loss placement for a strategy with an active entry ladder — both
/// change how the "immediately trigger" substring is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceOrderContext {
    pub is_trailing_entry: bool,
    pub is_stop_or_forced_loss_with_entry_ladder: bool,
}

/// Decides the retry action for a rejected `create_order` call, based on the literal
/// error text. Returns `None` for an empty/absent message (nothing to act on).
pub fn classify(error_text: &str, ctx: PlaceOrderContext) -> Option<RetryAction> {
    if error_text.is_empty() {
        return None;
    }

    if error_text.contains("Key is processing") {
        return Some(RetryAction::Retry {
            delay: Duration::from_secs(60),
            max_attempts: 1,
        });
    }

    if error_text.contains("position side does not match") {
        return Some(RetryAction::Retry {
            delay: Duration::from_secs(5),
            max_attempts: 3,
        });
    }

    if error_text.contains("invalid json") {
        return Some(RetryAction::Retry {
            delay: Duration::from_secs(2),
            max_attempts: 3,
        });
    }

    if error_text.contains("ReduceOnly Order Failed") || error_text.contains("Cannot read property") {
        return Some(RetryAction::Retry {
            delay: Duration::from_secs(5),
            max_attempts: 3,
        });
    }

    if error_text.contains("immediately trigger") {
        return Some(if ctx.is_trailing_entry {
            RetryAction::DowngradeToMarketAndRetry
        } else if ctx.is_stop_or_forced_loss_with_entry_ladder {
            RetryAction::RecomputeFromLastTargetAndRetry
        } else {
            RetryAction::Cancel
        });
    }

    if error_text.contains("ReduceOnly Order is rejected") {
        return Some(RetryAction::DisableStrategy);
    }

    Some(RetryAction::DisableAndError)
}

/// Network-level (transport, not gateway-rejection) failure retry policy.
pub fn network_failure_action() -> RetryAction {
    RetryAction::RetryForever {
        delay: Duration::from_secs(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEUTRAL: PlaceOrderContext = PlaceOrderContext {
        is_trailing_entry: false,
        is_stop_or_forced_loss_with_entry_ladder: false,
    };

    #[test]
    fn key_is_processing_retries_once_after_60s() {
        assert_eq!(
            classify("Key is processing", NEUTRAL),
            Some(RetryAction::Retry { delay: Duration::from_secs(60), max_attempts: 1 })
        );
    }

    #[test]
    fn immediately_trigger_on_trailing_entry_downgrades_to_market() {
        let ctx = PlaceOrderContext { is_trailing_entry: true, ..NEUTRAL };
        assert_eq!(
            classify("order would immediately trigger", ctx),
            Some(RetryAction::DowngradeToMarketAndRetry)
        );
    }

    #[test]
    fn immediately_trigger_on_entry_ladder_sl_recomputes_from_last_target() {
        let ctx = PlaceOrderContext {
            is_stop_or_forced_loss_with_entry_ladder: true,
            ..NEUTRAL
        };
        assert_eq!(
            classify("order would immediately trigger", ctx),
            Some(RetryAction::RecomputeFromLastTargetAndRetry)
        );
    }

    #[test]
    fn immediately_trigger_otherwise_cancels() {
        assert_eq!(
            classify("order would immediately trigger", NEUTRAL),
            Some(RetryAction::Cancel)
        );
    }

    #[test]
    fn reduce_only_rejected_disables_strategy() {
        assert_eq!(
            classify("ReduceOnly Order is rejected", NEUTRAL),
            Some(RetryAction::DisableStrategy)
        );
    }

    #[test]
    fn unrecognized_error_disables_and_errors() {
        assert_eq!(
            classify("some unexpected gateway error", NEUTRAL),
            Some(RetryAction::DisableAndError)
        );
    }

    #[test]
    fn empty_message_is_not_an_error() {
        assert_eq!(classify("", NEUTRAL), None);
    }
}
