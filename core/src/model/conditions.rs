use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smarttrade_markets::{ExchangeId, MarketType, Pair, Side};

use super::entry_point::{EntryLevel, EntryPoint, PriceLevel};
use super::strategy::StrategyId;

/// How a stop-loss order is sent to the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopLossType {
    Market,
    Limit,
}

/// One rung of the take-profit ladder. `Trailing` levels arm once price
/// moves `deviation_percent` in the strategy's favor past the prior target,
/// then fire on the first retrace (see `engine::smart_order::trailing`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum ExitLevel {
    Fixed {
        price: PriceLevel,
        amount_percent: Decimal,
    },
    Trailing {
        deviation_percent: Decimal,
        amount_percent: Decimal,
    },
}

impl ExitLevel {
    pub fn amount_percent(&self) -> Decimal {
        match self {
            ExitLevel::Fixed { amount_percent, .. } => *amount_percent,
            ExitLevel::Trailing { amount_percent, .. } => *amount_percent,
        }
    }
}

/// Immutable configuration for one smart-order strategy, as loaded from the
/// state store at strategy intake. Conditions never change once a strategy
/// is running (a new `Conditions` means a new strategy id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conditions {
    pub pair: Pair,
    pub market_type: MarketType,
    pub exchange: ExchangeId,
    pub leverage: Decimal,

    pub entry: EntryPoint,
    pub entry_levels: Vec<EntryLevel>,

    pub exit_levels: Vec<ExitLevel>,
    pub take_profit_price: Option<Decimal>,

    pub stop_loss: bool,
    pub stop_loss_type: StopLossType,
    /// Percent-based stop-loss target (spec.md §3.2 `stop_loss`), resolved
    /// against the entry price once it is known (`StrategyState::stop_loss_target`).
    pub stop_loss_percent: Option<Decimal>,
    /// Absolute override that takes precedence over `stop_loss_percent` when set.
    pub stop_loss_price: Option<Decimal>,
    /// The stop-loss is driven externally (e.g. a TradingView alert) rather
    /// than computed here; the core still tracks `stop_loss_target` but never
    /// arms a resting order for it.
    pub stop_loss_external: bool,

    pub forced_loss: bool,
    /// A second, mandatory stop-loss even when `forced_loss` itself would
    /// otherwise be optional (`mandatoryForcedLoss` in the original).
    pub mandatory_forced_loss: bool,
    pub forced_loss_percent: Option<Decimal>,
    pub forced_loss_price: Option<Decimal>,

    pub trailing_exit: bool,
    pub trailing_exit_price: Option<Decimal>,
    pub trailing_exit_deviation: Decimal,
    pub take_profit_external: bool,

    /// Poll the bid/ask spread instead of OHLCV while waiting to enter.
    pub entry_spread_hunter: bool,
    /// Poll the spread instead of OHLCV once in position, for take-profit checks.
    pub take_profit_spread_hunter: bool,
    pub without_loss: bool,
    /// Fee multiple (× leverage) past which a break-even order switches from
    /// a plain stop to a `TakeProfitLimit` (spec.md §4.3.4 "Break-even").
    pub without_loss_after_profit: Option<Decimal>,

    pub hedge: bool,
    pub hedge_mode: bool,
    /// Id of the twin opposite-side strategy this one hedges into, if any.
    pub hedge_strategy_id: Option<StrategyId>,
    pub hedge_key_id: Option<String>,
    pub hedge_loss_deviation: Option<Decimal>,
    pub take_profit_hedge_price: Option<Decimal>,

    /// Seconds the strategy will wait in `WaitForEntry` before cancelling
    /// the resting entry order (`checkTimeouts`'s waiting-entry goroutine).
    pub waiting_entry_timeout_secs: Option<u64>,
    /// Seconds between successive nudges of a trailing entry's activation
    /// price toward the market while still unfilled.
    pub activation_move_timeout_secs: Option<u64>,
    pub activation_move_step: Option<Decimal>,
    /// Place a timeout-driven stop-loss if the position stays adverse this
    /// long without otherwise reaching `stop_loss`/`forced_loss`.
    pub timeout_when_loss_secs: Option<u64>,
    /// Once in `Stoploss`, fire a limit SL at the last known price after this
    /// long if the position hasn't recovered back to `InEntry`.
    pub timeout_loss_secs: Option<u64>,
    /// Close the strategy after this long if it has been profitable the
    /// whole time (a soft "take the win" timeout).
    pub timeout_if_profitable_secs: Option<u64>,

    /// On first take-profit fill, cancel the remaining ladder and end.
    pub close_strategy_after_first_tap: bool,
    /// After a take-profit tap, re-arm the entry order for a fresh cycle
    /// instead of ending.
    pub place_entry_after_tap: bool,
    /// Refuse to place the entry at all if another enabled strategy already
    /// targets the same pair (`checkIfShouldCancelIfAnyActive`).
    pub cancel_if_any_active: bool,
    /// Re-enter `WaitForEntry` after reaching a terminal `Timeout`.
    pub continue_if_ended: bool,
    /// Skip `on_start`'s cold-start instant-entry placement even when it
    /// would otherwise qualify (single-entry, non-trailing, non-spread-hunter).
    pub skip_initial_setup: bool,
    /// An externally-closed position (observed via the position-update
    /// watcher) disables this strategy instead of being treated as a bug.
    pub position_was_closed: bool,
}

impl Conditions {
    pub fn opposite_side(&self) -> Side {
        self.entry.side.opposite()
    }
}
