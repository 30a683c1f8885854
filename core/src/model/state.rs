use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smarttrade_execution::order::OrderId;

/// The canonical machine state of a running strategy. There is exactly one
/// `State` at rest between ticks — `EnterNextTarget` in the original is an
/// internal dispatch detail of `exit()`, not a persisted state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum State {
    WaitForEntry,
    TrailingEntry,
    /// The averaging ladder has been placed and is still filling
    /// (`enterMultiEntry`'s own restricted permit set in the original).
    /// Re-entrant: every further ladder-level fill re-arms the exit orders
    /// against the new average and stays in this state until the last level
    /// fills, at which point the machine moves on to `InEntry`.
    InMultiEntry,
    InEntry,
    TakeProfit,
    StopLoss,
    ForcedLoss,
    WithoutLoss,
    HedgeLoss,
    WaitLossHedge,
    /// A configured timeout fired while no terminal condition was otherwise
    /// reached (`waiting_entry_timeout`, `timeout_loss`). Terminal unless
    /// `continue_if_ended` restarts the machine from `WaitForEntry`.
    Timeout,
    Canceled,
    End,
    /// An unrecoverable gateway rejection (`RetryAction::DisableAndError`).
    /// The strategy is disabled; `StrategyState::error_message` carries the
    /// gateway's message.
    Error,
}

impl State {
    /// The Start loop exits once any of these is reached (spec.md §4.3.1).
    pub fn is_terminal(self) -> bool {
        matches!(self, State::End | State::Canceled | State::Timeout | State::Error)
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            State::WaitForEntry => "wait_for_entry",
            State::TrailingEntry => "trailing_entry",
            State::InMultiEntry => "in_multi_entry",
            State::InEntry => "in_entry",
            State::TakeProfit => "take_profit",
            State::StopLoss => "stop_loss",
            State::ForcedLoss => "forced_loss",
            State::WithoutLoss => "without_loss",
            State::HedgeLoss => "hedge_loss",
            State::WaitLossHedge => "wait_loss_hedge",
            State::Timeout => "timeout",
            State::Canceled => "canceled",
            State::End => "end",
            State::Error => "error",
        };
        write!(f, "{label}")
    }
}

/// The mutable, persisted half of a strategy: everything the state machine
/// reads and writes as it advances. Rebuilt from the state store on
/// supervisor restart so a crash never loses more than the in-flight tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyState {
    pub state: State,

    pub entry_price: Option<Decimal>,
    /// Entry price captured once, before any averaging fills move it —
    /// the "immediately trigger" stop-loss recompute uses this, not the
    /// live average, matching the original's behavior.
    pub saved_entry_price: Option<Decimal>,
    pub exit_price: Option<Decimal>,
    pub hedge_exit_price: Option<Decimal>,

    pub trailing_entry_price: Option<Decimal>,
    pub trailing_exit_prices: Vec<Decimal>,
    pub trailing_hedge_exit_price: Option<Decimal>,

    pub executed_amount: Decimal,
    pub position_amount: Decimal,
    pub commission: Decimal,
    pub reached_target_count: u32,

    /// How many rungs of the averaging ladder (`Conditions.entry_levels`)
    /// have filled so far. The original's `SelectedEntryTarget`; used to
    /// decide whether `InMultiEntry` is done (the last rung filled, move on
    /// to `InEntry`) and by `averaging::last_target_price`'s ladder walk.
    pub filled_entry_level_count: u32,

    /// Sum of `price * filled` across every entry-side fill, used to derive
    /// the volume-weighted `entry_price` as averaging levels fill
    /// (`enterMultiEntry`'s running-average recompute).
    pub entry_notional: Decimal,

    /// Resolved absolute stop-loss / forced-loss price, computed once from
    /// `Conditions.stop_loss_percent`/`stop_loss_price` the moment the entry
    /// fills (entry price is needed to resolve a percent-based target).
    pub stop_loss_target: Option<Decimal>,
    pub forced_loss_target: Option<Decimal>,

    /// Accumulated realized PnL, see `analytics::pnl`.
    pub received_profit_amount: Decimal,
    pub received_profit_percentage: Decimal,

    /// Set on an unrecoverable gateway rejection; see [`State::Error`].
    pub error_message: Option<String>,

    /// Generation token bumped on every tick that changes the timeout
    /// deadlines below; a scheduled task compares its captured value against
    /// the current one before acting, so a stale timer is a no-op.
    pub iteration: u64,

    pub amount: Decimal,

    pub entry_order_id: Option<OrderId>,
    pub entry_level_order_ids: Vec<OrderId>,
    pub take_profit_order_ids: Vec<OrderId>,
    pub stop_order_id: Option<OrderId>,
    pub forced_loss_order_id: Option<OrderId>,
    pub without_loss_order_id: Option<OrderId>,
    pub hedge_order_id: Option<OrderId>,

    pub waiting_entry_deadline: Option<DateTime<Utc>>,
    pub activation_move_deadline: Option<DateTime<Utc>>,
    pub profitable_at: Option<DateTime<Utc>>,
    pub lossable_at: Option<DateTime<Utc>>,
    pub stop_loss_at: Option<DateTime<Utc>>,

    /// Set once a maker-only strategy settles its first resting order; kept
    /// here because the supervisor's admission logic reads it even though
    /// maker-only execution itself is out of scope.
    pub cold_start: bool,
}

impl StrategyState {
    pub fn fresh(amount: Decimal) -> Self {
        Self {
            state: State::WaitForEntry,
            entry_price: None,
            saved_entry_price: None,
            exit_price: None,
            hedge_exit_price: None,
            trailing_entry_price: None,
            trailing_exit_prices: Vec::new(),
            trailing_hedge_exit_price: None,
            executed_amount: Decimal::ZERO,
            position_amount: Decimal::ZERO,
            commission: Decimal::ZERO,
            reached_target_count: 0,
            filled_entry_level_count: 0,
            entry_notional: Decimal::ZERO,
            stop_loss_target: None,
            forced_loss_target: None,
            received_profit_amount: Decimal::ZERO,
            received_profit_percentage: Decimal::ZERO,
            error_message: None,
            iteration: 0,
            amount,
            entry_order_id: None,
            entry_level_order_ids: Vec::new(),
            take_profit_order_ids: Vec::new(),
            stop_order_id: None,
            forced_loss_order_id: None,
            without_loss_order_id: None,
            hedge_order_id: None,
            waiting_entry_deadline: None,
            activation_move_deadline: None,
            profitable_at: None,
            lossable_at: None,
            stop_loss_at: None,
            cold_start: false,
        }
    }

    pub fn next_iteration(&mut self) -> u64 {
        self.iteration += 1;
        self.iteration
    }

    pub fn is_current_iteration(&self, captured: u64) -> bool {
        captured == self.iteration
    }
}
