//! Trailing entry and trailing take-profit: both track a best-seen price
//! extreme and fire on the first retrace past a configured deviation,
//! mirroring `trailingEntry` / `checkTrailingProfitTrade` in the original.

use rust_decimal::Decimal;

use crate::model::{ActivationMode, ExitLevel, State, Tick};
use smarttrade_markets::Side;

use super::SmartOrder;

fn side_sign(side: Side) -> Decimal {
    match side {
        Side::Buy => Decimal::ONE,
        Side::Sell => -Decimal::ONE,
    }
}

/// Whether `reference` extends the tracked extreme further in the favorable
/// direction: down when `favors_lower`, up otherwise. Callers set
/// `favors_lower` per what's being tracked (entry wants the dip on a long,
/// take-profit wants the peak on a long — opposite defaults).
fn extends_extreme(reference: Decimal, extreme: Decimal, favors_lower: bool) -> bool {
    if favors_lower {
        reference <= extreme
    } else {
        reference >= extreme
    }
}

impl SmartOrder {
    /// `enterTrailingEntry`: arms the trailing-entry tracker without placing
    /// any order yet. The first tick that clears `ActivationMode` starts
    /// tracking the best-seen price; `trailing_entry_tick` fires once price
    /// retraces `entry_deviation` percent from that extreme.
    pub(super) async fn enter_trailing_entry(&self) {
        {
            let mut state = self.state.lock();
            state.trailing_entry_price = None;
            state.activation_move_deadline = self
                .conditions
                .activation_move_timeout_secs
                .map(|secs| chrono::Utc::now() + chrono::Duration::seconds(secs as i64));
        }
        self.transition_to(State::TrailingEntry).await;
    }

    /// Called every tick while `WaitForEntry` (activation not yet armed) or
    /// `TrailingEntry` (armed, tracking the extreme).
    pub(super) async fn trailing_entry_tick(&self, tick: &Tick) {
        let entry = &self.conditions.entry;
        let armed = match entry.activation {
            ActivationMode::Disabled => return,
            ActivationMode::Immediate => true,
            ActivationMode::AtPrice(activation_price) => {
                let reference = tick.reference_price();
                (reference - activation_price) * side_sign(entry.side) >= Decimal::ZERO
            }
        };
        if !armed {
            return;
        }
        if self.current_state() == State::WaitForEntry {
            self.transition_to(State::TrailingEntry).await;
        }

        let reference = tick.reference_price();
        // A long entry wants to buy the dip (track the lowest seen price);
        // a short entry wants to sell the rally (track the highest).
        let favors_lower = entry.side == Side::Buy;

        let should_fire = {
            let mut state = self.state.lock();
            match state.trailing_entry_price {
                None => {
                    state.trailing_entry_price = Some(reference);
                    false
                }
                Some(extreme) if extends_extreme(reference, extreme, favors_lower) => {
                    state.trailing_entry_price = Some(reference);
                    false
                }
                Some(extreme) => {
                    if extreme.is_zero() {
                        false
                    } else {
                        let retrace_pct = ((reference - extreme) / extreme).abs() * Decimal::ONE_HUNDRED;
                        retrace_pct >= entry.entry_deviation
                    }
                }
            }
        };

        if should_fire {
            if !self.conditions.entry_levels.is_empty() {
                self.enter_multi_entry().await;
            } else {
                self.place_single_entry_order().await;
            }
        }
    }

    /// `hedgeLossTick`'s counterpart for a trailing hedge exit; shares the
    /// same extreme-tracking shape as the entry and take-profit trackers but
    /// against `trailing_hedge_exit_price`. Invoked from `hedge::hedge_loss_tick`.
    pub(super) fn trailing_hedge_exit_should_fire(&self, tick: &Tick, deviation: Decimal) -> bool {
        let side = self.conditions.entry.side.opposite();
        let reference = tick.reference_price();
        let favors_lower = side == Side::Sell;

        let mut state = self.state.lock();
        match state.trailing_hedge_exit_price {
            None => {
                state.trailing_hedge_exit_price = Some(reference);
                false
            }
            Some(extreme) if extends_extreme(reference, extreme, favors_lower) => {
                state.trailing_hedge_exit_price = Some(reference);
                false
            }
            Some(extreme) => {
                if extreme.is_zero() {
                    false
                } else {
                    let retrace_pct = ((reference - extreme) / extreme).abs() * Decimal::ONE_HUNDRED;
                    retrace_pct >= deviation
                }
            }
        }
    }
}

/// `checkTrailingLossTrade`: the stop-loss / forced-loss price is itself a
/// `Trailing`-style deviation rather than a fixed level. Not currently a
/// configurable shape in `Conditions` (stop/forced loss are always fixed
/// targets, see `exit::resolve_loss_targets`), so this is a no-op hook kept
/// for symmetry with `check_trailing_profit` and documented as such.
pub(super) async fn check_trailing_loss(_sm: &SmartOrder, _tick: &Tick) -> bool {
    false
}

/// `checkTrailingProfitTrade`: advances the extreme tracker for the next
/// unreached `ExitLevel::Trailing` level and fires the take-profit order on
/// the first retrace past `deviation_percent`.
pub(super) async fn check_trailing_profit(sm: &SmartOrder, tick: &Tick) -> bool {
    let next = sm.state.lock().reached_target_count as usize;
    let Some(ExitLevel::Trailing { deviation_percent, .. }) = sm.conditions.exit_levels.get(next).copied()
    else {
        return false;
    };

    let side = sm.conditions.entry.side;
    let reference = tick.reference_price();
    // A long position's take-profit favors the high (track the best-seen
    // peak, fire once price retraces down); a short favors the low.
    let favors_lower = side == Side::Sell;

    while sm.state.lock().trailing_exit_prices.len() <= next {
        sm.state.lock().trailing_exit_prices.push(reference);
    }

    let should_fire = {
        let mut state = sm.state.lock();
        let extreme = state.trailing_exit_prices[next];
        if extends_extreme(reference, extreme, favors_lower) {
            state.trailing_exit_prices[next] = reference;
            false
        } else if extreme.is_zero() {
            false
        } else {
            let retrace_pct = ((reference - extreme) / extreme).abs() * Decimal::ONE_HUNDRED;
            retrace_pct >= deviation_percent
        }
    };

    if should_fire {
        sm.enter_take_profit(next, reference).await;
    }
    should_fire
}
