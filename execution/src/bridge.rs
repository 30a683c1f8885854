//! Order-lifecycle bridge (Component B): dispatches exactly-once terminal order
//! callbacks to whichever state machine placed the order.

use crate::order::{Order, OrderId, OrderStatus};
use dashmap::DashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{error, warn};

/// A subscriber callback, invoked at most once with the order's terminal snapshot.
pub type Subscriber = Box<dyn Fn(Order) + Send + Sync>;

/// Bridges upstream order updates (from the exchange gateway, out of scope here) to
/// the state machine that placed each order.
///
/// Callback dispatch is caught with `catch_unwind`: a panicking subscriber is logged
/// and does not poison delivery to any other order id.
#[derive(Default)]
pub struct OrderBridge {
    subscribers: DashMap<OrderId, Subscriber>,
    dispatched: DashMap<OrderId, Order>,
}

impl OrderBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers interest in `order_id`'s terminal event. If the bridge already holds
    /// a terminal observation for this id, invokes the callback synchronously with
    /// that stored snapshot.
    pub fn subscribe(self: &Arc<Self>, order_id: OrderId, on_terminal: Subscriber) {
        let already_terminal = self
            .dispatched
            .get(&order_id)
            .filter(|order| order.status.is_terminal())
            .map(|order| order.clone());

        if let Some(order) = already_terminal {
            on_terminal(order);
            return;
        }
        self.subscribers.insert(order_id, on_terminal);
    }

    /// Called by the upstream order-update watcher for every observed order snapshot.
    /// Dispatches to the subscriber at most once, only for terminal statuses.
    pub fn observe(&self, order: Order) {
        if !order.status.is_terminal() {
            return;
        }

        // Exactly-once: a prior terminal observation for this id is a duplicate.
        if self
            .dispatched
            .insert(order.order_id.clone(), order.clone())
            .map(|prev| prev.status.is_terminal())
            .unwrap_or(false)
        {
            return;
        }

        let Some((_, subscriber)) = self.subscribers.remove(&order.order_id) else {
            warn!(order_id = %order.order_id, "terminal order update with no subscriber, dropping");
            return;
        };

        let order_id = order.order_id.clone();
        let result = std::panic::catch_unwind(AssertUnwindSafe(|| subscriber(order)));
        if result.is_err() {
            error!(order_id = %order_id, "order subscriber panicked, isolated at bridge boundary");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{OrderKind, PositionSide};
    use smarttrade_markets::{Pair, Side};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn terminal_order(id: &str, status: OrderStatus) -> Order {
        Order {
            order_id: OrderId::from(id),
            post_only_initial_id: None,
            post_only_final_id: None,
            status,
            side: Side::Buy,
            kind: OrderKind::Market,
            pair: Pair::new("BTC_USDT"),
            average: Default::default(),
            filled: Default::default(),
            fee_cost: Default::default(),
            reduce_only: false,
            position_side: PositionSide::Both,
            stop_price: None,
            timestamp: 0,
        }
    }

    #[test]
    fn dispatches_terminal_event_once() {
        let bridge = Arc::new(OrderBridge::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        bridge.subscribe(
            OrderId::from("1"),
            Box::new(move |_| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );

        bridge.observe(terminal_order("1", OrderStatus::Filled));
        bridge.observe(terminal_order("1", OrderStatus::Filled));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn open_status_is_not_dispatched() {
        let bridge = Arc::new(OrderBridge::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        bridge.subscribe(
            OrderId::from("1"),
            Box::new(move |_| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );

        bridge.observe(terminal_order("1", OrderStatus::Open));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn missing_subscriber_is_dropped_silently() {
        let bridge = Arc::new(OrderBridge::new());
        bridge.observe(terminal_order("unknown", OrderStatus::Canceled));
    }

    #[test]
    fn late_subscribe_after_terminal_replays_synchronously() {
        let bridge = Arc::new(OrderBridge::new());
        bridge.observe(terminal_order("1", OrderStatus::Filled));

        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        bridge.subscribe(
            OrderId::from("1"),
            Box::new(move |_| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn panicking_subscriber_does_not_poison_other_orders() {
        let bridge = Arc::new(OrderBridge::new());
        bridge.subscribe(OrderId::from("1"), Box::new(|_| panic!("boom")));

        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        bridge.subscribe(
            OrderId::from("2"),
            Box::new(move |_| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );

        bridge.observe(terminal_order("1", OrderStatus::Filled));
        bridge.observe(terminal_order("2", OrderStatus::Filled));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
