//! `PlaceOrder`: sends a create-order request through the trading port,
//! applying the literal-substring retry policy from
//! `smarttrade_execution::retry`, and wires the resulting order id into the
//! order-lifecycle bridge so its terminal status comes back through
//! [`super::OrderEvent`].

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use smarttrade_execution::order::{CreateOrderRequest, OrderId, OrderKind, PlaceOrderStep};
use smarttrade_execution::retry::{classify, network_failure_action, PlaceOrderContext, RetryAction};
use smarttrade_markets::Side;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{error, warn};

use super::SmartOrder;

#[derive(Debug, Error)]
pub enum PlaceOrderError {
    #[error("an order for this step is already in flight")]
    AlreadyInFlight,
    #[error("placement abandoned")]
    Cancelled,
    #[error("strategy disabled: {0}")]
    Disabled(String),
    #[error("gateway rejected order: {0}")]
    Rejected(String),
}

pub(super) struct PlaceOrderRequest {
    pub step: PlaceOrderStep,
    pub side: Side,
    pub kind: OrderKind,
    pub price: Decimal,
    pub amount: Decimal,
    pub reduce_only: bool,
    pub ctx: PlaceOrderContext,
}

pub(super) async fn place_order(
    sm: &SmartOrder,
    req: PlaceOrderRequest,
) -> Result<OrderId, PlaceOrderError> {
    if !sm.waiting_for_order.insert(req.step) {
        return Err(PlaceOrderError::AlreadyInFlight);
    }

    let leverage = sm.conditions.leverage.to_u32().unwrap_or(1).max(1);
    let mut price = req.price;
    let mut kind = req.kind;
    let mut attempt: u32 = 0;

    let result = loop {
        let request = CreateOrderRequest {
            key_id: sm.key_id.clone(),
            pair: sm.pair.clone(),
            market_type: sm.market_type,
            side: req.side,
            kind,
            price,
            amount: req.amount,
            reduce_only: req.reduce_only,
            leverage,
            step: req.step,
        };

        match sm.trading.create_order(request).await {
            Ok(response) if response.ok => {
                let order_id = response
                    .order_id
                    .expect("ok create_order response always carries an order id");
                let bridge = sm.bridge.clone();
                let tx = sm.order_tx.clone();
                let step = req.step;
                bridge.subscribe(
                    order_id.clone(),
                    Box::new(move |order| {
                        let _ = tx.send((step, order));
                    }),
                );
                break Ok(order_id);
            }
            Ok(response) => {
                let action =
                    classify(response.error_text(), req.ctx).unwrap_or(RetryAction::DisableAndError);
                match action {
                    RetryAction::Retry { delay, max_attempts } => {
                        attempt += 1;
                        if attempt >= max_attempts {
                            break Err(PlaceOrderError::Rejected(response.error_text().to_string()));
                        }
                        sleep(delay).await;
                    }
                    RetryAction::DowngradeToMarketAndRetry => {
                        kind = OrderKind::Market;
                    }
                    RetryAction::RecomputeFromLastTargetAndRetry => {
                        price = super::averaging::last_target_price(sm);
                    }
                    RetryAction::Cancel => break Err(PlaceOrderError::Cancelled),
                    RetryAction::DisableStrategy => {
                        let _ = sm.store.disable_strategy(&sm.id).await;
                        break Err(PlaceOrderError::Disabled(response.error_text().to_string()));
                    }
                    RetryAction::DisableAndError => {
                        let _ = sm.store.disable_strategy(&sm.id).await;
                        error!(
                            strategy = %sm.id,
                            error = response.error_text(),
                            "unrecoverable order placement error"
                        );
                        break Err(PlaceOrderError::Rejected(response.error_text().to_string()));
                    }
                    RetryAction::RetryForever { delay } => sleep(delay).await,
                }
            }
            Err(err) => {
                warn!(strategy = %sm.id, %err, "transport error placing order, retrying forever");
                if let RetryAction::RetryForever { delay } = network_failure_action() {
                    sleep(delay).await;
                }
            }
        }
    };

    sm.waiting_for_order.remove(&req.step);
    result
}
