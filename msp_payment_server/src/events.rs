//! Event hooks the server installs on the engine.
//!
//! The engine publishes an event whenever an order's activity log grows, a payment changes state, or an order moves
//! along the fulfillment workflow. The server writes these to the `msp::events` log target so that an operator can
//! follow what MultiSafepay did to an order without querying the database.
use futures::FutureExt;
use log::*;
use msp_payment_engine::events::{
    EventHandlers,
    EventHooks,
    OrderActivityEvent,
    OrderTransitionedEvent,
    PaymentUpdatedEvent,
};

pub const EVENT_BUFFER_SIZE: usize = 25;
const EVENT_LOG_TARGET: &str = "msp::events";

pub fn create_event_log_handlers() -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks
        .on_order_activity(|ev: OrderActivityEvent| {
            debug!(target: EVENT_LOG_TARGET, "📬️ Order {}: {}", ev.order_id, ev.activity.kind);
            async {}.boxed()
        })
        .on_payment_updated(|ev: PaymentUpdatedEvent| {
            let PaymentUpdatedEvent { payment, old_state } = ev;
            match old_state {
                Some(old) => info!(
                    target: EVENT_LOG_TARGET,
                    "📬️ Payment {} for order {} went from {old} to {}. Refunded so far: {}",
                    payment.id,
                    payment.order_id,
                    payment.state,
                    payment.refunded_amount
                ),
                None => info!(
                    target: EVENT_LOG_TARGET,
                    "📬️ New {} payment {} of {} {} for order {} via {}",
                    payment.state,
                    payment.id,
                    payment.amount,
                    payment.currency,
                    payment.order_id,
                    payment.payment_gateway
                ),
            }
            async {}.boxed()
        })
        .on_order_transitioned(|ev: OrderTransitionedEvent| {
            info!(target: EVENT_LOG_TARGET, "📬️ Order {} moved from {} to {}", ev.order_id, ev.from, ev.to);
            async {}.boxed()
        });
    EventHandlers::new(EVENT_BUFFER_SIZE, hooks)
}
