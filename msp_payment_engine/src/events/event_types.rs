use serde::{Deserialize, Serialize};

use crate::db_types::{OrderActivity, OrderState, Payment, PaymentState};

/// An entry was added to an order's activity log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderActivityEvent {
    pub order_id: i64,
    pub activity: OrderActivity,
}

impl OrderActivityEvent {
    pub fn new(order_id: i64, activity: OrderActivity) -> Self {
        Self { order_id, activity }
    }
}

/// A payment changed state. `old_state` is `None` for a newly recorded payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentUpdatedEvent {
    pub payment: Payment,
    pub old_state: Option<PaymentState>,
}

impl PaymentUpdatedEvent {
    pub fn new(payment: Payment, old_state: Option<PaymentState>) -> Self {
        Self { payment, old_state }
    }
}

/// An order moved along the fulfillment workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTransitionedEvent {
    pub order_id: i64,
    pub from: OrderState,
    pub to: OrderState,
}

impl OrderTransitionedEvent {
    pub fn new(order_id: i64, from: OrderState, to: OrderState) -> Self {
        Self { order_id, from, to }
    }
}
