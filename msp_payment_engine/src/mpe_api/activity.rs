use log::*;
use multisafepay_tools::data_objects::PspOrderState;

use crate::{
    db::traits::OrderManagement,
    db_types::{ActivityParams, OrderActivity},
    events::{EventProducers, OrderActivityEvent},
};

/// Writes order activities to the log and publishes them to the activity hook.
///
/// Recording is best effort. A failed write is logged and never undoes the change that caused the activity.
#[derive(Clone)]
pub struct ActivityLog<B> {
    db: B,
    producers: EventProducers,
}

impl<B> ActivityLog<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn producers(&self) -> &EventProducers {
        &self.producers
    }
}

impl<B: OrderManagement> ActivityLog<B> {
    pub async fn record(&self, order_id: i64, activity: OrderActivity) {
        match self.db.insert_order_log(order_id, &activity).await {
            Ok(id) => trace!("📬️ Activity {id} ({}) logged for order {order_id}", activity.kind),
            Err(e) => warn!("📬️ Could not log {} for order {order_id}. {e}", activity.kind),
        }
        self.producers.publish_order_activity(OrderActivityEvent::new(order_id, activity)).await;
    }

    pub async fn record_all(&self, order_id: i64, activities: Vec<OrderActivity>) {
        for activity in activities {
            self.record(order_id, activity).await;
        }
    }
}

/// Activity parameters describing the order state MultiSafepay reported.
pub fn params_from_state(state: &PspOrderState) -> ActivityParams {
    let details = state.payment_details.as_ref();
    ActivityParams {
        status: state.status.clone(),
        amount: format!("{:.2}", state.amount.to_major()),
        currency: state.currency.clone(),
        msp_id: state.transaction_id.clone().unwrap_or_default(),
        external_id: details.and_then(|d| d.external_transaction_id.clone()).unwrap_or_default(),
        ..Default::default()
    }
}
