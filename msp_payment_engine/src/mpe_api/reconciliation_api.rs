use std::fmt::{Debug, Display};

use log::*;
use multisafepay_tools::{data_objects::PspOrderState, TransportFactory};
use serde::{Deserialize, Serialize};

use crate::{
    db::traits::{OrderManagement, PaymentBackend, PaymentGatewayDatabase},
    db_types::{ActivityParams, NewPayment, Order, OrderActivity, OrderActivityKind, OrderState, PaymentState},
    events::{EventProducers, OrderTransitionedEvent, PaymentUpdatedEvent},
    gateways::{GatewayDescriptor, GatewayId},
    helpers::KeyedLocks,
    mpe_api::{
        activity::{params_from_state, ActivityLog},
        errors::ReconciliationError,
        psp_clients::PspClients,
    },
    status::{PspStatus, WorkflowEffect},
};

/// How a notification was handled. Only [`NotificationOutcome::Processed`] means anything changed. The others are
/// acknowledged so that MultiSafepay stops retrying, but carry a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationOutcome {
    Processed,
    OrderNotFound,
    NonMspOrder,
    NoPaymentDetails,
}

impl NotificationOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            NotificationOutcome::Processed => "OK",
            NotificationOutcome::OrderNotFound => "Order does not exist",
            NotificationOutcome::NonMspOrder => "Non MSP order",
            NotificationOutcome::NoPaymentDetails => "No payment details found",
        }
    }
}

impl Display for NotificationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// `ReconciliationApi` brings local payments and orders in line with what MultiSafepay reports.
///
/// Notifications arrive at least once and possibly concurrently. The payment for a transaction is keyed by its
/// remote id, and all work on one remote id is serialised by a keyed lock, so replaying a notification never creates
/// a second payment or counts money twice. The lock is never held while talking to MultiSafepay.
///
/// Clones share the same lock table. Create one instance and clone it wherever it is needed.
pub struct ReconciliationApi<B, F> {
    db: B,
    clients: PspClients<F>,
    locks: KeyedLocks,
    activity: ActivityLog<B>,
}

impl<B, F> Debug for ReconciliationApi<B, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconciliationApi")
    }
}

impl<B: Clone, F: Clone> Clone for ReconciliationApi<B, F> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            clients: self.clients.clone(),
            locks: self.locks.clone(),
            activity: self.activity.clone(),
        }
    }
}

impl<B: Clone, F> ReconciliationApi<B, F> {
    pub fn new(db: B, clients: PspClients<F>, producers: EventProducers) -> Self {
        let activity = ActivityLog::new(db.clone(), producers);
        Self { db, clients, locks: KeyedLocks::new(), activity }
    }

    pub fn locks(&self) -> &KeyedLocks {
        &self.locks
    }
}

impl<B, F> ReconciliationApi<B, F>
where
    B: PaymentBackend,
    F: TransportFactory,
{
    /// Handles a MultiSafepay notification for `transaction_id`, which is the order id MultiSafepay was given when
    /// the payment started.
    pub async fn handle_notification(&self, transaction_id: &str) -> Result<NotificationOutcome, ReconciliationError> {
        let transaction_id = transaction_id.trim();
        if transaction_id.is_empty() {
            return Err(ReconciliationError::MissingTransactionId);
        }
        let Some(order) = self.resolve_order(transaction_id).await? else {
            info!("🔄️ Notification for {transaction_id} ignored. The order does not exist.");
            return Ok(NotificationOutcome::OrderNotFound);
        };
        let Some(descriptor) = self.clients.catalog().lookup(&order.payment_gateway).copied() else {
            info!("🔄️ Notification for order {} ignored. {} is not a MultiSafepay gateway.", order.id, order.payment_gateway);
            return Ok(NotificationOutcome::NonMspOrder);
        };
        let api = self.clients.api_for(&order)?;
        let state = api.get_order(transaction_id).await?;
        if state.payment_details.is_none() {
            info!("🔄️ Order {transaction_id} has no payment details at MultiSafepay yet");
            return Ok(NotificationOutcome::NoPaymentDetails);
        }
        let remote_id = state
            .transaction_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| transaction_id.to_string());
        let status = PspStatus::from(state.status.as_str());
        debug!("🔄️ Reconciling order {} with transaction {remote_id} ({status})", order.id);

        let activities = {
            let _guard = self.locks.lock(&remote_id).await;
            self.reconcile_locked(order.id, &remote_id, &descriptor, &state, &status).await?
        };
        self.activity.record_all(order.id, activities).await;

        let params = params_from_state(&state);
        if status.workflow_effect() == WorkflowEffect::LogUncleared {
            self.activity.record(order.id, OrderActivity::new(OrderActivityKind::Uncleared, params.clone())).await;
        }
        if let Some(method) = state.payment_method().filter(|m| !m.is_empty()) {
            if !method.eq_ignore_ascii_case(descriptor.code) {
                info!("🔄️ Order {} was paid with {method} instead of {}", order.id, descriptor.code);
                let params = ActivityParams {
                    old_gateway: descriptor.code.to_string(),
                    new_gateway: method.to_string(),
                    ..params
                };
                self.activity.record(order.id, OrderActivity::new(OrderActivityKind::NewGateway, params)).await;
            }
        }
        Ok(NotificationOutcome::Processed)
    }

    /// The part of reconciliation that must not interleave with another notification for the same transaction.
    /// Returns the activities to log once the lock is released.
    async fn reconcile_locked(
        &self,
        order_id: i64,
        remote_id: &str,
        descriptor: &GatewayDescriptor,
        state: &PspOrderState,
        status: &PspStatus,
    ) -> Result<Vec<OrderActivity>, ReconciliationError> {
        let mut activities = Vec::new();
        let params = params_from_state(state);
        let order = self
            .db
            .fetch_order_by_id(order_id)
            .await
            .map_err(ReconciliationError::database)?
            .ok_or_else(|| ReconciliationError::DatabaseError(format!("Order {order_id} disappeared")))?;

        if status.is_fulfillment_eligible() && order.state == OrderState::Draft {
            if let Some(transition) = order.state.next_transition() {
                let updated = self.db.apply_transition(order.id, transition).await.map_err(ReconciliationError::database)?;
                info!("🔄️ Order {} placed ({} -> {}) after a {status} payment", order.id, order.state, updated.state);
                let event = OrderTransitionedEvent::new(order.id, order.state, updated.state);
                self.activity.producers().publish_order_transitioned(event).await;
                activities.push(OrderActivity::new(OrderActivityKind::Reopened, params.clone()));
            }
        }

        let new_payment = new_payment_for(&order, remote_id, state);
        let inserted = self.db.fetch_or_create_payment(new_payment).await.map_err(ReconciliationError::database)?;
        let is_new = inserted.is_new();
        let payment = inserted.into_payment();
        if is_new {
            debug!("🔄️ Payment {} created for transaction {remote_id}", payment.id);
            if descriptor.id == GatewayId::BankTransfer {
                activities.push(OrderActivity::new(OrderActivityKind::BankTransferStarted, params.clone()));
            }
            let event = PaymentUpdatedEvent::new(payment.clone(), None);
            self.activity.producers().publish_payment_updated(event).await;
        }

        match status.payment_state() {
            Some(new_state) if new_state != payment.state => {
                let old_state = payment.state;
                let updated = self
                    .db
                    .update_payment_state(payment.id, new_state, &state.status)
                    .await
                    .map_err(ReconciliationError::database)?;
                info!("🔄️ Payment {} moved from {old_state} to {new_state}", payment.id);
                if new_state == PaymentState::Completed {
                    activities.push(OrderActivity::new(OrderActivityKind::PaymentCapture, params.clone()));
                }
                let event = PaymentUpdatedEvent::new(updated, Some(old_state));
                self.activity.producers().publish_payment_updated(event).await;
            },
            _ if payment.remote_state != state.status => {
                self.db
                    .update_payment_state(payment.id, payment.state, &state.status)
                    .await
                    .map_err(ReconciliationError::database)?;
                trace!("🔄️ Payment {} remote status is now '{}'", payment.id, state.status);
            },
            _ => trace!("🔄️ Payment {} is already up to date", payment.id),
        }
        Ok(activities)
    }

    /// Finds the order a notification refers to, first by internal id and then by order number.
    async fn resolve_order(&self, transaction_id: &str) -> Result<Option<Order>, ReconciliationError> {
        if let Ok(id) = transaction_id.parse::<i64>() {
            let order = self.db.fetch_order_by_id(id).await.map_err(ReconciliationError::database)?;
            if order.is_some() {
                return Ok(order);
            }
        }
        self.db.fetch_order_by_number(transaction_id).await.map_err(ReconciliationError::database)
    }
}

fn new_payment_for(order: &Order, remote_id: &str, state: &PspOrderState) -> NewPayment {
    let currency = if state.currency.is_empty() { order.currency.as_str() } else { state.currency.as_str() };
    NewPayment::new(order.id, order.payment_gateway.as_str(), state.amount, currency)
        .with_remote(remote_id, state.status.as_str())
}
