use std::fmt::Debug;

use log::*;
use msp_common::MinorUnits;
use multisafepay_tools::{data_objects::RefundRequest, TransportFactory};

use crate::{
    db::traits::{OrderManagement, PaymentBackend, PaymentGatewayDatabase},
    db_types::{ActivityParams, OrderActivity, OrderActivityKind, Payment, PaymentState},
    events::{EventProducers, PaymentUpdatedEvent},
    mpe_api::{activity::ActivityLog, errors::RefundError, psp_clients::PspClients},
};

/// `RefundApi` hands money back to customers through MultiSafepay.
///
/// The refunded total is only changed once MultiSafepay has accepted the refund, and never beyond the payment amount.
pub struct RefundApi<B, F> {
    db: B,
    clients: PspClients<F>,
    activity: ActivityLog<B>,
}

impl<B, F> Debug for RefundApi<B, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RefundApi")
    }
}

impl<B: Clone, F: Clone> Clone for RefundApi<B, F> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), clients: self.clients.clone(), activity: self.activity.clone() }
    }
}

impl<B: Clone, F> RefundApi<B, F> {
    pub fn new(db: B, clients: PspClients<F>, producers: EventProducers) -> Self {
        let activity = ActivityLog::new(db.clone(), producers);
        Self { db, clients, activity }
    }
}

impl<B, F> RefundApi<B, F>
where
    B: PaymentBackend,
    F: TransportFactory,
{
    /// Refunds `amount` of the payment, or whatever is left to refund if no amount is given.
    pub async fn refund(&self, payment_id: i64, amount: Option<MinorUnits>) -> Result<Payment, RefundError> {
        let payment = self
            .db
            .fetch_payment(payment_id)
            .await
            .map_err(RefundError::database)?
            .ok_or(RefundError::PaymentNotFound(payment_id))?;
        let available = payment.refundable();
        let requested = amount.unwrap_or(available);
        if !requested.is_positive() || requested > available {
            warn!("💸️ Refusing to refund {requested} of payment {payment_id}. {available} is refundable.");
            return Err(RefundError::InvalidRefundAmount { requested, available });
        }
        let order = self
            .db
            .fetch_order_by_id(payment.order_id)
            .await
            .map_err(RefundError::database)?
            .ok_or(RefundError::OrderNotFound(payment.order_id))?;
        let psp_order_id = order.psp_order_id();
        let api = self.clients.api_for(&order)?;
        let request = RefundRequest::new(&psp_order_id, &payment.currency, requested);
        let result = api.refund_order(&psp_order_id, &request).await?;
        if !result.success {
            let info = result.error_info.unwrap_or_else(|| "No reason given".to_string());
            return Err(RefundError::RefundDeclined { code: result.error_code, info });
        }
        let updated = self.db.record_refund(payment.id, requested).await.map_err(|e| {
            error!(
                "💸️ MultiSafepay accepted a refund of {requested} for payment {} but it could not be recorded. {e}",
                payment.id
            );
            RefundError::database(e)
        })?;
        info!("💸️ Refunded {requested} {} of payment {}. Payment is now {}", payment.currency, payment.id, updated.state);
        let kind = if updated.state == PaymentState::Refunded {
            OrderActivityKind::FullRefund
        } else {
            OrderActivityKind::PartialRefund
        };
        let params = ActivityParams {
            status: updated.state.to_string(),
            amount: format!("{:.2}", requested.to_major()),
            currency: payment.currency.clone(),
            msp_id: payment.remote_id.clone(),
            ..Default::default()
        };
        self.activity.record(order.id, OrderActivity::new(kind, params)).await;
        let event = PaymentUpdatedEvent::new(updated.clone(), Some(payment.state));
        self.activity.producers().publish_payment_updated(event).await;
        Ok(updated)
    }
}
