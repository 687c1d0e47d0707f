use std::fmt::Debug;

use log::*;
use multisafepay_tools::{
    data_objects::{GatewayInfo, GatewaySummary, Issuer, IDEAL_NO_ISSUER},
    ApiMode,
    TransportFactory,
};
use serde::{Deserialize, Serialize};

use crate::{
    db::traits::OrderManagement,
    db_types::{ActivityParams, Order, OrderActivity, OrderActivityKind, OrderState},
    events::EventProducers,
    gateways::{GatewayDescriptor, GatewayId},
    mpe_api::{activity::ActivityLog, errors::CheckoutError, psp_clients::PspClients},
    order_data::{CheckoutContext, OrderPayloadBuilder, PayloadError, PaymentRequest},
};

pub const CHOOSE_YOUR_BANK: &str = "Choose your bank...";

/// Where the customer must go to pay for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentLink {
    pub order_id: i64,
    /// The order id MultiSafepay knows the order by
    pub psp_order_id: String,
    pub gateway: String,
    pub payment_url: String,
}

/// `CheckoutApi` starts payments at MultiSafepay and answers the questions a checkout page asks: which gateways may
/// be offered, and which banks a customer can choose for iDEAL.
pub struct CheckoutApi<B, F> {
    db: B,
    clients: PspClients<F>,
    builder: OrderPayloadBuilder,
    activity: ActivityLog<B>,
}

impl<B, F> Debug for CheckoutApi<B, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckoutApi")
    }
}

impl<B: Clone, F: Clone> Clone for CheckoutApi<B, F> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            clients: self.clients.clone(),
            builder: self.builder.clone(),
            activity: self.activity.clone(),
        }
    }
}

impl<B: Clone, F> CheckoutApi<B, F> {
    pub fn new(db: B, clients: PspClients<F>, builder: OrderPayloadBuilder, producers: EventProducers) -> Self {
        let activity = ActivityLog::new(db.clone(), producers);
        Self { db, clients, builder, activity }
    }
}

impl<B, F> CheckoutApi<B, F>
where
    B: OrderManagement,
    F: TransportFactory,
{
    /// Creates the order at MultiSafepay and returns the payment page for it.
    ///
    /// The selected gateway must be a MultiSafepay gateway and must be available for the order's total and
    /// currency. The payment link is added to the order's activity log.
    pub async fn start_checkout(
        &self,
        order_id: i64,
        context: &CheckoutContext,
        gateway_info: GatewayInfo,
    ) -> Result<PaymentLink, CheckoutError> {
        let order = self.fetch_order(order_id).await?;
        if matches!(order.state, OrderState::Completed | OrderState::Canceled) {
            return Err(CheckoutError::OrderNotPayable { id: order.id, state: order.state });
        }
        let descriptor = self
            .clients
            .catalog()
            .lookup(&order.payment_gateway)
            .ok_or_else(|| PayloadError::UnknownGateway(order.payment_gateway.clone()))?;
        descriptor.policy.check(order.total_price, &order.currency).map_err(|reason| {
            CheckoutError::GatewayUnavailable { gateway: order.payment_gateway.clone(), reason }
        })?;
        let payment = PaymentRequest::for_order(&order);
        let payload = self.builder.build(&order, context, &payment, gateway_info)?;
        let api = self.clients.api_for(&order)?;
        let created = api.create_order(&payload).await?;
        info!("🛒️ Checkout started for order {} with {}", order.id, descriptor.code);
        let params = ActivityParams {
            new_gateway: descriptor.code.to_string(),
            amount: format!("{:.2}", payload.amount.to_major()),
            currency: payload.currency.clone(),
            payment_link: Some(created.payment_url.clone()),
            ..Default::default()
        };
        self.activity.record(order.id, OrderActivity::new(OrderActivityKind::PaymentLink, params)).await;
        Ok(PaymentLink {
            order_id: order.id,
            psp_order_id: payload.order_id,
            gateway: descriptor.code.to_string(),
            payment_url: created.payment_url,
        })
    }

    /// The MultiSafepay gateways that may be offered for the order.
    pub async fn available_gateways(&self, order_id: i64) -> Result<Vec<GatewayDescriptor>, CheckoutError> {
        let order = self.fetch_order(order_id).await?;
        let gateways = self.clients.catalog().available_for(order.total_price, &order.currency);
        debug!("🛒️ {} gateways are available for order {order_id}", gateways.len());
        Ok(gateways)
    }

    /// The iDEAL banks, led by an entry that lets the customer choose their bank on the payment page instead.
    pub async fn ideal_issuers(&self, mode: ApiMode) -> Result<Vec<Issuer>, CheckoutError> {
        let api = self.clients.api(mode)?;
        let code = self
            .clients
            .catalog()
            .descriptor(GatewayId::Ideal)
            .map(|d| d.code)
            .unwrap_or("IDEAL");
        let issuers = api.fetch_issuers(code).await?;
        let mut result = Vec::with_capacity(issuers.len() + 1);
        result.push(Issuer { code: IDEAL_NO_ISSUER.to_string(), description: CHOOSE_YOUR_BANK.to_string() });
        result.extend(issuers);
        Ok(result)
    }

    /// Every gateway enabled on the MultiSafepay account.
    pub async fn fetch_gateways(&self, mode: ApiMode) -> Result<Vec<GatewaySummary>, CheckoutError> {
        let api = self.clients.api(mode)?;
        Ok(api.fetch_gateways().await?)
    }

    async fn fetch_order(&self, order_id: i64) -> Result<Order, CheckoutError> {
        self.db
            .fetch_order_by_id(order_id)
            .await
            .map_err(CheckoutError::database)?
            .ok_or(CheckoutError::OrderNotFound(order_id))
    }
}
