use std::fmt::Debug;

use chrono::Utc;
use log::*;
use multisafepay_tools::{data_objects::ShipmentUpdate, TransportFactory};
use serde::{Deserialize, Serialize};

use crate::{
    db::traits::OrderManagement,
    db_types::{Order, OrderState, OrderTransition},
    events::{EventProducers, OrderTransitionedEvent},
    mpe_api::{errors::ShipmentError, psp_clients::PspClients},
};

/// The result of fulfilling an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FulfilledOrder {
    pub order: Order,
    /// Whether MultiSafepay was told about the shipment
    pub shipment_notified: bool,
}

/// `ShipmentApi` completes orders and tells MultiSafepay that the goods are on their way.
pub struct ShipmentApi<B, F> {
    db: B,
    clients: PspClients<F>,
    producers: EventProducers,
}

impl<B, F> Debug for ShipmentApi<B, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ShipmentApi")
    }
}

impl<B: Clone, F: Clone> Clone for ShipmentApi<B, F> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), clients: self.clients.clone(), producers: self.producers.clone() }
    }
}

impl<B, F> ShipmentApi<B, F> {
    pub fn new(db: B, clients: PspClients<F>, producers: EventProducers) -> Self {
        Self { db, clients, producers }
    }
}

impl<B, F> ShipmentApi<B, F>
where
    B: OrderManagement,
    F: TransportFactory,
{
    /// Moves an order from fulfillment to completed, storing the tracking code on its first shipment if one is
    /// given.
    ///
    /// The transition is committed before MultiSafepay is notified. A failed notification is logged and reported in
    /// the result, but does not undo the transition.
    pub async fn fulfill_order(
        &self,
        order_id: i64,
        tracking_code: Option<&str>,
    ) -> Result<FulfilledOrder, ShipmentError> {
        let order = self
            .db
            .fetch_order_by_id(order_id)
            .await
            .map_err(ShipmentError::database)?
            .ok_or(ShipmentError::OrderNotFound(order_id))?;
        if order.state != OrderState::Fulfillment {
            return Err(ShipmentError::NotFulfillable { id: order.id, state: order.state });
        }
        if let Some(code) = tracking_code.map(str::trim).filter(|c| !c.is_empty()) {
            if order.has_shipments() {
                self.db.set_tracking_code(order.id, code).await.map_err(ShipmentError::database)?;
            } else {
                warn!("🛒️ Order {order_id} has no shipments. Tracking code {code} is not stored.");
            }
        }
        let order =
            self.db.apply_transition(order.id, OrderTransition::Fulfill).await.map_err(ShipmentError::database)?;
        info!("🛒️ Order {order_id} fulfilled");
        let event = OrderTransitionedEvent::new(order.id, OrderState::Fulfillment, order.state);
        self.producers.publish_order_transitioned(event).await;
        let shipment_notified = match self.notify_shipment(&order).await {
            Ok(notified) => notified,
            Err(e) => {
                warn!("🛒️ Could not notify MultiSafepay of the shipment of order {order_id}. {e}");
                false
            },
        };
        Ok(FulfilledOrder { order, shipment_notified })
    }

    /// Tells MultiSafepay that a MultiSafepay order with shipments has shipped. Returns `false` when there was
    /// nothing to report.
    pub async fn notify_shipment(&self, order: &Order) -> Result<bool, ShipmentError> {
        if !self.clients.catalog().is_msp_gateway(&order.payment_gateway) {
            trace!("🛒️ Order {} was not paid through MultiSafepay. No shipment update is sent.", order.id);
            return Ok(false);
        }
        let Some(shipment) = order.shipments.first() else {
            trace!("🛒️ Order {} has no shipments. No shipment update is sent.", order.id);
            return Ok(false);
        };
        let tracking_code = shipment.tracking_code.clone().unwrap_or_default();
        let api = self.clients.api_for(order)?;
        let update = ShipmentUpdate::shipped(tracking_code, Utc::now());
        api.update_shipment(&order.psp_order_id(), &update).await?;
        Ok(true)
    }
}
