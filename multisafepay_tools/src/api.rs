use log::*;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::{
    data_objects::{
        CreatedOrder,
        GatewaySummary,
        Issuer,
        PspOrderPayload,
        PspOrderState,
        RefundRequest,
        RefundResult,
        ShipmentUpdate,
    },
    transport::{HttpMethod, MspTransport},
    MspApiError,
};

/// The common wrapper around every MultiSafepay response.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub error_info: Option<String>,
}

impl ResponseEnvelope {
    /// Converts an application-level failure into [`MspApiError::PaymentGatewayError`].
    pub fn into_result(self) -> Result<Value, MspApiError> {
        match (self.success, self.error_code) {
            (false, Some(code)) => Err(MspApiError::PaymentGatewayError { code, info: self.error_info.unwrap_or_default() }),
            _ => Ok(self.data),
        }
    }
}

#[derive(Clone)]
pub struct MultiSafepayApi<T> {
    transport: T,
}

impl<T: MspTransport> MultiSafepayApi<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends a request and decodes the envelope, without judging `success`.
    pub async fn raw_query<B: Serialize>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
    ) -> Result<ResponseEnvelope, MspApiError> {
        let body = body
            .map(|b| serde_json::to_vec(b).map_err(|e| MspApiError::SerializationError(e.to_string())))
            .transpose()?;
        let bytes = self.transport.send(method, path, body).await?;
        serde_json::from_slice::<ResponseEnvelope>(&bytes).map_err(|e| {
            warn!("💳️ Response to {method} {path} is not a valid envelope. {e}");
            MspApiError::malformed(&bytes)
        })
    }

    /// Sends a request and returns the decoded `data` member. PSP-reported failures become errors.
    pub async fn rest_query<R: DeserializeOwned, B: Serialize>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
    ) -> Result<R, MspApiError> {
        let data = self.raw_query(method, path, body).await?.into_result().map_err(|e| {
            warn!("💳️ MultiSafepay rejected {method} {path}. {e}");
            e
        })?;
        serde_json::from_value::<R>(data.clone()).map_err(|e| {
            warn!("💳️ Unexpected data in response to {method} {path}. {e}");
            MspApiError::MalformedResponse { body: data.to_string() }
        })
    }

    /// `POST orders`. Returns the hosted payment page the customer must be sent to.
    pub async fn create_order(&self, payload: &PspOrderPayload) -> Result<CreatedOrder, MspApiError> {
        debug!("💳️ Creating {} order {} for {} {}", payload.gateway, payload.order_id, payload.amount, payload.currency);
        let order = self.rest_query::<CreatedOrder, _>(HttpMethod::Post, "orders", Some(payload)).await?;
        info!("💳️ Order {} created. Payment link: {}", payload.order_id, order.payment_url);
        Ok(order)
    }

    /// `GET orders/{transaction_id}`
    pub async fn get_order(&self, transaction_id: &str) -> Result<PspOrderState, MspApiError> {
        let path = format!("orders/{transaction_id}");
        debug!("💳️ Fetching order state for {transaction_id}");
        let state = self.rest_query::<PspOrderState, ()>(HttpMethod::Get, &path, None).await?;
        trace!("💳️ Order {transaction_id} has status '{}'", state.status);
        Ok(state)
    }

    /// `PATCH orders/{order_id}` with shipment details.
    pub async fn update_shipment(&self, order_id: &str, update: &ShipmentUpdate) -> Result<(), MspApiError> {
        let path = format!("orders/{order_id}");
        debug!("💳️ Marking order {order_id} as shipped with tracking code {}", update.tracktrace_code);
        let _ = self.rest_query::<Value, _>(HttpMethod::Patch, &path, Some(update)).await?;
        info!("💳️ Order {order_id} marked as shipped");
        Ok(())
    }

    /// `POST orders/{order_id}/refunds`. A declined refund is not an error at this level, so callers must check
    /// [`RefundResult::success`].
    pub async fn refund_order(&self, order_id: &str, refund: &RefundRequest) -> Result<RefundResult, MspApiError> {
        let path = format!("orders/{order_id}/refunds");
        debug!("💳️ Requesting refund of {} {} for order {order_id}", refund.amount, refund.currency);
        let envelope = self.raw_query(HttpMethod::Post, &path, Some(refund)).await?;
        let result = RefundResult {
            success: envelope.success,
            error_code: envelope.error_code,
            error_info: envelope.error_info,
            data: envelope.data,
        };
        if result.success {
            info!("💳️ Refund for order {order_id} accepted");
        } else {
            warn!("💳️ Refund for order {order_id} declined. {:?}", result.error_info);
        }
        Ok(result)
    }

    /// `GET issuers/{gateway}`, e.g. the banks available for iDEAL.
    pub async fn fetch_issuers(&self, gateway: &str) -> Result<Vec<Issuer>, MspApiError> {
        let path = format!("issuers/{}", gateway.to_ascii_lowercase());
        let issuers = self.rest_query::<Vec<Issuer>, ()>(HttpMethod::Get, &path, None).await?;
        debug!("💳️ Fetched {} issuers for {gateway}", issuers.len());
        Ok(issuers)
    }

    /// `GET gateways`
    pub async fn fetch_gateways(&self) -> Result<Vec<GatewaySummary>, MspApiError> {
        let gateways = self.rest_query::<Vec<GatewaySummary>, ()>(HttpMethod::Get, "gateways", None).await?;
        debug!("💳️ Fetched {} gateways", gateways.len());
        Ok(gateways)
    }
}
