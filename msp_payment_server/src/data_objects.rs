use msp_common::MinorUnits;
use multisafepay_tools::{data_objects::GatewayInfo, ApiMode};
use serde::{Deserialize, Serialize};

/// The query string MultiSafepay appends to the notification url.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationParams {
    pub transactionid: Option<String>,
    pub timestamp: Option<String>,
}

/// Body of `POST /api/orders/{id}/checkout`. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub gateway_info: GatewayInfo,
    /// Where the customer lands after paying. Defaults to a page on this server.
    pub return_url: Option<String>,
    pub cancel_url: Option<String>,
    /// Overrides the configured shop language for this checkout.
    pub language: Option<String>,
}

/// Body of `POST /api/payments/{id}/refund`. Without an amount, whatever is left of the payment is refunded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefundParams {
    pub amount: Option<MinorUnits>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FulfillParams {
    pub tracking_code: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModeQuery {
    /// `test` or `live`. Defaults to the configured account type.
    pub mode: Option<ApiMode>,
}
