//! Wire types for the MultiSafepay JSON API.
//!
//! Field names follow the MultiSafepay contract exactly; do not rename them.
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use msp_common::MinorUnits;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::helpers::{opt_string_or_number, string_or_number};

pub const IDEAL_NO_ISSUER: &str = "none";

//--------------------------------------   Outbound order   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    /// The customer is sent to the MultiSafepay hosted payment page.
    Redirect,
    /// The payment is started directly with the selected method (e.g. straight to the chosen bank).
    Direct,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PspOrderPayload {
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub gateway: String,
    pub order_id: String,
    pub currency: String,
    pub amount: MinorUnits,
    /// HTML summary for display on the payment page. Not authoritative for pricing.
    pub items: String,
    pub description: String,
    pub seconds_active: u64,
    pub manual: String,
    pub payment_options: PaymentOptions,
    pub customer: CustomerBlock,
    pub delivery: CustomerBlock,
    pub shopping_cart: Option<ShoppingCart>,
    pub checkout_options: Option<CheckoutOptions>,
    pub gateway_info: GatewayInfo,
    pub plugin: PluginInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOptions {
    pub notification_url: String,
    pub redirect_url: String,
    pub cancel_url: String,
    pub close_window: String,
}

/// Customer or delivery details. Every field is optional and absent fields are omitted, so an empty block serializes
/// as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forwarded_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub house_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl CustomerBlock {
    pub fn is_empty(&self) -> bool {
        self == &CustomerBlock::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShoppingCart {
    pub items: Vec<CartItem>,
}

impl ShoppingCart {
    /// Sum of `unit_price × quantity` over every line, in major units.
    pub fn total(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// What MultiSafepay charges for this cart: every line plus the tax its selector picks out of `tables`.
    pub fn total_with_tax(&self, tables: &TaxTables) -> Decimal {
        self.items
            .iter()
            .map(|item| item.line_total() * (Decimal::ONE + tables.rate_for(&item.tax_table_selector)))
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity: Decimal,
    pub merchant_item_id: String,
    pub tax_table_selector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<Weight>,
}

impl CartItem {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * self.quantity
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weight {
    pub unit: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutOptions {
    pub tax_tables: TaxTables,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxTables {
    pub default: DefaultTaxRate,
    pub alternate: Vec<AlternateTaxTable>,
}

impl TaxTables {
    pub fn alternate_named(&self, name: &str) -> Option<&AlternateTaxTable> {
        self.alternate.iter().find(|t| t.name == name)
    }

    /// The rate a cart line with this selector is taxed at. Selectors without an alternate table use the default rate.
    pub fn rate_for(&self, selector: &str) -> Decimal {
        self.alternate_named(selector)
            .and_then(|t| t.rules.first())
            .map(|rule| rule.rate)
            .unwrap_or(self.default.rate)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultTaxRate {
    pub shipping_taxed: Option<bool>,
    #[serde(with = "rust_decimal::serde::float")]
    pub rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternateTaxTable {
    pub standalone: bool,
    pub name: String,
    pub rules: Vec<TaxRule>,
}

impl AlternateTaxTable {
    pub fn flat(name: &str, rate: Decimal) -> Self {
        Self { standalone: false, name: name.to_string(), rules: vec![TaxRule { rate }] }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRule {
    #[serde(with = "rust_decimal::serde::float")]
    pub rate: Decimal,
}

/// Gateway-specific details, e.g. the iDEAL issuer. Unknown keys are passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatewayInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer_id: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl GatewayInfo {
    pub fn with_issuer<S: Into<String>>(issuer_id: S) -> Self {
        Self { issuer_id: Some(issuer_id.into()), extra: BTreeMap::new() }
    }

    /// True when the customer has not picked a bank yet.
    pub fn has_no_issuer(&self) -> bool {
        self.issuer_id.as_deref() == Some(IDEAL_NO_ISSUER)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    pub shop: String,
    pub shop_version: String,
    pub plugin_version: String,
    pub partner: String,
}

//--------------------------------------   Inbound order    ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedOrder {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub order_id: Option<String>,
    pub payment_url: String,
}

/// The authoritative state of an order at MultiSafepay. Read only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PspOrderState {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub transaction_id: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub order_id: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub amount: MinorUnits,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub payment_details: Option<PaymentDetails>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    #[serde(rename = "type", default)]
    pub payment_type: String,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub external_transaction_id: Option<String>,
}

impl PspOrderState {
    /// The method the customer actually paid with, if MultiSafepay has recorded a payment.
    pub fn payment_method(&self) -> Option<&str> {
        self.payment_details.as_ref().map(|d| d.payment_type.as_str())
    }
}

//--------------------------------------   Shipment / refund  -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentUpdate {
    pub tracktrace_code: String,
    pub carrier: Option<String>,
    pub ship_date: String,
    pub reason: String,
}

impl ShipmentUpdate {
    pub fn shipped<S: Into<String>>(tracktrace_code: S, ship_date: DateTime<Utc>) -> Self {
        Self {
            tracktrace_code: tracktrace_code.into(),
            carrier: None,
            ship_date: ship_date.format("%Y-%m-%d %H:%M:%S").to_string(),
            reason: "Shipped".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundRequest {
    pub currency: String,
    pub amount: MinorUnits,
    pub description: String,
}

impl RefundRequest {
    pub fn new(order_id: &str, currency: &str, amount: MinorUnits) -> Self {
        Self { currency: currency.to_string(), amount, description: format!("Refund: {order_id}") }
    }
}

/// The outcome of a refund request. MultiSafepay may decline with `success: false`, so the flag is inspected by the
/// caller rather than turned into an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RefundResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub error_info: Option<String>,
    #[serde(default)]
    pub data: Value,
}

//--------------------------------------   Catalog lookups   --------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issuer {
    #[serde(deserialize_with = "string_or_number")]
    pub code: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewaySummary {
    pub id: String,
    pub description: String,
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use chrono::TimeZone;

    use super::*;

    #[test]
    fn psp_order_state_tolerates_numeric_ids() {
        let json = r#"{
            "transaction_id": 4051823,
            "order_id": "10042",
            "status": "completed",
            "amount": 10000,
            "currency": "EUR",
            "payment_details": { "type": "IDEAL", "external_transaction_id": 55443322 }
        }"#;
        let state: PspOrderState = serde_json::from_str(json).unwrap();
        assert_eq!(state.transaction_id.as_deref(), Some("4051823"));
        assert_eq!(state.order_id.as_deref(), Some("10042"));
        assert_eq!(state.amount, MinorUnits::from(10_000));
        assert_eq!(state.payment_method(), Some("IDEAL"));
        assert_eq!(state.payment_details.unwrap().external_transaction_id.as_deref(), Some("55443322"));
    }

    #[test]
    fn missing_payment_details() {
        let state: PspOrderState = serde_json::from_str(r#"{"status": "initialized"}"#).unwrap();
        assert!(state.payment_details.is_none());
        assert!(state.payment_method().is_none());
    }

    #[test]
    fn shipment_update_body() {
        let when = Utc.with_ymd_and_hms(2024, 5, 1, 9, 3, 7).unwrap();
        let update = ShipmentUpdate::shipped("3SABCD1234", when);
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "tracktrace_code": "3SABCD1234",
                "carrier": null,
                "ship_date": "2024-05-01 09:03:07",
                "reason": "Shipped"
            })
        );
    }

    #[test]
    fn refund_request_body() {
        let req = RefundRequest::new("10042", "EUR", MinorUnits::from(2550));
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, serde_json::json!({"currency": "EUR", "amount": 2550, "description": "Refund: 10042"}));
    }

    #[test]
    fn empty_customer_block_serializes_as_empty_object() {
        let block = CustomerBlock::default();
        assert!(block.is_empty());
        assert_eq!(serde_json::to_string(&block).unwrap(), "{}");
    }

    #[test]
    fn gateway_info_keeps_extra_fields() {
        let info: GatewayInfo = serde_json::from_str(r#"{"issuer_id": "none", "birthday": "1980-01-01"}"#).unwrap();
        assert!(info.has_no_issuer());
        assert_eq!(info.extra.get("birthday"), Some(&Value::from("1980-01-01")));
        assert!(!GatewayInfo::with_issuer("0031").has_no_issuer());
    }

    #[test]
    fn cart_total() {
        let d = |s: &str| Decimal::from_str(s).unwrap();
        let item = |price: &str, qty: &str| CartItem {
            name: "x".into(),
            description: String::new(),
            unit_price: d(price),
            quantity: d(qty),
            merchant_item_id: "1".into(),
            tax_table_selector: "default".into(),
            weight: None,
        };
        let cart = ShoppingCart { items: vec![item("10.00", "2"), item("-2.00", "1"), item("4.95", "1")] };
        assert_eq!(cart.total(), d("22.95"));

        let mut shipping = item("4.95", "1");
        shipping.tax_table_selector = "BTW0".into();
        let cart = ShoppingCart { items: vec![item("10.00", "2"), shipping] };
        let tables = TaxTables {
            default: DefaultTaxRate { shipping_taxed: None, rate: d("0.21") },
            alternate: vec![AlternateTaxTable::flat("BTW0", Decimal::ZERO)],
        };
        assert_eq!(tables.rate_for("default"), d("0.21"));
        assert_eq!(tables.rate_for("BTW0"), Decimal::ZERO);
        assert_eq!(cart.total_with_tax(&tables), d("29.15"));
    }
}
