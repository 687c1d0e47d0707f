use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use msp_common::MinorUnits;
use multisafepay_tools::GatewayMode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion: {0}")]
pub struct ConversionError(pub String);

//--------------------------------------     OrderState       ---------------------------------------------------------

/// The state of an order in the store's fulfillment workflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    #[default]
    Draft,
    Validation,
    Fulfillment,
    Completed,
    Canceled,
}

impl OrderState {
    /// The transition that moves an order in this state forward, if there is one.
    pub fn next_transition(&self) -> Option<OrderTransition> {
        match self {
            OrderState::Draft => Some(OrderTransition::Place),
            OrderState::Validation => Some(OrderTransition::Validate),
            OrderState::Fulfillment => Some(OrderTransition::Fulfill),
            OrderState::Completed | OrderState::Canceled => None,
        }
    }
}

impl Display for OrderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderState::Draft => write!(f, "draft"),
            OrderState::Validation => write!(f, "validation"),
            OrderState::Fulfillment => write!(f, "fulfillment"),
            OrderState::Completed => write!(f, "completed"),
            OrderState::Canceled => write!(f, "canceled"),
        }
    }
}

impl FromStr for OrderState {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "validation" => Ok(Self::Validation),
            "fulfillment" => Ok(Self::Fulfillment),
            "completed" => Ok(Self::Completed),
            "canceled" => Ok(Self::Canceled),
            s => Err(ConversionError(format!("Invalid order state: {s}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderTransition {
    Place,
    Validate,
    Fulfill,
}

impl OrderTransition {
    pub fn from_state(&self) -> OrderState {
        match self {
            OrderTransition::Place => OrderState::Draft,
            OrderTransition::Validate => OrderState::Validation,
            OrderTransition::Fulfill => OrderState::Fulfillment,
        }
    }

    pub fn to_state(&self) -> OrderState {
        match self {
            OrderTransition::Place | OrderTransition::Validate => OrderState::Fulfillment,
            OrderTransition::Fulfill => OrderState::Completed,
        }
    }
}

impl Display for OrderTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderTransition::Place => write!(f, "place"),
            OrderTransition::Validate => write!(f, "validate"),
            OrderTransition::Fulfill => write!(f, "fulfill"),
        }
    }
}

//--------------------------------------   Order contents     ---------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentType {
    Tax,
    Promotion,
    Other,
}

/// A price adjustment attached to a line item. Percentages are fractions, so 21% VAT is `0.21`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    pub adjustment_type: AdjustmentType,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub percentage: Option<Decimal>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    /// True when the adjustment is already part of the unit price (e.g. VAT-inclusive prices).
    #[serde(default)]
    pub included: bool,
}

impl Adjustment {
    pub fn tax(rate: Decimal, included: bool) -> Self {
        Self { adjustment_type: AdjustmentType::Tax, label: "VAT".into(), percentage: Some(rate), amount: None, included }
    }

    pub fn percentage_promotion(percentage: Decimal) -> Self {
        Self {
            adjustment_type: AdjustmentType::Promotion,
            label: "Discount".into(),
            percentage: Some(percentage),
            amount: None,
            included: false,
        }
    }

    pub fn flat_promotion(amount: Decimal) -> Self {
        Self {
            adjustment_type: AdjustmentType::Promotion,
            label: "Discount".into(),
            percentage: None,
            amount: Some(amount),
            included: false,
        }
    }

    /// A non-zero percentage makes this a percentage adjustment. Anything else is treated as a flat amount.
    pub fn is_percentage(&self) -> bool {
        self.percentage.map(|p| !p.is_zero()).unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductWeight {
    pub unit: String,
    pub number: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: String,
    pub title: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    #[serde(default)]
    pub weight: Option<ProductWeight>,
    #[serde(default)]
    pub adjustments: Vec<Adjustment>,
}

impl LineItem {
    pub fn new<S: Into<String>>(product_id: S, title: S, quantity: Decimal, unit_price: Decimal) -> Self {
        Self {
            product_id: product_id.into(),
            title: title.into(),
            quantity,
            unit_price,
            weight: None,
            adjustments: Vec::new(),
        }
    }

    pub fn with_adjustment(mut self, adjustment: Adjustment) -> Self {
        self.adjustments.push(adjustment);
        self
    }

    pub fn with_weight<S: Into<String>>(mut self, unit: S, number: Decimal) -> Self {
        self.weight = Some(ProductWeight { unit: unit.into(), number });
        self
    }

    /// The first adjustment of the given type.
    pub fn adjustment(&self, adjustment_type: AdjustmentType) -> Option<&Adjustment> {
        self.adjustments.iter().find(|a| a.adjustment_type == adjustment_type)
    }

    pub fn tax_included(&self) -> bool {
        self.adjustment(AdjustmentType::Tax).map(|a| a.included).unwrap_or(false)
    }

    pub fn subtotal(&self) -> Decimal {
        self.unit_price * self.quantity
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressProfile {
    pub given_name: String,
    pub family_name: String,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: Option<String>,
    pub postal_code: String,
    pub locality: String,
    #[serde(default)]
    pub administrative_area: Option<String>,
    pub country_code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingRateKind {
    FlatRate,
    FlatRatePerItem,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingMethod {
    pub label: String,
    pub rate_kind: ShippingRateKind,
    pub rate_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    #[serde(default)]
    pub tracking_code: Option<String>,
    pub shipping_profile: AddressProfile,
    pub method: ShippingMethod,
}

//--------------------------------------        Order         ---------------------------------------------------------

/// The parts of an order that are stored as a single document rather than in their own columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderDetails {
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub billing_profile: Option<AddressProfile>,
    #[serde(default)]
    pub shipments: Vec<Shipment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_number: Option<String>,
    pub state: OrderState,
    pub email: Option<String>,
    pub currency: String,
    /// Order total in major units, e.g. `12.50`
    pub total_price: Decimal,
    /// The plugin id of the payment gateway the customer picked, e.g. `msp_ideal`
    pub payment_gateway: String,
    pub gateway_mode: GatewayMode,
    pub items: Vec<LineItem>,
    pub billing_profile: Option<AddressProfile>,
    pub shipments: Vec<Shipment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// The order id that MultiSafepay knows this order by: the order number if one has been assigned, otherwise the
    /// internal id.
    pub fn psp_order_id(&self) -> String {
        self.order_number.clone().unwrap_or_else(|| self.id.to_string())
    }

    pub fn has_shipments(&self) -> bool {
        !self.shipments.is_empty()
    }

    pub fn total_quantity(&self) -> Decimal {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// A copy of the stored document part of the order.
    pub fn details(&self) -> OrderDetails {
        OrderDetails {
            items: self.items.clone(),
            billing_profile: self.billing_profile.clone(),
            shipments: self.shipments.clone(),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
    pub id: i64,
    pub order_number: Option<String>,
    pub state: OrderState,
    pub email: Option<String>,
    pub currency: String,
    pub total_price: String,
    pub payment_gateway: String,
    pub gateway_mode: String,
    pub details: Json<OrderDetails>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = ConversionError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let total_price = Decimal::from_str(&row.total_price)
            .map_err(|e| ConversionError(format!("Order {} has an invalid total price. {e}", row.id)))?;
        let OrderDetails { items, billing_profile, shipments } = row.details.0;
        Ok(Self {
            id: row.id,
            order_number: row.order_number,
            state: row.state,
            email: row.email,
            currency: row.currency,
            total_price,
            payment_gateway: row.payment_gateway,
            gateway_mode: GatewayMode::from(row.gateway_mode),
            items,
            billing_profile,
            shipments,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub order_number: Option<String>,
    pub email: Option<String>,
    pub currency: String,
    pub total_price: Decimal,
    pub payment_gateway: String,
    pub gateway_mode: GatewayMode,
    pub details: OrderDetails,
}

impl NewOrder {
    pub fn new<S: Into<String>>(payment_gateway: S, currency: S, total_price: Decimal) -> Self {
        Self {
            order_number: None,
            email: None,
            currency: currency.into(),
            total_price,
            payment_gateway: payment_gateway.into(),
            gateway_mode: GatewayMode::NotApplicable,
            details: OrderDetails::default(),
        }
    }

    pub fn with_order_number<S: Into<String>>(mut self, order_number: S) -> Self {
        self.order_number = Some(order_number.into());
        self
    }

    pub fn with_email<S: Into<String>>(mut self, email: S) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_gateway_mode(mut self, mode: GatewayMode) -> Self {
        self.gateway_mode = mode;
        self
    }

    pub fn with_item(mut self, item: LineItem) -> Self {
        self.details.items.push(item);
        self
    }

    pub fn with_billing_profile(mut self, profile: AddressProfile) -> Self {
        self.details.billing_profile = Some(profile);
        self
    }

    pub fn with_shipment(mut self, shipment: Shipment) -> Self {
        self.details.shipments.push(shipment);
        self
    }
}

//--------------------------------------     PaymentState     ---------------------------------------------------------

/// The local state of a payment record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    #[default]
    New,
    Authorization,
    Completed,
    AuthorizationVoided,
    AuthorizationExpired,
    PartiallyRefunded,
    Refunded,
}

impl Display for PaymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentState::New => write!(f, "new"),
            PaymentState::Authorization => write!(f, "authorization"),
            PaymentState::Completed => write!(f, "completed"),
            PaymentState::AuthorizationVoided => write!(f, "authorization_voided"),
            PaymentState::AuthorizationExpired => write!(f, "authorization_expired"),
            PaymentState::PartiallyRefunded => write!(f, "partially_refunded"),
            PaymentState::Refunded => write!(f, "refunded"),
        }
    }
}

impl FromStr for PaymentState {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "authorization" => Ok(Self::Authorization),
            "completed" => Ok(Self::Completed),
            "authorization_voided" => Ok(Self::AuthorizationVoided),
            "authorization_expired" => Ok(Self::AuthorizationExpired),
            "partially_refunded" => Ok(Self::PartiallyRefunded),
            "refunded" => Ok(Self::Refunded),
            s => Err(ConversionError(format!("Invalid payment state: {s}"))),
        }
    }
}

//--------------------------------------       Payment        ---------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: i64,
    pub order_id: i64,
    pub payment_gateway: String,
    pub state: PaymentState,
    pub amount: MinorUnits,
    pub refunded_amount: MinorUnits,
    pub currency: String,
    /// The MultiSafepay transaction id. Unique across payments.
    pub remote_id: String,
    /// The last status string MultiSafepay reported for this payment.
    pub remote_state: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// The amount that can still be refunded. Only settled payments can be refunded, so this is zero for a payment
    /// that is new, authorized, voided or expired.
    pub fn refundable(&self) -> MinorUnits {
        match self.state {
            PaymentState::Completed | PaymentState::PartiallyRefunded => self.amount - self.refunded_amount,
            _ => MinorUnits::from(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPayment {
    pub order_id: i64,
    pub payment_gateway: String,
    pub state: PaymentState,
    pub amount: MinorUnits,
    pub currency: String,
    pub remote_id: String,
    pub remote_state: String,
}

impl NewPayment {
    pub fn new<S: Into<String>>(order_id: i64, payment_gateway: S, amount: MinorUnits, currency: S) -> Self {
        Self {
            order_id,
            payment_gateway: payment_gateway.into(),
            state: PaymentState::New,
            amount,
            currency: currency.into(),
            remote_id: String::default(),
            remote_state: String::default(),
        }
    }

    pub fn with_remote<S: Into<String>>(mut self, remote_id: S, remote_state: S) -> Self {
        self.remote_id = remote_id.into();
        self.remote_state = remote_state.into();
        self
    }
}

//--------------------------------------   Order activity     ---------------------------------------------------------

/// The kinds of entries written to an order's activity log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderActivityKind {
    #[serde(rename = "order_payment_link")]
    PaymentLink,
    #[serde(rename = "order_reopened")]
    Reopened,
    #[serde(rename = "order_banktransfer_started")]
    BankTransferStarted,
    #[serde(rename = "order_payment_capture")]
    PaymentCapture,
    #[serde(rename = "order_uncleared")]
    Uncleared,
    #[serde(rename = "order_new_gateway")]
    NewGateway,
    #[serde(rename = "order_partial_refund")]
    PartialRefund,
    #[serde(rename = "order_full_refund")]
    FullRefund,
}

impl OrderActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderActivityKind::PaymentLink => "order_payment_link",
            OrderActivityKind::Reopened => "order_reopened",
            OrderActivityKind::BankTransferStarted => "order_banktransfer_started",
            OrderActivityKind::PaymentCapture => "order_payment_capture",
            OrderActivityKind::Uncleared => "order_uncleared",
            OrderActivityKind::NewGateway => "order_new_gateway",
            OrderActivityKind::PartialRefund => "order_partial_refund",
            OrderActivityKind::FullRefund => "order_full_refund",
        }
    }
}

impl Display for OrderActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderActivityKind {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "order_payment_link" => Ok(Self::PaymentLink),
            "order_reopened" => Ok(Self::Reopened),
            "order_banktransfer_started" => Ok(Self::BankTransferStarted),
            "order_payment_capture" => Ok(Self::PaymentCapture),
            "order_uncleared" => Ok(Self::Uncleared),
            "order_new_gateway" => Ok(Self::NewGateway),
            "order_partial_refund" => Ok(Self::PartialRefund),
            "order_full_refund" => Ok(Self::FullRefund),
            s => Err(ConversionError(format!("Invalid activity kind: {s}"))),
        }
    }
}

/// Template parameters for an activity log entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityParams {
    pub old_gateway: String,
    pub new_gateway: String,
    pub status: String,
    pub amount: String,
    pub currency: String,
    pub msp_id: String,
    pub external_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderActivity {
    pub kind: OrderActivityKind,
    pub params: ActivityParams,
}

impl OrderActivity {
    pub fn new(kind: OrderActivityKind, params: ActivityParams) -> Self {
        Self { kind, params }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct OrderLogRow {
    pub id: i64,
    pub order_id: i64,
    pub kind: String,
    pub params: Json<ActivityParams>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLogEntry {
    pub id: i64,
    pub order_id: i64,
    pub activity: OrderActivity,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<OrderLogRow> for OrderLogEntry {
    type Error = ConversionError;

    fn try_from(row: OrderLogRow) -> Result<Self, Self::Error> {
        let kind = OrderActivityKind::from_str(&row.kind)?;
        Ok(Self {
            id: row.id,
            order_id: row.order_id,
            activity: OrderActivity::new(kind, row.params.0),
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn order_workflow_transitions() {
        assert_eq!(OrderState::Draft.next_transition(), Some(OrderTransition::Place));
        assert_eq!(OrderTransition::Place.to_state(), OrderState::Fulfillment);
        assert_eq!(OrderState::Validation.next_transition().map(|t| t.to_state()), Some(OrderState::Fulfillment));
        assert_eq!(OrderState::Fulfillment.next_transition(), Some(OrderTransition::Fulfill));
        assert_eq!(OrderTransition::Fulfill.to_state(), OrderState::Completed);
        assert_eq!(OrderState::Completed.next_transition(), None);
        assert_eq!(OrderState::Canceled.next_transition(), None);
    }

    #[test]
    fn psp_order_id_prefers_order_number() {
        let mut order = sample_order();
        assert_eq!(order.psp_order_id(), "7");
        order.order_number = Some("10042".into());
        assert_eq!(order.psp_order_id(), "10042");
    }

    #[test]
    fn activity_kinds_round_trip_through_strings() {
        let kind = OrderActivityKind::from_str("order_banktransfer_started").unwrap();
        assert_eq!(kind, OrderActivityKind::BankTransferStarted);
        assert_eq!(serde_json::to_string(&OrderActivityKind::FullRefund).unwrap(), "\"order_full_refund\"");
        assert!(OrderActivityKind::from_str("order_shipped").is_err());
    }

    #[test]
    fn percentage_detection() {
        assert!(Adjustment::percentage_promotion(dec("0.1")).is_percentage());
        assert!(!Adjustment::flat_promotion(dec("5")).is_percentage());
        let zero = Adjustment { percentage: Some(Decimal::ZERO), ..Adjustment::flat_promotion(dec("5")) };
        assert!(!zero.is_percentage());
    }

    #[test]
    fn refundable_amount() {
        let now = Utc::now();
        let payment = Payment {
            id: 1,
            order_id: 7,
            payment_gateway: "msp_ideal".into(),
            state: PaymentState::PartiallyRefunded,
            amount: MinorUnits::from(10_000),
            refunded_amount: MinorUnits::from(2_500),
            currency: "EUR".into(),
            remote_id: "tx-1".into(),
            remote_state: "completed".into(),
            created_at: now,
            updated_at: now,
        };
        assert_eq!(payment.refundable(), MinorUnits::from(7_500));

        for state in [
            PaymentState::New,
            PaymentState::Authorization,
            PaymentState::AuthorizationVoided,
            PaymentState::AuthorizationExpired,
            PaymentState::Refunded,
        ] {
            let unsettled = Payment { state, refunded_amount: MinorUnits::from(0), ..payment.clone() };
            assert_eq!(unsettled.refundable(), MinorUnits::from(0), "{state} payments cannot be refunded");
        }
    }

    fn sample_order() -> Order {
        let now = Utc::now();
        Order {
            id: 7,
            order_number: None,
            state: OrderState::Draft,
            email: None,
            currency: "EUR".into(),
            total_price: dec("10"),
            payment_gateway: "msp_ideal".into(),
            gateway_mode: GatewayMode::NotApplicable,
            items: vec![],
            billing_profile: None,
            shipments: vec![],
            created_at: now,
            updated_at: now,
        }
    }
}
