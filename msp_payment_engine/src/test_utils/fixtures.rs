use std::str::FromStr;

use chrono::Utc;
use multisafepay_tools::GatewayMode;
use rust_decimal::Decimal;

use crate::db_types::{
    AddressProfile,
    LineItem,
    NewOrder,
    Order,
    OrderState,
    Shipment,
    ShippingMethod,
    ShippingRateKind,
};

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).expect("Invalid decimal in test fixture")
}

pub fn address(given_name: &str, address_line1: &str, postal_code: &str) -> AddressProfile {
    AddressProfile {
        given_name: given_name.to_string(),
        family_name: "de Vries".to_string(),
        address_line1: address_line1.to_string(),
        address_line2: None,
        postal_code: postal_code.to_string(),
        locality: "Amsterdam".to_string(),
        administrative_area: None,
        country_code: "NL".to_string(),
    }
}

pub fn flat_rate_shipment(label: &str, rate_kind: ShippingRateKind, rate_amount: Decimal) -> Shipment {
    Shipment {
        tracking_code: None,
        shipping_profile: address("Jan", "Teststraat 123", "1033SC"),
        method: ShippingMethod { label: label.to_string(), rate_kind, rate_amount },
    }
}

/// An in-memory draft order with id 7, paid in EUR. The total is the sum of the item subtotals.
pub fn draft_order(payment_gateway: &str, items: Vec<LineItem>) -> Order {
    let now = Utc::now();
    let total_price = items.iter().map(LineItem::subtotal).sum();
    Order {
        id: 7,
        order_number: None,
        state: OrderState::Draft,
        email: None,
        currency: "EUR".to_string(),
        total_price,
        payment_gateway: payment_gateway.to_string(),
        gateway_mode: GatewayMode::NotApplicable,
        items,
        billing_profile: None,
        shipments: vec![],
        created_at: now,
        updated_at: now,
    }
}

/// A new order for `total` EUR with a single line item and a billing address.
pub fn new_order(order_number: &str, payment_gateway: &str, total: &str) -> NewOrder {
    NewOrder::new(payment_gateway, "EUR", dec(total))
        .with_order_number(order_number)
        .with_email("jan@example.com")
        .with_item(LineItem::new("sku-1", "Tulips", Decimal::ONE, dec(total)))
        .with_billing_profile(address("Jan", "Teststraat 123", "1033SC"))
}
