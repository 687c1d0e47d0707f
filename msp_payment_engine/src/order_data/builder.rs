use std::{fmt::Write, sync::Arc};

use log::*;
use msp_common::{MinorUnits, MinorUnitsConversionError};
use multisafepay_tools::{
    data_objects::{CheckoutOptions, CustomerBlock, GatewayInfo, OrderType, PaymentOptions, PluginInfo, PspOrderPayload},
    DEFAULT_SECONDS_ACTIVE,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    db_types::Order,
    gateways::{GatewayCatalog, GatewayId},
    order_data::{
        customer::{resolve_customer, RequestContext},
        tax::{build_shopping_cart, build_tax_table, DiscountAccumulator},
        transformers::PayloadTransformers,
    },
};

#[derive(Debug, Clone, Error)]
pub enum PayloadError {
    #[error("{0} is not a MultiSafepay gateway")]
    UnknownGateway(String),
    #[error("Invalid payment amount. {0}")]
    InvalidAmount(#[from] MinorUnitsConversionError),
}

/// The payment being started for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub order_id: i64,
    /// Amount in major units
    pub amount: Decimal,
    pub currency: String,
}

impl PaymentRequest {
    pub fn for_order(order: &Order) -> Self {
        Self { order_id: order.id, amount: order.total_price, currency: order.currency.clone() }
    }
}

/// Everything about the checkout that is not stored with the order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutContext {
    pub notification_url: String,
    pub redirect_url: String,
    pub cancel_url: String,
    pub request: RequestContext,
}

/// Builds [`PspOrderPayload`]s for orders.
#[derive(Debug, Clone)]
pub struct OrderPayloadBuilder {
    catalog: Arc<GatewayCatalog>,
    transformers: PayloadTransformers,
    plugin: PluginInfo,
    seconds_active: u64,
}

impl OrderPayloadBuilder {
    pub fn new(catalog: Arc<GatewayCatalog>) -> Self {
        Self {
            catalog,
            transformers: PayloadTransformers::default(),
            plugin: default_plugin_info(),
            seconds_active: DEFAULT_SECONDS_ACTIVE,
        }
    }

    pub fn with_seconds_active(mut self, seconds_active: u64) -> Self {
        self.seconds_active = seconds_active;
        self
    }

    pub fn with_transformers(mut self, transformers: PayloadTransformers) -> Self {
        self.transformers = transformers;
        self
    }

    pub fn with_plugin_info(mut self, plugin: PluginInfo) -> Self {
        self.plugin = plugin;
        self
    }

    pub fn catalog(&self) -> &GatewayCatalog {
        &self.catalog
    }

    pub fn build(
        &self,
        order: &Order,
        context: &CheckoutContext,
        payment: &PaymentRequest,
        gateway_info: GatewayInfo,
    ) -> Result<PspOrderPayload, PayloadError> {
        let descriptor = self
            .catalog
            .lookup(&order.payment_gateway)
            .ok_or_else(|| PayloadError::UnknownGateway(order.payment_gateway.clone()))?;
        let order_type = if descriptor.id == GatewayId::Ideal && gateway_info.has_no_issuer() {
            trace!("🛒️ No iDEAL issuer chosen for order {}. Using the payment page instead.", order.id);
            OrderType::Redirect
        } else {
            descriptor.order_type
        };
        let (shopping_cart, checkout_options) = if descriptor.shopping_cart {
            let mut discounts = DiscountAccumulator::new();
            let tax_tables = build_tax_table(&order.items, &mut discounts);
            let cart = build_shopping_cart(order, &discounts);
            (Some(cart), Some(CheckoutOptions { tax_tables }))
        } else {
            (None, None)
        };
        let delivery = if order.has_shipments() {
            resolve_customer(order, true, &context.request)
        } else {
            CustomerBlock::default()
        };
        let order_id = order.order_number.clone().unwrap_or_else(|| payment.order_id.to_string());
        let mut payload = PspOrderPayload {
            order_type,
            gateway: descriptor.code.to_string(),
            order_id: order_id.clone(),
            currency: payment.currency.clone(),
            amount: MinorUnits::from_major(payment.amount)?,
            items: items_summary(order),
            description: order_id,
            seconds_active: self.seconds_active,
            manual: "false".to_string(),
            payment_options: PaymentOptions {
                notification_url: context.notification_url.clone(),
                redirect_url: context.redirect_url.clone(),
                cancel_url: context.cancel_url.clone(),
                close_window: "TRUE".to_string(),
            },
            customer: resolve_customer(order, false, &context.request),
            delivery,
            shopping_cart,
            checkout_options,
            gateway_info,
            plugin: self.plugin.clone(),
        };
        let gateway_info = payload.gateway_info.clone();
        self.transformers.apply(&mut payload, payment, &gateway_info);
        debug!("🛒️ Built {} payload for order {} ({})", payload.gateway, payload.order_id, payload.amount);
        Ok(payload)
    }
}

/// A short HTML list of what was ordered, shown on the payment page.
pub fn items_summary(order: &Order) -> String {
    let mut html = String::from("<ul>\n");
    for item in &order.items {
        let _ = writeln!(html, "<li>{}&times; : {}</li>", item.quantity.normalize(), item.title);
    }
    html.push_str("</ul>");
    html
}

fn default_plugin_info() -> PluginInfo {
    let version = env!("CARGO_PKG_VERSION");
    PluginInfo {
        shop: "msp_payment_server".to_string(),
        shop_version: version.to_string(),
        plugin_version: format!(" - Plugin {version}"),
        partner: "MultiSafepay".to_string(),
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{
        db_types::{Adjustment, LineItem, ShippingRateKind},
        test_utils::fixtures::{address, dec, draft_order, flat_rate_shipment},
    };

    fn builder() -> OrderPayloadBuilder {
        OrderPayloadBuilder::new(Arc::new(GatewayCatalog::new().unwrap()))
    }

    fn context() -> CheckoutContext {
        CheckoutContext {
            notification_url: "https://shop.example.com/notify".into(),
            redirect_url: "https://shop.example.com/complete".into(),
            cancel_url: "https://shop.example.com/cancel".into(),
            request: RequestContext::new("nl"),
        }
    }

    #[test]
    fn ideal_payload() {
        let mut order = draft_order("msp_ideal", vec![LineItem::new("sku-1", "Tulips", dec("2"), dec("12.50"))]);
        order.order_number = Some("10042".into());
        order.total_price = dec("25");
        order.billing_profile = Some(address("Jan", "Teststraat 123", "1033SC"));
        let payment = PaymentRequest::for_order(&order);
        let payload = builder().build(&order, &context(), &payment, GatewayInfo::with_issuer("3151")).unwrap();
        assert_eq!(payload.order_type, OrderType::Direct);
        assert_eq!(payload.gateway, "IDEAL");
        assert_eq!(payload.order_id, "10042");
        assert_eq!(payload.description, "10042");
        assert_eq!(payload.amount, MinorUnits::from(2500));
        assert_eq!(payload.items, "<ul>\n<li>2&times; : Tulips</li>\n</ul>");
        assert_eq!(payload.manual, "false");
        assert_eq!(payload.payment_options.close_window, "TRUE");
        assert_eq!(payload.customer.house_number.as_deref(), Some("123"));
        assert!(payload.delivery.is_empty());
        assert!(payload.shopping_cart.is_none());
        assert!(payload.checkout_options.is_none());
        assert_eq!(payload.plugin.partner, "MultiSafepay");
        assert_eq!(payload.seconds_active, DEFAULT_SECONDS_ACTIVE);
    }

    #[test]
    fn ideal_without_issuer_redirects() {
        let order = draft_order("msp_ideal", vec![]);
        let payment = PaymentRequest::for_order(&order);
        let info = GatewayInfo::with_issuer("none");
        let payload = builder().build(&order, &context(), &payment, info).unwrap();
        assert_eq!(payload.order_type, OrderType::Redirect);
        assert_eq!(payload.order_id, order.id.to_string());
    }

    #[test]
    fn unknown_gateways_are_rejected() {
        let order = draft_order("manual", vec![]);
        let payment = PaymentRequest::for_order(&order);
        let err = builder().build(&order, &context(), &payment, GatewayInfo::default()).unwrap_err();
        assert!(matches!(err, PayloadError::UnknownGateway(g) if g == "manual"));
    }

    #[test]
    fn cart_gateways_carry_a_cart_that_adds_up() {
        let mut order = draft_order("msp_klarna", vec![
            LineItem::new("sku-1", "Tulips", dec("3"), dec("9.99"))
                .with_adjustment(Adjustment::percentage_promotion(dec("0.15")))
                .with_adjustment(Adjustment::tax(dec("0.09"), false)),
            LineItem::new("sku-2", "Vase", dec("1"), dec("24.95")).with_adjustment(Adjustment::tax(dec("0.21"), false)),
        ]);
        let mut shipment = flat_rate_shipment("Express", ShippingRateKind::FlatRate, dec("6.95"));
        shipment.shipping_profile = address("Jan", "Teststraat 123", "1033SC");
        order.shipments.push(shipment);
        // 29.97 - 4.4955 + 24.95 + 6.95
        order.total_price = dec("57.3745");
        let payment = PaymentRequest::for_order(&order);
        let payload = builder().build(&order, &context(), &payment, GatewayInfo::default()).unwrap();
        let cart = payload.shopping_cart.as_ref().unwrap();
        assert_eq!(cart.items.len(), 4);
        let cart_minor = (cart.total() * Decimal::from(100)).round();
        assert!((cart_minor - Decimal::from(payload.amount.value())).abs() <= Decimal::ONE);
        let tables = &payload.checkout_options.as_ref().unwrap().tax_tables;
        assert_eq!(tables.default.rate, dec("0.09"));
        assert!(tables.alternate_named("promotion").is_some());
        assert_eq!(payload.delivery.address1.as_deref(), Some("Teststraat"));
    }

    #[test]
    fn transformers_run_specific_first() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut transformers = PayloadTransformers::new();
        let c = calls.clone();
        transformers.register_for_all(move |payload, _, _| {
            assert_eq!(c.fetch_add(1, Ordering::SeqCst), 1);
            payload.description.push_str(" (any)");
        });
        let c = calls.clone();
        transformers.register("ideal", move |payload, payment, _| {
            assert_eq!(c.fetch_add(1, Ordering::SeqCst), 0);
            payload.description = format!("Order {}", payment.order_id);
        });
        transformers.register("klarna", |payload, _, _| payload.description = "wrong gateway".into());
        let order = draft_order("msp_ideal", vec![]);
        let payment = PaymentRequest::for_order(&order);
        let payload = builder()
            .with_transformers(transformers)
            .build(&order, &context(), &payment, GatewayInfo::with_issuer("3151"))
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(payload.description, format!("Order {} (any)", order.id));
    }
}
