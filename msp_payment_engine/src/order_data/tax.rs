//! Shopping cart, tax table and discount construction for cart-based gateways.
//!
//! All amounts here are decimal major units. Tax and discount percentages are fractions (`0.21` for 21%).
use log::*;
use multisafepay_tools::data_objects::{
    AlternateTaxTable,
    CartItem,
    DefaultTaxRate,
    ShoppingCart,
    TaxTables,
    Weight,
};
use rust_decimal::Decimal;

use crate::db_types::{Adjustment, AdjustmentType, LineItem, Order, ShippingRateKind};

pub const DEFAULT_SELECTOR: &str = "default";
pub const ZERO_RATE_SELECTOR: &str = "BTW0";
pub const PROMOTION_SELECTOR: &str = "promotion";
pub const SHIPPING_TABLE: &str = "shipping";
pub const DISCOUNT_ITEM_ID: &str = "msp-discount";
pub const SHIPPING_ITEM_ID: &str = "msp-shipping";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DiscountKind {
    #[default]
    None,
    Percentage,
    Flat,
}

/// Running total of the promotions seen while building one cart.
///
/// The first promotion fixes the kind. Promotions of the other kind are ignored for the rest of the build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscountAccumulator {
    kind: DiscountKind,
    percentage: Decimal,
    flat_amount: Decimal,
}

impl DiscountAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(&self) -> DiscountKind {
        self.kind
    }

    pub fn percentage(&self) -> Decimal {
        self.percentage
    }

    pub fn flat_amount(&self) -> Decimal {
        self.flat_amount
    }

    pub fn is_active(&self) -> bool {
        self.percentage > Decimal::ZERO || self.flat_amount > Decimal::ZERO
    }

    /// Adds a promotion to the running total. Returns `false` if it was ignored because its kind conflicts with the
    /// kind already established.
    pub fn fold(&mut self, adjustment: &Adjustment) -> bool {
        let kind = if adjustment.is_percentage() { DiscountKind::Percentage } else { DiscountKind::Flat };
        match self.kind {
            DiscountKind::None => self.kind = kind,
            current if current == kind => {},
            current => {
                warn!(
                    "🛒️ Ignoring {kind:?} promotion '{}' because this cart already has {current:?} promotions",
                    adjustment.label
                );
                return false;
            },
        }
        match kind {
            DiscountKind::Percentage => self.percentage += adjustment.percentage.unwrap_or_default(),
            _ => self.flat_amount += adjustment.amount.unwrap_or_default().abs(),
        }
        true
    }
}

fn percentage_of(adjustment: Option<&Adjustment>) -> Decimal {
    adjustment.and_then(|a| a.percentage).unwrap_or_default()
}

/// Builds the tax tables for the cart and folds every promotion into `discounts`.
pub fn build_tax_table(items: &[LineItem], discounts: &mut DiscountAccumulator) -> TaxTables {
    let mut tables =
        TaxTables { default: DefaultTaxRate { shipping_taxed: None, rate: Decimal::ZERO }, alternate: Vec::new() };
    let no_adjustments = items.first().map(|i| i.adjustments.is_empty()).unwrap_or(true);
    if no_adjustments {
        tables.alternate.push(AlternateTaxTable::flat(SHIPPING_TABLE, Decimal::ZERO));
        return tables;
    }
    let mut tax_rate = None;
    for item in items {
        if let Some(promotion) = item.adjustment(AdjustmentType::Promotion) {
            discounts.fold(promotion);
            if tables.alternate_named(PROMOTION_SELECTOR).is_none() {
                tables.alternate.push(AlternateTaxTable::flat(PROMOTION_SELECTOR, Decimal::ZERO));
            }
        }
        if tax_rate.is_none() {
            tax_rate = item.adjustment(AdjustmentType::Tax).and_then(|a| a.percentage);
        }
    }
    if let Some(rate) = tax_rate {
        tables.default.rate = rate;
        if let Some(rule) = tables.alternate.first_mut().and_then(|t| t.rules.first_mut()) {
            rule.rate = rate;
        }
    }
    tables.alternate.push(AlternateTaxTable::flat(ZERO_RATE_SELECTOR, Decimal::ZERO));
    tables
}

/// The single cart row that carries the accumulated discount, if there is one.
///
/// A percentage discount is applied per item, using each item's own promotion percentage against its original unit
/// price. A flat discount is taken off once.
pub fn build_discount_row(discounts: &DiscountAccumulator, items: &[LineItem], tax_included: bool) -> Option<CartItem> {
    if !discounts.is_active() {
        return None;
    }
    let price = match discounts.kind() {
        DiscountKind::Percentage => -items
            .iter()
            .map(|item| {
                let promotion = item.adjustment(AdjustmentType::Promotion).filter(|a| a.is_percentage());
                item.subtotal() * percentage_of(promotion)
            })
            .sum::<Decimal>(),
        DiscountKind::Flat => -discounts.flat_amount(),
        DiscountKind::None => return None,
    };
    let selector = if tax_included { ZERO_RATE_SELECTOR } else { PROMOTION_SELECTOR };
    Some(CartItem {
        name: "Discount".to_string(),
        description: String::new(),
        unit_price: price,
        quantity: Decimal::ONE,
        merchant_item_id: DISCOUNT_ITEM_ID.to_string(),
        tax_table_selector: selector.to_string(),
        weight: None,
    })
}

/// The shipping cost as a cart row. Omitted when the order has no shipments or shipping is free.
pub fn build_shipping_line(order: &Order, total_quantity: Decimal) -> Option<CartItem> {
    let method = &order.shipments.first()?.method;
    let price = match method.rate_kind {
        ShippingRateKind::FlatRate => method.rate_amount,
        ShippingRateKind::FlatRatePerItem => method.rate_amount * total_quantity,
    };
    if price.is_zero() {
        trace!("🛒️ Free shipping on order {}. No shipping line added.", order.id);
        return None;
    }
    Some(CartItem {
        name: method.label.clone(),
        description: String::new(),
        unit_price: price,
        quantity: Decimal::ONE,
        merchant_item_id: SHIPPING_ITEM_ID.to_string(),
        tax_table_selector: ZERO_RATE_SELECTOR.to_string(),
        weight: None,
    })
}

/// Builds the cart rows for the order: one per line item, then the discount row and the shipping line.
///
/// `discounts` must already hold the order's promotions, see [`build_tax_table`].
pub fn build_shopping_cart(order: &Order, discounts: &DiscountAccumulator) -> ShoppingCart {
    let mut items = Vec::with_capacity(order.items.len() + 2);
    let mut tax_included = false;
    for item in &order.items {
        let tax = item.adjustment(AdjustmentType::Tax).filter(|a| a.included);
        // Tax-included prices go in without tax. The default table adds it back.
        let unit_price = match tax {
            Some(tax) => {
                tax_included = true;
                item.unit_price / (Decimal::ONE + percentage_of(Some(tax)))
            },
            None => item.unit_price,
        };
        items.push(CartItem {
            name: item.title.clone(),
            description: String::new(),
            unit_price,
            quantity: item.quantity,
            merchant_item_id: item.product_id.clone(),
            tax_table_selector: DEFAULT_SELECTOR.to_string(),
            weight: item.weight.as_ref().map(|w| Weight { unit: w.unit.clone(), value: w.number }),
        });
    }
    if let Some(discount) = build_discount_row(discounts, &order.items, tax_included) {
        items.push(discount);
    }
    if let Some(shipping) = build_shipping_line(order, order.total_quantity()) {
        items.push(shipping);
    }
    ShoppingCart { items }
}
