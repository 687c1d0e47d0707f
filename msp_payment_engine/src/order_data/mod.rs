//! Turns a stored order into the payload MultiSafepay expects when an order is created.
mod builder;
mod customer;
mod tax;
mod transformers;

pub use builder::{items_summary, CheckoutContext, OrderPayloadBuilder, PayloadError, PaymentRequest};
pub use customer::{forwarded_ip, locale_for, resolve_customer, RequestContext};
pub use tax::{
    build_discount_row,
    build_shipping_line,
    build_shopping_cart,
    build_tax_table,
    DiscountAccumulator,
    DiscountKind,
};
pub use transformers::{PayloadTransformer, PayloadTransformers};
