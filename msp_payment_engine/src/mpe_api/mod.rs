//! The public face of the payment engine.
//!
//! Each API is generic over a storage backend (`B`) and a MultiSafepay transport factory (`F`), and is cheap to clone.
//!
//! * [`CheckoutApi`] starts payments and lists gateways and iDEAL issuers.
//! * [`ReconciliationApi`] processes MultiSafepay notifications.
//! * [`RefundApi`] issues refunds.
//! * [`ShipmentApi`] fulfills orders and reports shipments.
mod activity;
mod checkout_api;
mod psp_clients;
mod reconciliation_api;
mod refund_api;
mod shipment_api;

pub mod errors;

pub use activity::{params_from_state, ActivityLog};
pub use checkout_api::{CheckoutApi, PaymentLink, CHOOSE_YOUR_BANK};
pub use psp_clients::PspClients;
pub use reconciliation_api::{NotificationOutcome, ReconciliationApi};
pub use refund_api::RefundApi;
pub use shipment_api::{FulfilledOrder, ShipmentApi};
