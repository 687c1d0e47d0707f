//! MultiSafepay Payment Engine
//!
//! The payment engine lets an order-management system hand payment collection to MultiSafepay. It turns stored
//! orders into MultiSafepay order payloads, starts payments, and reconciles the notifications MultiSafepay sends back
//! into local payment and order state.
//!
//! The library is divided into these sections:
//! 1. Storage ([`mod@db`]). The traits a backend must implement, and a SQLite backend. The data types stored by a
//!    backend live in [`db_types`].
//! 2. Order data ([`order_data`]). Builds the MultiSafepay payload for an order, including tax tables, discounts,
//!    shipping and customer details.
//! 3. The gateway catalog ([`gateways`]) and the status mapping ([`status`]).
//! 4. The engine APIs ([`mod@mpe_api`]): checkout, reconciliation, refunds and shipments.
//!
//! Domain events (activity log entries, payment updates and order transitions) can be subscribed to through
//! [`events::EventHooks`].
mod db;

pub mod db_types;
pub mod events;
pub mod gateways;
pub mod helpers;
pub mod mpe_api;
pub mod order_data;
pub mod status;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::{SqliteDatabase, SqliteDatabaseError};
pub use db::traits::{InsertOrderResult, InsertPaymentResult, OrderManagement, PaymentBackend, PaymentGatewayDatabase};
pub use gateways::{GatewayCatalog, GatewayDescriptor, GatewayId, GatewayPolicy};
pub use mpe_api::{
    errors::{CheckoutError, ReconciliationError, RefundError, ShipmentError},
    CheckoutApi,
    FulfilledOrder,
    NotificationOutcome,
    PaymentLink,
    PspClients,
    ReconciliationApi,
    RefundApi,
    ShipmentApi,
};
