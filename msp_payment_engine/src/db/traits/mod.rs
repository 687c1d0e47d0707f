//! # Database management and control.
//!
//! These traits are the contract a storage backend must honour to serve the MultiSafepay payment engine.
//!
//! * [`OrderManagement`] covers orders, their fulfillment workflow and their activity log.
//! * [`PaymentGatewayDatabase`] covers the payment records that mirror MultiSafepay transactions.
//!
//! The engine APIs need both, which [`PaymentBackend`] expresses. Any type that implements the two traits is a
//! `PaymentBackend`.
mod data_objects;
mod order_management;
mod payment_gateway_database;

pub use data_objects::{InsertOrderResult, InsertPaymentResult};
pub use order_management::OrderManagement;
pub use payment_gateway_database::PaymentGatewayDatabase;

pub trait PaymentBackend: OrderManagement + PaymentGatewayDatabase {}

impl<T> PaymentBackend for T where T: OrderManagement + PaymentGatewayDatabase {}
