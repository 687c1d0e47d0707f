use std::fmt::Display;

use msp_common::MinorUnits;
use multisafepay_tools::MspApiError;
use thiserror::Error;

use crate::{db_types::OrderState, order_data::PayloadError};

#[derive(Debug, Clone, Error)]
pub enum CheckoutError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(i64),
    #[error("Order {id} cannot be paid for while it is {state}")]
    OrderNotPayable { id: i64, state: OrderState },
    #[error("{gateway} is not available for this order. {reason}")]
    GatewayUnavailable { gateway: String, reason: String },
    #[error("Could not build the order payload. {0}")]
    Payload(#[from] PayloadError),
    #[error("MultiSafepay error. {0}")]
    PaymentGateway(#[from] MspApiError),
}

impl CheckoutError {
    pub fn database<E: Display>(e: E) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum ReconciliationError {
    #[error("The notification did not carry a transaction id")]
    MissingTransactionId,
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("MultiSafepay error. {0}")]
    PaymentGateway(#[from] MspApiError),
}

impl ReconciliationError {
    pub fn database<E: Display>(e: E) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum RefundError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Payment {0} does not exist")]
    PaymentNotFound(i64),
    #[error("Order {0} does not exist")]
    OrderNotFound(i64),
    #[error("Cannot refund {requested}. At most {available} can be refunded.")]
    InvalidRefundAmount { requested: MinorUnits, available: MinorUnits },
    #[error("MultiSafepay declined the refund. {}", .info)]
    RefundDeclined { code: Option<i64>, info: String },
    #[error("MultiSafepay error. {0}")]
    PaymentGateway(#[from] MspApiError),
}

impl RefundError {
    pub fn database<E: Display>(e: E) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum ShipmentError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(i64),
    #[error("Order {id} cannot be fulfilled while it is {state}")]
    NotFulfillable { id: i64, state: OrderState },
    #[error("MultiSafepay error. {0}")]
    PaymentGateway(#[from] MspApiError),
}

impl ShipmentError {
    pub fn database<E: Display>(e: E) -> Self {
        Self::DatabaseError(e.to_string())
    }
}
