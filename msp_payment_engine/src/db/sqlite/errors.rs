use thiserror::Error;

use crate::db_types::{ConversionError, OrderState, OrderTransition};

#[derive(Debug, Error)]
pub enum SqliteDatabaseError {
    #[error("Database connection error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("Database migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
    #[error("Database query error: {0}")]
    QueryError(String),
    #[error("Stored data could not be read. {0}")]
    ConversionError(#[from] ConversionError),
    #[error("Order {0} does not exist")]
    OrderNotFound(i64),
    #[error("Payment {0} does not exist")]
    PaymentNotFound(i64),
    #[error("Cannot {transition} order {id} while it is {state}")]
    InvalidTransition { id: i64, transition: OrderTransition, state: OrderState },
    #[error("Order {0} has no shipments")]
    NoShipment(i64),
    #[error("Payment {id} is not settled or refunding {amount} would exceed its amount")]
    RefundExceedsPayment { id: i64, amount: String },
}
