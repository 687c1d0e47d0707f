use msp_common::MinorUnits;

use crate::{
    db::traits::InsertPaymentResult,
    db_types::{NewPayment, Payment, PaymentState},
};

/// Storage of the payment records that track MultiSafepay transactions.
#[allow(async_fn_in_trait)]
pub trait PaymentGatewayDatabase: Clone {
    type Error: std::error::Error;

    /// The URL of the database
    fn url(&self) -> &str;

    /// Fetches the payment with the given remote id, creating it from `payment` if there is none. Concurrent calls
    /// for the same remote id result in exactly one stored payment.
    async fn fetch_or_create_payment(&self, payment: NewPayment) -> Result<InsertPaymentResult, Self::Error>;

    async fn fetch_payment(&self, id: i64) -> Result<Option<Payment>, Self::Error>;

    async fn fetch_payment_by_remote_id(&self, remote_id: &str) -> Result<Option<Payment>, Self::Error>;

    async fn fetch_payments_for_order(&self, order_id: i64) -> Result<Vec<Payment>, Self::Error>;

    /// Sets the local state and records the last status MultiSafepay reported.
    async fn update_payment_state(
        &self,
        id: i64,
        state: PaymentState,
        remote_state: &str,
    ) -> Result<Payment, Self::Error>;

    /// Adds `amount` to the refunded total in a single atomic step, and marks the payment as partially or fully
    /// refunded. Fails without changing anything if the refunded total would exceed the payment amount.
    async fn record_refund(&self, id: i64, amount: MinorUnits) -> Result<Payment, Self::Error>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
