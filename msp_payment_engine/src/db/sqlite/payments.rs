use log::*;
use msp_common::MinorUnits;
use sqlx::SqliteConnection;

use crate::{
    db::{sqlite::SqliteDatabaseError, traits::InsertPaymentResult},
    db_types::{NewPayment, Payment, PaymentState},
};

const SELECT_PAYMENT: &str = r#"
    SELECT
        id,
        order_id,
        payment_gateway,
        state,
        amount,
        refunded_amount,
        currency,
        remote_id,
        remote_state,
        created_at,
        updated_at
    FROM payments
"#;

/// Stores the payment unless one with the same remote id exists already. The UNIQUE constraint on `remote_id` is
/// the final arbiter, so this is safe against concurrent inserts even outside a transaction.
pub async fn idempotent_insert(
    payment: NewPayment,
    conn: &mut SqliteConnection,
) -> Result<InsertPaymentResult, SqliteDatabaseError> {
    if let Some(existing) = fetch_payment_by_remote_id(&payment.remote_id, &mut *conn).await? {
        return Ok(InsertPaymentResult::AlreadyExists(existing));
    }
    let result: Result<i64, sqlx::Error> = sqlx::query_scalar(
        r#"
            INSERT INTO payments (order_id, payment_gateway, state, amount, currency, remote_id, remote_state)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id;
        "#,
    )
    .bind(payment.order_id)
    .bind(&payment.payment_gateway)
    .bind(payment.state)
    .bind(payment.amount)
    .bind(&payment.currency)
    .bind(&payment.remote_id)
    .bind(&payment.remote_state)
    .fetch_one(&mut *conn)
    .await;
    match result {
        Ok(id) => {
            let stored = fetch_payment(id, conn).await?.ok_or(SqliteDatabaseError::PaymentNotFound(id))?;
            debug!("🗃️ Payment {id} for {} created for order {}", payment.remote_id, payment.order_id);
            Ok(InsertPaymentResult::Inserted(stored))
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            debug!("🗃️ Payment for {} was created concurrently", payment.remote_id);
            let existing = fetch_payment_by_remote_id(&payment.remote_id, conn).await?.ok_or_else(|| {
                SqliteDatabaseError::QueryError(format!("Payment {} vanished after insert", payment.remote_id))
            })?;
            Ok(InsertPaymentResult::AlreadyExists(existing))
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_payment(id: i64, conn: &mut SqliteConnection) -> Result<Option<Payment>, SqliteDatabaseError> {
    let sql = format!("{SELECT_PAYMENT} WHERE id = $1");
    let payment = sqlx::query_as::<_, Payment>(&sql).bind(id).fetch_optional(conn).await?;
    Ok(payment)
}

pub async fn fetch_payment_by_remote_id(
    remote_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, SqliteDatabaseError> {
    let sql = format!("{SELECT_PAYMENT} WHERE remote_id = $1");
    let payment = sqlx::query_as::<_, Payment>(&sql).bind(remote_id).fetch_optional(conn).await?;
    Ok(payment)
}

pub async fn fetch_payments_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Payment>, SqliteDatabaseError> {
    let sql = format!("{SELECT_PAYMENT} WHERE order_id = $1 ORDER BY id");
    let payments = sqlx::query_as::<_, Payment>(&sql).bind(order_id).fetch_all(conn).await?;
    Ok(payments)
}

pub async fn update_state(
    id: i64,
    state: PaymentState,
    remote_state: &str,
    conn: &mut SqliteConnection,
) -> Result<Payment, SqliteDatabaseError> {
    let result = sqlx::query(
        "UPDATE payments SET state = $1, remote_state = $2, updated_at = CURRENT_TIMESTAMP WHERE id = $3",
    )
    .bind(state)
    .bind(remote_state)
    .bind(id)
    .execute(&mut *conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(SqliteDatabaseError::PaymentNotFound(id));
    }
    trace!("🗃️ Payment {id} is now {state} ({remote_state})");
    fetch_payment(id, conn).await?.ok_or(SqliteDatabaseError::PaymentNotFound(id))
}

/// Adds `amount` to the refunded total of a settled payment. The bound check and the update are one statement, so
/// concurrent refunds can never push the total past the payment amount.
pub async fn add_refund(
    id: i64,
    amount: MinorUnits,
    conn: &mut SqliteConnection,
) -> Result<Payment, SqliteDatabaseError> {
    let result = sqlx::query(
        r#"
            UPDATE payments SET
                refunded_amount = refunded_amount + ?1,
                state = CASE WHEN refunded_amount + ?1 >= amount THEN ?2 ELSE ?3 END,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ?4 AND ?1 > 0 AND refunded_amount + ?1 <= amount AND state IN (?5, ?3)
        "#,
    )
    .bind(amount)
    .bind(PaymentState::Refunded)
    .bind(PaymentState::PartiallyRefunded)
    .bind(id)
    .bind(PaymentState::Completed)
    .execute(&mut *conn)
    .await?;
    let payment = fetch_payment(id, conn).await?.ok_or(SqliteDatabaseError::PaymentNotFound(id))?;
    if result.rows_affected() == 0 {
        return Err(SqliteDatabaseError::RefundExceedsPayment { id, amount: amount.to_string() });
    }
    debug!("🗃️ Refunded {amount} of payment {id}. {} refunded in total.", payment.refunded_amount);
    Ok(payment)
}
