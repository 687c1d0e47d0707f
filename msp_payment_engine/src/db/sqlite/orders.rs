use log::*;
use sqlx::{types::Json, SqliteConnection};

use crate::{
    db::{sqlite::SqliteDatabaseError, traits::InsertOrderResult},
    db_types::{NewOrder, Order, OrderDetails, OrderRow, OrderTransition},
};

const SELECT_ORDER: &str = r#"
    SELECT
        id,
        order_number,
        state,
        email,
        currency,
        total_price,
        payment_gateway,
        gateway_mode,
        details,
        created_at,
        updated_at
    FROM orders
"#;

/// Inserts the order unless one with the same order number already exists. This is not atomic on its own. Run it
/// inside a transaction and pass `&mut *tx` as the connection if you need atomicity.
pub async fn idempotent_insert(
    order: NewOrder,
    conn: &mut SqliteConnection,
) -> Result<InsertOrderResult, SqliteDatabaseError> {
    if let Some(number) = &order.order_number {
        if let Some(existing) = fetch_order_by_number(number, &mut *conn).await? {
            return Ok(InsertOrderResult::AlreadyExists(existing.id));
        }
    }
    let result: Result<i64, sqlx::Error> = sqlx::query_scalar(
        r#"
            INSERT INTO orders (order_number, email, currency, total_price, payment_gateway, gateway_mode, details)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id;
        "#,
    )
    .bind(&order.order_number)
    .bind(&order.email)
    .bind(&order.currency)
    .bind(order.total_price.to_string())
    .bind(&order.payment_gateway)
    .bind(order.gateway_mode.to_string())
    .bind(Json(&order.details))
    .fetch_one(&mut *conn)
    .await;
    match result {
        Ok(id) => {
            debug!("🗃️ Order {id} ({:?}) saved", order.order_number);
            Ok(InsertOrderResult::Inserted(id))
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            let number = order.order_number.unwrap_or_default();
            let existing = fetch_order_by_number(&number, conn)
                .await?
                .ok_or_else(|| SqliteDatabaseError::QueryError(format!("Order {number} vanished after insert")))?;
            Ok(InsertOrderResult::AlreadyExists(existing.id))
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_order_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, SqliteDatabaseError> {
    let sql = format!("{SELECT_ORDER} WHERE id = $1");
    let row = sqlx::query_as::<_, OrderRow>(&sql).bind(id).fetch_optional(conn).await?;
    row.map(Order::try_from).transpose().map_err(SqliteDatabaseError::from)
}

pub async fn fetch_order_by_number(
    order_number: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, SqliteDatabaseError> {
    let sql = format!("{SELECT_ORDER} WHERE order_number = $1");
    let row = sqlx::query_as::<_, OrderRow>(&sql).bind(order_number).fetch_optional(conn).await?;
    row.map(Order::try_from).transpose().map_err(SqliteDatabaseError::from)
}

/// Moves the order from the transition's source state to its target. The state check and the update are a single
/// statement, so two concurrent transitions cannot both succeed.
pub async fn apply_transition(
    id: i64,
    transition: OrderTransition,
    conn: &mut SqliteConnection,
) -> Result<Order, SqliteDatabaseError> {
    let from = transition.from_state();
    let to = transition.to_state();
    let result = sqlx::query(
        "UPDATE orders SET state = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND state = $3",
    )
    .bind(to)
    .bind(id)
    .bind(from)
    .execute(&mut *conn)
    .await?;
    let order = fetch_order_by_id(id, conn).await?.ok_or(SqliteDatabaseError::OrderNotFound(id))?;
    if result.rows_affected() == 0 {
        return Err(SqliteDatabaseError::InvalidTransition { id, transition, state: order.state });
    }
    debug!("🗃️ Order {id} moved from {from} to {to}");
    Ok(order)
}

pub async fn update_details(
    id: i64,
    details: &OrderDetails,
    conn: &mut SqliteConnection,
) -> Result<(), SqliteDatabaseError> {
    let result = sqlx::query("UPDATE orders SET details = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
        .bind(Json(details))
        .bind(id)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(SqliteDatabaseError::OrderNotFound(id));
    }
    trace!("🗃️ Details for order {id} updated");
    Ok(())
}
