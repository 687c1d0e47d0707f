use log::*;
use sqlx::{types::Json, SqliteConnection};

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{OrderActivity, OrderLogEntry, OrderLogRow},
};

pub async fn insert_log(
    order_id: i64,
    activity: &OrderActivity,
    conn: &mut SqliteConnection,
) -> Result<i64, SqliteDatabaseError> {
    let id: i64 = sqlx::query_scalar("INSERT INTO order_logs (order_id, kind, params) VALUES ($1, $2, $3) RETURNING id")
        .bind(order_id)
        .bind(activity.kind.as_str())
        .bind(Json(&activity.params))
        .fetch_one(conn)
        .await?;
    trace!("🗃️ Logged {} for order {order_id}", activity.kind);
    Ok(id)
}

pub async fn fetch_logs(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderLogEntry>, SqliteDatabaseError> {
    let rows = sqlx::query_as::<_, OrderLogRow>(
        "SELECT id, order_id, kind, params, created_at FROM order_logs WHERE order_id = $1 ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;
    rows.into_iter().map(|r| OrderLogEntry::try_from(r).map_err(SqliteDatabaseError::from)).collect()
}
