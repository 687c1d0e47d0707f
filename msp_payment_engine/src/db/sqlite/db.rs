//! `SqliteDatabase` is the SQLite backend of the payment engine. It implements every trait in [`crate::db::traits`].
use std::fmt::Debug;

use log::*;
use msp_common::MinorUnits;
use sqlx::SqlitePool;

use super::{db_url, new_pool, order_logs, orders, payments, SqliteDatabaseError};
use crate::{
    db::traits::{InsertOrderResult, InsertPaymentResult, OrderManagement, PaymentGatewayDatabase},
    db_types::{NewOrder, NewPayment, Order, OrderActivity, OrderLogEntry, OrderTransition, Payment, PaymentState},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Connects to the database named by `MSP_DATABASE_URL`.
    pub async fn new(max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date. Already applied migrations are skipped.
    pub async fn run_migrations(&self) -> Result<(), SqliteDatabaseError> {
        sqlx::migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        debug!("🗃️ Migrations complete");
        Ok(())
    }
}

impl OrderManagement for SqliteDatabase {
    type Error = SqliteDatabaseError;

    async fn insert_order(&self, order: NewOrder) -> Result<InsertOrderResult, Self::Error> {
        let mut tx = self.pool.begin().await?;
        let result = orders::idempotent_insert(order, &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }

    async fn fetch_order_by_id(&self, id: i64) -> Result<Option<Order>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_by_id(id, &mut conn).await
    }

    async fn fetch_order_by_number(&self, order_number: &str) -> Result<Option<Order>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_by_number(order_number, &mut conn).await
    }

    async fn apply_transition(&self, id: i64, transition: OrderTransition) -> Result<Order, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        orders::apply_transition(id, transition, &mut conn).await
    }

    async fn set_tracking_code(&self, id: i64, tracking_code: &str) -> Result<Order, Self::Error> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order_by_id(id, &mut tx).await?.ok_or(SqliteDatabaseError::OrderNotFound(id))?;
        let mut details = order.details();
        let shipment = details.shipments.first_mut().ok_or(SqliteDatabaseError::NoShipment(id))?;
        shipment.tracking_code = Some(tracking_code.to_string());
        orders::update_details(id, &details, &mut tx).await?;
        let order = orders::fetch_order_by_id(id, &mut tx).await?.ok_or(SqliteDatabaseError::OrderNotFound(id))?;
        tx.commit().await?;
        debug!("🗃️ Tracking code {tracking_code} set for order {id}");
        Ok(order)
    }

    async fn insert_order_log(&self, order_id: i64, activity: &OrderActivity) -> Result<i64, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        order_logs::insert_log(order_id, activity, &mut conn).await
    }

    async fn fetch_order_log(&self, order_id: i64) -> Result<Vec<OrderLogEntry>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        order_logs::fetch_logs(order_id, &mut conn).await
    }
}

impl PaymentGatewayDatabase for SqliteDatabase {
    type Error = SqliteDatabaseError;

    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch_or_create_payment(&self, payment: NewPayment) -> Result<InsertPaymentResult, Self::Error> {
        let mut tx = self.pool.begin().await?;
        let result = payments::idempotent_insert(payment, &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }

    async fn fetch_payment(&self, id: i64) -> Result<Option<Payment>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        payments::fetch_payment(id, &mut conn).await
    }

    async fn fetch_payment_by_remote_id(&self, remote_id: &str) -> Result<Option<Payment>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        payments::fetch_payment_by_remote_id(remote_id, &mut conn).await
    }

    async fn fetch_payments_for_order(&self, order_id: i64) -> Result<Vec<Payment>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        payments::fetch_payments_for_order(order_id, &mut conn).await
    }

    async fn update_payment_state(
        &self,
        id: i64,
        state: PaymentState,
        remote_state: &str,
    ) -> Result<Payment, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        payments::update_state(id, state, remote_state, &mut conn).await
    }

    async fn record_refund(&self, id: i64, amount: MinorUnits) -> Result<Payment, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        payments::add_refund(id, amount, &mut conn).await
    }

    async fn close(&mut self) -> Result<(), Self::Error> {
        self.pool.close().await;
        Ok(())
    }
}
