use crate::{
    db::traits::InsertOrderResult,
    db_types::{NewOrder, Order, OrderActivity, OrderLogEntry, OrderTransition},
};

/// Storage of orders, their place in the fulfillment workflow and their activity log.
///
/// Backends must not cache orders in-process. Every fetch reflects the latest committed state.
#[allow(async_fn_in_trait)]
pub trait OrderManagement: Clone {
    type Error: std::error::Error;

    /// Stores a new order. An order whose order number already exists is not stored again, and the id of the existing
    /// order is returned instead.
    async fn insert_order(&self, order: NewOrder) -> Result<InsertOrderResult, Self::Error>;

    async fn fetch_order_by_id(&self, id: i64) -> Result<Option<Order>, Self::Error>;

    async fn fetch_order_by_number(&self, order_number: &str) -> Result<Option<Order>, Self::Error>;

    /// Moves the order along the workflow. Fails if the order is not in the transition's source state.
    async fn apply_transition(&self, id: i64, transition: OrderTransition) -> Result<Order, Self::Error>;

    /// Attaches the tracking code to the order's first shipment.
    async fn set_tracking_code(&self, id: i64, tracking_code: &str) -> Result<Order, Self::Error>;

    /// Appends an entry to the order's activity log and returns its id.
    async fn insert_order_log(&self, order_id: i64, activity: &OrderActivity) -> Result<i64, Self::Error>;

    /// The order's activity log, oldest first.
    async fn fetch_order_log(&self, order_id: i64) -> Result<Vec<OrderLogEntry>, Self::Error>;
}
