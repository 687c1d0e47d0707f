#![allow(dead_code)]

use std::sync::Arc;

use log::*;
use msp_payment_engine::{
    db_types::{NewOrder, Order},
    events::EventProducers,
    order_data::OrderPayloadBuilder,
    test_utils::{canned_transport::CannedTransport, prepare_env::new_test_database},
    CheckoutApi,
    GatewayCatalog,
    OrderManagement,
    PaymentGatewayDatabase,
    PspClients,
    ReconciliationApi,
    RefundApi,
    ShipmentApi,
    SqliteDatabase,
};
use multisafepay_tools::MspConfig;
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub type Reconciliation = ReconciliationApi<SqliteDatabase, CannedTransport>;

/// A migrated database and a canned MultiSafepay, wired together the way the server wires the real ones.
pub struct TestSystem {
    pub db: SqliteDatabase,
    pub psp: CannedTransport,
    pub clients: PspClients<CannedTransport>,
}

impl TestSystem {
    pub async fn new() -> Self {
        let db = new_test_database().await;
        let psp = CannedTransport::new();
        let catalog = Arc::new(GatewayCatalog::new().expect("Gateway catalog is incomplete"));
        let clients = PspClients::new(psp.clone(), MspConfig::default(), catalog);
        Self { db, psp, clients }
    }

    pub fn reconciliation_api(&self, producers: EventProducers) -> Reconciliation {
        ReconciliationApi::new(self.db.clone(), self.clients.clone(), producers)
    }

    pub fn refund_api(&self, producers: EventProducers) -> RefundApi<SqliteDatabase, CannedTransport> {
        RefundApi::new(self.db.clone(), self.clients.clone(), producers)
    }

    pub fn checkout_api(&self, producers: EventProducers) -> CheckoutApi<SqliteDatabase, CannedTransport> {
        let builder = OrderPayloadBuilder::new(self.clients.shared_catalog());
        CheckoutApi::new(self.db.clone(), self.clients.clone(), builder, producers)
    }

    pub fn shipment_api(&self, producers: EventProducers) -> ShipmentApi<SqliteDatabase, CannedTransport> {
        ShipmentApi::new(self.db.clone(), self.clients.clone(), producers)
    }

    pub async fn store_order(&self, order: NewOrder) -> Order {
        let id = self.db.insert_order(order).await.expect("Error inserting order").id();
        self.db.fetch_order_by_id(id).await.expect("Error fetching order").expect("Order was not stored")
    }

    pub async fn tear_down(mut self) {
        let url = self.db.url().to_string();
        if let Err(e) = self.db.close().await {
            error!("🚀️ Failed to close database: {e}");
        }
        if let Err(e) = Sqlite::drop_database(&url).await {
            warn!("🚀️ Failed to remove database {url}: {e}");
        }
    }
}
