use std::sync::Arc;

use actix_web::{http::StatusCode, test, test::TestRequest, App};
use log::*;
use msp_common::Secret;
use msp_payment_engine::{
    db_types::{NewOrder, Order},
    events::EventProducers,
    test_utils::{canned_transport::CannedTransport, prepare_env::new_test_database},
    GatewayCatalog,
    OrderManagement,
    PaymentGatewayDatabase,
    PspClients,
    SqliteDatabase,
};
use multisafepay_tools::{ApiMode, MspConfig};
use sqlx::{migrate::MigrateDatabase, Sqlite};

use crate::{
    config::ServerOptions,
    server::{configure_routes, EngineApis, ADMIN_TOKEN_HEADER},
};

pub const SITE_URL: &str = "https://pay.example.com";
pub const ADMIN_TOKEN: &str = "let-me-in";

pub fn options() -> ServerOptions {
    ServerOptions {
        use_x_forwarded_for: true,
        use_forwarded: false,
        locale: "nl".to_string(),
        site_url: SITE_URL.to_string(),
        account_type: ApiMode::Test,
    }
}

/// A fresh database and a canned MultiSafepay behind the full set of routes.
pub struct TestServer {
    pub db: SqliteDatabase,
    pub psp: CannedTransport,
    pub apis: EngineApis<SqliteDatabase, CannedTransport>,
    pub admin_token: Option<Secret<String>>,
}

impl TestServer {
    pub async fn new() -> Self {
        let db = new_test_database().await;
        let psp = CannedTransport::new();
        let catalog = Arc::new(GatewayCatalog::new().expect("Gateway catalog is incomplete"));
        let clients = PspClients::new(psp.clone(), MspConfig::default(), catalog);
        let apis = EngineApis::new(db.clone(), clients, EventProducers::default());
        Self { db, psp, apis, admin_token: Some(Secret::new(ADMIN_TOKEN.to_string())) }
    }

    pub fn without_admin_token(mut self) -> Self {
        self.admin_token = None;
        self
    }

    pub async fn store_order(&self, order: NewOrder) -> Order {
        let id = self.db.insert_order(order).await.expect("Error inserting order").id();
        self.db.fetch_order_by_id(id).await.expect("Error fetching order").expect("Order was not stored")
    }

    /// Sends `req` through the routes and returns the status and body of the response.
    pub async fn send(&self, req: TestRequest) -> (StatusCode, String) {
        let apis = self.apis.clone();
        let admin_token = self.admin_token.clone();
        let app = App::new().configure(move |cfg| configure_routes(cfg, apis, options(), admin_token));
        let service = test::init_service(app).await;
        let res = test::call_service(&service, req.to_request()).await;
        let status = res.status();
        let body = test::read_body(res).await;
        let body = String::from_utf8_lossy(&body).into_owned();
        debug!("🚀️ Response: {status} {body}");
        (status, body)
    }

    /// Like [`Self::send`], with the admin token header set.
    pub async fn send_as_admin(&self, req: TestRequest) -> (StatusCode, String) {
        self.send(req.insert_header((ADMIN_TOKEN_HEADER, ADMIN_TOKEN))).await
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
