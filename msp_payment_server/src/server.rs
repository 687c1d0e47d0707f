use std::{sync::Arc, time::Duration};

use actix_web::{
    dev::{Server, Service},
    http::KeepAlive,
    middleware::Logger,
    web,
    App,
    HttpServer,
};
use futures::{future::ok, FutureExt};
use log::*;
use msp_common::Secret;
use msp_payment_engine::{
    events::EventProducers,
    order_data::OrderPayloadBuilder,
    CheckoutApi,
    GatewayCatalog,
    PaymentBackend,
    PspClients,
    ReconciliationApi,
    RefundApi,
    ShipmentApi,
    SqliteDatabase,
};
use multisafepay_tools::{HttpTransportFactory, TransportFactory};

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    events::create_event_log_handlers,
    routes::{
        health,
        CheckoutRoute,
        FulfillRoute,
        GatewaysRoute,
        IdealIssuersRoute,
        NotifyGetRoute,
        NotifyPostRoute,
        OrderGatewaysRoute,
        RefundRoute,
    },
};

/// Requests to the `/api` scope must carry the admin token in this header.
pub const ADMIN_TOKEN_HEADER: &str = "msp_admin_token";

/// One instance of every engine API, shared by all workers.
///
/// The APIs are cheap to clone. Clones share the database pool and, for reconciliation, the per-order locks, so
/// concurrent notifications for the same order are serialized no matter which worker receives them.
pub struct EngineApis<B, F> {
    pub checkout: CheckoutApi<B, F>,
    pub reconciliation: ReconciliationApi<B, F>,
    pub refunds: RefundApi<B, F>,
    pub shipments: ShipmentApi<B, F>,
}

impl<B: Clone, F: Clone> Clone for EngineApis<B, F> {
    fn clone(&self) -> Self {
        Self {
            checkout: self.checkout.clone(),
            reconciliation: self.reconciliation.clone(),
            refunds: self.refunds.clone(),
            shipments: self.shipments.clone(),
        }
    }
}

impl<B, F> EngineApis<B, F>
where
    B: PaymentBackend,
    F: TransportFactory,
{
    pub fn new(db: B, clients: PspClients<F>, producers: EventProducers) -> Self {
        let builder = OrderPayloadBuilder::new(clients.shared_catalog());
        Self {
            checkout: CheckoutApi::new(db.clone(), clients.clone(), builder, producers.clone()),
            reconciliation: ReconciliationApi::new(db.clone(), clients.clone(), producers.clone()),
            refunds: RefundApi::new(db.clone(), clients.clone(), producers.clone()),
            shipments: ShipmentApi::new(db, clients, producers),
        }
    }
}

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let catalog = GatewayCatalog::new().map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let factory = HttpTransportFactory::new(&config.msp);
    let clients = PspClients::new(factory, config.msp.clone(), Arc::new(catalog));
    let handlers = create_event_log_handlers();
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let apis = EngineApis::new(db, clients, producers);
    let srv = create_server_instance(config, apis)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    apis: EngineApis<SqliteDatabase, HttpTransportFactory>,
) -> Result<Server, ServerError> {
    let options = ServerOptions::from_config(&config);
    let admin_token = config.admin_token.clone();
    let srv = HttpServer::new(move || {
        let apis = apis.clone();
        let options = options.clone();
        let admin_token = admin_token.clone();
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("msp::access_log"))
            .configure(move |cfg| {
                configure_routes::<SqliteDatabase, HttpTransportFactory>(cfg, apis, options, admin_token)
            })
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Registers the engine APIs and every route on an app. Public routes sit at the root, shop-facing routes under
/// `/api`, behind the admin token if one is given.
pub fn configure_routes<B, F>(
    cfg: &mut web::ServiceConfig,
    apis: EngineApis<B, F>,
    options: ServerOptions,
    admin_token: Option<Secret<String>>,
) where
    B: PaymentBackend + 'static,
    F: TransportFactory + 'static,
{
    let api_scope = web::scope("/api")
        .wrap_fn(move |req, srv| {
            let authorized = match &admin_token {
                None => true,
                Some(token) => req
                    .headers()
                    .get(ADMIN_TOKEN_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .map(|v| v == token.reveal().as_str())
                    .unwrap_or(false),
            };
            if authorized {
                srv.call(req)
            } else {
                warn!("💻️ Request to {} without a valid admin token. Denying access.", req.path());
                ok(req.error_response(ServerError::Unauthorized)).boxed_local()
            }
        })
        .service(CheckoutRoute::<B, F>::new())
        .service(OrderGatewaysRoute::<B, F>::new())
        .service(RefundRoute::<B, F>::new())
        .service(FulfillRoute::<B, F>::new());
    cfg.app_data(web::Data::new(options))
        .app_data(web::Data::new(apis.checkout))
        .app_data(web::Data::new(apis.reconciliation))
        .app_data(web::Data::new(apis.refunds))
        .app_data(web::Data::new(apis.shipments))
        .service(health)
        .service(NotifyGetRoute::<B, F>::new())
        .service(NotifyPostRoute::<B, F>::new())
        .service(IdealIssuersRoute::<B, F>::new())
        .service(GatewaysRoute::<B, F>::new())
        .service(api_scope);
}
