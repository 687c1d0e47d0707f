//! Request handler definitions
//!
//! Define each route and its handler here. The heavy lifting happens in the engine APIs, which are shared by every
//! worker through `web::Data`. Handlers only translate between HTTP and those APIs.
//!
//! Handlers must not block. Anything that waits on I/O (the database, MultiSafepay) is awaited so that the worker
//! thread can serve other requests in the meantime.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use msp_payment_engine::{
    CheckoutApi,
    PaymentBackend,
    ReconciliationApi,
    ReconciliationError,
    RefundApi,
    ShipmentApi,
};
use multisafepay_tools::TransportFactory;

use crate::{
    config::ServerOptions,
    data_objects::{CheckoutRequest, FulfillParams, ModeQuery, NotificationParams, RefundParams},
    errors::ServerError,
    helpers::request_context,
};

// Actix cannot register generic handlers directly, so the `route!` macro generates a service factory per handler
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Notifications  ----------------------------------------------------
route!(notify_get => Get "/notify" impl PaymentBackend, TransportFactory);
/// MultiSafepay calls the notification url with `?transactionid=...` whenever a transaction changes. Older accounts
/// use GET, newer ones POST, so both are served.
pub async fn notify_get<B, F>(
    query: web::Query<NotificationParams>,
    api: web::Data<ReconciliationApi<B, F>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentBackend,
    F: TransportFactory,
{
    handle_notification(query.into_inner(), api.as_ref()).await
}

route!(notify_post => Post "/notify" impl PaymentBackend, TransportFactory);
pub async fn notify_post<B, F>(
    query: web::Query<NotificationParams>,
    api: web::Data<ReconciliationApi<B, F>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentBackend,
    F: TransportFactory,
{
    handle_notification(query.into_inner(), api.as_ref()).await
}

/// Answers MultiSafepay. Anything other than a 200 makes MultiSafepay retry, so orders we cannot act on are
/// acknowledged with a diagnostic message instead of an error.
async fn handle_notification<B, F>(
    params: NotificationParams,
    api: &ReconciliationApi<B, F>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentBackend,
    F: TransportFactory,
{
    let transaction_id = params.transactionid.unwrap_or_default();
    debug!("💻️ Notification received for transaction [{transaction_id}]");
    match api.handle_notification(&transaction_id).await {
        Ok(outcome) => {
            info!("💻️ Notification for [{transaction_id}] handled: {outcome}");
            Ok(HttpResponse::Ok().content_type("text/plain").body(outcome.message()))
        },
        Err(ReconciliationError::MissingTransactionId) => {
            warn!("💻️ Notification received without a transaction id");
            Ok(HttpResponse::InternalServerError().content_type("text/plain").body("Error 500"))
        },
        Err(ReconciliationError::DatabaseError(e)) => {
            error!("💻️ Could not reconcile transaction [{transaction_id}]. {e}");
            Err(ServerError::BackendError(e))
        },
        Err(e @ ReconciliationError::PaymentGateway(_)) => {
            warn!("💻️ Could not fetch transaction [{transaction_id}] from MultiSafepay. {e}");
            Err(ServerError::PaymentProviderError(e.to_string()))
        },
    }
}

//----------------------------------------------   Checkout  ----------------------------------------------------
route!(checkout => Post "/orders/{order_id}/checkout" impl PaymentBackend, TransportFactory);
/// Starts a payment for the order at MultiSafepay and returns the payment link. The customer must be sent to
/// `payment_url` to pay.
pub async fn checkout<B, F>(
    req: HttpRequest,
    path: web::Path<i64>,
    body: Option<web::Json<CheckoutRequest>>,
    options: web::Data<ServerOptions>,
    api: web::Data<CheckoutApi<B, F>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentBackend,
    F: TransportFactory,
{
    let order_id = path.into_inner();
    let params = body.map(|b| b.into_inner()).unwrap_or_default();
    debug!("💻️ POST checkout for order {order_id}");
    let request = request_context(&req, options.as_ref(), params.language.as_deref());
    let context = options.checkout_context(order_id, request, params.return_url, params.cancel_url);
    let link = api.start_checkout(order_id, &context, params.gateway_info).await.map_err(|e| {
        debug!("💻️ Could not start checkout for order {order_id}. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(link))
}

route!(order_gateways => Get "/orders/{order_id}/gateways" impl PaymentBackend, TransportFactory);
/// The gateways that may be offered for the order, given its total and currency.
pub async fn order_gateways<B, F>(
    path: web::Path<i64>,
    api: web::Data<CheckoutApi<B, F>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentBackend,
    F: TransportFactory,
{
    let order_id = path.into_inner();
    debug!("💻️ GET gateways for order {order_id}");
    let gateways = api.available_gateways(order_id).await?;
    Ok(HttpResponse::Ok().json(gateways))
}

route!(ideal_issuers => Get "/issuers/ideal" impl PaymentBackend, TransportFactory);
pub async fn ideal_issuers<B, F>(
    query: web::Query<ModeQuery>,
    options: web::Data<ServerOptions>,
    api: web::Data<CheckoutApi<B, F>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentBackend,
    F: TransportFactory,
{
    let mode = query.mode.unwrap_or(options.account_type);
    debug!("💻️ GET iDEAL issuers ({mode})");
    let issuers = api.ideal_issuers(mode).await?;
    Ok(HttpResponse::Ok().json(issuers))
}

route!(gateways => Get "/gateways" impl PaymentBackend, TransportFactory);
pub async fn gateways<B, F>(
    query: web::Query<ModeQuery>,
    options: web::Data<ServerOptions>,
    api: web::Data<CheckoutApi<B, F>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentBackend,
    F: TransportFactory,
{
    let mode = query.mode.unwrap_or(options.account_type);
    debug!("💻️ GET gateways ({mode})");
    let gateways = api.fetch_gateways(mode).await?;
    Ok(HttpResponse::Ok().json(gateways))
}

//----------------------------------------------   Refunds  ----------------------------------------------------
route!(refund => Post "/payments/{payment_id}/refund" impl PaymentBackend, TransportFactory);
/// Refunds `amount` minor units of the payment, or everything that has not been refunded yet when no amount is
/// given. Returns the updated payment.
pub async fn refund<B, F>(
    path: web::Path<i64>,
    body: Option<web::Json<RefundParams>>,
    api: web::Data<RefundApi<B, F>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentBackend,
    F: TransportFactory,
{
    let payment_id = path.into_inner();
    let amount = body.and_then(|b| b.into_inner().amount);
    debug!("💻️ POST refund for payment {payment_id}");
    let payment = api.refund(payment_id, amount).await.map_err(|e| {
        info!("💻️ Refund of payment {payment_id} failed. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(payment))
}

//----------------------------------------------   Fulfillment  ----------------------------------------------------
route!(fulfill => Post "/orders/{order_id}/fulfill" impl PaymentBackend, TransportFactory);
pub async fn fulfill<B, F>(
    path: web::Path<i64>,
    body: Option<web::Json<FulfillParams>>,
    api: web::Data<ShipmentApi<B, F>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentBackend,
    F: TransportFactory,
{
    let order_id = path.into_inner();
    let tracking_code = body.and_then(|b| b.into_inner().tracking_code);
    debug!("💻️ POST fulfill for order {order_id}");
    let fulfilled = api.fulfill_order(order_id, tracking_code.as_deref()).await?;
    Ok(HttpResponse::Ok().json(fulfilled))
}
