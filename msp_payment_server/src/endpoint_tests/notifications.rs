use actix_web::{http::StatusCode, test::TestRequest};
use msp_payment_engine::{
    db_types::{OrderState, PaymentState},
    test_utils::fixtures::new_order,
    OrderManagement,
    PaymentGatewayDatabase,
};

use super::helpers::TestServer;

#[actix_web::test]
async fn health_check() {
    let _ = env_logger::try_init().ok();
    let server = TestServer::new().await;
    let (status, body) = server.send(TestRequest::get().uri("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
    server.tear_down().await;
}

#[actix_web::test]
async fn notification_without_transaction_id() {
    let _ = env_logger::try_init().ok();
    let server = TestServer::new().await;
    let (status, body) = server.send(TestRequest::get().uri("/notify")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Error 500");
    let (status, body) = server.send(TestRequest::post().uri("/notify?transactionid=&timestamp=1718000000")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Error 500");
    server.tear_down().await;
}

#[actix_web::test]
async fn notification_for_unknown_order_is_acknowledged() {
    let _ = env_logger::try_init().ok();
    let server = TestServer::new().await;
    let (status, body) = server.send(TestRequest::get().uri("/notify?transactionid=99999")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Order does not exist");
    assert!(server.psp.requests().is_empty());
    server.tear_down().await;
}

#[actix_web::test]
async fn notification_for_other_gateway_is_acknowledged() {
    let _ = env_logger::try_init().ok();
    let server = TestServer::new().await;
    server.store_order(new_order("10077", "bank_transfer", "12.50")).await;
    let (status, body) = server.send(TestRequest::post().uri("/notify?transactionid=10077")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Non MSP order");
    server.tear_down().await;
}

#[actix_web::test]
async fn completed_payment_is_recorded() {
    let _ = env_logger::try_init().ok();
    let server = TestServer::new().await;
    let order = server.store_order(new_order("10042", "msp_ideal", "25.00")).await;
    server.psp.order_status("10042", "completed", 2500, Some("IDEAL"));

    let (status, body) = server.send(TestRequest::post().uri("/notify?transactionid=10042&timestamp=1718000000")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
    // MultiSafepay retries with GET. Nothing changes the second time around.
    let (status, body) = server.send(TestRequest::get().uri("/notify?transactionid=10042")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");

    let payments = server.db.fetch_payments_for_order(order.id).await.unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].state, PaymentState::Completed);
    assert_eq!(payments[0].remote_id, "msp-10042");
    let order = server.db.fetch_order_by_id(order.id).await.unwrap().unwrap();
    assert_eq!(order.state, OrderState::Fulfillment);
    server.tear_down().await;
}

#[actix_web::test]
async fn unreachable_multisafepay_is_a_gateway_error() {
    let _ = env_logger::try_init().ok();
    let server = TestServer::new().await;
    server.store_order(new_order("10043", "msp_ideal", "25.00")).await;
    let (status, body) = server.send(TestRequest::get().uri("/notify?transactionid=10043")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("MultiSafepay"), "Unexpected body: {body}");
    server.tear_down().await;
}
