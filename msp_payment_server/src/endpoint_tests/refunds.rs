use actix_web::{http::StatusCode, test::TestRequest};
use msp_common::MinorUnits;
use msp_payment_engine::{
    db_types::{OrderState, OrderTransition, Payment, PaymentState},
    test_utils::fixtures::new_order,
    FulfilledOrder,
    OrderManagement,
    PaymentGatewayDatabase,
};
use multisafepay_tools::HttpMethod;
use serde_json::json;

use super::helpers::TestServer;

/// Stores an order and lets MultiSafepay report it as paid in full.
async fn paid_order(server: &TestServer, order_number: &str, amount: i64) -> Payment {
    let total = format!("{}.{:02}", amount / 100, amount % 100);
    server.store_order(new_order(order_number, "msp_ideal", &total)).await;
    server.psp.order_status(order_number, "completed", amount, Some("IDEAL"));
    let (status, body) = server.send(TestRequest::post().uri(&format!("/notify?transactionid={order_number}"))).await;
    assert_eq!((status, body.as_str()), (StatusCode::OK, "OK"));
    let remote_id = format!("msp-{order_number}");
    server.db.fetch_payment_by_remote_id(&remote_id).await.unwrap().expect("Payment was not created")
}

#[actix_web::test]
async fn partial_then_full_refund() {
    let _ = env_logger::try_init().ok();
    let server = TestServer::new().await;
    let payment = paid_order(&server, "10042", 2500).await;
    server.psp.respond(HttpMethod::Post, "orders/10042/refunds", json!({ "transaction_id": 9_000_001 }));

    let req = TestRequest::post().uri(&format!("/api/payments/{}/refund", payment.id)).set_json(json!({ "amount": 1000 }));
    let (status, body) = server.send_as_admin(req).await;
    assert_eq!(status, StatusCode::OK);
    let refunded: Payment = serde_json::from_str(&body).expect("Not a payment");
    assert_eq!(refunded.state, PaymentState::PartiallyRefunded);
    assert_eq!(refunded.refunded_amount, MinorUnits::from(1000));

    // Without an amount, whatever is left is refunded
    let req = TestRequest::post().uri(&format!("/api/payments/{}/refund", payment.id));
    let (status, body) = server.send_as_admin(req).await;
    assert_eq!(status, StatusCode::OK);
    let refunded: Payment = serde_json::from_str(&body).expect("Not a payment");
    assert_eq!(refunded.state, PaymentState::Refunded);
    assert_eq!(refunded.refunded_amount, MinorUnits::from(2500));
    assert_eq!(server.psp.request_count(HttpMethod::Post, "orders/10042/refunds"), 2);
    server.tear_down().await;
}

#[actix_web::test]
async fn refunds_that_cannot_happen() {
    let _ = env_logger::try_init().ok();
    let server = TestServer::new().await;
    let (status, _) = server.send_as_admin(TestRequest::post().uri("/api/payments/9999/refund")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let payment = paid_order(&server, "10043", 2500).await;
    let req = TestRequest::post().uri(&format!("/api/payments/{}/refund", payment.id)).set_json(json!({ "amount": 2501 }));
    let (status, _) = server.send_as_admin(req).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(server.psp.request_count(HttpMethod::Post, "orders/10043/refunds"), 0);

    server.psp.respond_raw(
        HttpMethod::Post,
        "orders/10043/refunds",
        json!({ "success": false, "error_code": 1001, "error_info": "Refund not allowed" }),
    );
    let req = TestRequest::post().uri(&format!("/api/payments/{}/refund", payment.id)).set_json(json!({ "amount": 500 }));
    let (status, _) = server.send_as_admin(req).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let payment = server.db.fetch_payment_by_remote_id("msp-10043").await.unwrap().unwrap();
    assert_eq!(payment.refunded_amount, MinorUnits::from(0));
    server.tear_down().await;
}

#[actix_web::test]
async fn fulfilment_completes_the_order() {
    let _ = env_logger::try_init().ok();
    let server = TestServer::new().await;
    let order = server.store_order(new_order("10050", "msp_ideal", "31.95")).await;
    server.db.apply_transition(order.id, OrderTransition::Place).await.expect("Error placing order");
    server.psp.respond(HttpMethod::Patch, "orders/10050", json!({}));

    let req = TestRequest::post()
        .uri(&format!("/api/orders/{}/fulfill", order.id))
        .set_json(json!({ "tracking_code": "3SABCD0123456789" }));
    let (status, body) = server.send_as_admin(req).await;
    assert_eq!(status, StatusCode::OK);
    let fulfilled: FulfilledOrder = serde_json::from_str(&body).expect("Not a fulfilled order");
    assert_eq!(fulfilled.order.state, OrderState::Completed);

    let (status, _) = server.send_as_admin(req_fulfill(order.id)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = server.send_as_admin(req_fulfill(9999)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    server.tear_down().await;
}

fn req_fulfill(order_id: i64) -> TestRequest {
    TestRequest::post().uri(&format!("/api/orders/{order_id}/fulfill"))
}
