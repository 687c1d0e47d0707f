use actix_web::{http::StatusCode, test::TestRequest};
use msp_payment_engine::{
    db_types::OrderState,
    test_utils::fixtures::new_order,
    OrderManagement,
    PaymentLink,
};
use multisafepay_tools::{data_objects::Issuer, HttpMethod, MspApiError};
use serde_json::{json, Value};

use super::helpers::{TestServer, SITE_URL};

const PAYMENT_URL: &str = "https://payv2.multisafepay.com/connect/82b8a3xYs2pQ";

#[actix_web::test]
async fn checkout_returns_the_payment_link() {
    let _ = env_logger::try_init().ok();
    let server = TestServer::new().await;
    let order = server.store_order(new_order("10042", "msp_ideal", "25.00")).await;
    server.psp.respond(HttpMethod::Post, "orders", json!({ "order_id": "10042", "payment_url": PAYMENT_URL }));

    let req = TestRequest::post()
        .uri(&format!("/api/orders/{}/checkout", order.id))
        .insert_header(("X-Forwarded-For", "198.51.100.7, 10.0.0.1"))
        .set_json(json!({ "gateway_info": { "issuer_id": "0031" }, "language": "de" }));
    let (status, body) = server.send_as_admin(req).await;
    assert_eq!(status, StatusCode::OK);
    let link: PaymentLink = serde_json::from_str(&body).expect("Not a payment link");
    assert_eq!(link.order_id, order.id);
    assert_eq!(link.payment_url, PAYMENT_URL);
    assert_eq!(link.gateway, "IDEAL");

    let requests = server.psp.requests();
    assert_eq!(requests.len(), 1);
    let payload = requests[0].body.as_ref().expect("No payload sent");
    assert_eq!(payload["type"], "direct");
    assert_eq!(payload["gateway_info"]["issuer_id"], "0031");
    assert_eq!(payload["customer"]["locale"], "de_DE");
    assert_eq!(payload["customer"]["ip_address"], "198.51.100.7");
    assert_eq!(payload["payment_options"]["notification_url"], format!("{SITE_URL}/notify"));
    assert_eq!(payload["payment_options"]["redirect_url"], format!("{SITE_URL}/checkout/{}/complete", order.id));
    assert_eq!(payload["payment_options"]["cancel_url"], format!("{SITE_URL}/checkout/{}/cancel", order.id));
    server.tear_down().await;
}

#[actix_web::test]
async fn checkout_without_a_body_uses_the_defaults() {
    let _ = env_logger::try_init().ok();
    let server = TestServer::new().await;
    let order = server.store_order(new_order("10043", "msp_ideal", "25.00")).await;
    server.psp.respond(HttpMethod::Post, "orders", json!({ "payment_url": PAYMENT_URL }));

    let req = TestRequest::post().uri(&format!("/api/orders/{}/checkout", order.id));
    let (status, _) = server.send_as_admin(req).await;
    assert_eq!(status, StatusCode::OK);
    let requests = server.psp.requests();
    let payload = requests[0].body.as_ref().expect("No payload sent");
    // No bank was chosen, so the customer picks one on the payment page
    assert_eq!(payload["type"], "redirect");
    assert_eq!(payload["customer"]["locale"], "nl_NL");
    server.tear_down().await;
}

#[actix_web::test]
async fn checkout_errors() {
    let _ = env_logger::try_init().ok();
    let server = TestServer::new().await;
    let (status, body) = server.send_as_admin(TestRequest::post().uri("/api/orders/9999/checkout")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let body: Value = serde_json::from_str(&body).expect("Error body is not JSON");
    assert!(body["error"].as_str().is_some());

    let mut order = server.store_order(new_order("10044", "msp_ideal", "25.00")).await;
    while let Some(transition) = order.state.next_transition() {
        order = server.db.apply_transition(order.id, transition).await.expect("Error moving order along");
    }
    assert_eq!(order.state, OrderState::Completed);
    let req = TestRequest::post().uri(&format!("/api/orders/{}/checkout", order.id));
    let (status, _) = server.send_as_admin(req).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let order = server.store_order(new_order("10045", "msp_ideal", "25.00")).await;
    server.psp.fail(
        HttpMethod::Post,
        "orders",
        MspApiError::transport(Some(503), "Service unavailable"),
    );
    let req = TestRequest::post().uri(&format!("/api/orders/{}/checkout", order.id));
    let (status, _) = server.send_as_admin(req).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let order = server.db.fetch_order_by_id(order.id).await.unwrap().unwrap();
    assert_eq!(order.state, OrderState::Draft);
    server.tear_down().await;
}

#[actix_web::test]
async fn gateways_for_an_order() {
    let _ = env_logger::try_init().ok();
    let server = TestServer::new().await;
    let order = server.store_order(new_order("10046", "msp_ideal", "25.00")).await;
    let req = TestRequest::get().uri(&format!("/api/orders/{}/gateways", order.id));
    let (status, body) = server.send_as_admin(req).await;
    assert_eq!(status, StatusCode::OK);
    let gateways: Vec<Value> = serde_json::from_str(&body).expect("Not a list of gateways");
    assert!(!gateways.is_empty());
    server.tear_down().await;
}

#[actix_web::test]
async fn ideal_issuers_lead_with_the_payment_page_option() {
    let _ = env_logger::try_init().ok();
    let server = TestServer::new().await;
    server.psp.respond(
        HttpMethod::Get,
        "issuers/ideal",
        json!([{ "code": 31, "description": "ABN AMRO" }, { "code": "0021", "description": "Rabobank" }]),
    );
    let (status, body) = server.send(TestRequest::get().uri("/issuers/ideal")).await;
    assert_eq!(status, StatusCode::OK);
    let issuers: Vec<Issuer> = serde_json::from_str(&body).expect("Not a list of issuers");
    assert_eq!(issuers.len(), 3);
    assert_eq!(issuers[0].code, "none");
    assert_eq!(issuers[1].description, "ABN AMRO");
    assert_eq!(issuers[2].code, "0021");
    server.tear_down().await;
}

#[actix_web::test]
async fn account_gateways() {
    let _ = env_logger::try_init().ok();
    let server = TestServer::new().await;
    server.psp.respond(
        HttpMethod::Get,
        "gateways",
        json!([{ "id": "IDEAL", "description": "iDEAL" }, { "id": "VISA", "description": "Visa" }]),
    );
    let (status, body) = server.send(TestRequest::get().uri("/gateways?mode=test")).await;
    assert_eq!(status, StatusCode::OK);
    let gateways: Vec<Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(gateways.len(), 2);
    assert_eq!(gateways[1]["id"], "VISA");

    let (status, _) = server.send(TestRequest::get().uri("/gateways?mode=sandbox")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    server.tear_down().await;
}
