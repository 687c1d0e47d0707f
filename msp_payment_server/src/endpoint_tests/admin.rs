use actix_web::{http::StatusCode, test::TestRequest};
use serde_json::Value;

use super::helpers::TestServer;
use crate::server::ADMIN_TOKEN_HEADER;

#[actix_web::test]
async fn api_routes_need_the_admin_token() {
    let _ = env_logger::try_init().ok();
    let server = TestServer::new().await;
    let (status, body) = server.send(TestRequest::post().uri("/api/payments/1/refund")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let body: Value = serde_json::from_str(&body).expect("Error body is not JSON");
    assert_eq!(body["error"], "A valid admin token is required");

    let req = TestRequest::get().uri("/api/orders/1/gateways").insert_header((ADMIN_TOKEN_HEADER, "guess"));
    let (status, _) = server.send(req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The token does not get in the way of the routes MultiSafepay calls
    let (status, _) = server.send(TestRequest::get().uri("/notify?transactionid=99999")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = server.send_as_admin(TestRequest::get().uri("/api/orders/1/gateways")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    server.tear_down().await;
}

#[actix_web::test]
async fn api_routes_are_open_without_a_configured_token() {
    let _ = env_logger::try_init().ok();
    let server = TestServer::new().await.without_admin_token();
    let (status, _) = server.send(TestRequest::get().uri("/api/orders/1/gateways")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    server.tear_down().await;
}
