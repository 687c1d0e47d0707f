use std::str::FromStr;

use cucumber::{given, then, when};
use futures_util::future::join_all;
use msp_common::MinorUnits;
use msp_payment_engine::{
    db_types::{Order, OrderActivityKind, OrderState, Payment, PaymentState},
    test_utils::fixtures::new_order,
    OrderManagement,
    PaymentGatewayDatabase,
};
use multisafepay_tools::HttpMethod;
use serde_json::json;

use crate::cucumber::MspWorld;

#[given(expr = "an order {word} paid with {word} for {word} EUR")]
async fn store_order(world: &mut MspWorld, order_number: String, gateway: String, total: String) {
    world.system().system.store_order(new_order(&order_number, &gateway, &total)).await;
}

#[given(expr = "MultiSafepay reports order {word} as {word} for {int} cents paid with {word}")]
async fn remote_status(world: &mut MspWorld, order_number: String, status: String, amount: i64, method: String) {
    world.system().system.psp.order_status(&order_number, &status, amount, Some(method.as_str()));
}

#[given(expr = "MultiSafepay reports order {word} as {word} for {int} cents without payment details")]
async fn remote_status_without_details(world: &mut MspWorld, order_number: String, status: String, amount: i64) {
    world.system().system.psp.order_status(&order_number, &status, amount, None);
}

#[given(expr = "MultiSafepay accepts refunds for order {word}")]
async fn accept_refunds(world: &mut MspWorld, order_number: String) {
    let path = format!("orders/{order_number}/refunds");
    world.system().system.psp.respond(HttpMethod::Post, &path, json!({ "transaction_id": 9_100_001 }));
}

#[given(expr = "MultiSafepay has notified us about {word}")]
async fn notified_about(world: &mut MspWorld, transaction_id: String) {
    notify(world, &transaction_id).await;
    assert_eq!(world.last_outcome.as_deref(), Some("OK"), "Notification failed: {:?}", world.last_error);
}

#[when(expr = "MultiSafepay notifies us about {word}")]
async fn notify_about(world: &mut MspWorld, transaction_id: String) {
    notify(world, &transaction_id).await;
}

#[when("MultiSafepay notifies us without a transaction id")]
async fn notify_without_id(world: &mut MspWorld) {
    notify(world, "").await;
}

async fn notify(world: &mut MspWorld, transaction_id: &str) {
    let result = world.system().reconciliation.handle_notification(transaction_id).await;
    match result {
        Ok(outcome) => {
            world.last_outcome = Some(outcome.message().to_string());
            world.last_error = None;
        },
        Err(e) => {
            world.last_outcome = None;
            world.last_error = Some(e.to_string());
        },
    }
}

#[when(expr = "MultiSafepay sends {int} notifications about {word} at once")]
async fn notify_concurrently(world: &mut MspWorld, count: usize, transaction_id: String) {
    let api = &world.system().reconciliation;
    let results = join_all((0..count).map(|_| api.handle_notification(&transaction_id))).await;
    for result in results {
        let outcome = result.expect("Error handling notification");
        assert_eq!(outcome.message(), "OK");
    }
}

#[when(expr = "I refund {int} cents of the payment for order {word}")]
async fn refund_part(world: &mut MspWorld, amount: i64, order_number: String) {
    refund(world, &order_number, Some(MinorUnits::from(amount))).await;
}

#[when(expr = "I refund the rest of the payment for order {word}")]
async fn refund_rest(world: &mut MspWorld, order_number: String) {
    refund(world, &order_number, None).await;
}

async fn refund(world: &mut MspWorld, order_number: &str, amount: Option<MinorUnits>) {
    let payment = only_payment(world, order_number).await;
    let result = world.system().refunds.refund(payment.id, amount).await;
    world.last_error = result.err().map(|e| e.to_string());
}

async fn fetch_order(world: &MspWorld, order_number: &str) -> Order {
    let db = &world.system().system.db;
    db.fetch_order_by_number(order_number)
        .await
        .expect("Error fetching order")
        .unwrap_or_else(|| panic!("Order {order_number} does not exist"))
}

async fn payments_for(world: &MspWorld, order_number: &str) -> Vec<Payment> {
    let order = fetch_order(world, order_number).await;
    world.system().system.db.fetch_payments_for_order(order.id).await.expect("Error fetching payments")
}

async fn only_payment(world: &MspWorld, order_number: &str) -> Payment {
    let mut payments = payments_for(world, order_number).await;
    assert_eq!(payments.len(), 1, "Expected exactly one payment for order {order_number}");
    payments.remove(0)
}

#[then(expr = "the notification is answered with {string}")]
async fn check_outcome(world: &mut MspWorld, message: String) {
    assert_eq!(world.last_outcome.as_deref(), Some(message.as_str()), "Last error: {:?}", world.last_error);
}

#[then("the notification is rejected")]
async fn check_rejected(world: &mut MspWorld) {
    assert!(world.last_error.is_some(), "Notification was answered with {:?}", world.last_outcome);
}

#[then(expr = "order {word} has {int} payment(s)")]
async fn check_payment_count(world: &mut MspWorld, order_number: String, count: usize) {
    let payments = payments_for(world, &order_number).await;
    assert_eq!(payments.len(), count, "Payment count for order {order_number} is incorrect");
}

#[then(expr = "the payment for order {word} is {word}")]
async fn check_payment_state(world: &mut MspWorld, order_number: String, state: String) {
    let expected = PaymentState::from_str(&state).expect("Not a payment state");
    let payment = only_payment(world, &order_number).await;
    assert_eq!(payment.state, expected, "Payment state is incorrect");
}

#[then(expr = "the payment for order {word} has {int} cents refunded")]
async fn check_refunded(world: &mut MspWorld, order_number: String, amount: i64) {
    let payment = only_payment(world, &order_number).await;
    assert_eq!(payment.refunded_amount, MinorUnits::from(amount), "Refunded amount is incorrect");
}

#[then(expr = "order {word} is in the {word} state")]
async fn check_order_state(world: &mut MspWorld, order_number: String, state: String) {
    let expected = OrderState::from_str(&state).expect("Not an order state");
    let order = fetch_order(world, &order_number).await;
    assert_eq!(order.state, expected, "Order state is incorrect");
}

#[then(expr = "the activity log for order {word} reads {string}")]
async fn check_activity_log(world: &mut MspWorld, order_number: String, kinds: String) {
    let expected = kinds
        .split(',')
        .map(|k| OrderActivityKind::from_str(k.trim()).expect("Not an activity kind"))
        .collect::<Vec<_>>();
    let order = fetch_order(world, &order_number).await;
    let log = world.system().system.db.fetch_order_log(order.id).await.expect("Error fetching order log");
    let actual = log.into_iter().map(|e| e.activity.kind).collect::<Vec<_>>();
    assert_eq!(actual, expected, "Activity log is incorrect");
}

#[then("the refund is refused")]
async fn check_refund_refused(world: &mut MspWorld) {
    assert!(world.last_error.is_some(), "The refund went through");
}

#[then(expr = "MultiSafepay received {int} refund request(s) for order {word}")]
async fn check_refund_requests(world: &mut MspWorld, count: usize, order_number: String) {
    let path = format!("orders/{order_number}/refunds");
    assert_eq!(world.system().system.psp.request_count(HttpMethod::Post, &path), count);
}
