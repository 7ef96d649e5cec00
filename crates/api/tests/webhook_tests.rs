mod common;

use common::{create_test_context, sign_webhook_payload, TEST_WEBHOOK_SECRET};
use serde_json::json;

fn auth_header(token: &str) -> (http::HeaderName, http::HeaderValue) {
    (
        http::HeaderName::from_static("authorization"),
        http::HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    )
}

fn signature_header(value: &str) -> (http::HeaderName, http::HeaderValue) {
    (
        http::HeaderName::from_static("stripe-signature"),
        http::HeaderValue::from_str(value).unwrap(),
    )
}

async fn seed_checkout(ctx: &common::TestContext, token: &str) {
    let (name, value) = auth_header(token);
    ctx.server
        .post("/api/cart/add")
        .add_header(name.clone(), value.clone())
        .json(&json!({
            "product": {
                "serviceId": "svc_a",
                "name": "city tour",
                "price": 1000,
                "quantity": 2,
                "typeOf": "tours"
            }
        }))
        .await
        .assert_status(http::StatusCode::CREATED);
    ctx.server
        .post("/api/orders/add")
        .add_header(name, value)
        .await
        .assert_status(http::StatusCode::CREATED);
}

#[tokio::test]
async fn test_webhook_without_signature_header_is_rejected() {
    let ctx = create_test_context();

    let response = ctx
        .server
        .post("/api/webhook")
        .json(&json!({ "id": "evt_1", "type": "payment_intent.succeeded" }))
        .await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_webhook_with_invalid_signature_mutates_nothing() {
    let ctx = create_test_context();
    let (user_id, token) = ctx.login("buyer@example.com").await;
    seed_checkout(&ctx, &token).await;

    let payload = json!({
        "id": "evt_2",
        "type": "payment_intent.succeeded",
        "data": { "object": {
            "id": "pi_1",
            "currency": "usd",
            "metadata": {
                "user_id": user_id.to_string(),
                "cart_items": "[{\"service_id\":\"svc_a\",\"amount\":2000}]"
            }
        }}
    });

    let (name, value) = signature_header("t=1,v1=deadbeef");
    let response = ctx
        .server
        .post("/api/webhook")
        .add_header(name, value)
        .json(&payload)
        .await;
    response.assert_status_bad_request();

    // Fail-closed: no payments, orders still unpaid, cart untouched
    assert!(ctx.payment_repo.all_payments().is_empty());
    assert!(ctx
        .order_repo
        .all_main_orders()
        .iter()
        .all(|o| !o.is_paid));
    assert!(!ctx.cart_repo.all_items().is_empty());
}

#[tokio::test]
async fn test_webhook_succeeded_event_settles_user_state() {
    let ctx = create_test_context();
    let (user_id, token) = ctx.login("buyer@example.com").await;
    seed_checkout(&ctx, &token).await;

    let payload = json!({
        "id": "evt_3",
        "type": "payment_intent.succeeded",
        "data": { "object": {
            "id": "pi_2",
            "currency": "usd",
            "metadata": {
                "user_id": user_id.to_string(),
                "email": "buyer@example.com",
                "cart_items": "[{\"service_id\":\"svc_a\",\"amount\":2000}]"
            }
        }}
    })
    .to_string();

    let signature = sign_webhook_payload(&payload, TEST_WEBHOOK_SECRET);
    let (name, value) = signature_header(&signature);
    let response = ctx
        .server
        .post("/api/webhook")
        .add_header(name, value)
        .bytes(axum::body::Bytes::from(payload))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["received"], true);

    // One payment per metadata item, orders paid, cart cleared
    let payments = ctx.payment_repo.all_payments();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].provider_payment_id, "pi_2");
    assert!(ctx
        .order_repo
        .all_main_orders()
        .iter()
        .filter(|o| o.user_id == user_id)
        .all(|o| o.is_paid));
    assert!(ctx.cart_repo.all_items().is_empty());

    // The payment surfaces on the ledger endpoint
    let (name, value) = auth_header(&token);
    let response = ctx
        .server
        .get("/api/payments/get")
        .add_header(name, value)
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["payments"].as_array().unwrap().len(), 1);
    assert_eq!(body["payments"][0]["stripePaymentId"], "pi_2");
}
