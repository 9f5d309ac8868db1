/// Integration tests for donations, webhooks, and refunds
///
/// These tests exercise the payment endpoints through the HTTP stack,
/// including the signed webhook deliveries that settle checkouts.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::*;
use serde_json::{json, Value};
use stargazer::dto::PaymentQueryDto;
use stargazer::handlers::WEBHOOK_SIGNATURE_HEADER;
use stargazer::models::{PaymentStatus, UserRole};
use stargazer::signing::sign_webhook_payload;
use stargazer::state::AppState;

async fn donate(app: &mut axum::Router, token: &str, amount_cents: i64) -> Value {
    let request = json_request(
        Method::POST,
        "/api/donations",
        Some(token),
        &json!({"amount_cents": amount_cents, "designation": "dark site", "note": null}),
    );
    let (status, response) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    response
}

fn webhook_delivery(state: &AppState, event_type: &str, provider_ref: &str) -> Request<Body> {
    let body = json!({"event_type": event_type, "provider_ref": provider_ref}).to_string();
    let signature = sign_webhook_payload(
        &state.config.webhook_secret,
        chrono::Utc::now().timestamp(),
        body.as_bytes(),
    );
    Request::builder()
        .method(Method::POST)
        .uri("/api/payments/webhook")
        .header(WEBHOOK_SIGNATURE_HEADER, signature)
        .body(Body::from(body))
        .unwrap()
}

/// Tests that a donation opens a checkout and lands in the ledger
///
/// This test verifies:
/// 1. The created payment is pending with a sandbox checkout URL
/// 2. The donor sees it under their own payments
/// 3. Zero-amount donations and anonymous donors are refused
#[tokio::test]
async fn test_donation_opens_a_checkout() {
    let mut app = create_test_app();
    let (dora_token, dora) = register(&mut app, "dora@example.com", "Dora").await;

    let response = donate(&mut app, &dora_token, 25_000).await;
    assert_eq!(response["payment"]["status"], "pending");
    assert_eq!(response["payment"]["kind"], "donation");
    assert_eq!(response["payment"]["user_id"], dora["id"]);
    assert!(response["checkout_url"]
        .as_str()
        .unwrap()
        .contains("/sandbox/checkout/"));

    let request = bare_request(Method::GET, "/api/user/payments", Some(&dora_token));
    let (status, mine) = send(&mut app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);

    let request = json_request(
        Method::POST,
        "/api/donations",
        Some(&dora_token),
        &json!({"amount_cents": 0}),
    );
    let (status, _) = send(&mut app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let request = json_request(
        Method::POST,
        "/api/donations",
        None,
        &json!({"amount_cents": 1_000}),
    );
    let (status, _) = send(&mut app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

/// Tests the webhook settlement flow end to end
///
/// This test verifies:
/// 1. A signed completion settles the pending payment
/// 2. Redelivering the same event succeeds quietly
/// 3. A contradictory settlement afterwards is a conflict
#[tokio::test]
async fn test_signed_webhook_settles_a_donation() {
    let state = create_test_state();
    let mut app = stargazer::create_app(state.clone());
    let (dora_token, _) = register(&mut app, "dora@example.com", "Dora").await;

    let response = donate(&mut app, &dora_token, 25_000).await;
    let provider_ref = response["payment"]["provider_ref"].as_str().unwrap().to_string();

    let (status, settled) = send(
        &mut app,
        webhook_delivery(&state, "checkout.completed", &provider_ref),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settled["status"], "completed");

    // Processors retry deliveries; the repeat is acknowledged
    let (status, _) = send(
        &mut app,
        webhook_delivery(&state, "checkout.completed", &provider_ref),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, error) = send(
        &mut app,
        webhook_delivery(&state, "checkout.failed", &provider_ref),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(error["error"].as_str().unwrap().contains("settled"));
}

/// Tests that the webhook route trusts nothing but the signature
///
/// This test verifies:
/// 1. Deliveries without a signature header are rejected
/// 2. A signature that does not match the body is rejected
/// 3. A well-signed event for an unknown reference is a 404
#[tokio::test]
async fn test_webhook_signature_is_enforced() {
    let state = create_test_state();
    let mut app = stargazer::create_app(state.clone());
    let (dora_token, _) = register(&mut app, "dora@example.com", "Dora").await;

    let response = donate(&mut app, &dora_token, 25_000).await;
    let provider_ref = response["payment"]["provider_ref"].as_str().unwrap().to_string();

    let body = json!({"event_type": "checkout.completed", "provider_ref": provider_ref}).to_string();
    let unsigned = Request::builder()
        .method(Method::POST)
        .uri("/api/payments/webhook")
        .body(Body::from(body.clone()))
        .unwrap();
    let (status, _) = send(&mut app, unsigned).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Signature computed over different bytes than the body sent
    let forged_signature = sign_webhook_payload(
        &state.config.webhook_secret,
        chrono::Utc::now().timestamp(),
        b"not the real body",
    );
    let forged = Request::builder()
        .method(Method::POST)
        .uri("/api/payments/webhook")
        .header(WEBHOOK_SIGNATURE_HEADER, forged_signature)
        .body(Body::from(body))
        .unwrap();
    let (status, _) = send(&mut app, forged).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &mut app,
        webhook_delivery(&state, "checkout.completed", "sandbox_never_issued"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

/// Tests the refund flow through the back office
///
/// This test verifies:
/// 1. An admin refunds a completed payment with a reason
/// 2. A second refund of the same payment is a conflict
/// 3. Members cannot reach the refund endpoint at all
#[tokio::test]
async fn test_admin_refunds_a_settled_donation() {
    let state = create_test_state();
    let mut app = stargazer::create_app(state.clone());
    let (admin_token, _) =
        register_with_role(&mut app, &state, "admin@example.com", "Ada", UserRole::Admin).await;
    let (dora_token, _) = register(&mut app, "dora@example.com", "Dora").await;

    let response = donate(&mut app, &dora_token, 25_000).await;
    let payment_id = response["payment"]["id"].as_str().unwrap().to_string();
    let provider_ref = response["payment"]["provider_ref"].as_str().unwrap().to_string();
    send(
        &mut app,
        webhook_delivery(&state, "checkout.completed", &provider_ref),
    )
    .await;

    let uri = format!("/api/admin/payments/{}/refund", payment_id);

    // A blank reason is not a reason
    let request = json_request(Method::POST, &uri, Some(&admin_token), &json!({"reason": "  "}));
    let (status, _) = send(&mut app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let request = json_request(
        Method::POST,
        &uri,
        Some(&admin_token),
        &json!({"reason": "Star party cancelled for weather"}),
    );
    let (status, refunded) = send(&mut app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(refunded["status"], "refunded");
    assert_eq!(refunded["refund_reason"], "Star party cancelled for weather");

    let request = json_request(
        Method::POST,
        &uri,
        Some(&admin_token),
        &json!({"reason": "Again, somehow"}),
    );
    let (status, _) = send(&mut app, request).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let request = json_request(
        Method::POST,
        &uri,
        Some(&dora_token),
        &json!({"reason": "My own refund"}),
    );
    let (status, _) = send(&mut app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

/// Tests the back-office ledger views and their filters
///
/// This test verifies:
/// 1. The admin index narrows by status through the query string
/// 2. Single payments can be fetched by ID, with 404 for strangers
/// 3. The whole surface is closed to ordinary members
#[tokio::test]
async fn test_back_office_ledger_filters() {
    let state = create_test_state();
    let mut app = stargazer::create_app(state.clone());
    let (admin_token, _) =
        register_with_role(&mut app, &state, "admin@example.com", "Ada", UserRole::Admin).await;
    let (dora_token, _) = register(&mut app, "dora@example.com", "Dora").await;
    let (finn_token, finn) = register(&mut app, "finn@example.com", "Finn").await;

    let settled = donate(&mut app, &dora_token, 25_000).await;
    donate(&mut app, &finn_token, 5_000).await;
    send(
        &mut app,
        webhook_delivery(
            &state,
            "checkout.completed",
            settled["payment"]["provider_ref"].as_str().unwrap(),
        ),
    )
    .await;

    let request = bare_request(Method::GET, "/api/admin/payments", Some(&admin_token));
    let (status, all) = send(&mut app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 2);

    let query = serde_html_form::to_string(&PaymentQueryDto {
        status: Some(PaymentStatus::Completed),
        ..Default::default()
    })
    .unwrap();
    let request = bare_request(
        Method::GET,
        &format!("/api/admin/payments?{}", query),
        Some(&admin_token),
    );
    let (_, completed) = send(&mut app, request).await;
    assert_eq!(completed.as_array().unwrap().len(), 1);
    assert_eq!(completed[0]["id"], settled["payment"]["id"]);

    let query = serde_html_form::to_string(&PaymentQueryDto {
        user_id: Some(finn["id"].as_str().unwrap().to_string()),
        ..Default::default()
    })
    .unwrap();
    let request = bare_request(
        Method::GET,
        &format!("/api/admin/payments?{}", query),
        Some(&admin_token),
    );
    let (_, finns) = send(&mut app, request).await;
    assert_eq!(finns.as_array().unwrap().len(), 1);

    let uri = format!(
        "/api/admin/payments/{}",
        settled["payment"]["id"].as_str().unwrap()
    );
    let request = bare_request(Method::GET, &uri, Some(&admin_token));
    let (status, fetched) = send(&mut app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["status"], "completed");

    let request = bare_request(Method::GET, "/api/admin/payments/nope", Some(&admin_token));
    let (status, _) = send(&mut app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let request = bare_request(Method::GET, "/api/admin/payments", Some(&dora_token));
    let (status, _) = send(&mut app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
