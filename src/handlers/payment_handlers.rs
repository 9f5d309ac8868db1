use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::auth;
use crate::dto::{CreateDonationDto, DonationResponseDto, PaymentQueryDto, RefundDto, WebhookEventDto};
use crate::errors::ApiError;
use crate::models::{Payment, PaymentKind, PaymentStatus};
use crate::payments::CheckoutRequest;
use crate::repo;
use crate::signing;
use crate::state::AppState;

/// Header carrying the processor's HMAC signature on webhook deliveries
pub const WEBHOOK_SIGNATURE_HEADER: &str = "X-Webhook-Signature";

/// Handler for making a donation
///
/// This function handles POST requests to `/api/donations`.
///
/// The processor is contacted before the payment row is written, so a
/// declined session leaves nothing behind in the ledger.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `headers` - The request headers carrying the bearer token
/// * `payload` - The donation amount, fund designation, and note
///
/// ### Returns
///
/// The pending payment and the checkout URL as JSON
#[instrument(skip(state, headers, payload), fields(amount_cents = %payload.amount_cents))]
pub async fn create_donation_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
    // Extract and deserialize the JSON request body
    Json(payload): Json<CreateDonationDto>,
) -> Result<Json<DonationResponseDto>, ApiError> {
    let user = auth::require_user(&state.pool, &headers)?;

    info!("Creating donation of {} cents", payload.amount_cents);

    if payload.amount_cents <= 0 {
        return Err(ApiError::Validation(
            "Donation amount must be positive".to_string(),
        ));
    }

    let mut payment = Payment::new(user.get_id(), PaymentKind::Donation, payload.amount_cents);
    payment.set_designation(payload.designation.clone());
    payment.set_note(payload.note);

    let description = match payload.designation {
        Some(fund) => format!("Donation to the {} fund", fund),
        None => "General donation".to_string(),
    };
    let request = CheckoutRequest {
        payment_id: payment.get_id(),
        amount_cents: payment.get_amount_cents(),
        description,
        customer_email: user.get_email(),
    };
    let session = state
        .payments
        .create_checkout(&request)
        .await
        .map_err(|err| ApiError::Provider(err.to_string()))?;
    payment.set_provider_ref(Some(session.provider_ref.clone()));

    // Call the repository function to record the payment
    let payment = repo::create_payment(&state.pool, &payment)
        .await
        .map_err(ApiError::Database)?;

    info!("Created donation payment with id: {}", payment.get_id());

    // Return the payment and checkout URL as JSON
    Ok(Json(DonationResponseDto {
        payment,
        checkout_url: session.url,
    }))
}

/// Handler for listing the caller's own payments
///
/// This function handles GET requests to `/api/user/payments`.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `headers` - The request headers carrying the bearer token
///
/// ### Returns
///
/// A list of the caller's payments as JSON, newest first
#[instrument(skip(state, headers))]
pub async fn list_my_payments_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
) -> Result<Json<Vec<Payment>>, ApiError> {
    let user = auth::require_user(&state.pool, &headers)?;

    debug!("Listing payments for user {}", user.get_id());

    let payments =
        repo::list_payments_for_user(&state.pool, &user.get_id()).map_err(ApiError::Database)?;

    // Return the list of payments as JSON
    Ok(Json(payments))
}

/// Handler for listing payments in the back office
///
/// This function handles GET requests to `/api/admin/payments`.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `query` - Status, kind, and user filters from the query string
/// * `headers` - The request headers carrying the bearer token
///
/// ### Returns
///
/// A list of payments as JSON, newest first
#[instrument(skip(state, headers))]
pub async fn list_payments_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract and deserialize the query string
    Query(query): Query<PaymentQueryDto>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
) -> Result<Json<Vec<Payment>>, ApiError> {
    auth::require_admin(&state.pool, &headers)?;

    // Call the repository function to list payments
    let payments = repo::list_payments(&state.pool, &query).map_err(ApiError::Database)?;

    // Return the list of payments as JSON
    Ok(Json(payments))
}

/// Handler for retrieving a specific payment in the back office
///
/// This function handles GET requests to `/api/admin/payments/{id}`.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `payment_id` - The ID of the payment, extracted from the URL path
/// * `headers` - The request headers carrying the bearer token
///
/// ### Returns
///
/// The requested payment as JSON
#[instrument(skip(state, headers), fields(payment_id = %payment_id))]
pub async fn get_payment_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the payment ID from the URL path
    Path(payment_id): Path<String>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
) -> Result<Json<Payment>, ApiError> {
    auth::require_admin(&state.pool, &headers)?;

    debug!("Retrieving payment");

    let payment = repo::get_payment(&state.pool, &payment_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;

    // Return the payment as JSON
    Ok(Json(payment))
}

/// Handler for refunding a payment
///
/// This function handles POST requests to `/api/admin/payments/{id}/refund`.
///
/// The processor moves the money first; only if it agrees is the ledger
/// row marked refunded. A refusal leaves the payment untouched.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `payment_id` - The ID of the payment to refund
/// * `headers` - The request headers carrying the bearer token
/// * `payload` - The request payload with the refund reason
///
/// ### Returns
///
/// The refunded payment as JSON
#[instrument(skip(state, headers, payload), fields(payment_id = %payment_id))]
pub async fn refund_payment_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the payment ID from the URL path
    Path(payment_id): Path<String>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
    // Extract and deserialize the JSON request body
    Json(payload): Json<RefundDto>,
) -> Result<Json<Payment>, ApiError> {
    auth::require_admin(&state.pool, &headers)?;

    info!("Refunding payment");

    let reason = payload.reason.trim();
    if reason.is_empty() {
        return Err(ApiError::Validation(
            "A refund reason is required".to_string(),
        ));
    }

    // First check the payment exists and is refundable
    let payment = repo::get_payment(&state.pool, &payment_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;
    if !payment.is_refundable() {
        return Err(ApiError::Conflict(format!(
            "Only completed payments can be refunded (status: {})",
            payment.get_status()
        )));
    }
    let provider_ref = payment.get_provider_ref().ok_or(ApiError::Conflict(
        "Payment has no processor reference".to_string(),
    ))?;

    state
        .payments
        .refund(&provider_ref, payment.get_amount_cents())
        .await
        .map_err(|err| ApiError::Provider(err.to_string()))?;

    // Call the repository function to record the refund
    let payment = repo::refund_payment(&state.pool, &payment_id, reason)
        .await
        .map_err(ApiError::Database)?;

    info!("Refunded payment {}", payment_id);

    // Return the refunded payment as JSON
    Ok(Json(payment))
}

/// Handler for payment-processor webhook deliveries
///
/// This function handles POST requests to `/api/payments/webhook`.
///
/// There is no session on this route; authenticity comes from the HMAC
/// signature over the raw body. Deliveries are retried by processors, so
/// settling a payment into the state it already has succeeds quietly.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `headers` - The request headers carrying the signature
/// * `body` - The raw request body the signature covers
///
/// ### Returns
///
/// The settled payment as JSON
#[instrument(skip(state, headers, body))]
pub async fn webhook_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the request headers for the signature
    headers: HeaderMap,
    // Extract the raw body; the signature covers the exact bytes
    body: String,
) -> Result<Json<Payment>, ApiError> {
    let signature = headers
        .get(WEBHOOK_SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    if let Err(err) =
        signing::verify_webhook_signature(&state.config.webhook_secret, signature, body.as_bytes())
    {
        warn!("Rejected webhook delivery: {}", err);
        return Err(ApiError::Unauthorized);
    }

    let event: WebhookEventDto = serde_json::from_str(&body)
        .map_err(|_| ApiError::Validation("Malformed webhook payload".to_string()))?;

    debug!("Processing {} for {}", event.event_type, event.provider_ref);

    let outcome = match event.event_type.as_str() {
        "checkout.completed" => PaymentStatus::Completed,
        "checkout.failed" => PaymentStatus::Failed,
        other => {
            return Err(ApiError::Validation(format!(
                "Unknown webhook event type: {}",
                other
            )));
        }
    };

    let payment = repo::get_payment_by_provider_ref(&state.pool, &event.provider_ref)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;

    // Re-deliveries of the same outcome are acknowledged, not errors
    if payment.get_status() == outcome {
        return Ok(Json(payment));
    }
    if payment.get_status() != PaymentStatus::Pending {
        return Err(ApiError::Conflict(format!(
            "Payment already settled (status: {})",
            payment.get_status()
        )));
    }

    // Call the repository function to settle the payment
    let payment = repo::settle_payment(&state.pool, &event.provider_ref, outcome)
        .await
        .map_err(ApiError::Database)?;

    info!("Webhook settled payment {} as {}", payment.get_id(), outcome);

    // Return the settled payment as JSON
    Ok(Json(payment))
}
