use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::auth;
use crate::dto::{QuoteRequestDto, RegistrationResponseDto};
use crate::errors::ApiError;
use crate::handlers::event_handlers::{price_party, validate_party};
use crate::models::{Payment, PaymentKind, Registration, RegistrationStatus};
use crate::payments::CheckoutRequest;
use crate::repo;
use crate::state::AppState;

/// Handler for registering for an event
///
/// This function handles POST requests to `/api/events/{id}/registrations`.
///
/// The price is recomputed on the server from the caller's membership
/// standing and the early-bird window, never taken from the client. A
/// full event waitlists the registration instead; waitlisted members are
/// not charged until a place opens up. Confirmed registrations with a
/// balance get a hosted checkout URL, and the processor is contacted
/// before any payment row is written.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `event_id` - The ID of the event, extracted from the URL path
/// * `headers` - The request headers carrying the bearer token
/// * `payload` - The party being registered
///
/// ### Returns
///
/// The registration and, when payment is due, the checkout URL as JSON
#[instrument(skip(state, headers, payload), fields(event_id = %event_id))]
pub async fn create_registration_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the event ID from the URL path
    Path(event_id): Path<String>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
    // Extract and deserialize the JSON request body
    Json(payload): Json<QuoteRequestDto>,
) -> Result<Json<RegistrationResponseDto>, ApiError> {
    let user = auth::require_user(&state.pool, &headers)?;

    info!(
        "Registering {} adults, {} children for event",
        payload.adults, payload.children
    );

    validate_party(&payload)?;

    let event = repo::get_event(&state.pool, &event_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;
    if !event.is_published() && !user.is_admin() {
        return Err(ApiError::NotFound);
    }

    let now = Utc::now();
    if event.has_ended(now) {
        return Err(ApiError::Conflict(
            "Event has already ended".to_string(),
        ));
    }
    if repo::get_active_registration(&state.pool, &event_id, &user.get_id())
        .map_err(ApiError::Database)?
        .is_some()
    {
        return Err(ApiError::Conflict(
            "You are already registered for this event".to_string(),
        ));
    }

    let quote = price_party(&state.config.pricing, &event, &user, &payload, now);

    // Call the repository function to create the registration
    let registration = repo::create_registration(
        &state.pool,
        &event_id,
        &user.get_id(),
        &payload,
        &quote,
    )
    .await
    .map_err(ApiError::Database)?;

    // Waitlisted members keep their money until a place opens up
    if registration.get_status() != RegistrationStatus::Confirmed
        || registration.get_total_cents() == 0
    {
        info!(
            "Created {} registration {} with nothing to collect",
            registration.get_status(),
            registration.get_id()
        );
        return Ok(Json(RegistrationResponseDto {
            registration,
            checkout_url: None,
        }));
    }

    let mut payment = Payment::new(
        user.get_id(),
        PaymentKind::Registration,
        registration.get_total_cents(),
    );
    payment.set_registration_id(Some(registration.get_id()));

    let request = CheckoutRequest {
        payment_id: payment.get_id(),
        amount_cents: payment.get_amount_cents(),
        description: format!("{} registration", event.get_title()),
        customer_email: user.get_email(),
    };
    let session = match state.payments.create_checkout(&request).await {
        Ok(session) => session,
        Err(err) => {
            // Give the place back before reporting the processor failure
            repo::cancel_registration(&state.pool, &registration.get_id())
                .await
                .map_err(ApiError::Database)?;
            return Err(ApiError::Provider(err.to_string()));
        }
    };
    payment.set_provider_ref(Some(session.provider_ref.clone()));

    repo::create_payment(&state.pool, &payment)
        .await
        .map_err(ApiError::Database)?;
    let registration = repo::attach_payment(&state.pool, &registration.get_id(), &payment.get_id())
        .await
        .map_err(ApiError::Database)?;

    info!(
        "Created registration {} with payment {} awaiting checkout",
        registration.get_id(),
        payment.get_id()
    );

    // Return the registration and checkout URL as JSON
    Ok(Json(RegistrationResponseDto {
        registration,
        checkout_url: Some(session.url),
    }))
}

/// Handler for listing the caller's own registrations
///
/// This function handles GET requests to `/api/user/registrations`.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `headers` - The request headers carrying the bearer token
///
/// ### Returns
///
/// A list of the caller's registrations as JSON, newest first
#[instrument(skip(state, headers))]
pub async fn list_my_registrations_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
) -> Result<Json<Vec<Registration>>, ApiError> {
    let user = auth::require_user(&state.pool, &headers)?;

    debug!("Listing registrations for user {}", user.get_id());

    let registrations = repo::list_registrations_for_user(&state.pool, &user.get_id())
        .map_err(ApiError::Database)?;

    // Return the list of registrations as JSON
    Ok(Json(registrations))
}

/// Handler for listing every registration on an event
///
/// This function handles GET requests to `/api/events/{id}/registrations`.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `event_id` - The ID of the event, extracted from the URL path
/// * `headers` - The request headers carrying the bearer token
///
/// ### Returns
///
/// A list of registrations as JSON in arrival order
#[instrument(skip(state, headers), fields(event_id = %event_id))]
pub async fn list_event_registrations_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the event ID from the URL path
    Path(event_id): Path<String>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
) -> Result<Json<Vec<Registration>>, ApiError> {
    auth::require_admin(&state.pool, &headers)?;

    debug!("Listing registrations for event");

    // First check the event exists
    repo::get_event(&state.pool, &event_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;

    let registrations =
        repo::list_registrations_for_event(&state.pool, &event_id).map_err(ApiError::Database)?;

    info!(
        "Retrieved {} registrations for event {}",
        registrations.len(),
        event_id
    );

    // Return the list of registrations as JSON
    Ok(Json(registrations))
}

/// Handler for cancelling a registration
///
/// This function handles DELETE requests to `/api/registrations/{id}`.
///
/// When the cancellation frees a confirmed place, the oldest waitlisted
/// registration is promoted and that member is notified.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `registration_id` - The ID of the registration to cancel
/// * `headers` - The request headers carrying the bearer token
///
/// ### Returns
///
/// The cancelled registration as JSON
#[instrument(skip(state, headers), fields(registration_id = %registration_id))]
pub async fn cancel_registration_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the registration ID from the URL path
    Path(registration_id): Path<String>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
) -> Result<Json<Registration>, ApiError> {
    let user = auth::require_user(&state.pool, &headers)?;

    info!("Cancelling registration");

    // First check the registration exists and the caller may touch it
    let registration = repo::get_registration(&state.pool, &registration_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;
    if registration.get_user_id() != user.get_id() && !user.is_admin() {
        return Err(ApiError::Forbidden);
    }
    if !registration.is_active() {
        return Err(ApiError::Conflict(
            "Registration is already cancelled".to_string(),
        ));
    }

    // Call the repository function to cancel the registration
    let (cancelled, promoted) = repo::cancel_registration(&state.pool, &registration_id)
        .await
        .map_err(ApiError::Database)?;

    if let Some(promoted) = promoted {
        let event = repo::get_event(&state.pool, &promoted.get_event_id())
            .map_err(ApiError::Database)?;
        let promoted_user =
            repo::get_user(&state.pool, &promoted.get_user_id()).map_err(ApiError::Database)?;
        if let (Some(event), Some(promoted_user)) = (event, promoted_user) {
            state
                .notifier
                .notify(
                    &promoted_user.get_email(),
                    &format!("You're off the waitlist for {}", event.get_title()),
                    &format!(
                        "A place opened up and your registration for {} is now confirmed.",
                        event.get_title()
                    ),
                )
                .await;
        }
    }

    info!("Cancelled registration {}", registration_id);

    // Return the cancelled registration as JSON
    Ok(Json(cancelled))
}
