use axum::{extract::State, http::HeaderMap, Json};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::auth;
use crate::dto::{LoginDto, RegisterDto, SessionResponseDto};
use crate::errors::ApiError;
use crate::models::User;
use crate::repo;
use crate::state::AppState;

/// Handler for registering a new member account
///
/// This function handles POST requests to `/api/auth/register`.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `payload` - The request payload containing email, password, and name
///
/// ### Returns
///
/// The new user together with a fresh session token as JSON
#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn register_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract and deserialize the JSON request body
    Json(payload): Json<RegisterDto>,
) -> Result<Json<SessionResponseDto>, ApiError> {
    info!("Registering new member account");

    if payload.password.len() < 8 {
        return Err(ApiError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let email = repo::normalize_email(&payload.email);
    if !email.contains('@') {
        return Err(ApiError::Validation(
            "A valid email address is required".to_string(),
        ));
    }

    // First check whether the email is already taken
    let taken = repo::find_user_by_email(&state.pool, &email)
        .map_err(ApiError::Database)?
        .is_some();
    if taken {
        return Err(ApiError::Conflict("Email is already registered".to_string()));
    }

    // Call the repository function to create the user
    let user = repo::create_user(&state.pool, &payload.email, &payload.password, &payload.name)
        .await
        .map_err(ApiError::Database)?;

    // A registration doubles as a login, so hand back a session right away
    let session = repo::create_session(&state.pool, &user.get_id(), state.config.session_ttl())
        .await
        .map_err(ApiError::Database)?;

    info!("Registered member with id: {}", user.get_id());

    // Return the user and their session token as JSON
    Ok(Json(SessionResponseDto {
        token: session.get_id(),
        user,
    }))
}

/// Handler for logging in
///
/// This function handles POST requests to `/api/auth/login`.
///
/// Bad credentials and deactivated accounts both come back as 401
/// without saying which, so the endpoint does not leak which emails
/// are registered.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `payload` - The request payload containing email and password
///
/// ### Returns
///
/// The user together with a fresh session token as JSON
#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn login_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract and deserialize the JSON request body
    Json(payload): Json<LoginDto>,
) -> Result<Json<SessionResponseDto>, ApiError> {
    debug!("Attempting login");

    let email = repo::normalize_email(&payload.email);
    let user = repo::find_user_by_email(&state.pool, &email)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::Unauthorized)?;

    let valid = auth::verify_password(&payload.password, &user.get_password_hash())
        .map_err(ApiError::Database)?;
    if !valid {
        debug!("Password mismatch");
        return Err(ApiError::Unauthorized);
    }

    if user.is_deactivated() {
        debug!("Rejected login for deactivated account");
        return Err(ApiError::Unauthorized);
    }

    // Logins double as an opportunistic sweep of expired sessions
    repo::sweep_expired_sessions(&state.pool)
        .await
        .map_err(ApiError::Database)?;

    let session = repo::create_session(&state.pool, &user.get_id(), state.config.session_ttl())
        .await
        .map_err(ApiError::Database)?;

    info!("Logged in user {}", user.get_id());

    // Return the user and their session token as JSON
    Ok(Json(SessionResponseDto {
        token: session.get_id(),
        user,
    }))
}

/// Handler for logging out
///
/// This function handles POST requests to `/api/auth/logout`.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `headers` - The request headers carrying the bearer token
///
/// ### Returns
///
/// A Result indicating success (Ok(())) or an error
#[instrument(skip(state, headers))]
pub async fn logout_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
) -> Result<Json<()>, ApiError> {
    let token = auth::bearer_token(&headers).ok_or(ApiError::Unauthorized)?;

    // Call the repository function to revoke the session
    repo::delete_session(&state.pool, token)
        .await
        .map_err(ApiError::Database)?;

    info!("Logged out");

    // Return a success message
    Ok(Json(()))
}

/// Handler for retrieving the authenticated user
///
/// This function handles GET requests to `/api/auth/me`.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `headers` - The request headers carrying the bearer token
///
/// ### Returns
///
/// The current user as JSON, or 401 without a valid session
#[instrument(skip(state, headers))]
pub async fn me_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
) -> Result<Json<User>, ApiError> {
    let user = auth::require_user(&state.pool, &headers)?;

    debug!("Resolved session for user {}", user.get_id());

    // Return the current user as JSON
    Ok(Json(user))
}
