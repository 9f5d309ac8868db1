use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::auth;
use crate::dto::IssueBadgeDto;
use crate::errors::ApiError;
use crate::models::Badge;
use crate::repo;
use crate::state::AppState;

/// Handler for retrieving the caller's current badge
///
/// This function handles GET requests to `/api/user/badge`.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `headers` - The request headers carrying the bearer token
///
/// ### Returns
///
/// The caller's active badge as JSON
#[instrument(skip(state, headers))]
pub async fn get_my_badge_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
) -> Result<Json<Badge>, ApiError> {
    let user = auth::require_user(&state.pool, &headers)?;

    debug!("Retrieving badge for user {}", user.get_id());

    let badge = repo::get_active_badge(&state.pool, &user.get_id())
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;

    // Return the badge as JSON
    Ok(Json(badge))
}

/// Handler for issuing a membership badge
///
/// This function handles POST requests to `/api/admin/members/{id}/badge`.
///
/// Reissuing is the normal path for a lost or outdated badge: the
/// member's old badge is revoked and the new one takes the next number
/// in the club's sequence. Numbers are never reused.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `member_id` - The ID of the member, extracted from the URL path
/// * `headers` - The request headers carrying the bearer token
/// * `payload` - The optional label and badge artwork parameters
///
/// ### Returns
///
/// The newly issued badge as JSON
#[instrument(skip(state, headers, payload), fields(member_id = %member_id))]
pub async fn issue_badge_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the member ID from the URL path
    Path(member_id): Path<String>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
    // Extract and deserialize the JSON request body
    Json(payload): Json<IssueBadgeDto>,
) -> Result<Json<Badge>, ApiError> {
    auth::require_admin(&state.pool, &headers)?;

    info!("Issuing badge");

    // First check the member exists and can hold a badge
    let member = repo::get_user(&state.pool, &member_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;
    if member.is_deactivated() {
        return Err(ApiError::Conflict(
            "Cannot issue a badge to a deactivated account".to_string(),
        ));
    }

    // A blank label falls back to the member's name
    let label = match payload.label {
        Some(label) if !label.trim().is_empty() => label,
        _ => member.get_name(),
    };
    let design = payload.design.unwrap_or_default();

    // Call the repository function to issue the badge
    let badge = repo::issue_badge(&state.pool, &member_id, label, design)
        .await
        .map_err(ApiError::Database)?;

    info!(
        "Issued badge #{} to member {}",
        badge.get_badge_number(),
        member_id
    );

    // Return the issued badge as JSON
    Ok(Json(badge))
}

/// Handler for listing the badge register
///
/// This function handles GET requests to `/api/admin/badges`.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `headers` - The request headers carrying the bearer token
///
/// ### Returns
///
/// Every badge ever issued as JSON, highest number first
#[instrument(skip(state, headers))]
pub async fn list_badges_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
) -> Result<Json<Vec<Badge>>, ApiError> {
    auth::require_admin(&state.pool, &headers)?;

    // Call the repository function to list every badge
    let badges = repo::list_badges(&state.pool).map_err(ApiError::Database)?;

    info!("Retrieved {} badges", badges.len());

    // Return the badge register as JSON
    Ok(Json(badges))
}
