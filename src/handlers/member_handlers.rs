use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::auth;
use crate::dto::{MemberQueryDto, UpdateMemberDto};
use crate::errors::ApiError;
use crate::models::User;
use crate::repo;
use crate::state::AppState;

/// Handler for listing member accounts
///
/// This function handles GET requests to `/api/admin/members`.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `query` - Role, free-text, and deactivation filters
/// * `headers` - The request headers carrying the bearer token
///
/// ### Returns
///
/// The matching member accounts as JSON
#[instrument(skip(state, headers))]
pub async fn list_members_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract and deserialize the query string
    Query(query): Query<MemberQueryDto>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
) -> Result<Json<Vec<User>>, ApiError> {
    auth::require_admin(&state.pool, &headers)?;

    // Call the repository function to list members
    let members = repo::list_members(&state.pool, &query).map_err(ApiError::Database)?;

    info!("Retrieved {} members", members.len());

    // Return the members as JSON
    Ok(Json(members))
}

/// Handler for updating a member's role or membership expiry
///
/// This function handles PATCH requests to `/api/admin/members/{id}`.
/// This is where dues renewals land: the front desk records a payment
/// and pushes the expiry date out.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `member_id` - The ID of the member, extracted from the URL path
/// * `headers` - The request headers carrying the bearer token
/// * `payload` - The fields to change; omitted fields are left alone
///
/// ### Returns
///
/// The updated member account as JSON
#[instrument(skip(state, headers, payload), fields(member_id = %member_id))]
pub async fn update_member_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the member ID from the URL path
    Path(member_id): Path<String>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
    // Extract and deserialize the JSON request body
    Json(payload): Json<UpdateMemberDto>,
) -> Result<Json<User>, ApiError> {
    auth::require_admin(&state.pool, &headers)?;

    info!("Updating member");

    // First check the member exists
    repo::get_user(&state.pool, &member_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;

    // Call the repository function to update the member
    let member = repo::update_member(
        &state.pool,
        &member_id,
        payload.role,
        payload.membership_expires,
    )
    .await
    .map_err(ApiError::Database)?;

    info!("Updated member {}", member_id);

    // Return the updated member as JSON
    Ok(Json(member))
}

/// Handler for deactivating a member account
///
/// This function handles DELETE requests to `/api/admin/members/{id}`.
/// Accounts are never removed outright: payments, offers and
/// registrations keep pointing at the deactivated record. Every live
/// session the member holds is revoked in the same stroke.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `member_id` - The ID of the member, extracted from the URL path
/// * `headers` - The request headers carrying the bearer token
///
/// ### Returns
///
/// An empty JSON response on success
#[instrument(skip(state, headers), fields(member_id = %member_id))]
pub async fn deactivate_member_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the member ID from the URL path
    Path(member_id): Path<String>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
) -> Result<Json<()>, ApiError> {
    let admin = auth::require_admin(&state.pool, &headers)?;

    info!("Deactivating member");

    if member_id == admin.get_id() {
        return Err(ApiError::Validation(
            "You cannot deactivate your own account".to_string(),
        ));
    }

    // First check the member exists
    let member = repo::get_user(&state.pool, &member_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;
    if member.is_deactivated() {
        return Err(ApiError::Conflict(
            "Account is already deactivated".to_string(),
        ));
    }

    // Call the repository function to deactivate the member
    repo::deactivate_user(&state.pool, &member_id)
        .await
        .map_err(ApiError::Database)?;

    info!("Deactivated member {}", member_id);

    Ok(Json(()))
}
