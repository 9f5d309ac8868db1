use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::auth;
use crate::dto::{CreateFamilyMemberDto, UpdateFamilyMemberDto};
use crate::errors::ApiError;
use crate::models::FamilyMember;
use crate::repo;
use crate::state::AppState;

/// Handler for listing the caller's family members
///
/// This function handles GET requests to `/api/user/family`.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `headers` - The request headers carrying the bearer token
///
/// ### Returns
///
/// The caller's family members as JSON
#[instrument(skip(state, headers))]
pub async fn list_family_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
) -> Result<Json<Vec<FamilyMember>>, ApiError> {
    let user = auth::require_user(&state.pool, &headers)?;

    // Call the repository function to list the household
    let members =
        repo::list_family_members(&state.pool, &user.get_id()).map_err(ApiError::Database)?;

    debug!("Retrieved {} family members", members.len());

    // Return the list of family members as JSON
    Ok(Json(members))
}

/// Handler for adding a family member to the caller's account
///
/// This function handles POST requests to `/api/user/family`.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `headers` - The request headers carrying the bearer token
/// * `payload` - The request payload with name, relation, and birth year
///
/// ### Returns
///
/// The newly created family member as JSON
#[instrument(skip(state, headers, payload), fields(name = %payload.name))]
pub async fn create_family_member_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
    // Extract and deserialize the JSON request body
    Json(payload): Json<CreateFamilyMemberDto>,
) -> Result<Json<FamilyMember>, ApiError> {
    let user = auth::require_user(&state.pool, &headers)?;

    info!("Adding family member");

    if payload.name.trim().is_empty() {
        return Err(ApiError::Validation("Name cannot be empty".to_string()));
    }

    let relation = payload.relation.unwrap_or_else(|| "family".to_string());

    // Call the repository function to create the record
    let member = repo::create_family_member(
        &state.pool,
        &user.get_id(),
        payload.name,
        relation,
        payload.birth_year,
    )
    .await
    .map_err(ApiError::Database)?;

    info!("Added family member with id: {}", member.get_id());

    // Return the created family member as JSON
    Ok(Json(member))
}

/// Handler for updating one of the caller's family members
///
/// This function handles PUT requests to `/api/user/family/{id}`.
///
/// Records belonging to other users are reported as missing rather
/// than forbidden, so ids cannot be probed.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `headers` - The request headers carrying the bearer token
/// * `member_id` - The ID of the record, extracted from the URL path
/// * `payload` - The request payload with the fields to change
///
/// ### Returns
///
/// The updated family member as JSON
#[instrument(skip(state, headers, payload), fields(member_id = %member_id))]
pub async fn update_family_member_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the record ID from the URL path
    Path(member_id): Path<String>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
    // Extract and deserialize the JSON request body
    Json(payload): Json<UpdateFamilyMemberDto>,
) -> Result<Json<FamilyMember>, ApiError> {
    let user = auth::require_user(&state.pool, &headers)?;

    // First check the record exists and belongs to the caller
    let existing = repo::get_family_member(&state.pool, &member_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;
    if existing.get_user_id() != user.get_id() {
        return Err(ApiError::NotFound);
    }

    // Call the repository function to apply the changes
    let member = repo::update_family_member(
        &state.pool,
        &member_id,
        payload.name,
        payload.relation,
        payload.birth_year,
    )
    .await
    .map_err(ApiError::Database)?;

    info!("Updated family member {}", member_id);

    // Return the updated family member as JSON
    Ok(Json(member))
}

/// Handler for removing one of the caller's family members
///
/// This function handles DELETE requests to `/api/user/family/{id}`.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `headers` - The request headers carrying the bearer token
/// * `member_id` - The ID of the record, extracted from the URL path
///
/// ### Returns
///
/// A Result indicating success (Ok(())) or an error
#[instrument(skip(state, headers), fields(member_id = %member_id))]
pub async fn delete_family_member_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the record ID from the URL path
    Path(member_id): Path<String>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
) -> Result<Json<()>, ApiError> {
    let user = auth::require_user(&state.pool, &headers)?;

    info!("Removing family member");

    // First check the record exists and belongs to the caller
    let existing = repo::get_family_member(&state.pool, &member_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;
    if existing.get_user_id() != user.get_id() {
        return Err(ApiError::NotFound);
    }

    // Call the repository function to delete the record
    repo::delete_family_member(&state.pool, &member_id)
        .await
        .map_err(ApiError::Database)?;

    info!("Removed family member {}", member_id);

    // Return a success message
    Ok(Json(()))
}
