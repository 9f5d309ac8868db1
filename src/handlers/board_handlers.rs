use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::auth;
use crate::dto::{BoardRosterEntryDto, CreateBoardMemberDto};
use crate::errors::ApiError;
use crate::models::BoardMember;
use crate::repo;
use crate::state::AppState;

/// Handler for the public board roster
///
/// This function handles GET requests to `/api/board`. The roster is
/// the one piece of member data the club shows to the world, so no
/// authentication is required.
///
/// ### Arguments
///
/// * `state` - The shared application state
///
/// ### Returns
///
/// The current office holders as JSON, president first
#[instrument(skip(state))]
pub async fn list_board_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BoardRosterEntryDto>>, ApiError> {
    // Call the repository function to list the current roster
    let roster = repo::list_current_roster(&state.pool).map_err(ApiError::Database)?;

    let entries = roster
        .into_iter()
        .map(|(board_member, user)| BoardRosterEntryDto {
            board_member,
            name: user.get_name(),
        })
        .collect::<Vec<_>>();

    info!("Retrieved {} roster entries", entries.len());

    // Return the roster as JSON
    Ok(Json(entries))
}

/// Handler for appointing a member to the board
///
/// This function handles POST requests to `/api/admin/board`.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `headers` - The request headers carrying the bearer token
/// * `payload` - The office holder, title and term dates
///
/// ### Returns
///
/// The created roster entry as JSON
#[instrument(skip(state, headers, payload))]
pub async fn create_board_member_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
    // Extract and deserialize the JSON request body
    Json(payload): Json<CreateBoardMemberDto>,
) -> Result<Json<BoardMember>, ApiError> {
    auth::require_admin(&state.pool, &headers)?;

    info!("Appointing board member");

    if payload.office.trim().is_empty() {
        return Err(ApiError::Validation(
            "An office title is required".to_string(),
        ));
    }
    if payload.term_ends <= payload.term_starts {
        return Err(ApiError::Validation(
            "Term must end after it starts".to_string(),
        ));
    }

    // First check the member exists
    repo::get_user(&state.pool, &payload.user_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;

    // Call the repository function to create the roster entry
    let seat = repo::create_board_member(
        &state.pool,
        &payload.user_id,
        payload.office,
        payload.sort_order,
        payload.term_starts,
        payload.term_ends,
    )
    .await
    .map_err(ApiError::Database)?;

    info!("Created roster entry with ID: {}", seat.get_id());

    // Return the roster entry as JSON
    Ok(Json(seat))
}

/// Handler for removing a seat from the board roster
///
/// This function handles DELETE requests to `/api/admin/board/{id}`.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `entry_id` - The ID of the roster entry, extracted from the URL path
/// * `headers` - The request headers carrying the bearer token
///
/// ### Returns
///
/// An empty JSON response on success
#[instrument(skip(state, headers), fields(entry_id = %entry_id))]
pub async fn delete_board_member_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the roster entry ID from the URL path
    Path(entry_id): Path<String>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
) -> Result<Json<()>, ApiError> {
    auth::require_admin(&state.pool, &headers)?;

    info!("Removing roster entry");

    // First check the roster entry exists
    repo::get_board_member(&state.pool, &entry_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;

    // Call the repository function to delete the roster entry
    repo::delete_board_member(&state.pool, &entry_id)
        .await
        .map_err(ApiError::Database)?;

    info!("Deleted roster entry {}", entry_id);

    Ok(Json(()))
}
