use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::auth;
use crate::dto::{CreatePhotoDto, PhotoUploadResponseDto, UpdatePhotoDto};
use crate::errors::ApiError;
use crate::models::Photo;
use crate::repo;
use crate::signing;
use crate::state::AppState;

/// Handler for uploading a gallery photo
///
/// This function handles POST requests to `/api/photos`.
///
/// New photos land unpublished; an admin puts them on the public gallery
/// page later. The response carries a signed URL the client PUTs the
/// image bytes to.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `headers` - The request headers carrying the bearer token
/// * `payload` - The photo title, file details, caption, and credit
///
/// ### Returns
///
/// The photo record and the signed upload URL as JSON
#[instrument(skip(state, headers, payload), fields(title = %payload.title))]
pub async fn create_photo_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
    // Extract and deserialize the JSON request body
    Json(payload): Json<CreatePhotoDto>,
) -> Result<Json<PhotoUploadResponseDto>, ApiError> {
    let user = auth::require_user(&state.pool, &headers)?;

    info!("Creating photo: {}", payload.title);

    if payload.title.trim().is_empty() {
        return Err(ApiError::Validation("Title cannot be empty".to_string()));
    }
    if !payload.content_type.starts_with("image/") {
        return Err(ApiError::Validation(
            "Gallery uploads must be images".to_string(),
        ));
    }

    let file_key = signing::object_key("photos", &payload.file_name);

    // Call the repository function to create the photo record
    let photo = repo::create_photo(
        &state.pool,
        &user.get_id(),
        payload.title,
        file_key.clone(),
        payload.caption,
        payload.credit,
        payload.captured_at,
    )
    .await
    .map_err(ApiError::Database)?;

    let upload_url = state
        .signer
        .upload_url(&file_key, state.config.upload_url_ttl());

    info!("Created photo with id: {}", photo.get_id());

    // Return the photo and upload URL as JSON
    Ok(Json(PhotoUploadResponseDto { photo, upload_url }))
}

/// Handler for listing the photo gallery
///
/// This function handles GET requests to `/api/photos`. Anonymous
/// callers see the published gallery, members also see their own
/// unpublished uploads, and admins see everything awaiting review.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `headers` - The request headers, which may carry a bearer token
///
/// ### Returns
///
/// A list of photos as JSON, newest first
#[instrument(skip(state, headers))]
pub async fn list_photos_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
) -> Result<Json<Vec<Photo>>, ApiError> {
    let caller = auth::optional_user(&state.pool, &headers)?;

    debug!("Listing photos");

    let photos = match caller {
        Some(user) if user.is_admin() => {
            repo::list_all_photos(&state.pool).map_err(ApiError::Database)?
        }
        Some(user) => repo::list_photos_for_viewer(&state.pool, &user.get_id())
            .map_err(ApiError::Database)?,
        None => repo::list_published_photos(&state.pool).map_err(ApiError::Database)?,
    };

    // Return the list of photos as JSON
    Ok(Json(photos))
}

/// Handler for editing a photo's details
///
/// This function handles PATCH requests to `/api/photos/{id}`.
///
/// Owners may correct the title, caption, credit, and capture time of
/// their own uploads; flipping `published` is curation and stays with
/// admins.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `photo_id` - The ID of the photo to update
/// * `headers` - The request headers carrying the bearer token
/// * `payload` - The request payload containing the fields to change
///
/// ### Returns
///
/// The updated photo as JSON
#[instrument(skip(state, headers, payload), fields(photo_id = %photo_id))]
pub async fn update_photo_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the photo ID from the URL path
    Path(photo_id): Path<String>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
    // Extract and deserialize the JSON request body
    Json(payload): Json<UpdatePhotoDto>,
) -> Result<Json<Photo>, ApiError> {
    let user = auth::require_user(&state.pool, &headers)?;

    info!("Updating photo");

    // First check the photo exists and the caller may touch it
    let photo = repo::get_photo(&state.pool, &photo_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;
    if photo.get_owner_id() != user.get_id() && !user.is_admin() {
        return Err(ApiError::Forbidden);
    }
    if payload.published.is_some() && !user.is_admin() {
        return Err(ApiError::Forbidden);
    }

    // Call the repository function to update the photo
    let photo = repo::update_photo(&state.pool, &photo_id, &payload)
        .await
        .map_err(ApiError::Database)?;

    info!("Updated photo {}", photo_id);

    // Return the updated photo as JSON
    Ok(Json(photo))
}

/// Handler for removing a photo from the gallery
///
/// This function handles DELETE requests to `/api/photos/{id}`.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `photo_id` - The ID of the photo to delete
/// * `headers` - The request headers carrying the bearer token
///
/// ### Returns
///
/// An empty JSON response on success
#[instrument(skip(state, headers), fields(photo_id = %photo_id))]
pub async fn delete_photo_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the photo ID from the URL path
    Path(photo_id): Path<String>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
) -> Result<Json<()>, ApiError> {
    let user = auth::require_user(&state.pool, &headers)?;

    info!("Deleting photo");

    // First check the photo exists and the caller may remove it
    let photo = repo::get_photo(&state.pool, &photo_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;
    if photo.get_owner_id() != user.get_id() && !user.is_admin() {
        return Err(ApiError::Forbidden);
    }

    // Call the repository function to delete the photo
    repo::delete_photo(&state.pool, &photo_id)
        .await
        .map_err(ApiError::Database)?;

    info!("Deleted photo {}", photo_id);

    // Return an empty response
    Ok(Json(()))
}
