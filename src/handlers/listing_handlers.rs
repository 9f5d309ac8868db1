use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::auth;
use crate::dto::{
    AttachListingPhotoDto, CreateListingDto, ListingPhotoResponseDto, ListingQueryDto,
    UpdateListingDto,
};
use crate::errors::ApiError;
use crate::models::{Listing, ListingStatus};
use crate::repo;
use crate::signing;
use crate::state::AppState;

/// Handler for browsing the classifieds
///
/// This function handles GET requests to `/api/listings`.
///
/// Without a `status` filter only active listings come back; sold and
/// withdrawn listings stay reachable through an explicit filter.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `headers` - The request headers carrying the bearer token
/// * `query` - Query parameters for filtering the results
///
/// ### Returns
///
/// A list of matching listings as JSON
#[instrument(skip(state, headers, query))]
pub async fn list_listings_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract and deserialize the query string
    Query(query): Query<ListingQueryDto>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
) -> Result<Json<Vec<Listing>>, ApiError> {
    auth::require_user(&state.pool, &headers)?;

    // Call the repository function to list listings
    let listings = repo::list_listings(&state.pool, &query).map_err(ApiError::Database)?;

    debug!("Retrieved {} listings", listings.len());

    // Return the list of listings as JSON
    Ok(Json(listings))
}

/// Handler for creating a listing
///
/// This function handles POST requests to `/api/listings`.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `headers` - The request headers carrying the bearer token
/// * `payload` - The request payload with title, description, category, price
///
/// ### Returns
///
/// The newly created listing as JSON
#[instrument(skip(state, headers, payload), fields(title = %payload.title))]
pub async fn create_listing_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
    // Extract and deserialize the JSON request body
    Json(payload): Json<CreateListingDto>,
) -> Result<Json<Listing>, ApiError> {
    let user = auth::require_user(&state.pool, &headers)?;

    info!("Creating new listing");

    if payload.title.trim().is_empty() {
        return Err(ApiError::Validation("Title cannot be empty".to_string()));
    }
    if payload.price_cents < 0 {
        return Err(ApiError::Validation(
            "Asking price cannot be negative".to_string(),
        ));
    }

    // Call the repository function to create the listing
    let listing = repo::create_listing(
        &state.pool,
        &user.get_id(),
        payload.title,
        payload.description,
        payload.category,
        payload.price_cents,
    )
    .await
    .map_err(ApiError::Database)?;

    info!("Created listing with id: {}", listing.get_id());

    // Return the created listing as JSON
    Ok(Json(listing))
}

/// Handler for retrieving a specific listing
///
/// This function handles GET requests to `/api/listings/{id}`.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `listing_id` - The ID of the listing, extracted from the URL path
/// * `headers` - The request headers carrying the bearer token
///
/// ### Returns
///
/// The requested listing as JSON, or 404 if it does not exist
#[instrument(skip(state, headers), fields(listing_id = %listing_id))]
pub async fn get_listing_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the listing ID from the URL path
    Path(listing_id): Path<String>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
) -> Result<Json<Listing>, ApiError> {
    auth::require_user(&state.pool, &headers)?;

    debug!("Retrieving listing");

    // Call the repository function to get the listing
    let listing = repo::get_listing(&state.pool, &listing_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;

    // Return the listing as JSON
    Ok(Json(listing))
}

/// Handler for editing a listing
///
/// This function handles PUT requests to `/api/listings/{id}`.
///
/// Only the seller may edit, and not once the listing has been sold or
/// withdrawn.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `listing_id` - The ID of the listing, extracted from the URL path
/// * `headers` - The request headers carrying the bearer token
/// * `payload` - The request payload with the fields to change
///
/// ### Returns
///
/// The updated listing as JSON
#[instrument(skip(state, headers, payload), fields(listing_id = %listing_id))]
pub async fn update_listing_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the listing ID from the URL path
    Path(listing_id): Path<String>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
    // Extract and deserialize the JSON request body
    Json(payload): Json<UpdateListingDto>,
) -> Result<Json<Listing>, ApiError> {
    let user = auth::require_user(&state.pool, &headers)?;

    // First check the listing exists and the caller is the seller
    let existing = repo::get_listing(&state.pool, &listing_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;
    if existing.get_seller_id() != user.get_id() {
        return Err(ApiError::Forbidden);
    }
    if matches!(
        existing.get_status(),
        ListingStatus::Sold | ListingStatus::Withdrawn
    ) {
        return Err(ApiError::Conflict(format!(
            "Listing can no longer be edited (status: {})",
            existing.get_status()
        )));
    }

    if let Some(price) = payload.price_cents {
        if price < 0 {
            return Err(ApiError::Validation(
                "Asking price cannot be negative".to_string(),
            ));
        }
    }

    // Call the repository function to apply the changes
    let listing = repo::update_listing(
        &state.pool,
        &listing_id,
        payload.title,
        payload.description,
        payload.category,
        payload.price_cents,
    )
    .await
    .map_err(ApiError::Database)?;

    info!("Updated listing {}", listing_id);

    // Return the updated listing as JSON
    Ok(Json(listing))
}

/// Handler for withdrawing a listing
///
/// This function handles DELETE requests to `/api/listings/{id}`.
///
/// The row stays for history; pending offers on it are rejected in the
/// same transaction. The seller or an admin may withdraw.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `listing_id` - The ID of the listing, extracted from the URL path
/// * `headers` - The request headers carrying the bearer token
///
/// ### Returns
///
/// The withdrawn listing as JSON
#[instrument(skip(state, headers), fields(listing_id = %listing_id))]
pub async fn withdraw_listing_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the listing ID from the URL path
    Path(listing_id): Path<String>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
) -> Result<Json<Listing>, ApiError> {
    let user = auth::require_user(&state.pool, &headers)?;

    info!("Withdrawing listing");

    // First check the listing exists and the caller may withdraw it
    let existing = repo::get_listing(&state.pool, &listing_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;
    if existing.get_seller_id() != user.get_id() && !user.is_admin() {
        return Err(ApiError::Forbidden);
    }
    if existing.get_status() == ListingStatus::Withdrawn {
        return Err(ApiError::Conflict(
            "Listing is already withdrawn".to_string(),
        ));
    }

    // Call the repository function to withdraw the listing
    let listing = repo::withdraw_listing(&state.pool, &listing_id)
        .await
        .map_err(ApiError::Database)?;

    info!("Withdrew listing {}", listing_id);

    // Return the withdrawn listing as JSON
    Ok(Json(listing))
}

/// Handler for attaching a photo to a listing
///
/// This function handles POST requests to `/api/listings/{id}/photo`.
///
/// The server only records the storage key; the client PUTs the image
/// bytes to the signed URL that comes back.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `listing_id` - The ID of the listing, extracted from the URL path
/// * `headers` - The request headers carrying the bearer token
/// * `payload` - The request payload with the file name and content type
///
/// ### Returns
///
/// The listing and a signed upload URL as JSON
#[instrument(skip(state, headers, payload), fields(listing_id = %listing_id))]
pub async fn attach_listing_photo_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the listing ID from the URL path
    Path(listing_id): Path<String>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
    // Extract and deserialize the JSON request body
    Json(payload): Json<AttachListingPhotoDto>,
) -> Result<Json<ListingPhotoResponseDto>, ApiError> {
    let user = auth::require_user(&state.pool, &headers)?;

    info!("Attaching photo to listing");

    // First check the listing exists and the caller is the seller
    let existing = repo::get_listing(&state.pool, &listing_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;
    if existing.get_seller_id() != user.get_id() {
        return Err(ApiError::Forbidden);
    }
    if !existing.is_open_for_offers() {
        return Err(ApiError::Conflict(format!(
            "Listing is no longer open (status: {})",
            existing.get_status()
        )));
    }

    if !payload.content_type.starts_with("image/") {
        return Err(ApiError::Validation(
            "Listing photos must be images".to_string(),
        ));
    }

    let key = signing::object_key("listings", &payload.file_name);

    // Call the repository function to record the storage key
    let listing = repo::set_listing_photo(&state.pool, &listing_id, Some(key.clone()))
        .await
        .map_err(ApiError::Database)?;

    let upload_url = state.signer.upload_url(&key, state.config.upload_url_ttl());

    info!("Reserved photo slot {} for listing {}", key, listing_id);

    // Return the listing and the signed upload URL as JSON
    Ok(Json(ListingPhotoResponseDto {
        listing,
        upload_url,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::tests::{member_with_headers, setup_test_state, staff_with_headers};
    use crate::models::UserRole;

    fn telescope_payload() -> CreateListingDto {
        CreateListingDto {
            title: "8-inch Dobsonian".to_string(),
            description: "Well loved, mirror recently recoated".to_string(),
            category: "telescopes".to_string(),
            price_cents: 40_000,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_listing() {
        let state = setup_test_state();
        let (seller, headers) = member_with_headers(&state, "seller@example.com", "Sam").await;

        let created = create_listing_handler(
            State(state.clone()),
            headers.clone(),
            Json(telescope_payload()),
        )
        .await
        .unwrap()
        .0;

        assert_eq!(created.get_seller_id(), seller.get_id());
        assert_eq!(created.get_status(), ListingStatus::Active);

        let fetched = get_listing_handler(State(state), Path(created.get_id()), headers)
            .await
            .unwrap()
            .0;
        assert_eq!(fetched.get_title(), "8-inch Dobsonian");
    }

    #[tokio::test]
    async fn test_create_rejects_blank_title_and_negative_price() {
        let state = setup_test_state();
        let (_, headers) = member_with_headers(&state, "seller@example.com", "Sam").await;

        let mut blank = telescope_payload();
        blank.title = "  ".to_string();
        let err = create_listing_handler(State(state.clone()), headers.clone(), Json(blank))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let mut negative = telescope_payload();
        negative.price_cents = -1;
        let err = create_listing_handler(State(state), headers, Json(negative))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_index_hides_withdrawn_by_default() {
        let state = setup_test_state();
        let (_, headers) = member_with_headers(&state, "seller@example.com", "Sam").await;

        let keep = create_listing_handler(
            State(state.clone()),
            headers.clone(),
            Json(telescope_payload()),
        )
        .await
        .unwrap()
        .0;
        let gone = create_listing_handler(
            State(state.clone()),
            headers.clone(),
            Json(CreateListingDto {
                title: "Eyepiece case".to_string(),
                ..telescope_payload()
            }),
        )
        .await
        .unwrap()
        .0;

        withdraw_listing_handler(State(state.clone()), Path(gone.get_id()), headers.clone())
            .await
            .unwrap();

        let visible = list_listings_handler(
            State(state.clone()),
            Query(ListingQueryDto::default()),
            headers.clone(),
        )
        .await
        .unwrap()
        .0;
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].get_id(), keep.get_id());

        // An explicit status filter digs the withdrawn one back up
        let withdrawn = list_listings_handler(
            State(state),
            Query(ListingQueryDto {
                status: Some(ListingStatus::Withdrawn),
                ..Default::default()
            }),
            headers,
        )
        .await
        .unwrap()
        .0;
        assert_eq!(withdrawn.len(), 1);
        assert_eq!(withdrawn[0].get_id(), gone.get_id());
    }

    #[tokio::test]
    async fn test_only_the_seller_may_edit() {
        let state = setup_test_state();
        let (_, seller) = member_with_headers(&state, "seller@example.com", "Sam").await;
        let (_, other) = member_with_headers(&state, "other@example.com", "Olu").await;

        let listing =
            create_listing_handler(State(state.clone()), seller, Json(telescope_payload()))
                .await
                .unwrap()
                .0;

        let err = update_listing_handler(
            State(state),
            Path(listing.get_id()),
            other,
            Json(UpdateListingDto {
                price_cents: Some(1),
                ..Default::default()
            }),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ApiError::Forbidden));
    }

    #[tokio::test]
    async fn test_editing_a_withdrawn_listing_conflicts() {
        let state = setup_test_state();
        let (_, headers) = member_with_headers(&state, "seller@example.com", "Sam").await;

        let listing = create_listing_handler(
            State(state.clone()),
            headers.clone(),
            Json(telescope_payload()),
        )
        .await
        .unwrap()
        .0;
        withdraw_listing_handler(State(state.clone()), Path(listing.get_id()), headers.clone())
            .await
            .unwrap();

        let err = update_listing_handler(
            State(state),
            Path(listing.get_id()),
            headers,
            Json(UpdateListingDto {
                title: Some("New title".to_string()),
                ..Default::default()
            }),
        )
        .await
        .unwrap_err();

        match err {
            ApiError::Conflict(message) => assert!(message.contains("withdrawn")),
            other => panic!("Expected a conflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_admin_may_withdraw_but_strangers_may_not() {
        let state = setup_test_state();
        let (_, seller) = member_with_headers(&state, "seller@example.com", "Sam").await;
        let (_, stranger) = member_with_headers(&state, "other@example.com", "Olu").await;
        let (_, admin) =
            staff_with_headers(&state, "admin@example.com", "Ada", UserRole::Admin).await;

        let listing =
            create_listing_handler(State(state.clone()), seller, Json(telescope_payload()))
                .await
                .unwrap()
                .0;

        let err =
            withdraw_listing_handler(State(state.clone()), Path(listing.get_id()), stranger)
                .await
                .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden));

        let withdrawn =
            withdraw_listing_handler(State(state.clone()), Path(listing.get_id()), admin.clone())
                .await
                .unwrap()
                .0;
        assert_eq!(withdrawn.get_status(), ListingStatus::Withdrawn);

        // Withdrawing twice is a conflict
        let err = withdraw_listing_handler(State(state), Path(listing.get_id()), admin)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_attach_photo_signs_an_upload_url() {
        let state = setup_test_state();
        let (_, headers) = member_with_headers(&state, "seller@example.com", "Sam").await;

        let listing = create_listing_handler(
            State(state.clone()),
            headers.clone(),
            Json(telescope_payload()),
        )
        .await
        .unwrap()
        .0;

        let response = attach_listing_photo_handler(
            State(state),
            Path(listing.get_id()),
            headers,
            Json(AttachListingPhotoDto {
                file_name: "dob.jpg".to_string(),
                content_type: "image/jpeg".to_string(),
            }),
        )
        .await
        .unwrap()
        .0;

        let key = response.listing.get_photo_key().unwrap();
        assert!(key.starts_with("listings/"));
        assert!(response.upload_url.contains(&key));
        assert!(response.upload_url.contains("signature="));
    }

    #[tokio::test]
    async fn test_attach_photo_rejects_non_images() {
        let state = setup_test_state();
        let (_, headers) = member_with_headers(&state, "seller@example.com", "Sam").await;

        let listing = create_listing_handler(
            State(state.clone()),
            headers.clone(),
            Json(telescope_payload()),
        )
        .await
        .unwrap()
        .0;

        let err = attach_listing_photo_handler(
            State(state),
            Path(listing.get_id()),
            headers,
            Json(AttachListingPhotoDto {
                file_name: "notes.pdf".to_string(),
                content_type: "application/pdf".to_string(),
            }),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_get_unknown_listing_is_not_found() {
        let state = setup_test_state();
        let (_, headers) = member_with_headers(&state, "seller@example.com", "Sam").await;

        let err = get_listing_handler(State(state), Path("missing".to_string()), headers)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::NotFound));
    }
}
