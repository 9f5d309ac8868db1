use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::auth;
use crate::dto::{CounterOfferDto, CreateOfferDto};
use crate::errors::ApiError;
use crate::models::{Listing, Offer, OfferParty};
use crate::repo;
use crate::state::AppState;

/// Formats integer cents for notification text
fn dollars(amount_cents: i64) -> String {
    format!("${}.{:02}", amount_cents / 100, amount_cents % 100)
}

/// Notifies the party who proposed an offer about what became of it
async fn notify_proposer(
    state: &AppState,
    offer: &Offer,
    listing: &Listing,
    subject: &str,
    body: &str,
) -> Result<(), ApiError> {
    let recipient_id = match offer.get_proposed_by() {
        OfferParty::Buyer => offer.get_buyer_id(),
        OfferParty::Seller => listing.get_seller_id(),
    };

    if let Some(recipient) =
        repo::get_user(&state.pool, &recipient_id).map_err(ApiError::Database)?
    {
        state
            .notifier
            .notify(&recipient.get_email(), subject, body)
            .await;
    }

    Ok(())
}

/// Handler for making an offer on a listing
///
/// This function handles POST requests to `/api/listings/{id}/offers`.
///
/// A buyer may hold one open offer per listing; negotiating happens by
/// counter, not by stacking offers.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `listing_id` - The ID of the listing, extracted from the URL path
/// * `headers` - The request headers carrying the bearer token
/// * `payload` - The request payload with the amount and an optional note
///
/// ### Returns
///
/// The newly created offer as JSON
#[instrument(skip(state, headers, payload), fields(listing_id = %listing_id))]
pub async fn create_offer_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the listing ID from the URL path
    Path(listing_id): Path<String>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
    // Extract and deserialize the JSON request body
    Json(payload): Json<CreateOfferDto>,
) -> Result<Json<Offer>, ApiError> {
    let user = auth::require_user(&state.pool, &headers)?;

    info!("Creating offer of {} cents", payload.amount_cents);

    if payload.amount_cents <= 0 {
        return Err(ApiError::Validation(
            "Offer amount must be positive".to_string(),
        ));
    }

    // First check the listing exists and can take this buyer's offer
    let listing = repo::get_listing(&state.pool, &listing_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;
    if !listing.is_open_for_offers() {
        return Err(ApiError::Conflict(format!(
            "Listing is not open for offers (status: {})",
            listing.get_status()
        )));
    }
    if listing.get_seller_id() == user.get_id() {
        return Err(ApiError::Validation(
            "Cannot make an offer on your own listing".to_string(),
        ));
    }
    if repo::has_pending_offer(&state.pool, &listing_id, &user.get_id())
        .map_err(ApiError::Database)?
    {
        return Err(ApiError::Conflict(
            "You already have a pending offer on this listing".to_string(),
        ));
    }

    // Call the repository function to create the offer
    let offer = repo::create_offer(
        &state.pool,
        &listing_id,
        &user.get_id(),
        payload.amount_cents,
        payload.message,
    )
    .await
    .map_err(ApiError::Database)?;

    // Let the seller know; a failed notification never fails the offer
    if let Some(seller) =
        repo::get_user(&state.pool, &listing.get_seller_id()).map_err(ApiError::Database)?
    {
        state
            .notifier
            .notify(
                &seller.get_email(),
                &format!("New offer on {}", listing.get_title()),
                &format!(
                    "{} offered {} for \"{}\".",
                    user.get_name(),
                    dollars(offer.get_amount_cents()),
                    listing.get_title()
                ),
            )
            .await;
    }

    info!("Created offer with id: {}", offer.get_id());

    // Return the created offer as JSON
    Ok(Json(offer))
}

/// Handler for retrieving a specific offer
///
/// This function handles GET requests to `/api/offers/{id}`.
///
/// Only the buyer, the seller, and admins may look.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `offer_id` - The ID of the offer, extracted from the URL path
/// * `headers` - The request headers carrying the bearer token
///
/// ### Returns
///
/// The requested offer as JSON
#[instrument(skip(state, headers), fields(offer_id = %offer_id))]
pub async fn get_offer_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the offer ID from the URL path
    Path(offer_id): Path<String>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
) -> Result<Json<Offer>, ApiError> {
    let user = auth::require_user(&state.pool, &headers)?;

    debug!("Retrieving offer");

    let offer = repo::get_offer(&state.pool, &offer_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;
    let listing = repo::get_listing(&state.pool, &offer.get_listing_id())
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;

    let is_party =
        offer.get_buyer_id() == user.get_id() || listing.get_seller_id() == user.get_id();
    if !is_party && !user.is_admin() {
        return Err(ApiError::Forbidden);
    }

    // Return the offer as JSON
    Ok(Json(offer))
}

/// Handler for listing the offers on a listing
///
/// This function handles GET requests to `/api/listings/{id}/offers`.
///
/// The seller and admins see the whole negotiation; everyone else sees
/// only their own offers.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `listing_id` - The ID of the listing, extracted from the URL path
/// * `headers` - The request headers carrying the bearer token
///
/// ### Returns
///
/// A list of offers as JSON, oldest first
#[instrument(skip(state, headers), fields(listing_id = %listing_id))]
pub async fn list_listing_offers_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the listing ID from the URL path
    Path(listing_id): Path<String>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
) -> Result<Json<Vec<Offer>>, ApiError> {
    let user = auth::require_user(&state.pool, &headers)?;

    debug!("Listing offers");

    // First check the listing exists
    let listing = repo::get_listing(&state.pool, &listing_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;

    let offers = if listing.get_seller_id() == user.get_id() || user.is_admin() {
        repo::list_offers_for_listing(&state.pool, &listing_id).map_err(ApiError::Database)?
    } else {
        repo::list_buyer_offers(&state.pool, &listing_id, &user.get_id())
            .map_err(ApiError::Database)?
    };

    info!("Retrieved {} offers for listing {}", offers.len(), listing_id);

    // Return the list of offers as JSON
    Ok(Json(offers))
}

/// Checks that an offer is still pending and the caller is the recipient
///
/// Returns the offer and its listing so the action handlers do not fetch
/// them twice.
fn pending_offer_for_responder(
    state: &AppState,
    offer_id: &str,
    user_id: &str,
) -> Result<(Offer, Listing), ApiError> {
    let offer = repo::get_offer(&state.pool, offer_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;
    let listing = repo::get_listing(&state.pool, &offer.get_listing_id())
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;

    if !offer.is_pending() {
        return Err(ApiError::Conflict(format!(
            "Offer is not pending (status: {})",
            offer.get_status()
        )));
    }
    if !offer.responder_is(user_id, &listing.get_seller_id()) {
        return Err(ApiError::Forbidden);
    }

    Ok((offer, listing))
}

/// Handler for accepting an offer
///
/// This function handles POST requests to `/api/offers/{id}/accept`.
///
/// Accepting closes the whole negotiation: the listing is marked sold
/// and every other pending offer on it is rejected in the same
/// transaction.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `offer_id` - The ID of the offer, extracted from the URL path
/// * `headers` - The request headers carrying the bearer token
///
/// ### Returns
///
/// The accepted offer as JSON
#[instrument(skip(state, headers), fields(offer_id = %offer_id))]
pub async fn accept_offer_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the offer ID from the URL path
    Path(offer_id): Path<String>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
) -> Result<Json<Offer>, ApiError> {
    let user = auth::require_user(&state.pool, &headers)?;

    info!("Accepting offer");

    let (_, listing) = pending_offer_for_responder(&state, &offer_id, &user.get_id())?;

    // Call the repository function to accept the offer
    let offer = repo::accept_offer(&state.pool, &offer_id)
        .await
        .map_err(ApiError::Database)?;

    notify_proposer(
        &state,
        &offer,
        &listing,
        "Your offer was accepted",
        &format!(
            "Your offer of {} on \"{}\" was accepted.",
            dollars(offer.get_amount_cents()),
            listing.get_title()
        ),
    )
    .await?;

    info!("Accepted offer {} on listing {}", offer_id, listing.get_id());

    // Return the accepted offer as JSON
    Ok(Json(offer))
}

/// Handler for rejecting an offer
///
/// This function handles POST requests to `/api/offers/{id}/reject`.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `offer_id` - The ID of the offer, extracted from the URL path
/// * `headers` - The request headers carrying the bearer token
///
/// ### Returns
///
/// The rejected offer as JSON
#[instrument(skip(state, headers), fields(offer_id = %offer_id))]
pub async fn reject_offer_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the offer ID from the URL path
    Path(offer_id): Path<String>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
) -> Result<Json<Offer>, ApiError> {
    let user = auth::require_user(&state.pool, &headers)?;

    info!("Rejecting offer");

    let (_, listing) = pending_offer_for_responder(&state, &offer_id, &user.get_id())?;

    // Call the repository function to reject the offer
    let offer = repo::reject_offer(&state.pool, &offer_id)
        .await
        .map_err(ApiError::Database)?;

    notify_proposer(
        &state,
        &offer,
        &listing,
        "Your offer was declined",
        &format!(
            "Your offer of {} on \"{}\" was declined.",
            dollars(offer.get_amount_cents()),
            listing.get_title()
        ),
    )
    .await?;

    // Return the rejected offer as JSON
    Ok(Json(offer))
}

/// Handler for countering an offer
///
/// This function handles POST requests to `/api/offers/{id}/counter`.
///
/// The original offer is retired to `countered` and a new pending offer
/// linked to it takes its place, proposed by the countering party.
/// Chains may alternate buyer and seller any number of times.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `offer_id` - The ID of the offer being countered
/// * `headers` - The request headers carrying the bearer token
/// * `payload` - The request payload with the counter amount and note
///
/// ### Returns
///
/// The new pending counter-offer as JSON
#[instrument(skip(state, headers, payload), fields(offer_id = %offer_id))]
pub async fn counter_offer_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the offer ID from the URL path
    Path(offer_id): Path<String>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
    // Extract and deserialize the JSON request body
    Json(payload): Json<CounterOfferDto>,
) -> Result<Json<Offer>, ApiError> {
    let user = auth::require_user(&state.pool, &headers)?;

    info!("Countering offer with {} cents", payload.amount_cents);

    if payload.amount_cents <= 0 {
        return Err(ApiError::Validation(
            "Counter amount must be positive".to_string(),
        ));
    }

    let (original, listing) = pending_offer_for_responder(&state, &offer_id, &user.get_id())?;

    // Call the repository function to counter the offer
    let counter = repo::counter_offer(
        &state.pool,
        &offer_id,
        payload.amount_cents,
        payload.message,
    )
    .await
    .map_err(ApiError::Database)?;

    // The original proposer is the recipient of the counter
    notify_proposer(
        &state,
        &original,
        &listing,
        &format!("Counter-offer on {}", listing.get_title()),
        &format!(
            "{} countered with {} on \"{}\".",
            user.get_name(),
            dollars(counter.get_amount_cents()),
            listing.get_title()
        ),
    )
    .await?;

    info!(
        "Countered offer {} with new offer {}",
        offer_id,
        counter.get_id()
    );

    // Return the new counter-offer as JSON
    Ok(Json(counter))
}

/// Handler for withdrawing an offer
///
/// This function handles POST requests to `/api/offers/{id}/withdraw`.
///
/// Only whoever proposed the offer may pull it back, and only while it
/// is still pending.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `offer_id` - The ID of the offer, extracted from the URL path
/// * `headers` - The request headers carrying the bearer token
///
/// ### Returns
///
/// The withdrawn offer as JSON
#[instrument(skip(state, headers), fields(offer_id = %offer_id))]
pub async fn withdraw_offer_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the offer ID from the URL path
    Path(offer_id): Path<String>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
) -> Result<Json<Offer>, ApiError> {
    let user = auth::require_user(&state.pool, &headers)?;

    info!("Withdrawing offer");

    let offer = repo::get_offer(&state.pool, &offer_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;
    let listing = repo::get_listing(&state.pool, &offer.get_listing_id())
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;

    if !offer.is_pending() {
        return Err(ApiError::Conflict(format!(
            "Offer is not pending (status: {})",
            offer.get_status()
        )));
    }
    if !offer.proposer_is(&user.get_id(), &listing.get_seller_id()) {
        return Err(ApiError::Forbidden);
    }

    // Call the repository function to withdraw the offer
    let offer = repo::withdraw_offer(&state.pool, &offer_id)
        .await
        .map_err(ApiError::Database)?;

    // Return the withdrawn offer as JSON
    Ok(Json(offer))
}
