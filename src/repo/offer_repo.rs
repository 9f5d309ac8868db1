use crate::db::{DbPool, ExecuteWithRetry};
use crate::models::{Listing, ListingStatus, Offer, OfferStatus};
use crate::schema::{listings, offers};
use anyhow::{Result, anyhow};
use chrono::Utc;
use diesel::prelude::*;
use tracing::{debug, info, instrument};

/// Creates a pending offer from a buyer on a listing
///
/// The check-then-insert runs in one transaction so two racing requests
/// cannot leave a buyer with two open offers on the same listing.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `listing_id` - The listing being negotiated
/// * `buyer_id` - The buying user
/// * `amount_cents` - Offered amount in integer cents
/// * `message` - Optional note to the seller
///
/// ### Returns
///
/// A Result containing the newly created Offer if successful
///
/// ### Errors
///
/// Returns an error if:
/// - The listing does not exist or is not open for offers
/// - The buyer is the seller
/// - The buyer already has a pending offer on the listing
/// - The database insert operation fails
#[instrument(skip(pool, message), fields(listing_id = %listing_id, buyer_id = %buyer_id))]
pub async fn create_offer(
    pool: &DbPool,
    listing_id: &str,
    buyer_id: &str,
    amount_cents: i64,
    message: Option<String>,
) -> Result<Offer> {
    debug!("Creating offer of {} cents", amount_cents);

    let listing_id = listing_id.to_string();
    let buyer_id = buyer_id.to_string();

    let conn = &mut pool.get()?;
    let offer = conn.immediate_transaction::<_, anyhow::Error, _>(|conn| {
        let listing = listings::table
            .find(listing_id.clone())
            .first::<Listing>(conn)
            .optional()?
            .ok_or(anyhow!("Listing not found"))?;

        if !listing.is_open_for_offers() {
            return Err(anyhow!(
                "Listing is not open for offers (status: {})",
                listing.get_status()
            ));
        }
        if listing.get_seller_id() == buyer_id {
            return Err(anyhow!("Cannot make an offer on your own listing"));
        }

        let open_offers: i64 = offers::table
            .filter(offers::listing_id.eq(listing_id.clone()))
            .filter(offers::buyer_id.eq(buyer_id.clone()))
            .filter(offers::status.eq(OfferStatus::Pending))
            .count()
            .get_result(conn)?;
        if open_offers > 0 {
            return Err(anyhow!("Buyer already has a pending offer on this listing"));
        }

        let offer = Offer::new(listing_id.clone(), buyer_id.clone(), amount_cents, message);
        diesel::insert_into(offers::table)
            .values(offer.clone())
            .execute(conn)?;

        Ok(offer)
    })?;

    info!("Created offer {} on listing {}", offer.get_id(), listing_id);

    Ok(offer)
}

/// Retrieves an offer from the database by its ID
#[instrument(skip(pool), fields(offer_id = %offer_id))]
pub fn get_offer(pool: &DbPool, offer_id: &str) -> Result<Option<Offer>> {
    let conn = &mut pool.get()?;

    let result = offers::table
        .find(offer_id)
        .first::<Offer>(conn)
        .optional()?;

    Ok(result)
}

/// Whether a buyer already has a pending offer on a listing
#[instrument(skip(pool))]
pub fn has_pending_offer(pool: &DbPool, listing_id: &str, buyer_id: &str) -> Result<bool> {
    let conn = &mut pool.get()?;

    let count: i64 = offers::table
        .filter(offers::listing_id.eq(listing_id))
        .filter(offers::buyer_id.eq(buyer_id))
        .filter(offers::status.eq(OfferStatus::Pending))
        .count()
        .get_result(conn)?;

    Ok(count > 0)
}

/// Lists every offer made on a listing, oldest first
///
/// Oldest-first keeps counter chains readable top to bottom.
#[instrument(skip(pool), fields(listing_id = %listing_id))]
pub fn list_offers_for_listing(pool: &DbPool, listing_id: &str) -> Result<Vec<Offer>> {
    let conn = &mut pool.get()?;

    let results = offers::table
        .filter(offers::listing_id.eq(listing_id))
        .order_by(offers::created_at.asc())
        .load::<Offer>(conn)?;

    Ok(results)
}

/// Lists a single buyer's offers on a listing, oldest first
#[instrument(skip(pool), fields(listing_id = %listing_id, buyer_id = %buyer_id))]
pub fn list_buyer_offers(pool: &DbPool, listing_id: &str, buyer_id: &str) -> Result<Vec<Offer>> {
    let conn = &mut pool.get()?;

    let results = offers::table
        .filter(offers::listing_id.eq(listing_id))
        .filter(offers::buyer_id.eq(buyer_id))
        .order_by(offers::created_at.asc())
        .load::<Offer>(conn)?;

    Ok(results)
}

/// Accepts a pending offer, closing the negotiation
///
/// Transactionally the offer becomes accepted, the listing becomes sold
/// with `sold_at` stamped, and every other pending offer on the listing
/// is rejected. At most one offer per listing can ever be accepted.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `offer_id` - The ID of the offer to accept
///
/// ### Returns
///
/// A Result containing the accepted Offer
///
/// ### Errors
///
/// Returns an error if the offer does not exist or is no longer pending
#[instrument(skip(pool), fields(offer_id = %offer_id))]
pub async fn accept_offer(pool: &DbPool, offer_id: &str) -> Result<Offer> {
    debug!("Accepting offer");

    let offer_id = offer_id.to_string();
    let now = Utc::now().naive_utc();

    let conn = &mut pool.get()?;
    conn.immediate_transaction::<_, anyhow::Error, _>(|conn| {
        let offer = offers::table
            .find(offer_id.clone())
            .first::<Offer>(conn)
            .optional()?
            .ok_or(anyhow!("Offer not found"))?;

        if !offer.is_pending() {
            return Err(anyhow!(
                "Offer is no longer pending (status: {})",
                offer.get_status()
            ));
        }

        diesel::update(offers::table.find(offer_id.clone()))
            .set((
                offers::status.eq(OfferStatus::Accepted),
                offers::updated_at.eq(now),
            ))
            .execute(conn)?;

        // Competing offers lose
        diesel::update(
            offers::table
                .filter(offers::listing_id.eq(offer.get_listing_id()))
                .filter(offers::status.eq(OfferStatus::Pending))
                .filter(offers::id.ne(offer_id.clone())),
        )
        .set((
            offers::status.eq(OfferStatus::Rejected),
            offers::updated_at.eq(now),
        ))
        .execute(conn)?;

        diesel::update(listings::table.find(offer.get_listing_id()))
            .set((
                listings::status.eq(ListingStatus::Sold),
                listings::sold_at.eq(Some(now)),
                listings::updated_at.eq(now),
            ))
            .execute(conn)?;

        Ok(())
    })?;

    info!("Accepted offer {}", offer_id);

    get_offer(pool, &offer_id)?.ok_or(anyhow!("Offer disappeared during acceptance"))
}

/// Rejects a pending offer
///
/// ### Errors
///
/// Returns an error if the offer does not exist or is no longer pending
#[instrument(skip(pool), fields(offer_id = %offer_id))]
pub async fn reject_offer(pool: &DbPool, offer_id: &str) -> Result<Offer> {
    transition_pending_offer(pool, offer_id, OfferStatus::Rejected).await
}

/// Withdraws a pending offer, taken by whoever proposed it
///
/// ### Errors
///
/// Returns an error if the offer does not exist or is no longer pending
#[instrument(skip(pool), fields(offer_id = %offer_id))]
pub async fn withdraw_offer(pool: &DbPool, offer_id: &str) -> Result<Offer> {
    transition_pending_offer(pool, offer_id, OfferStatus::Withdrawn).await
}

/// Moves a pending offer to a terminal status
///
/// The status guard sits in the UPDATE itself, so a concurrent transition
/// loses cleanly instead of double-applying.
async fn transition_pending_offer(
    pool: &DbPool,
    offer_id: &str,
    to: OfferStatus,
) -> Result<Offer> {
    let existing = get_offer(pool, offer_id)?.ok_or(anyhow!("Offer not found"))?;
    if !existing.is_pending() {
        return Err(anyhow!(
            "Offer is no longer pending (status: {})",
            existing.get_status()
        ));
    }

    let conn = &mut pool.get()?;
    let updated = diesel::update(
        offers::table
            .find(offer_id.to_string())
            .filter(offers::status.eq(OfferStatus::Pending)),
    )
    .set((offers::status.eq(to), offers::updated_at.eq(Utc::now().naive_utc())))
    .execute_with_retry(conn)
    .await?;

    if updated == 0 {
        return Err(anyhow!("Offer is no longer pending"));
    }

    debug!("Offer {} moved to {}", offer_id, to);

    get_offer(pool, offer_id)?.ok_or(anyhow!("Offer disappeared during transition"))
}

/// Counters a pending offer with a new amount
///
/// Transactionally the original offer is retired as countered and a fresh
/// pending offer is created with `parent_offer_id` linking back and
/// `proposed_by` flipped to the countering party.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `offer_id` - The ID of the offer being countered
/// * `amount_cents` - The counter amount in integer cents
/// * `message` - Optional note to the counterparty
///
/// ### Returns
///
/// A Result containing the new pending counter Offer
///
/// ### Errors
///
/// Returns an error if the offer does not exist or is no longer pending
#[instrument(skip(pool, message), fields(offer_id = %offer_id))]
pub async fn counter_offer(
    pool: &DbPool,
    offer_id: &str,
    amount_cents: i64,
    message: Option<String>,
) -> Result<Offer> {
    debug!("Countering offer with {} cents", amount_cents);

    let offer_id = offer_id.to_string();
    let now = Utc::now().naive_utc();

    let conn = &mut pool.get()?;
    let counter = conn.immediate_transaction::<_, anyhow::Error, _>(|conn| {
        let original = offers::table
            .find(offer_id.clone())
            .first::<Offer>(conn)
            .optional()?
            .ok_or(anyhow!("Offer not found"))?;

        if !original.is_pending() {
            return Err(anyhow!(
                "Offer is no longer pending (status: {})",
                original.get_status()
            ));
        }

        diesel::update(offers::table.find(offer_id.clone()))
            .set((
                offers::status.eq(OfferStatus::Countered),
                offers::updated_at.eq(now),
            ))
            .execute(conn)?;

        let counter = Offer::counter_to(&original, amount_cents, message);
        diesel::insert_into(offers::table)
            .values(counter.clone())
            .execute(conn)?;

        Ok(counter)
    })?;

    info!("Countered offer {} with {}", offer_id, counter.get_id());

    Ok(counter)
}
