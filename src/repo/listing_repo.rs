use crate::db::{DbPool, ExecuteWithRetry};
use crate::dto::ListingQueryDto;
use crate::models::{Listing, ListingStatus, OfferStatus};
use crate::schema::{listings, offers};
use anyhow::{Result, anyhow};
use chrono::Utc;
use diesel::prelude::*;
use tracing::{debug, info, instrument};

/// Creates a new active listing in the classifieds
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `seller_id` - The ID of the selling user
/// * `title` - Short title shown in search results
/// * `description` - Full description of the item
/// * `category` - Free-form category label
/// * `price_cents` - Asking price in integer cents
///
/// ### Returns
///
/// A Result containing the newly created Listing if successful
#[instrument(skip(pool, description), fields(seller_id = %seller_id))]
pub async fn create_listing(
    pool: &DbPool,
    seller_id: &str,
    title: String,
    description: String,
    category: String,
    price_cents: i64,
) -> Result<Listing> {
    debug!("Creating listing: {}", title);

    let listing = Listing::new(seller_id.to_string(), title, description, category, price_cents);

    let conn = &mut pool.get()?;
    diesel::insert_into(listings::table)
        .values(listing.clone())
        .execute_with_retry(conn)
        .await?;

    info!("Created listing {} for seller {}", listing.get_id(), seller_id);

    Ok(listing)
}

/// Retrieves a listing from the database by its ID
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `listing_id` - The ID of the listing to retrieve
///
/// ### Returns
///
/// A Result containing an Option with the Listing if found, or None if not found
#[instrument(skip(pool), fields(listing_id = %listing_id))]
pub fn get_listing(pool: &DbPool, listing_id: &str) -> Result<Option<Listing>> {
    let conn = &mut pool.get()?;

    let result = listings::table
        .find(listing_id)
        .first::<Listing>(conn)
        .optional()?;

    Ok(result)
}

/// Lists classifieds with optional filtering
///
/// Without an explicit status filter only active listings are returned,
/// so withdrawn and sold listings drop out of default searches.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `query` - Category, status, seller, and free-text filters
///
/// ### Returns
///
/// A Result containing a vector of Listings matching the filters, newest first
#[instrument(skip(pool, query))]
pub fn list_listings(pool: &DbPool, query: &ListingQueryDto) -> Result<Vec<Listing>> {
    debug!("Listing classifieds with filters: {:?}", query);

    let conn = &mut pool.get()?;

    let mut listing_query = listings::table.into_boxed();

    match query.status {
        Some(status) => {
            debug!("Filtering by status: {}", status);
            listing_query = listing_query.filter(listings::status.eq(status));
        }
        None => {
            listing_query = listing_query.filter(listings::status.eq(ListingStatus::Active));
        }
    }

    if let Some(category) = &query.category {
        debug!("Filtering by category: {}", category);
        listing_query = listing_query.filter(listings::category.eq(category.clone()));
    }

    if let Some(seller_id) = &query.seller_id {
        debug!("Filtering by seller: {}", seller_id);
        listing_query = listing_query.filter(listings::seller_id.eq(seller_id.clone()));
    }

    if let Some(q) = &query.q {
        debug!("Filtering by search text: {}", q);
        let pattern = format!("%{}%", q);
        listing_query = listing_query.filter(
            listings::title
                .like(pattern.clone())
                .or(listings::description.like(pattern)),
        );
    }

    let results = listing_query
        .order_by(listings::created_at.desc())
        .load::<Listing>(conn)?;

    info!("Retrieved {} listings matching filters", results.len());

    Ok(results)
}

/// Updates a listing's details
///
/// Only the provided fields are changed. Sold and withdrawn listings can
/// no longer be edited.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `listing_id` - The ID of the listing to update
/// * `title` - A new title, or None to leave it alone
/// * `description` - A new description, or None to leave it alone
/// * `category` - A new category, or None to leave it alone
/// * `price_cents` - A new asking price, or None to leave it alone
///
/// ### Returns
///
/// A Result containing the updated Listing
///
/// ### Errors
///
/// Returns an error if:
/// - The listing does not exist
/// - The listing has already been sold or withdrawn
/// - The database update operation fails
#[instrument(skip(pool, description), fields(listing_id = %listing_id))]
pub async fn update_listing(
    pool: &DbPool,
    listing_id: &str,
    title: Option<String>,
    description: Option<String>,
    category: Option<String>,
    price_cents: Option<i64>,
) -> Result<Listing> {
    let existing = get_listing(pool, listing_id)?.ok_or(anyhow!("Listing not found"))?;

    if matches!(
        existing.get_status(),
        ListingStatus::Sold | ListingStatus::Withdrawn
    ) {
        return Err(anyhow!(
            "Listing can no longer be edited (status: {})",
            existing.get_status()
        ));
    }

    let new_title = title.unwrap_or_else(|| existing.get_title());
    let new_description = description.unwrap_or_else(|| existing.get_description());
    let new_category = category.unwrap_or_else(|| existing.get_category());
    let new_price = price_cents.unwrap_or_else(|| existing.get_price_cents());

    let conn = &mut pool.get()?;
    diesel::update(listings::table.find(listing_id.to_string()))
        .set((
            listings::title.eq(new_title),
            listings::description.eq(new_description),
            listings::category.eq(new_category),
            listings::price_cents.eq(new_price),
            listings::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute_with_retry(conn)
        .await?;

    debug!("Updated listing {}", listing_id);

    get_listing(pool, listing_id)?.ok_or(anyhow!("Listing disappeared during update"))
}

/// Sets the photo key on a listing
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `listing_id` - The ID of the listing
/// * `photo_key` - The object-storage key, or None to clear it
#[instrument(skip(pool), fields(listing_id = %listing_id))]
pub async fn set_listing_photo(
    pool: &DbPool,
    listing_id: &str,
    photo_key: Option<String>,
) -> Result<Listing> {
    get_listing(pool, listing_id)?.ok_or(anyhow!("Listing not found"))?;

    let conn = &mut pool.get()?;
    diesel::update(listings::table.find(listing_id.to_string()))
        .set((
            listings::photo_key.eq(photo_key),
            listings::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute_with_retry(conn)
        .await?;

    get_listing(pool, listing_id)?.ok_or(anyhow!("Listing disappeared during update"))
}

/// Withdraws a listing and invalidates its open offers
///
/// The listing row stays for history but drops out of default searches.
/// Every pending offer on it is rejected in the same transaction, so no
/// negotiation can continue against a withdrawn listing.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `listing_id` - The ID of the listing to withdraw
///
/// ### Returns
///
/// A Result containing the withdrawn Listing
///
/// ### Errors
///
/// Returns an error if the listing does not exist or was already withdrawn
#[instrument(skip(pool), fields(listing_id = %listing_id))]
pub async fn withdraw_listing(pool: &DbPool, listing_id: &str) -> Result<Listing> {
    debug!("Withdrawing listing");

    let listing = get_listing(pool, listing_id)?.ok_or(anyhow!("Listing not found"))?;
    if listing.get_status() == ListingStatus::Withdrawn {
        return Err(anyhow!("Listing is already withdrawn"));
    }

    let now = Utc::now().naive_utc();
    let conn = &mut pool.get()?;
    conn.immediate_transaction(|conn| {
        diesel::update(listings::table.find(listing_id.to_string()))
            .set((
                listings::status.eq(ListingStatus::Withdrawn),
                listings::updated_at.eq(now),
            ))
            .execute(conn)?;

        diesel::update(
            offers::table
                .filter(offers::listing_id.eq(listing_id.to_string()))
                .filter(offers::status.eq(OfferStatus::Pending)),
        )
        .set((
            offers::status.eq(OfferStatus::Rejected),
            offers::updated_at.eq(now),
        ))
        .execute(conn)?;

        Ok::<(), diesel::result::Error>(())
    })?;

    info!("Withdrew listing {} and rejected its pending offers", listing_id);

    get_listing(pool, listing_id)?.ok_or(anyhow!("Listing disappeared during withdrawal"))
}
