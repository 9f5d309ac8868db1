use crate::db::{DbPool, ExecuteWithRetry};
use crate::dto::{CreateEventDto, EventQueryDto, UpdateEventDto};
use crate::models::{Event, RegistrationStatus};
use crate::schema::{events, registrations};
use anyhow::{Result, anyhow};
use chrono::Utc;
use diesel::prelude::*;
use tracing::{debug, info, instrument};

/// Creates a new event
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `dto` - The event details
///
/// ### Returns
///
/// A Result containing the newly created Event if successful
#[instrument(skip(pool, dto))]
pub async fn create_event(pool: &DbPool, dto: &CreateEventDto) -> Result<Event> {
    debug!("Creating event: {}", dto.title);

    let mut event = Event::new(
        dto.title.clone(),
        dto.description.clone(),
        dto.location.clone(),
        dto.starts_at,
        dto.ends_at,
        dto.capacity,
        dto.kind,
    );
    event.set_published(dto.published);
    event.set_early_bird_deadline(dto.early_bird_deadline);

    let conn = &mut pool.get()?;
    diesel::insert_into(events::table)
        .values(event.clone())
        .execute_with_retry(conn)
        .await?;

    info!("Created event with id: {}", event.get_id());

    Ok(event)
}

/// Retrieves an event from the database by its ID
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `event_id` - The ID of the event to retrieve
///
/// ### Returns
///
/// A Result containing an Option with the Event if found, or None if not found
#[instrument(skip(pool), fields(event_id = %event_id))]
pub fn get_event(pool: &DbPool, event_id: &str) -> Result<Option<Event>> {
    let conn = &mut pool.get()?;

    let result = events::table
        .find(event_id)
        .first::<Event>(conn)
        .optional()?;

    Ok(result)
}

/// Lists events with optional filtering
///
/// By default only published events that have not yet ended are returned,
/// soonest first. `include_past` keeps finished events; `include_unpublished`
/// keeps drafts and is only honored for admin callers (the handler's check).
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `query` - Kind, past, and draft filters
///
/// ### Returns
///
/// A Result containing a vector of Events matching the filters
#[instrument(skip(pool, query))]
pub fn list_events(pool: &DbPool, query: &EventQueryDto) -> Result<Vec<Event>> {
    debug!("Listing events with filters: {:?}", query);

    let conn = &mut pool.get()?;

    let mut event_query = events::table.into_boxed();

    if let Some(kind) = query.kind {
        debug!("Filtering by kind: {}", kind);
        event_query = event_query.filter(events::event_kind.eq(kind));
    }

    if !query.include_past {
        event_query = event_query.filter(events::ends_at.ge(Utc::now().naive_utc()));
    }

    if !query.include_unpublished {
        event_query = event_query.filter(events::published.eq(true));
    }

    let results = event_query
        .order_by(events::starts_at.asc())
        .load::<Event>(conn)?;

    info!("Retrieved {} events matching filters", results.len());

    Ok(results)
}

/// Updates an event's details
///
/// Only the provided fields are changed.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `event_id` - The ID of the event to update
/// * `dto` - The fields to change
///
/// ### Returns
///
/// A Result containing the updated Event
///
/// ### Errors
///
/// Returns an error if the event does not exist or the update fails
#[instrument(skip(pool, dto), fields(event_id = %event_id))]
pub async fn update_event(pool: &DbPool, event_id: &str, dto: &UpdateEventDto) -> Result<Event> {
    let existing = get_event(pool, event_id)?.ok_or(anyhow!("Event not found"))?;

    let new_title = dto.title.clone().unwrap_or_else(|| existing.get_title());
    let new_description = dto
        .description
        .clone()
        .unwrap_or_else(|| existing.get_description());
    let new_kind = dto.kind.unwrap_or_else(|| existing.get_event_kind());
    let new_location = dto
        .location
        .clone()
        .unwrap_or_else(|| existing.get_location());
    let new_starts = dto.starts_at.unwrap_or_else(|| existing.get_starts_at());
    let new_ends = dto.ends_at.unwrap_or_else(|| existing.get_ends_at());
    let new_capacity = dto.capacity.unwrap_or_else(|| existing.get_capacity());
    let new_deadline = dto
        .early_bird_deadline
        .or_else(|| existing.get_early_bird_deadline());
    let new_published = dto.published.unwrap_or_else(|| existing.is_published());

    let conn = &mut pool.get()?;
    diesel::update(events::table.find(event_id.to_string()))
        .set((
            events::title.eq(new_title),
            events::description.eq(new_description),
            events::event_kind.eq(new_kind),
            events::location.eq(new_location),
            events::starts_at.eq(new_starts.naive_utc()),
            events::ends_at.eq(new_ends.naive_utc()),
            events::capacity.eq(new_capacity),
            events::early_bird_deadline.eq(new_deadline.map(|dt| dt.naive_utc())),
            events::published.eq(new_published),
            events::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute_with_retry(conn)
        .await?;

    debug!("Updated event {}", event_id);

    get_event(pool, event_id)?.ok_or(anyhow!("Event disappeared during update"))
}

/// Deletes an event
///
/// Refused while the event still has non-cancelled registrations; those
/// have money and expectations attached, so the event must be emptied (or
/// left in place) first.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `event_id` - The ID of the event to delete
///
/// ### Errors
///
/// Returns an error if the event does not exist or still has active
/// registrations
#[instrument(skip(pool), fields(event_id = %event_id))]
pub async fn delete_event(pool: &DbPool, event_id: &str) -> Result<()> {
    debug!("Deleting event");

    get_event(pool, event_id)?.ok_or(anyhow!("Event not found"))?;

    let active = count_active_registrations(pool, event_id)?;
    if active > 0 {
        return Err(anyhow!(
            "Event still has {} active registrations",
            active
        ));
    }

    let conn = &mut pool.get()?;
    diesel::delete(events::table.find(event_id.to_string()))
        .execute_with_retry(conn)
        .await?;

    info!("Deleted event {}", event_id);
    Ok(())
}

/// Counts the non-cancelled registrations on an event
///
/// Confirmed and waitlisted registrations both hold a place for the
/// capacity check.
#[instrument(skip(pool), fields(event_id = %event_id))]
pub fn count_active_registrations(pool: &DbPool, event_id: &str) -> Result<i64> {
    let conn = &mut pool.get()?;

    let count: i64 = registrations::table
        .filter(registrations::event_id.eq(event_id))
        .filter(registrations::status.ne(RegistrationStatus::Cancelled))
        .count()
        .get_result(conn)?;

    Ok(count)
}
