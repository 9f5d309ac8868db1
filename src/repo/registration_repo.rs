use crate::db::{DbPool, ExecuteWithRetry};
use crate::dto::QuoteRequestDto;
use crate::models::{Event, Registration, RegistrationStatus};
use crate::pricing::Quote;
use crate::schema::{events, registrations};
use anyhow::{Result, anyhow};
use chrono::Utc;
use diesel::prelude::*;
use tracing::{debug, info, instrument};

/// Creates a registration for an event, priced by the caller
///
/// The capacity check and the insert run in one transaction: when the
/// event is full the registration lands on the waitlist instead of being
/// confirmed, and two racing registrations cannot both squeeze into the
/// last slot. Waitlisted and confirmed registrations alike hold a place,
/// so a newcomer behind a queue is waitlisted too.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `event_id` - The event being registered for
/// * `user_id` - The registering user
/// * `details` - Party shape (adults, children, nights, meal plan)
/// * `quote` - The server-computed price breakdown to freeze in
///
/// ### Returns
///
/// A Result containing the newly created Registration if successful
///
/// ### Errors
///
/// Returns an error if:
/// - The event does not exist
/// - The user already has a non-cancelled registration for the event
/// - The database insert operation fails
#[instrument(skip(pool, details, quote), fields(event_id = %event_id, user_id = %user_id))]
pub async fn create_registration(
    pool: &DbPool,
    event_id: &str,
    user_id: &str,
    details: &QuoteRequestDto,
    quote: &Quote,
) -> Result<Registration> {
    debug!("Creating registration");

    let event_id = event_id.to_string();
    let user_id = user_id.to_string();
    let details = details.clone();
    let quote = quote.clone();

    let conn = &mut pool.get()?;
    let registration = conn.immediate_transaction::<_, anyhow::Error, _>(|conn| {
        let event = events::table
            .find(event_id.clone())
            .first::<Event>(conn)
            .optional()?
            .ok_or(anyhow!("Event not found"))?;

        let existing: i64 = registrations::table
            .filter(registrations::event_id.eq(event_id.clone()))
            .filter(registrations::user_id.eq(user_id.clone()))
            .filter(registrations::status.ne(RegistrationStatus::Cancelled))
            .count()
            .get_result(conn)?;
        if existing > 0 {
            return Err(anyhow!("User is already registered for this event"));
        }

        let active: i64 = registrations::table
            .filter(registrations::event_id.eq(event_id.clone()))
            .filter(registrations::status.ne(RegistrationStatus::Cancelled))
            .count()
            .get_result(conn)?;

        let status = if event.is_full(active) {
            RegistrationStatus::Waitlisted
        } else {
            RegistrationStatus::Confirmed
        };

        let registration = Registration::new(
            event_id.clone(),
            user_id.clone(),
            status,
            details.adults,
            details.children,
            details.nights,
            details.meal_plan,
            quote.line_items.clone(),
            quote.total_cents,
        );
        diesel::insert_into(registrations::table)
            .values(registration.clone())
            .execute(conn)?;

        Ok(registration)
    })?;

    info!(
        "Created {} registration {} for event {}",
        registration.get_status(),
        registration.get_id(),
        event_id
    );

    Ok(registration)
}

/// Retrieves a registration from the database by its ID
#[instrument(skip(pool), fields(registration_id = %registration_id))]
pub fn get_registration(pool: &DbPool, registration_id: &str) -> Result<Option<Registration>> {
    let conn = &mut pool.get()?;

    let result = registrations::table
        .find(registration_id)
        .first::<Registration>(conn)
        .optional()?;

    Ok(result)
}

/// Finds a user's non-cancelled registration for an event, if any
#[instrument(skip(pool), fields(event_id = %event_id, user_id = %user_id))]
pub fn get_active_registration(
    pool: &DbPool,
    event_id: &str,
    user_id: &str,
) -> Result<Option<Registration>> {
    let conn = &mut pool.get()?;

    let result = registrations::table
        .filter(registrations::event_id.eq(event_id))
        .filter(registrations::user_id.eq(user_id))
        .filter(registrations::status.ne(RegistrationStatus::Cancelled))
        .first::<Registration>(conn)
        .optional()?;

    Ok(result)
}

/// Lists a user's registrations, newest first
#[instrument(skip(pool), fields(user_id = %user_id))]
pub fn list_registrations_for_user(pool: &DbPool, user_id: &str) -> Result<Vec<Registration>> {
    let conn = &mut pool.get()?;

    let results = registrations::table
        .filter(registrations::user_id.eq(user_id))
        .order_by(registrations::created_at.desc())
        .load::<Registration>(conn)?;

    Ok(results)
}

/// Lists every registration for an event in arrival order
#[instrument(skip(pool), fields(event_id = %event_id))]
pub fn list_registrations_for_event(pool: &DbPool, event_id: &str) -> Result<Vec<Registration>> {
    let conn = &mut pool.get()?;

    let results = registrations::table
        .filter(registrations::event_id.eq(event_id))
        .order_by(registrations::created_at.asc())
        .load::<Registration>(conn)?;

    Ok(results)
}

/// Links a payment to a registration
#[instrument(skip(pool), fields(registration_id = %registration_id, payment_id = %payment_id))]
pub async fn attach_payment(
    pool: &DbPool,
    registration_id: &str,
    payment_id: &str,
) -> Result<Registration> {
    get_registration(pool, registration_id)?.ok_or(anyhow!("Registration not found"))?;

    let conn = &mut pool.get()?;
    diesel::update(registrations::table.find(registration_id.to_string()))
        .set((
            registrations::payment_id.eq(Some(payment_id.to_string())),
            registrations::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute_with_retry(conn)
        .await?;

    debug!("Attached payment {} to registration {}", payment_id, registration_id);

    get_registration(pool, registration_id)?
        .ok_or(anyhow!("Registration disappeared during update"))
}

/// Cancels a registration and backfills from the waitlist
///
/// Transactionally the registration becomes cancelled and, when a
/// confirmed place was freed on a capacity-limited event, the oldest
/// waitlisted registration is promoted to confirmed.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `registration_id` - The ID of the registration to cancel
///
/// ### Returns
///
/// A Result containing the cancelled Registration and the promoted one,
/// if a waitlisted registration moved up
///
/// ### Errors
///
/// Returns an error if the registration does not exist or was already
/// cancelled
#[instrument(skip(pool), fields(registration_id = %registration_id))]
pub async fn cancel_registration(
    pool: &DbPool,
    registration_id: &str,
) -> Result<(Registration, Option<Registration>)> {
    debug!("Cancelling registration");

    let registration_id = registration_id.to_string();
    let now = Utc::now().naive_utc();

    let conn = &mut pool.get()?;
    let promoted_id = conn.immediate_transaction::<_, anyhow::Error, _>(|conn| {
        let registration = registrations::table
            .find(registration_id.clone())
            .first::<Registration>(conn)
            .optional()?
            .ok_or(anyhow!("Registration not found"))?;

        if !registration.is_active() {
            return Err(anyhow!("Registration is already cancelled"));
        }

        diesel::update(registrations::table.find(registration_id.clone()))
            .set((
                registrations::status.eq(RegistrationStatus::Cancelled),
                registrations::updated_at.eq(now),
            ))
            .execute(conn)?;

        // Only a confirmed cancellation frees a confirmed place
        if registration.get_status() != RegistrationStatus::Confirmed {
            return Ok(None);
        }

        let event = events::table
            .find(registration.get_event_id())
            .first::<Event>(conn)
            .optional()?
            .ok_or(anyhow!("Event not found"))?;
        if event.get_capacity() == 0 {
            return Ok(None);
        }

        let confirmed: i64 = registrations::table
            .filter(registrations::event_id.eq(registration.get_event_id()))
            .filter(registrations::status.eq(RegistrationStatus::Confirmed))
            .count()
            .get_result(conn)?;
        if confirmed >= event.get_capacity() as i64 {
            return Ok(None);
        }

        let next_up = registrations::table
            .filter(registrations::event_id.eq(registration.get_event_id()))
            .filter(registrations::status.eq(RegistrationStatus::Waitlisted))
            .order_by(registrations::created_at.asc())
            .first::<Registration>(conn)
            .optional()?;

        match next_up {
            Some(waiting) => {
                diesel::update(registrations::table.find(waiting.get_id()))
                    .set((
                        registrations::status.eq(RegistrationStatus::Confirmed),
                        registrations::updated_at.eq(now),
                    ))
                    .execute(conn)?;
                Ok(Some(waiting.get_id()))
            }
            None => Ok(None),
        }
    })?;

    info!("Cancelled registration {}", registration_id);

    let cancelled = get_registration(pool, &registration_id)?
        .ok_or(anyhow!("Registration disappeared during cancellation"))?;
    let promoted = match promoted_id {
        Some(id) => {
            info!("Promoted registration {} from the waitlist", id);
            get_registration(pool, &id)?
        }
        None => None,
    };

    Ok((cancelled, promoted))
}
