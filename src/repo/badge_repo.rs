use crate::db::DbPool;
use crate::models::{Badge, BadgeDesign};
use crate::schema::{badges, users};
use anyhow::{Result, anyhow};
use chrono::Utc;
use diesel::prelude::*;
use tracing::{debug, info, instrument};

/// Issues a membership badge to a user
///
/// Badge numbers grow monotonically across the whole club and are never
/// reused, so the revoke-and-renumber happens in one transaction: any
/// active badge the member holds is revoked, then a new row takes the
/// next number after the highest ever issued.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `user_id` - The member the badge is issued to
/// * `label` - Name line printed on the badge
/// * `design` - Rendering parameters for the card renderer
///
/// ### Returns
///
/// A Result containing the newly issued Badge
///
/// ### Errors
///
/// Returns an error if the user does not exist
#[instrument(skip(pool, design), fields(user_id = %user_id))]
pub async fn issue_badge(
    pool: &DbPool,
    user_id: &str,
    label: String,
    design: BadgeDesign,
) -> Result<Badge> {
    debug!("Issuing badge to user");

    let conn = &mut pool.get()?;
    let badge = conn.immediate_transaction::<_, anyhow::Error, _>(|conn| {
        let holder_exists: i64 = users::table
            .filter(users::id.eq(user_id.to_string()))
            .count()
            .get_result(conn)?;
        if holder_exists == 0 {
            return Err(anyhow!("User not found"));
        }

        let revoked = diesel::update(
            badges::table
                .filter(badges::user_id.eq(user_id.to_string()))
                .filter(badges::revoked_at.is_null()),
        )
        .set(badges::revoked_at.eq(Utc::now().naive_utc()))
        .execute(conn)?;
        if revoked > 0 {
            debug!("Revoked {} previous badge(s)", revoked);
        }

        let highest: Option<i32> = badges::table
            .select(diesel::dsl::max(badges::badge_number))
            .first(conn)?;
        let badge = Badge::new(
            user_id.to_string(),
            label.clone(),
            highest.unwrap_or(0) + 1,
            design.clone(),
        );

        diesel::insert_into(badges::table)
            .values(badge.clone())
            .execute(conn)?;

        Ok(badge)
    })?;

    info!(
        "Issued badge #{} with id: {}",
        badge.get_badge_number(),
        badge.get_id()
    );

    Ok(badge)
}

/// Retrieves a badge by its ID
#[instrument(skip(pool), fields(badge_id = %badge_id))]
pub fn get_badge(pool: &DbPool, badge_id: &str) -> Result<Option<Badge>> {
    let conn = &mut pool.get()?;

    let result = badges::table
        .find(badge_id)
        .first::<Badge>(conn)
        .optional()?;

    Ok(result)
}

/// Retrieves a user's current (unrevoked) badge, if they hold one
///
/// A member holds at most one active badge; issuing revokes the old one
/// in the same transaction.
#[instrument(skip(pool), fields(user_id = %user_id))]
pub fn get_active_badge(pool: &DbPool, user_id: &str) -> Result<Option<Badge>> {
    let conn = &mut pool.get()?;

    let result = badges::table
        .filter(badges::user_id.eq(user_id.to_string()))
        .filter(badges::revoked_at.is_null())
        .first::<Badge>(conn)
        .optional()?;

    Ok(result)
}

/// Lists every badge ever issued to a user, newest first
///
/// Includes revoked badges; this is the member's issue history.
#[instrument(skip(pool), fields(user_id = %user_id))]
pub fn list_badges_for_user(pool: &DbPool, user_id: &str) -> Result<Vec<Badge>> {
    let conn = &mut pool.get()?;

    let results = badges::table
        .filter(badges::user_id.eq(user_id.to_string()))
        .order_by(badges::badge_number.desc())
        .load::<Badge>(conn)?;

    info!("Retrieved {} badges for user", results.len());

    Ok(results)
}

/// Lists every badge ever issued club-wide, newest first
#[instrument(skip(pool))]
pub fn list_badges(pool: &DbPool) -> Result<Vec<Badge>> {
    let conn = &mut pool.get()?;

    let results = badges::table
        .order_by(badges::badge_number.desc())
        .load::<Badge>(conn)?;

    info!("Retrieved {} badges", results.len());

    Ok(results)
}
