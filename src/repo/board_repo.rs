use crate::db::{DbPool, ExecuteWithRetry};
use crate::models::{BoardMember, User};
use crate::repo::user_repo;
use crate::schema::{board_members, users};
use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use tracing::{debug, info, instrument};

/// Appoints a member to a seat on the board roster
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `user_id` - The member holding the office
/// * `office` - Office title ("President", "Observing Chair", ...)
/// * `sort_order` - Position in the roster listing, lowest first
/// * `term_starts` - When the term starts
/// * `term_ends` - When the term ends
///
/// ### Returns
///
/// A Result containing the new roster entry
///
/// ### Errors
///
/// Returns an error if the user does not exist or the term is inverted
#[instrument(skip(pool), fields(user_id = %user_id, office = %office))]
pub async fn create_board_member(
    pool: &DbPool,
    user_id: &str,
    office: String,
    sort_order: i32,
    term_starts: DateTime<Utc>,
    term_ends: DateTime<Utc>,
) -> Result<BoardMember> {
    debug!("Appointing board member");

    user_repo::get_user(pool, user_id)?.ok_or(anyhow!("User not found"))?;

    if term_ends <= term_starts {
        return Err(anyhow!("Term must end after it starts"));
    }

    let seat = BoardMember::new(
        user_id.to_string(),
        office,
        sort_order,
        term_starts,
        term_ends,
    );

    let conn = &mut pool.get()?;
    diesel::insert_into(board_members::table)
        .values(seat.clone())
        .execute_with_retry(conn)
        .await?;

    info!("Created roster entry with id: {}", seat.get_id());

    Ok(seat)
}

/// Retrieves a roster entry by its ID
#[instrument(skip(pool), fields(entry_id = %entry_id))]
pub fn get_board_member(pool: &DbPool, entry_id: &str) -> Result<Option<BoardMember>> {
    let conn = &mut pool.get()?;

    let result = board_members::table
        .find(entry_id)
        .first::<BoardMember>(conn)
        .optional()?;

    Ok(result)
}

/// Lists the current board roster with each office holder
///
/// Entries whose term covers the present moment, ordered by `sort_order`
/// so the president comes first.
#[instrument(skip(pool))]
pub fn list_current_roster(pool: &DbPool) -> Result<Vec<(BoardMember, User)>> {
    let now = Utc::now().naive_utc();

    let conn = &mut pool.get()?;
    let results = board_members::table
        .inner_join(users::table)
        .filter(board_members::term_starts.le(now))
        .filter(board_members::term_ends.ge(now))
        .order_by(board_members::sort_order.asc())
        .select((BoardMember::as_select(), User::as_select()))
        .load::<(BoardMember, User)>(conn)?;

    info!("Retrieved {} current roster entries", results.len());

    Ok(results)
}

/// Removes a seat from the roster
///
/// ### Errors
///
/// Returns an error if the entry does not exist
#[instrument(skip(pool), fields(entry_id = %entry_id))]
pub async fn delete_board_member(pool: &DbPool, entry_id: &str) -> Result<()> {
    debug!("Deleting roster entry");

    get_board_member(pool, entry_id)?.ok_or(anyhow!("Roster entry not found"))?;

    let conn = &mut pool.get()?;
    diesel::delete(board_members::table.find(entry_id.to_string()))
        .execute_with_retry(conn)
        .await?;

    info!("Deleted roster entry {}", entry_id);
    Ok(())
}

#[cfg(test)]
mod tests;
