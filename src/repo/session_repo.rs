use crate::db::{DbPool, ExecuteWithRetry};
use crate::models::Session;
use crate::schema::sessions;
use anyhow::Result;
use chrono::{TimeDelta, Utc};
use diesel::prelude::*;
use tracing::{debug, info, instrument};

/// Creates a new login session for a user
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `user_id` - The ID of the user logging in
/// * `ttl` - How long the session stays valid
///
/// ### Returns
///
/// A Result containing the newly created Session if successful
#[instrument(skip(pool), fields(user_id = %user_id))]
pub async fn create_session(pool: &DbPool, user_id: &str, ttl: TimeDelta) -> Result<Session> {
    debug!("Creating session with ttl {}", ttl);

    let session = Session::new(user_id.to_string(), ttl);

    let conn = &mut pool.get()?;
    diesel::insert_into(sessions::table)
        .values(session.clone())
        .execute_with_retry(conn)
        .await?;

    info!("Created session for user {}", user_id);

    Ok(session)
}

/// Looks up a session by its bearer token
///
/// Expiry is not checked here; callers decide what a stale session means.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `token` - The bearer token presented by the client
///
/// ### Returns
///
/// A Result containing an Option with the Session if found, or None if not found
#[instrument(skip(pool, token))]
pub fn find_session(pool: &DbPool, token: &str) -> Result<Option<Session>> {
    let conn = &mut pool.get()?;

    let result = sessions::table
        .find(token)
        .first::<Session>(conn)
        .optional()?;

    Ok(result)
}

/// Deletes a session, logging the holder out
///
/// Deleting a token that no longer exists is not an error: logout is
/// idempotent.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `token` - The bearer token to revoke
#[instrument(skip(pool, token))]
pub async fn delete_session(pool: &DbPool, token: &str) -> Result<()> {
    let conn = &mut pool.get()?;

    let deleted = diesel::delete(sessions::table.find(token.to_string()))
        .execute_with_retry(conn)
        .await?;

    debug!("Deleted {} session rows", deleted);

    Ok(())
}

/// Deletes every session that has already expired
///
/// Run periodically by the server so abandoned logins do not pile up.
///
/// ### Returns
///
/// A Result containing the number of sessions removed
#[instrument(skip(pool))]
pub async fn sweep_expired_sessions(pool: &DbPool) -> Result<usize> {
    let now = Utc::now().naive_utc();

    let conn = &mut pool.get()?;
    let deleted = diesel::delete(sessions::table.filter(sessions::expires_at.lt(now)))
        .execute_with_retry(conn)
        .await?;

    if deleted > 0 {
        info!("Swept {} expired sessions", deleted);
    }

    Ok(deleted)
}
