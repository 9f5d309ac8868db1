use crate::auth;
use crate::db::{DbPool, ExecuteWithRetry};
use crate::dto::MemberQueryDto;
use crate::models::{User, UserRole};
use crate::schema::{sessions, users};
use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use tracing::{debug, info, instrument, warn};

/// Normalizes a login email: trimmed and lowercased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Creates a new member account
///
/// The email is normalized before storage so logins are case and
/// whitespace insensitive, and the password is hashed with Argon2.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `email` - The login email, in whatever shape the client sent it
/// * `password` - The plaintext password
/// * `name` - The display name
///
/// ### Returns
///
/// A Result containing the newly created User if successful
///
/// ### Errors
///
/// Returns an error if:
/// - The email is already registered
/// - Unable to get a connection from the pool
/// - The database insert operation fails
#[instrument(skip(pool, password), fields(email = %email))]
pub async fn create_user(pool: &DbPool, email: &str, password: &str, name: &str) -> Result<User> {
    debug!("Creating new user account");

    let email = normalize_email(email);

    if find_user_by_email(pool, &email)?.is_some() {
        info!("Email already registered: {}", email);
        return Err(anyhow!("Email is already registered"));
    }

    let password_hash = auth::hash_password(password)?;
    let new_user = User::new(email, password_hash, name.to_string());
    let new_user_id = new_user.get_id();

    let conn = &mut pool.get()?;
    diesel::insert_into(users::table)
        .values(new_user.clone())
        .execute_with_retry(conn)
        .await?;

    info!("Successfully created user with id: {}", new_user_id);

    Ok(new_user)
}

/// Retrieves a user from the database by their ID
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `user_id` - The ID of the user to retrieve
///
/// ### Returns
///
/// A Result containing an Option with the User if found, or None if not found
#[instrument(skip(pool), fields(user_id = %user_id))]
pub fn get_user(pool: &DbPool, user_id: &str) -> Result<Option<User>> {
    let conn = &mut pool.get()?;

    let result = users::table.find(user_id).first::<User>(conn).optional()?;

    Ok(result)
}

/// Retrieves a user by their normalized email
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `email` - The normalized login email
///
/// ### Returns
///
/// A Result containing an Option with the User if found, or None if not found
#[instrument(skip(pool), fields(email = %email))]
pub fn find_user_by_email(pool: &DbPool, email: &str) -> Result<Option<User>> {
    let conn = &mut pool.get()?;

    let result = users::table
        .filter(users::email.eq(email))
        .first::<User>(conn)
        .optional()?;

    Ok(result)
}

/// Lists member accounts with optional filtering
///
/// Deactivated accounts are hidden unless the query asks for them.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `query` - Role, free-text, and deactivation filters
///
/// ### Returns
///
/// A Result containing a vector of Users matching the filters
#[instrument(skip(pool, query))]
pub fn list_members(pool: &DbPool, query: &MemberQueryDto) -> Result<Vec<User>> {
    debug!("Listing members with filters: {:?}", query);

    let conn = &mut pool.get()?;

    let mut member_query = users::table.into_boxed();

    if let Some(role) = query.role {
        debug!("Filtering by role: {}", role);
        member_query = member_query.filter(users::role.eq(role));
    }

    if let Some(q) = &query.q {
        debug!("Filtering by search text: {}", q);
        let pattern = format!("%{}%", q);
        member_query = member_query.filter(
            users::name
                .like(pattern.clone())
                .or(users::email.like(pattern)),
        );
    }

    if !query.include_deactivated {
        member_query = member_query.filter(users::deactivated_at.is_null());
    }

    let results = member_query.order_by(users::name.asc()).load::<User>(conn)?;

    info!("Retrieved {} members matching filters", results.len());

    Ok(results)
}

/// Updates a member's role and/or membership expiry
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `user_id` - The ID of the member to update
/// * `role` - The new role, or None to leave it alone
/// * `membership_expires` - The new expiry, or None to leave it alone
///
/// ### Returns
///
/// A Result containing the updated User
///
/// ### Errors
///
/// Returns an error if the user does not exist or the update fails
#[instrument(skip(pool), fields(user_id = %user_id))]
pub async fn update_member(
    pool: &DbPool,
    user_id: &str,
    role: Option<UserRole>,
    membership_expires: Option<DateTime<Utc>>,
) -> Result<User> {
    let mut user = get_user(pool, user_id)?.ok_or(anyhow!("User not found"))?;

    if let Some(role) = role {
        user.set_role(role);
    }
    if let Some(expires) = membership_expires {
        user.set_membership_expires(Some(expires));
    }

    let conn = &mut pool.get()?;
    diesel::update(users::table.find(user_id.to_string()))
        .set((
            users::role.eq(user.get_role()),
            users::membership_expires.eq(user.get_membership_expires().map(|dt| dt.naive_utc())),
            users::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute_with_retry(conn)
        .await?;

    info!("Updated member {}", user_id);

    get_user(pool, user_id)?.ok_or(anyhow!("User disappeared during update"))
}

/// Deactivates a member account and revokes all of its sessions
///
/// Both writes land in one transaction: a deactivated account must not
/// keep a live login.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `user_id` - The ID of the member to deactivate
///
/// ### Returns
///
/// A Result containing the deactivated User
///
/// ### Errors
///
/// Returns an error if the user does not exist or was already deactivated
#[instrument(skip(pool), fields(user_id = %user_id))]
pub async fn deactivate_user(pool: &DbPool, user_id: &str) -> Result<User> {
    debug!("Deactivating user");

    let user = get_user(pool, user_id)?.ok_or(anyhow!("User not found"))?;
    if user.is_deactivated() {
        warn!("User {} is already deactivated", user_id);
        return Err(anyhow!("User is already deactivated"));
    }

    let conn = &mut pool.get()?;
    conn.immediate_transaction(|conn| {
        diesel::update(users::table.find(user_id.to_string()))
            .set((
                users::deactivated_at.eq(Some(Utc::now().naive_utc())),
                users::updated_at.eq(Utc::now().naive_utc()),
            ))
            .execute(conn)?;

        diesel::delete(sessions::table.filter(sessions::user_id.eq(user_id.to_string())))
            .execute(conn)?;

        Ok::<(), diesel::result::Error>(())
    })?;

    info!("Deactivated user {} and revoked their sessions", user_id);

    get_user(pool, user_id)?.ok_or(anyhow!("User disappeared during deactivation"))
}

#[cfg(test)]
mod tests;
