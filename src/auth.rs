//! Password hashing and request authentication
//!
//! Passwords are hashed with Argon2id. Requests authenticate with a
//! bearer token issued at login; the helpers here resolve that token to
//! a live user so handlers can check it up front, before touching any
//! other state.

use anyhow::anyhow;
use argon2::password_hash::{PasswordHash, PasswordVerifier, SaltString};
use argon2::{Argon2, PasswordHasher};
use axum::http::{HeaderMap, header};
use chrono::Utc;
use rand::RngCore;
use tracing::debug;

use crate::db::DbPool;
use crate::errors::ApiError;
use crate::models::User;
use crate::repo;

/// Hashes a password with Argon2id and a freshly generated salt
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let mut salt_bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut salt_bytes);

    let salt =
        SaltString::encode_b64(&salt_bytes).map_err(|e| anyhow!("Failed to encode salt: {}", e))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow!("Failed to hash password: {}", e))
}

/// Verifies a plaintext password against a stored Argon2 hash
pub fn verify_password(password: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| anyhow!("Stored password hash is invalid: {}", e))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Extracts the bearer token from the Authorization header, if present
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Resolves the request's bearer token to a live user
///
/// Fails with Unauthorized when the token is missing, unknown, expired,
/// or belongs to a deactivated account.
pub fn require_user(pool: &DbPool, headers: &HeaderMap) -> Result<User, ApiError> {
    let token = bearer_token(headers).ok_or(ApiError::Unauthorized)?;

    let session = repo::find_session(pool, token)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::Unauthorized)?;

    if session.is_expired(Utc::now()) {
        debug!("Rejected expired session for user {}", session.get_user_id());
        return Err(ApiError::Unauthorized);
    }

    let user = repo::get_user(pool, &session.get_user_id())
        .map_err(ApiError::Database)?
        .ok_or(ApiError::Unauthorized)?;

    if user.is_deactivated() {
        return Err(ApiError::Unauthorized);
    }

    Ok(user)
}

/// Resolves the authenticated user if credentials were sent, None otherwise
///
/// Used on endpoints that serve both the public and members, where a
/// valid token unlocks more content. A token that is present but bad is
/// still rejected rather than silently downgraded.
pub fn optional_user(pool: &DbPool, headers: &HeaderMap) -> Result<Option<User>, ApiError> {
    if bearer_token(headers).is_none() {
        return Ok(None);
    }
    require_user(pool, headers).map(Some)
}

/// Resolves the authenticated user and requires the admin role
pub fn require_admin(pool: &DbPool, headers: &HeaderMap) -> Result<User, ApiError> {
    let user = require_user(pool, headers)?;
    if !user.is_admin() {
        return Err(ApiError::Forbidden);
    }
    Ok(user)
}

/// Resolves the authenticated user and requires the board or admin role
pub fn require_board(pool: &DbPool, headers: &HeaderMap) -> Result<User, ApiError> {
    let user = require_user(pool, headers)?;
    if !user.is_board() {
        return Err(ApiError::Forbidden);
    }
    Ok(user)
}
