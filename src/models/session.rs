use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use diesel::prelude::*;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Represents a login session
///
/// The session ID doubles as the bearer token presented by clients, so it
/// is minted from 32 random bytes rather than a UUID.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::sessions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Session {
    /// Opaque bearer token (32 random bytes, hex encoded)
    id: String,

    /// The ID of the user this session belongs to
    user_id: String,

    /// When the session was created
    created_at: NaiveDateTime,

    /// When the session stops being accepted
    expires_at: NaiveDateTime,
}

impl Session {
    /// Creates a new session for a user
    ///
    /// ### Arguments
    ///
    /// * `user_id` - The ID of the user logging in
    /// * `ttl` - How long the session stays valid
    pub fn new(user_id: String, ttl: TimeDelta) -> Self {
        let now = Utc::now();
        Self {
            id: generate_token(),
            user_id,
            created_at: now.naive_utc(),
            expires_at: (now + ttl).naive_utc(),
        }
    }

    /// Gets the session token
    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    /// Gets the ID of the user this session belongs to
    pub fn get_user_id(&self) -> String {
        self.user_id.clone()
    }

    /// Gets when the session expires as a DateTime<Utc>
    pub fn get_expires_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.expires_at, Utc)
    }

    /// Whether the session has expired at the given instant
    pub fn is_expired(&self, at: DateTime<Utc>) -> bool {
        self.expires_at < at.naive_utc()
    }
}

/// Mints an opaque session token
fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
