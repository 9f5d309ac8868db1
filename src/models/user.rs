use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::deserialize::{FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::prelude::*;
use diesel::serialize;
use diesel::serialize::{IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel::sqlite::{Sqlite, SqliteValue};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Access level of a club member
///
/// Stored as lowercase text in the `users.role` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Member,
    Board,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Member => "member",
            UserRole::Board => "board",
            UserRole::Admin => "admin",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromSql<Text, Sqlite> for UserRole {
    fn from_sql(value: SqliteValue<'_, '_, '_>) -> diesel::deserialize::Result<Self> {
        let text = <String as FromSql<Text, Sqlite>>::from_sql(value)?;
        match text.as_str() {
            "member" => Ok(UserRole::Member),
            "board" => Ok(UserRole::Board),
            "admin" => Ok(UserRole::Admin),
            other => Err(format!("Unknown user role: {}", other).into()),
        }
    }
}

impl ToSql<Text, Sqlite> for UserRole {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(self.as_str());
        Ok(IsNull::No)
    }
}

/// Represents a member account
///
/// The password hash never leaves the server: it is skipped during
/// serialization so handlers can return `User` values directly.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    /// Unique identifier for the user (UUID v4 as string)
    id: String,

    /// Login email, stored normalized (trimmed, lowercased)
    email: String,

    /// Argon2 hash of the user's password
    #[serde(skip_serializing, default)]
    password_hash: String,

    /// Display name, also printed on membership badges
    name: String,

    /// Optional contact phone number
    phone: Option<String>,

    /// Access level of the account
    role: UserRole,

    /// When the paid membership lapses, or None if never set
    membership_expires: Option<NaiveDateTime>,

    /// When the account was deactivated, or None while active
    deactivated_at: Option<NaiveDateTime>,

    /// When the account was created
    created_at: NaiveDateTime,

    /// When the account was last modified
    updated_at: NaiveDateTime,
}

impl User {
    /// Creates a new member account
    ///
    /// ### Arguments
    ///
    /// * `email` - Normalized login email
    /// * `password_hash` - Argon2 hash of the chosen password
    /// * `name` - Display name
    ///
    /// ### Returns
    ///
    /// A new `User` with the member role and no membership expiry
    pub fn new(email: String, password_hash: String, name: String) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4().to_string(),
            email,
            password_hash,
            name,
            phone: None,
            role: UserRole::Member,
            membership_expires: None,
            deactivated_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Gets the user's ID
    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    /// Gets the user's login email
    pub fn get_email(&self) -> String {
        self.email.clone()
    }

    /// Gets the user's password hash
    pub fn get_password_hash(&self) -> String {
        self.password_hash.clone()
    }

    /// Gets the user's display name
    pub fn get_name(&self) -> String {
        self.name.clone()
    }

    /// Sets the user's display name
    pub fn set_name(&mut self, name: String) {
        self.name = name;
    }

    /// Gets the user's phone number
    pub fn get_phone(&self) -> Option<String> {
        self.phone.clone()
    }

    /// Sets the user's phone number
    pub fn set_phone(&mut self, phone: Option<String>) {
        self.phone = phone;
    }

    /// Gets the account's role
    pub fn get_role(&self) -> UserRole {
        self.role
    }

    /// Sets the account's role
    pub fn set_role(&mut self, role: UserRole) {
        self.role = role;
    }

    /// Gets the membership expiry as a DateTime<Utc>
    pub fn get_membership_expires(&self) -> Option<DateTime<Utc>> {
        self.membership_expires
            .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc))
    }

    /// Sets the membership expiry
    pub fn set_membership_expires(&mut self, expires: Option<DateTime<Utc>>) {
        self.membership_expires = expires.map(|dt| dt.naive_utc());
    }

    /// Gets when the account was deactivated, or None while active
    pub fn get_deactivated_at(&self) -> Option<DateTime<Utc>> {
        self.deactivated_at
            .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc))
    }

    /// Gets when the account was created
    pub fn get_created_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.created_at, Utc)
    }

    /// Whether the account has been deactivated
    pub fn is_deactivated(&self) -> bool {
        self.deactivated_at.is_some()
    }

    /// Whether the account may use the admin back-office
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Whether the account holds board privileges (board or admin role)
    pub fn is_board(&self) -> bool {
        matches!(self.role, UserRole::Board | UserRole::Admin)
    }

    /// Whether the paid membership is current at the given instant
    ///
    /// An account with no expiry on record counts as lapsed, not as a
    /// lifetime membership.
    pub fn is_member_in_good_standing(&self, at: DateTime<Utc>) -> bool {
        match self.membership_expires {
            Some(expires) => expires >= at.naive_utc(),
            None => false,
        }
    }
}
