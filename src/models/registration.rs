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

use super::LineItems;

/// State of an event registration
///
/// `Waitlisted` registrations hold a place in arrival order and are
/// promoted when capacity frees up. `Cancelled` is the soft delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Confirmed,
    Waitlisted,
    Cancelled,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Confirmed => "confirmed",
            RegistrationStatus::Waitlisted => "waitlisted",
            RegistrationStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromSql<Text, Sqlite> for RegistrationStatus {
    fn from_sql(value: SqliteValue<'_, '_, '_>) -> diesel::deserialize::Result<Self> {
        let text = <String as FromSql<Text, Sqlite>>::from_sql(value)?;
        match text.as_str() {
            "confirmed" => Ok(RegistrationStatus::Confirmed),
            "waitlisted" => Ok(RegistrationStatus::Waitlisted),
            "cancelled" => Ok(RegistrationStatus::Cancelled),
            other => Err(format!("Unknown registration status: {}", other).into()),
        }
    }
}

impl ToSql<Text, Sqlite> for RegistrationStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(self.as_str());
        Ok(IsNull::No)
    }
}

/// Represents one member's registration for an event
///
/// The priced breakdown is computed server-side at registration time and
/// stored with the row, so later price changes never alter what someone
/// was charged.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::registrations)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Registration {
    /// Unique identifier for the registration (UUID v4 as string)
    id: String,

    /// The event being registered for
    event_id: String,

    /// The registering user
    user_id: String,

    /// State of the registration
    status: RegistrationStatus,

    /// Number of adults attending (at least one, the member)
    adults: i32,

    /// Number of children attending
    children: i32,

    /// Number of camping nights
    nights: i32,

    /// Whether the meal plan was chosen
    meal_plan: bool,

    /// Priced breakdown captured at registration time
    line_items: LineItems,

    /// Total charged in cents (sum of line items, never negative)
    total_cents: i64,

    /// The payment created for this registration, if the total was positive
    payment_id: Option<String>,

    /// When the registration was made
    created_at: NaiveDateTime,

    /// When the registration last changed
    updated_at: NaiveDateTime,
}

impl Registration {
    /// Creates a new registration with its priced breakdown
    pub fn new(
        event_id: String,
        user_id: String,
        status: RegistrationStatus,
        adults: i32,
        children: i32,
        nights: i32,
        meal_plan: bool,
        line_items: LineItems,
        total_cents: i64,
    ) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4().to_string(),
            event_id,
            user_id,
            status,
            adults,
            children,
            nights,
            meal_plan,
            line_items,
            total_cents,
            payment_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Gets the registration's ID
    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    /// Gets the ID of the event
    pub fn get_event_id(&self) -> String {
        self.event_id.clone()
    }

    /// Gets the ID of the registering user
    pub fn get_user_id(&self) -> String {
        self.user_id.clone()
    }

    /// Gets the registration's state
    pub fn get_status(&self) -> RegistrationStatus {
        self.status
    }

    /// Gets the number of adults attending
    pub fn get_adults(&self) -> i32 {
        self.adults
    }

    /// Gets the number of children attending
    pub fn get_children(&self) -> i32 {
        self.children
    }

    /// Gets the number of camping nights
    pub fn get_nights(&self) -> i32 {
        self.nights
    }

    /// Whether the meal plan was chosen
    pub fn has_meal_plan(&self) -> bool {
        self.meal_plan
    }

    /// Gets the priced breakdown
    pub fn get_line_items(&self) -> LineItems {
        self.line_items.clone()
    }

    /// Gets the total charged in cents
    pub fn get_total_cents(&self) -> i64 {
        self.total_cents
    }

    /// Gets the linked payment ID, if any
    pub fn get_payment_id(&self) -> Option<String> {
        self.payment_id.clone()
    }

    /// Sets the linked payment ID
    pub fn set_payment_id(&mut self, payment_id: Option<String>) {
        self.payment_id = payment_id;
    }

    /// Gets when the registration was made
    pub fn get_created_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.created_at, Utc)
    }

    /// Whether the registration still counts against event capacity
    pub fn is_active(&self) -> bool {
        self.status != RegistrationStatus::Cancelled
    }
}
