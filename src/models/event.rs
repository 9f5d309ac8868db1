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

/// Kind of club event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Meeting,
    StarParty,
    Workshop,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Meeting => "meeting",
            EventKind::StarParty => "star_party",
            EventKind::Workshop => "workshop",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromSql<Text, Sqlite> for EventKind {
    fn from_sql(value: SqliteValue<'_, '_, '_>) -> diesel::deserialize::Result<Self> {
        let text = <String as FromSql<Text, Sqlite>>::from_sql(value)?;
        match text.as_str() {
            "meeting" => Ok(EventKind::Meeting),
            "star_party" => Ok(EventKind::StarParty),
            "workshop" => Ok(EventKind::Workshop),
            other => Err(format!("Unknown event kind: {}", other).into()),
        }
    }
}

impl ToSql<Text, Sqlite> for EventKind {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(self.as_str());
        Ok(IsNull::No)
    }
}

/// Represents a club event
///
/// A capacity of zero means unlimited. Unpublished events are drafts only
/// admins can see.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::events)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Event {
    /// Unique identifier for the event (UUID v4 as string)
    id: String,

    /// Event title
    title: String,

    /// Full description shown on the event page
    description: String,

    /// Where the event takes place
    location: String,

    /// When the event starts
    starts_at: NaiveDateTime,

    /// When the event ends
    ends_at: NaiveDateTime,

    /// Maximum number of registrations, 0 for unlimited
    capacity: i32,

    /// Kind of event
    event_kind: EventKind,

    /// Whether the event is visible to members
    published: bool,

    /// Registrations made before this deadline get the early-bird discount
    early_bird_deadline: Option<NaiveDateTime>,

    /// When the event was created
    created_at: NaiveDateTime,

    /// When the event was last modified
    updated_at: NaiveDateTime,
}

impl Event {
    /// Creates a new unpublished event
    pub fn new(
        title: String,
        description: String,
        location: String,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        capacity: i32,
        event_kind: EventKind,
    ) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            description,
            location,
            starts_at: starts_at.naive_utc(),
            ends_at: ends_at.naive_utc(),
            capacity,
            event_kind,
            published: false,
            early_bird_deadline: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Gets the event's ID
    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    /// Gets the event's title
    pub fn get_title(&self) -> String {
        self.title.clone()
    }

    /// Gets the event's description
    pub fn get_description(&self) -> String {
        self.description.clone()
    }

    /// Gets the event's location
    pub fn get_location(&self) -> String {
        self.location.clone()
    }

    /// Gets when the event starts as a DateTime<Utc>
    pub fn get_starts_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.starts_at, Utc)
    }

    /// Gets when the event ends as a DateTime<Utc>
    pub fn get_ends_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.ends_at, Utc)
    }

    /// Gets the registration capacity (0 means unlimited)
    pub fn get_capacity(&self) -> i32 {
        self.capacity
    }

    /// Gets the kind of event
    pub fn get_event_kind(&self) -> EventKind {
        self.event_kind
    }

    /// Whether the event is visible to members
    pub fn is_published(&self) -> bool {
        self.published
    }

    /// Sets whether the event is visible to members
    pub fn set_published(&mut self, published: bool) {
        self.published = published;
    }

    /// Gets the early-bird deadline as a DateTime<Utc>
    pub fn get_early_bird_deadline(&self) -> Option<DateTime<Utc>> {
        self.early_bird_deadline
            .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc))
    }

    /// Sets the early-bird deadline
    pub fn set_early_bird_deadline(&mut self, deadline: Option<DateTime<Utc>>) {
        self.early_bird_deadline = deadline.map(|dt| dt.naive_utc());
    }

    /// Whether the event has already ended at the given instant
    pub fn has_ended(&self, at: DateTime<Utc>) -> bool {
        self.ends_at < at.naive_utc()
    }

    /// Whether a registration made at the given instant earns the
    /// early-bird discount
    pub fn is_early_bird(&self, at: DateTime<Utc>) -> bool {
        match self.early_bird_deadline {
            Some(deadline) => at.naive_utc() <= deadline,
            None => false,
        }
    }

    /// Whether the given number of active registrations fills the event
    pub fn is_full(&self, active_registrations: i64) -> bool {
        self.capacity > 0 && active_registrations >= self.capacity as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn star_party() -> Event {
        let starts = Utc::now() + Duration::days(30);
        Event::new(
            "Orange Blossom Special".to_string(),
            "Annual dark-sky star party.".to_string(),
            "Withlacoochee River Park".to_string(),
            starts,
            starts + Duration::days(4),
            120,
            EventKind::StarParty,
        )
    }

    #[test]
    fn test_new_event_is_unpublished() {
        let event = star_party();
        assert!(!event.is_published());
        assert_eq!(event.get_event_kind(), EventKind::StarParty);
        assert!(!event.has_ended(Utc::now()));
    }

    #[test]
    fn test_early_bird_window() {
        let mut event = star_party();
        let now = Utc::now();

        // No deadline configured
        assert!(!event.is_early_bird(now));

        event.set_early_bird_deadline(Some(now + Duration::days(7)));
        assert!(event.is_early_bird(now));
        assert!(!event.is_early_bird(now + Duration::days(8)));
    }

    #[test]
    fn test_capacity_zero_is_unlimited() {
        let mut event = star_party();
        assert!(event.is_full(120));
        assert!(!event.is_full(119));

        event = Event::new(
            "Monthly Meeting".to_string(),
            "Club business and a speaker.".to_string(),
            "Science Center".to_string(),
            Utc::now(),
            Utc::now() + Duration::hours(2),
            0,
            EventKind::Meeting,
        );
        assert!(!event.is_full(10_000));
    }

    #[test]
    fn test_event_kind_serde_uses_snake_case() {
        let json = serde_json::to_string(&EventKind::StarParty).unwrap();
        assert_eq!(json, "\"star_party\"");
    }
}
