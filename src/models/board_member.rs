use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents one seat on the club's board roster
///
/// The public roster shows entries whose term has not ended, ordered by
/// `sort_order` (president first).
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::board_members)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BoardMember {
    /// Unique identifier for the roster entry (UUID v4 as string)
    id: String,

    /// The member holding the office
    user_id: String,

    /// Office title ("President", "Observing Chair", ...)
    office: String,

    /// Position in the roster listing, lowest first
    sort_order: i32,

    /// When the term starts
    term_starts: NaiveDateTime,

    /// When the term ends
    term_ends: NaiveDateTime,
}

impl BoardMember {
    pub fn new(
        user_id: String,
        office: String,
        sort_order: i32,
        term_starts: DateTime<Utc>,
        term_ends: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            office,
            sort_order,
            term_starts: term_starts.naive_utc(),
            term_ends: term_ends.naive_utc(),
        }
    }

    /// Gets the roster entry's ID
    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    /// Gets the office holder's user ID
    pub fn get_user_id(&self) -> String {
        self.user_id.clone()
    }

    /// Gets the office title
    pub fn get_office(&self) -> String {
        self.office.clone()
    }

    /// Gets the roster position
    pub fn get_sort_order(&self) -> i32 {
        self.sort_order
    }

    /// Gets when the term starts
    pub fn get_term_starts(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.term_starts, Utc)
    }

    /// Gets when the term ends
    pub fn get_term_ends(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.term_ends, Utc)
    }

    /// Whether the term is current at the given instant
    pub fn is_current(&self, at: DateTime<Utc>) -> bool {
        let at = at.naive_utc();
        self.term_starts <= at && at <= self.term_ends
    }
}
