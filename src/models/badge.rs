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

/// Rendering parameters for a membership badge, stored as JSON TEXT
///
/// The card renderer on the client side interprets these; the server only
/// stores and returns them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
pub struct BadgeDesign(pub serde_json::Value);

impl Default for BadgeDesign {
    fn default() -> Self {
        BadgeDesign(serde_json::json!({}))
    }
}

impl FromSql<Text, Sqlite> for BadgeDesign {
    fn from_sql(value: SqliteValue<'_, '_, '_>) -> diesel::deserialize::Result<Self> {
        let text = <String as FromSql<Text, Sqlite>>::from_sql(value)?;
        let value = serde_json::from_str(&text)?;
        Ok(BadgeDesign(value))
    }
}

impl ToSql<Text, Sqlite> for BadgeDesign {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(serde_json::to_string(&self.0)?);
        Ok(IsNull::No)
    }
}

/// Represents a printed membership badge
///
/// Badge numbers are issued sequentially and never reused; reissuing a
/// member's badge revokes the old row and creates a new one with the next
/// number.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::badges)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Badge {
    /// Unique identifier for the badge (UUID v4 as string)
    id: String,

    /// The member the badge was issued to
    user_id: String,

    /// Name line printed on the badge
    label: String,

    /// Sequential badge number, unique across the club's history
    badge_number: i32,

    /// Rendering parameters consumed by the client-side card renderer
    design: BadgeDesign,

    /// When the badge was issued
    issued_at: NaiveDateTime,

    /// When the badge was revoked, or None while active
    revoked_at: Option<NaiveDateTime>,
}

impl Badge {
    pub fn new(user_id: String, label: String, badge_number: i32, design: BadgeDesign) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            label,
            badge_number,
            design,
            issued_at: Utc::now().naive_utc(),
            revoked_at: None,
        }
    }

    /// Gets the badge's ID
    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    /// Gets the holder's user ID
    pub fn get_user_id(&self) -> String {
        self.user_id.clone()
    }

    /// Gets the name line printed on the badge
    pub fn get_label(&self) -> String {
        self.label.clone()
    }

    /// Gets the sequential badge number
    pub fn get_badge_number(&self) -> i32 {
        self.badge_number
    }

    /// Gets the rendering parameters
    pub fn get_design(&self) -> BadgeDesign {
        self.design.clone()
    }

    /// Gets when the badge was issued
    pub fn get_issued_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.issued_at, Utc)
    }

    /// Gets when the badge was revoked, or None while active
    pub fn get_revoked_at(&self) -> Option<DateTime<Utc>> {
        self.revoked_at
            .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc))
    }

    /// Whether the badge is the holder's current one
    pub fn is_active(&self) -> bool {
        self.revoked_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_badge_new_is_active() {
        let badge = Badge::new(
            "user-1".to_string(),
            "Ada Lovelace".to_string(),
            42,
            BadgeDesign(json!({"theme": "nebula"})),
        );

        assert!(badge.is_active());
        assert_eq!(badge.get_badge_number(), 42);
        assert_eq!(badge.get_design().0["theme"], "nebula");
    }
}
