use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a family member attached to a user's account
///
/// Family members are purely informational records (used on registration
/// forms and name badges) owned and managed by the account holder.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::family_members)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FamilyMember {
    /// Unique identifier (UUID v4 as string)
    id: String,

    /// The ID of the user this record belongs to
    user_id: String,

    /// Full name of the family member
    name: String,

    /// Relation to the account holder ("spouse", "child", ...)
    relation: String,

    /// Birth year, used for youth programs
    birth_year: Option<i32>,

    /// When the record was created
    created_at: NaiveDateTime,
}

impl FamilyMember {
    pub fn new(user_id: String, name: String, relation: String, birth_year: Option<i32>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            name,
            relation,
            birth_year,
            created_at: Utc::now().naive_utc(),
        }
    }

    /// Gets the record's ID
    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    /// Gets the ID of the owning user
    pub fn get_user_id(&self) -> String {
        self.user_id.clone()
    }

    /// Gets the family member's name
    pub fn get_name(&self) -> String {
        self.name.clone()
    }

    /// Gets the relation to the account holder
    pub fn get_relation(&self) -> String {
        self.relation.clone()
    }

    /// Gets the birth year, if recorded
    pub fn get_birth_year(&self) -> Option<i32> {
        self.birth_year
    }
}
