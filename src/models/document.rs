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

/// Who may see a document
///
/// Tiers are ordered: board members see everything, members see member
/// and public documents, everyone sees public ones.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Members,
    Board,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Members => "members",
            Visibility::Board => "board",
        }
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromSql<Text, Sqlite> for Visibility {
    fn from_sql(value: SqliteValue<'_, '_, '_>) -> diesel::deserialize::Result<Self> {
        let text = <String as FromSql<Text, Sqlite>>::from_sql(value)?;
        match text.as_str() {
            "public" => Ok(Visibility::Public),
            "members" => Ok(Visibility::Members),
            "board" => Ok(Visibility::Board),
            other => Err(format!("Unknown visibility: {}", other).into()),
        }
    }
}

impl ToSql<Text, Sqlite> for Visibility {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(self.as_str());
        Ok(IsNull::No)
    }
}

/// Represents a document in the club library
///
/// The file bytes live in object storage under `file_key`; the server only
/// issues signed upload and download URLs.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::documents)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Document {
    /// Unique identifier for the document (UUID v4 as string)
    id: String,

    /// Title shown in the library listing
    title: String,

    /// Object-storage key of the file
    file_key: String,

    /// MIME type of the file
    content_type: String,

    /// File size in bytes, as declared on upload
    size_bytes: i64,

    /// Who may see the document
    visibility: Visibility,

    /// The user who uploaded it
    uploaded_by: String,

    /// When the record was created
    created_at: NaiveDateTime,
}

impl Document {
    pub fn new(
        title: String,
        file_key: String,
        content_type: String,
        size_bytes: i64,
        visibility: Visibility,
        uploaded_by: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            file_key,
            content_type,
            size_bytes,
            visibility,
            uploaded_by,
            created_at: Utc::now().naive_utc(),
        }
    }

    /// Gets the document's ID
    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    /// Gets the document's title
    pub fn get_title(&self) -> String {
        self.title.clone()
    }

    /// Gets the object-storage key
    pub fn get_file_key(&self) -> String {
        self.file_key.clone()
    }

    /// Gets the MIME type
    pub fn get_content_type(&self) -> String {
        self.content_type.clone()
    }

    /// Gets the file size in bytes
    pub fn get_size_bytes(&self) -> i64 {
        self.size_bytes
    }

    /// Gets who may see the document
    pub fn get_visibility(&self) -> Visibility {
        self.visibility
    }

    /// Gets the uploader's user ID
    pub fn get_uploaded_by(&self) -> String {
        self.uploaded_by.clone()
    }

    /// Gets when the record was created
    pub fn get_created_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.created_at, Utc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_tiers_are_ordered() {
        assert!(Visibility::Public < Visibility::Members);
        assert!(Visibility::Members < Visibility::Board);
    }

    #[test]
    fn test_visibility_serde_uses_snake_case() {
        let json = serde_json::to_string(&Visibility::Members).unwrap();
        assert_eq!(json, "\"members\"");
    }
}
