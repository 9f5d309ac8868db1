use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a photo in the member gallery
///
/// Photos start unpublished; an admin flips `published` to put them on the
/// public gallery page. Bytes live in object storage under `file_key`.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::photos)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Photo {
    /// Unique identifier for the photo (UUID v4 as string)
    id: String,

    /// The user who uploaded the photo
    owner_id: String,

    /// Title shown under the photo
    title: String,

    /// Longer caption, if provided
    caption: Option<String>,

    /// Photographer credit line, if different from the owner
    credit: Option<String>,

    /// Object-storage key of the image
    file_key: String,

    /// Whether the photo appears in the public gallery
    published: bool,

    /// When the photo was taken, if known
    captured_at: Option<NaiveDateTime>,

    /// When the record was created
    created_at: NaiveDateTime,
}

impl Photo {
    pub fn new(owner_id: String, title: String, file_key: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id,
            title,
            caption: None,
            credit: None,
            file_key,
            published: false,
            captured_at: None,
            created_at: Utc::now().naive_utc(),
        }
    }

    /// Gets the photo's ID
    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    /// Gets the owner's user ID
    pub fn get_owner_id(&self) -> String {
        self.owner_id.clone()
    }

    /// Gets the photo's title
    pub fn get_title(&self) -> String {
        self.title.clone()
    }

    /// Gets the caption, if any
    pub fn get_caption(&self) -> Option<String> {
        self.caption.clone()
    }

    /// Sets the caption
    pub fn set_caption(&mut self, caption: Option<String>) {
        self.caption = caption;
    }

    /// Gets the photographer credit, if any
    pub fn get_credit(&self) -> Option<String> {
        self.credit.clone()
    }

    /// Sets the photographer credit
    pub fn set_credit(&mut self, credit: Option<String>) {
        self.credit = credit;
    }

    /// Gets the object-storage key
    pub fn get_file_key(&self) -> String {
        self.file_key.clone()
    }

    /// Whether the photo appears in the public gallery
    pub fn is_published(&self) -> bool {
        self.published
    }

    /// Sets whether the photo appears in the public gallery
    pub fn set_published(&mut self, published: bool) {
        self.published = published;
    }

    /// Gets when the photo was taken as a DateTime<Utc>
    pub fn get_captured_at(&self) -> Option<DateTime<Utc>> {
        self.captured_at
            .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc))
    }

    /// Sets when the photo was taken
    pub fn set_captured_at(&mut self, captured_at: Option<DateTime<Utc>>) {
        self.captured_at = captured_at.map(|dt| dt.naive_utc());
    }

    /// Gets when the record was created
    pub fn get_created_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.created_at, Utc)
    }
}
