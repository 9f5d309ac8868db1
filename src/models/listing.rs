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

/// Lifecycle state of a classified listing
///
/// Stored as lowercase text in the `listings.status` column. `Withdrawn`
/// is the soft delete: the row stays for history but the listing no longer
/// appears in default searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Active,
    Pending,
    Sold,
    Withdrawn,
    Expired,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Active => "active",
            ListingStatus::Pending => "pending",
            ListingStatus::Sold => "sold",
            ListingStatus::Withdrawn => "withdrawn",
            ListingStatus::Expired => "expired",
        }
    }
}

impl std::fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromSql<Text, Sqlite> for ListingStatus {
    fn from_sql(value: SqliteValue<'_, '_, '_>) -> diesel::deserialize::Result<Self> {
        let text = <String as FromSql<Text, Sqlite>>::from_sql(value)?;
        match text.as_str() {
            "active" => Ok(ListingStatus::Active),
            "pending" => Ok(ListingStatus::Pending),
            "sold" => Ok(ListingStatus::Sold),
            "withdrawn" => Ok(ListingStatus::Withdrawn),
            "expired" => Ok(ListingStatus::Expired),
            other => Err(format!("Unknown listing status: {}", other).into()),
        }
    }
}

impl ToSql<Text, Sqlite> for ListingStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(self.as_str());
        Ok(IsNull::No)
    }
}

/// Represents a classified listing in the member marketplace
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::listings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Listing {
    /// Unique identifier for the listing (UUID v4 as string)
    id: String,

    /// The ID of the selling user
    seller_id: String,

    /// Short title shown in search results
    title: String,

    /// Full description of the item
    description: String,

    /// Free-form category ("telescope", "eyepiece", ...)
    category: String,

    /// Asking price in integer cents
    price_cents: i64,

    /// Lifecycle state of the listing
    status: ListingStatus,

    /// Object-storage key of the listing photo, if one was uploaded
    photo_key: Option<String>,

    /// When the listing was marked sold
    sold_at: Option<NaiveDateTime>,

    /// When the listing was created
    created_at: NaiveDateTime,

    /// When the listing was last modified
    updated_at: NaiveDateTime,
}

impl Listing {
    /// Creates a new active listing
    ///
    /// ### Arguments
    ///
    /// * `seller_id` - The ID of the selling user
    /// * `title` - Short title shown in search results
    /// * `description` - Full description of the item
    /// * `category` - Free-form category label
    /// * `price_cents` - Asking price in integer cents
    pub fn new(
        seller_id: String,
        title: String,
        description: String,
        category: String,
        price_cents: i64,
    ) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4().to_string(),
            seller_id,
            title,
            description,
            category,
            price_cents,
            status: ListingStatus::Active,
            photo_key: None,
            sold_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Gets the listing's ID
    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    /// Gets the ID of the selling user
    pub fn get_seller_id(&self) -> String {
        self.seller_id.clone()
    }

    /// Gets the listing's title
    pub fn get_title(&self) -> String {
        self.title.clone()
    }

    /// Gets the listing's description
    pub fn get_description(&self) -> String {
        self.description.clone()
    }

    /// Gets the listing's category
    pub fn get_category(&self) -> String {
        self.category.clone()
    }

    /// Gets the asking price in cents
    pub fn get_price_cents(&self) -> i64 {
        self.price_cents
    }

    /// Gets the listing's lifecycle state
    pub fn get_status(&self) -> ListingStatus {
        self.status
    }

    /// Gets the object-storage key of the listing photo
    pub fn get_photo_key(&self) -> Option<String> {
        self.photo_key.clone()
    }

    /// Sets the object-storage key of the listing photo
    pub fn set_photo_key(&mut self, photo_key: Option<String>) {
        self.photo_key = photo_key;
    }

    /// Gets when the listing was sold as a DateTime<Utc>
    pub fn get_sold_at(&self) -> Option<DateTime<Utc>> {
        self.sold_at
            .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc))
    }

    /// Gets when the listing was created
    pub fn get_created_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.created_at, Utc)
    }

    /// Whether offers may currently be made on the listing
    pub fn is_open_for_offers(&self) -> bool {
        self.status == ListingStatus::Active
    }
}
