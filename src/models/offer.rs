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

/// State of an offer in the negotiation machine
///
/// Only `Pending` offers can transition. Accept, reject and counter are
/// taken by the party the offer was made to; withdraw is taken by the
/// party who proposed it. A countered offer is retired and replaced by a
/// fresh pending offer linked through `parent_offer_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Rejected,
    Countered,
    Withdrawn,
}

impl OfferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferStatus::Pending => "pending",
            OfferStatus::Accepted => "accepted",
            OfferStatus::Rejected => "rejected",
            OfferStatus::Countered => "countered",
            OfferStatus::Withdrawn => "withdrawn",
        }
    }
}

impl std::fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromSql<Text, Sqlite> for OfferStatus {
    fn from_sql(value: SqliteValue<'_, '_, '_>) -> diesel::deserialize::Result<Self> {
        let text = <String as FromSql<Text, Sqlite>>::from_sql(value)?;
        match text.as_str() {
            "pending" => Ok(OfferStatus::Pending),
            "accepted" => Ok(OfferStatus::Accepted),
            "rejected" => Ok(OfferStatus::Rejected),
            "countered" => Ok(OfferStatus::Countered),
            "withdrawn" => Ok(OfferStatus::Withdrawn),
            other => Err(format!("Unknown offer status: {}", other).into()),
        }
    }
}

impl ToSql<Text, Sqlite> for OfferStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(self.as_str());
        Ok(IsNull::No)
    }
}

/// Which side of the negotiation proposed an offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
pub enum OfferParty {
    Buyer,
    Seller,
}

impl OfferParty {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferParty::Buyer => "buyer",
            OfferParty::Seller => "seller",
        }
    }

    /// The party an offer proposed by this one is waiting on
    pub fn other(&self) -> OfferParty {
        match self {
            OfferParty::Buyer => OfferParty::Seller,
            OfferParty::Seller => OfferParty::Buyer,
        }
    }
}

impl std::fmt::Display for OfferParty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromSql<Text, Sqlite> for OfferParty {
    fn from_sql(value: SqliteValue<'_, '_, '_>) -> diesel::deserialize::Result<Self> {
        let text = <String as FromSql<Text, Sqlite>>::from_sql(value)?;
        match text.as_str() {
            "buyer" => Ok(OfferParty::Buyer),
            "seller" => Ok(OfferParty::Seller),
            other => Err(format!("Unknown offer party: {}", other).into()),
        }
    }
}

impl ToSql<Text, Sqlite> for OfferParty {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(self.as_str());
        Ok(IsNull::No)
    }
}

/// Represents one offer in a listing negotiation
///
/// Counter-offers form a chain: each counter creates a new row whose
/// `parent_offer_id` points at the offer it replaced, alternating
/// `proposed_by` between buyer and seller.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::offers)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Offer {
    /// Unique identifier for the offer (UUID v4 as string)
    id: String,

    /// The listing being negotiated
    listing_id: String,

    /// The buying user, regardless of which party proposed this offer
    buyer_id: String,

    /// Offered amount in integer cents
    amount_cents: i64,

    /// Optional note to the counterparty
    message: Option<String>,

    /// Which side proposed this offer
    proposed_by: OfferParty,

    /// The offer this one countered, if any
    parent_offer_id: Option<String>,

    /// Negotiation state of this offer
    status: OfferStatus,

    /// When the offer was created
    created_at: NaiveDateTime,

    /// When the offer last changed state
    updated_at: NaiveDateTime,
}

impl Offer {
    /// Creates a new pending offer from the buyer
    pub fn new(
        listing_id: String,
        buyer_id: String,
        amount_cents: i64,
        message: Option<String>,
    ) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4().to_string(),
            listing_id,
            buyer_id,
            amount_cents,
            message,
            proposed_by: OfferParty::Buyer,
            parent_offer_id: None,
            status: OfferStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates the pending counter to an existing offer
    ///
    /// The counter keeps the original buyer but flips `proposed_by`, so a
    /// buyer's offer countered by the seller is waiting on the buyer and
    /// vice versa.
    pub fn counter_to(original: &Offer, amount_cents: i64, message: Option<String>) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4().to_string(),
            listing_id: original.listing_id.clone(),
            buyer_id: original.buyer_id.clone(),
            amount_cents,
            message,
            proposed_by: original.proposed_by.other(),
            parent_offer_id: Some(original.id.clone()),
            status: OfferStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Gets the offer's ID
    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    /// Gets the ID of the listing being negotiated
    pub fn get_listing_id(&self) -> String {
        self.listing_id.clone()
    }

    /// Gets the ID of the buying user
    pub fn get_buyer_id(&self) -> String {
        self.buyer_id.clone()
    }

    /// Gets the offered amount in cents
    pub fn get_amount_cents(&self) -> i64 {
        self.amount_cents
    }

    /// Gets the note to the counterparty, if any
    pub fn get_message(&self) -> Option<String> {
        self.message.clone()
    }

    /// Gets which side proposed this offer
    pub fn get_proposed_by(&self) -> OfferParty {
        self.proposed_by
    }

    /// Gets the offer this one countered, if any
    pub fn get_parent_offer_id(&self) -> Option<String> {
        self.parent_offer_id.clone()
    }

    /// Gets the offer's negotiation state
    pub fn get_status(&self) -> OfferStatus {
        self.status
    }

    /// Gets when the offer was created
    pub fn get_created_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.created_at, Utc)
    }

    /// Whether the offer can still transition
    pub fn is_pending(&self) -> bool {
        self.status == OfferStatus::Pending
    }

    /// Whether the given user may respond (accept, reject, counter)
    ///
    /// The responder is the counterparty of whoever proposed the offer:
    /// the seller for buyer offers, the buyer for seller counters.
    pub fn responder_is(&self, user_id: &str, seller_id: &str) -> bool {
        match self.proposed_by.other() {
            OfferParty::Buyer => self.buyer_id == user_id,
            OfferParty::Seller => seller_id == user_id,
        }
    }

    /// Whether the given user proposed the offer (and so may withdraw it)
    pub fn proposer_is(&self, user_id: &str, seller_id: &str) -> bool {
        match self.proposed_by {
            OfferParty::Buyer => self.buyer_id == user_id,
            OfferParty::Seller => seller_id == user_id,
        }
    }
}
