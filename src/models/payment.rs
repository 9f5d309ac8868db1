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

/// What a payment was for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    Registration,
    Donation,
    Dues,
}

impl PaymentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentKind::Registration => "registration",
            PaymentKind::Donation => "donation",
            PaymentKind::Dues => "dues",
        }
    }
}

impl std::fmt::Display for PaymentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromSql<Text, Sqlite> for PaymentKind {
    fn from_sql(value: SqliteValue<'_, '_, '_>) -> diesel::deserialize::Result<Self> {
        let text = <String as FromSql<Text, Sqlite>>::from_sql(value)?;
        match text.as_str() {
            "registration" => Ok(PaymentKind::Registration),
            "donation" => Ok(PaymentKind::Donation),
            "dues" => Ok(PaymentKind::Dues),
            other => Err(format!("Unknown payment kind: {}", other).into()),
        }
    }
}

impl ToSql<Text, Sqlite> for PaymentKind {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(self.as_str());
        Ok(IsNull::No)
    }
}

/// Settlement state of a payment
///
/// `Pending` payments are waiting on the processor's webhook. Only
/// `Completed` payments can be refunded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Refunded,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromSql<Text, Sqlite> for PaymentStatus {
    fn from_sql(value: SqliteValue<'_, '_, '_>) -> diesel::deserialize::Result<Self> {
        let text = <String as FromSql<Text, Sqlite>>::from_sql(value)?;
        match text.as_str() {
            "pending" => Ok(PaymentStatus::Pending),
            "completed" => Ok(PaymentStatus::Completed),
            "refunded" => Ok(PaymentStatus::Refunded),
            "failed" => Ok(PaymentStatus::Failed),
            other => Err(format!("Unknown payment status: {}", other).into()),
        }
    }
}

impl ToSql<Text, Sqlite> for PaymentStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(self.as_str());
        Ok(IsNull::No)
    }
}

/// Represents a payment ledger entry
///
/// The processor holds the money; this row tracks our view of it. The
/// `provider_ref` is the processor's checkout/charge identifier and is the
/// key webhooks use to find the row.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::payments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Payment {
    /// Unique identifier for the payment (UUID v4 as string)
    id: String,

    /// The paying user
    user_id: String,

    /// What the payment was for
    kind: PaymentKind,

    /// Amount in integer cents
    amount_cents: i64,

    /// Settlement state
    status: PaymentStatus,

    /// The processor's reference for this payment
    provider_ref: Option<String>,

    /// Donation fund designation ("scholarship", "observatory", ...)
    designation: Option<String>,

    /// Free-form note from the donor
    note: Option<String>,

    /// The registration this payment covers, for registration payments
    registration_id: Option<String>,

    /// When the payment was refunded
    refunded_at: Option<NaiveDateTime>,

    /// Why the payment was refunded
    refund_reason: Option<String>,

    /// When the payment was created
    created_at: NaiveDateTime,

    /// When the payment last changed state
    updated_at: NaiveDateTime,
}

impl Payment {
    /// Creates a new pending payment
    pub fn new(user_id: String, kind: PaymentKind, amount_cents: i64) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            kind,
            amount_cents,
            status: PaymentStatus::Pending,
            provider_ref: None,
            designation: None,
            note: None,
            registration_id: None,
            refunded_at: None,
            refund_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Gets the payment's ID
    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    /// Gets the paying user's ID
    pub fn get_user_id(&self) -> String {
        self.user_id.clone()
    }

    /// Gets what the payment was for
    pub fn get_kind(&self) -> PaymentKind {
        self.kind
    }

    /// Gets the amount in cents
    pub fn get_amount_cents(&self) -> i64 {
        self.amount_cents
    }

    /// Gets the settlement state
    pub fn get_status(&self) -> PaymentStatus {
        self.status
    }

    /// Gets the processor's reference
    pub fn get_provider_ref(&self) -> Option<String> {
        self.provider_ref.clone()
    }

    /// Sets the processor's reference
    pub fn set_provider_ref(&mut self, provider_ref: Option<String>) {
        self.provider_ref = provider_ref;
    }

    /// Gets the donation fund designation
    pub fn get_designation(&self) -> Option<String> {
        self.designation.clone()
    }

    /// Sets the donation fund designation
    pub fn set_designation(&mut self, designation: Option<String>) {
        self.designation = designation;
    }

    /// Gets the donor's note
    pub fn get_note(&self) -> Option<String> {
        self.note.clone()
    }

    /// Sets the donor's note
    pub fn set_note(&mut self, note: Option<String>) {
        self.note = note;
    }

    /// Gets the linked registration ID
    pub fn get_registration_id(&self) -> Option<String> {
        self.registration_id.clone()
    }

    /// Sets the linked registration ID
    pub fn set_registration_id(&mut self, registration_id: Option<String>) {
        self.registration_id = registration_id;
    }

    /// Gets when the payment was refunded as a DateTime<Utc>
    pub fn get_refunded_at(&self) -> Option<DateTime<Utc>> {
        self.refunded_at
            .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc))
    }

    /// Gets the refund reason, if refunded
    pub fn get_refund_reason(&self) -> Option<String> {
        self.refund_reason.clone()
    }

    /// Gets when the payment was created
    pub fn get_created_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.created_at, Utc)
    }

    /// Whether the payment can be refunded
    pub fn is_refundable(&self) -> bool {
        self.status == PaymentStatus::Completed
    }
}
