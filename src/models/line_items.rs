use diesel::deserialize::{FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::serialize;
use diesel::serialize::{IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel::sqlite::{Sqlite, SqliteValue};
use serde::{Deserialize, Serialize};

/// One priced component of a registration quote
///
/// `amount_cents` is always `quantity * unit_cents`; discounts carry a
/// negative unit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Human-readable label ("Camping (2 adults, 3 nights)")
    pub label: String,

    /// How many units were charged
    pub quantity: i32,

    /// Price per unit in cents, negative for discounts
    pub unit_cents: i64,

    /// Extended amount in cents
    pub amount_cents: i64,
}

impl LineItem {
    pub fn new(label: impl Into<String>, quantity: i32, unit_cents: i64) -> Self {
        Self {
            label: label.into(),
            quantity,
            unit_cents,
            amount_cents: quantity as i64 * unit_cents,
        }
    }
}

/// The priced breakdown of a registration, stored as JSON TEXT
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
pub struct LineItems(pub Vec<LineItem>);

impl LineItems {
    /// Sum of all line amounts in cents
    pub fn subtotal_cents(&self) -> i64 {
        self.0.iter().map(|item| item.amount_cents).sum()
    }
}

impl FromSql<Text, Sqlite> for LineItems {
    fn from_sql(value: SqliteValue<'_, '_, '_>) -> diesel::deserialize::Result<Self> {
        let text = <String as FromSql<Text, Sqlite>>::from_sql(value)?;
        let items = serde_json::from_str(&text)?;
        Ok(LineItems(items))
    }
}

impl ToSql<Text, Sqlite> for LineItems {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(serde_json::to_string(&self.0)?);
        Ok(IsNull::No)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_item_extends_amount() {
        let item = LineItem::new("Child registration", 3, 1_000);
        assert_eq!(item.amount_cents, 3_000);
    }

    #[test]
    fn test_negative_unit_for_discounts() {
        let item = LineItem::new("Early-bird discount", 1, -1_000);
        assert_eq!(item.amount_cents, -1_000);
    }

    #[test]
    fn test_subtotal_sums_amounts() {
        let items = LineItems(vec![
            LineItem::new("Registration", 1, 5_000),
            LineItem::new("Early-bird discount", 1, -1_000),
        ]);
        assert_eq!(items.subtotal_cents(), 4_000);
    }
}
