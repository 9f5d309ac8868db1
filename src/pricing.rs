//! Price calculator for star-party registrations
//!
//! Registration prices are assembled from the configured price table as a
//! list of labelled line items, so members can see exactly what they are
//! being charged for. The calculator is pure: the handler gathers the
//! context (party size, membership standing, early-bird window) and the
//! same function prices both quotes and real registrations.

use crate::config::PricingConfig;
use crate::models::{LineItem, LineItems};

/// Everything the calculator needs to price one registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteInput {
    /// Number of adults attending, including the registrant
    pub adults: i32,

    /// Number of children attending
    pub children: i32,

    /// Number of nights camping, 0 for day visits
    pub nights: i32,

    /// Whether the meal plan is included
    pub meal_plan: bool,

    /// Whether the registrant's membership is paid up
    pub member_in_good_standing: bool,

    /// Whether the registration falls inside the early-bird window
    pub early_bird: bool,
}

/// A priced registration: the itemised charges and their clamped sum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    /// The individual charges and discounts, in presentation order
    pub line_items: LineItems,

    /// The sum of all line items, clamped to zero from below
    pub total_cents: i64,
}

/// Prices a registration against the configured price table.
///
/// Line items with a zero quantity are omitted entirely rather than
/// listed at zero, so the breakdown only shows charges that apply.
/// Discounts carry negative unit prices; the final total is clamped so a
/// discount can never produce a negative balance.
pub fn quote(prices: &PricingConfig, input: &QuoteInput) -> Quote {
    let mut items = Vec::new();

    items.push(LineItem::new("Registration fee", 1, prices.base_fee_cents));

    let extra_adults = (input.adults - 1).max(0);
    if extra_adults > 0 {
        items.push(LineItem::new(
            "Additional adults",
            extra_adults,
            prices.extra_adult_cents,
        ));
    }

    if input.children > 0 {
        items.push(LineItem::new("Children", input.children, prices.child_cents));
    }

    // Camping is charged per adult per night
    let camping_nights = input.nights * input.adults;
    if camping_nights > 0 {
        items.push(LineItem::new(
            "Camping",
            camping_nights,
            prices.nightly_camping_cents,
        ));
    }

    if input.meal_plan {
        let diners = input.adults + input.children;
        items.push(LineItem::new("Meal plan", diners, prices.meal_plan_cents));
    }

    if !input.member_in_good_standing {
        items.push(LineItem::new(
            "Non-member surcharge",
            1,
            prices.non_member_surcharge_cents,
        ));
    }

    if input.early_bird {
        items.push(LineItem::new(
            "Early-bird discount",
            1,
            -prices.early_bird_discount_cents,
        ));
    }

    let line_items = LineItems(items);
    let total_cents = line_items.subtotal_cents().max(0);

    Quote {
        line_items,
        total_cents,
    }
}

#[cfg(test)]
mod tests;

#[cfg(test)]
mod prop_tests;
