use crate::config::PricingConfig;
use crate::pricing::QuoteInput;
use chrono::{DateTime, Utc};
use proptest::prelude::*;

/// Generates an arbitrary DateTime<Utc> within 2020-01-01 to 2030-01-01
pub fn arb_datetime_utc() -> impl Strategy<Value = DateTime<Utc>> {
    (1_577_836_800i64..1_893_456_000i64)
        .prop_map(|ts| DateTime::from_timestamp(ts, 0).unwrap())
}

/// Generates an optional arbitrary DateTime<Utc>
pub fn arb_optional_datetime_utc() -> impl Strategy<Value = Option<DateTime<Utc>>> {
    prop_oneof![
        Just(None),
        arb_datetime_utc().prop_map(Some),
    ]
}

/// Generates an arbitrary positive amount in cents, up to $10,000
pub fn arb_cents() -> impl Strategy<Value = i64> {
    1i64..1_000_000i64
}

/// Generates an arbitrary price table with every price in [0, $200)
pub fn arb_pricing_config() -> impl Strategy<Value = PricingConfig> {
    (
        0i64..20_000,
        0i64..20_000,
        0i64..20_000,
        0i64..20_000,
        0i64..20_000,
        0i64..20_000,
        0i64..20_000,
    )
        .prop_map(
            |(base, extra_adult, child, nightly, meal, surcharge, early_bird)| PricingConfig {
                base_fee_cents: base,
                extra_adult_cents: extra_adult,
                child_cents: child,
                nightly_camping_cents: nightly,
                meal_plan_cents: meal,
                non_member_surcharge_cents: surcharge,
                early_bird_discount_cents: early_bird,
            },
        )
}

/// Generates an arbitrary registration shape: 1-8 adults, 0-6 children,
/// up to 10 nights, with every membership/early-bird combination
pub fn arb_quote_input() -> impl Strategy<Value = QuoteInput> {
    (
        1i32..=8,
        0i32..=6,
        0i32..=10,
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(
            |(adults, children, nights, meal_plan, member, early_bird)| QuoteInput {
                adults,
                children,
                nights,
                meal_plan,
                member_in_good_standing: member,
                early_bird,
            },
        )
}

/// One step a buyer or seller might take in a listing negotiation
///
/// `buyer` and `pick` are indices resolved modulo the available buyers and
/// offers when the action is applied, so every generated action is
/// applicable to some target (or skipped when nothing exists yet).
#[derive(Debug, Clone)]
pub enum OfferAction {
    Make { buyer: usize, amount_cents: i64 },
    Accept { pick: usize },
    Reject { pick: usize },
    Counter { pick: usize, amount_cents: i64 },
    Withdraw { pick: usize },
}

fn arb_offer_action() -> impl Strategy<Value = OfferAction> {
    prop_oneof![
        (0usize..8, 1_000i64..100_000).prop_map(|(buyer, amount_cents)| OfferAction::Make {
            buyer,
            amount_cents,
        }),
        (0usize..8).prop_map(|pick| OfferAction::Accept { pick }),
        (0usize..8).prop_map(|pick| OfferAction::Reject { pick }),
        (0usize..8, 1_000i64..100_000).prop_map(|(pick, amount_cents)| OfferAction::Counter {
            pick,
            amount_cents,
        }),
        (0usize..8).prop_map(|pick| OfferAction::Withdraw { pick }),
    ]
}

/// Generates a short random negotiation: a sequence of offer actions,
/// valid or not, thrown at one listing
pub fn arb_offer_actions() -> impl Strategy<Value = Vec<OfferAction>> {
    proptest::collection::vec(arb_offer_action(), 1..12)
}
