use super::*;
use crate::test_utils::{arb_pricing_config, arb_quote_input};
use proptest::prelude::*;

/// Pure oracle replicating the calculator's arithmetic from first
/// principles, without going through LineItem construction.
fn oracle_subtotal(prices: &PricingConfig, input: &QuoteInput) -> i64 {
    let mut subtotal = prices.base_fee_cents;
    subtotal += (input.adults as i64 - 1).max(0) * prices.extra_adult_cents;
    subtotal += input.children as i64 * prices.child_cents;
    subtotal += input.nights as i64 * input.adults as i64 * prices.nightly_camping_cents;
    if input.meal_plan {
        subtotal += (input.adults + input.children) as i64 * prices.meal_plan_cents;
    }
    if !input.member_in_good_standing {
        subtotal += prices.non_member_surcharge_cents;
    }
    if input.early_bird {
        subtotal -= prices.early_bird_discount_cents;
    }
    subtotal
}

proptest! {
    /// The itemised breakdown always sums to the oracle's subtotal
    #[test]
    fn prop_breakdown_matches_oracle(
        prices in arb_pricing_config(),
        input in arb_quote_input(),
    ) {
        let result = quote(&prices, &input);
        prop_assert_eq!(
            result.line_items.subtotal_cents(),
            oracle_subtotal(&prices, &input)
        );
    }

    /// The total is the subtotal clamped to zero from below
    #[test]
    fn prop_total_is_clamped_subtotal(
        prices in arb_pricing_config(),
        input in arb_quote_input(),
    ) {
        let result = quote(&prices, &input);
        prop_assert!(result.total_cents >= 0);
        prop_assert_eq!(
            result.total_cents,
            result.line_items.subtotal_cents().max(0)
        );
    }

    /// Every line item's amount is its quantity times its unit price
    #[test]
    fn prop_line_amounts_extend_correctly(
        prices in arb_pricing_config(),
        input in arb_quote_input(),
    ) {
        let result = quote(&prices, &input);
        for item in &result.line_items.0 {
            prop_assert_eq!(item.amount_cents, item.quantity as i64 * item.unit_cents);
            prop_assert!(item.quantity > 0, "zero-quantity item {} present", item.label);
        }
    }

    /// Members never pay more than non-members for the same registration
    #[test]
    fn prop_membership_never_costs_extra(
        prices in arb_pricing_config(),
        input in arb_quote_input(),
    ) {
        let as_member = QuoteInput { member_in_good_standing: true, ..input.clone() };
        let as_lapsed = QuoteInput { member_in_good_standing: false, ..input };

        prop_assert!(
            quote(&prices, &as_member).total_cents <= quote(&prices, &as_lapsed).total_cents
        );
    }

    /// Registering early never costs more than registering late
    #[test]
    fn prop_early_bird_never_costs_extra(
        prices in arb_pricing_config(),
        input in arb_quote_input(),
    ) {
        let early = QuoteInput { early_bird: true, ..input.clone() };
        let late = QuoteInput { early_bird: false, ..input };

        prop_assert!(quote(&prices, &early).total_cents <= quote(&prices, &late).total_cents);
    }

    /// Adding a night of camping never reduces the total
    #[test]
    fn prop_total_monotonic_in_nights(
        prices in arb_pricing_config(),
        input in arb_quote_input(),
    ) {
        let longer = QuoteInput { nights: input.nights + 1, ..input.clone() };

        prop_assert!(quote(&prices, &input).total_cents <= quote(&prices, &longer).total_cents);
    }

    /// The first line is always the base registration fee
    #[test]
    fn prop_base_fee_always_first(
        prices in arb_pricing_config(),
        input in arb_quote_input(),
    ) {
        let result = quote(&prices, &input);
        prop_assert_eq!(result.line_items.0[0].label.as_str(), "Registration fee");
        prop_assert_eq!(result.line_items.0[0].amount_cents, prices.base_fee_cents);
    }
}
