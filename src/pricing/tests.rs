use super::*;

fn prices() -> PricingConfig {
    PricingConfig {
        base_fee_cents: 5_000,
        extra_adult_cents: 2_500,
        child_cents: 1_000,
        nightly_camping_cents: 1_500,
        meal_plan_cents: 4_500,
        non_member_surcharge_cents: 2_000,
        early_bird_discount_cents: 1_000,
    }
}

fn solo_member() -> QuoteInput {
    QuoteInput {
        adults: 1,
        children: 0,
        nights: 0,
        meal_plan: false,
        member_in_good_standing: true,
        early_bird: false,
    }
}

#[test]
fn test_solo_member_day_visit_pays_base_fee_only() {
    let result = quote(&prices(), &solo_member());

    assert_eq!(result.line_items.0.len(), 1);
    assert_eq!(result.line_items.0[0].label, "Registration fee");
    assert_eq!(result.total_cents, 5_000);
}

#[test]
fn test_family_weekend_itemisation() {
    // Two adults and two children, three nights camping with meals
    let input = QuoteInput {
        adults: 2,
        children: 2,
        nights: 3,
        meal_plan: true,
        member_in_good_standing: true,
        early_bird: false,
    };

    let result = quote(&prices(), &input);

    let labels: Vec<&str> = result
        .line_items
        .0
        .iter()
        .map(|item| item.label.as_str())
        .collect();
    assert_eq!(
        labels,
        vec![
            "Registration fee",
            "Additional adults",
            "Children",
            "Camping",
            "Meal plan",
        ]
    );

    // base 5000 + 1 extra adult 2500 + 2 children 2000
    // + camping 2 adults x 3 nights x 1500 = 9000
    // + meals 4 people x 4500 = 18000
    assert_eq!(result.total_cents, 5_000 + 2_500 + 2_000 + 9_000 + 18_000);
}

#[test]
fn test_camping_charged_per_adult_per_night() {
    let input = QuoteInput {
        adults: 3,
        nights: 2,
        ..solo_member()
    };

    let result = quote(&prices(), &input);

    let camping = result
        .line_items
        .0
        .iter()
        .find(|item| item.label == "Camping")
        .unwrap();
    assert_eq!(camping.quantity, 6);
    assert_eq!(camping.amount_cents, 9_000);
}

#[test]
fn test_zero_quantity_items_are_omitted() {
    let result = quote(&prices(), &solo_member());

    // No extra adults, no children, no camping, no meals
    assert!(result.line_items.0.iter().all(|item| item.quantity != 0));
    assert!(
        !result
            .line_items
            .0
            .iter()
            .any(|item| item.label == "Additional adults")
    );
}

#[test]
fn test_non_member_surcharge_applies() {
    let input = QuoteInput {
        member_in_good_standing: false,
        ..solo_member()
    };

    let result = quote(&prices(), &input);

    let surcharge = result
        .line_items
        .0
        .iter()
        .find(|item| item.label == "Non-member surcharge")
        .unwrap();
    assert_eq!(surcharge.amount_cents, 2_000);
    assert_eq!(result.total_cents, 7_000);
}

#[test]
fn test_early_bird_discount_is_negative_line() {
    let input = QuoteInput {
        early_bird: true,
        ..solo_member()
    };

    let result = quote(&prices(), &input);

    let discount = result
        .line_items
        .0
        .iter()
        .find(|item| item.label == "Early-bird discount")
        .unwrap();
    assert_eq!(discount.unit_cents, -1_000);
    assert_eq!(discount.amount_cents, -1_000);
    assert_eq!(result.total_cents, 4_000);
}

#[test]
fn test_total_clamps_at_zero() {
    // A discount larger than every other charge combined
    let prices = PricingConfig {
        base_fee_cents: 500,
        early_bird_discount_cents: 10_000,
        ..prices()
    };
    let input = QuoteInput {
        early_bird: true,
        ..solo_member()
    };

    let result = quote(&prices, &input);

    // The breakdown still shows the full discount, only the total clamps
    assert_eq!(result.line_items.subtotal_cents(), 500 - 10_000);
    assert_eq!(result.total_cents, 0);
}

#[test]
fn test_free_event_prices_to_zero() {
    let prices = PricingConfig {
        base_fee_cents: 0,
        extra_adult_cents: 0,
        child_cents: 0,
        nightly_camping_cents: 0,
        meal_plan_cents: 0,
        non_member_surcharge_cents: 0,
        early_bird_discount_cents: 0,
    };
    let input = QuoteInput {
        adults: 4,
        children: 3,
        nights: 2,
        meal_plan: true,
        member_in_good_standing: false,
        early_bird: true,
    };

    let result = quote(&prices, &input);
    assert_eq!(result.total_cents, 0);
}
