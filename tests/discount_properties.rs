/// Property-based tests for discount computation and code generation.
///
/// These verify the pure pieces of the engine across a wide range of
/// randomly generated inputs.
use gift_card_ledger::ledger::{CODE_LENGTH, CodeGenerator};
use gift_card_ledger::redemption::RedemptionEngine;
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashSet;

// Strategy for a non-negative money amount with two decimal places
fn money_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

proptest! {
    #[test]
    fn discount_is_never_negative(
        requested in money_strategy(),
        eligible in money_strategy(),
        subtotal in money_strategy(),
    ) {
        let discount = RedemptionEngine::compute_discount(requested, eligible, subtotal);
        prop_assert!(discount >= Decimal::ZERO);
    }

    #[test]
    fn discount_equals_min_of_inputs(
        requested in money_strategy(),
        eligible in money_strategy(),
        subtotal in money_strategy(),
    ) {
        let discount = RedemptionEngine::compute_discount(requested, eligible, subtotal);
        let expected = requested.min(eligible).min(subtotal);
        prop_assert_eq!(discount, expected);
    }

    #[test]
    fn discount_never_exceeds_owned_balance_or_cart(
        requested in money_strategy(),
        eligible in money_strategy(),
        subtotal in money_strategy(),
    ) {
        let discount = RedemptionEngine::compute_discount(requested, eligible, subtotal);
        prop_assert!(discount <= eligible);
        prop_assert!(discount <= subtotal);
        prop_assert!(discount <= requested);
    }

    #[test]
    fn codes_stay_in_charset(_seed in 0u32..1000) {
        let code = CodeGenerator::random_code();
        prop_assert_eq!(code.len(), CODE_LENGTH);
        prop_assert!(code.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
    }
}

#[test]
fn code_space_is_large_enough_to_avoid_quick_collisions() {
    let mut seen = HashSet::new();
    for _ in 0..10_000 {
        seen.insert(CodeGenerator::random_code());
    }
    // 36^10 candidates; ten thousand draws colliding would point at a
    // broken generator rather than bad luck.
    assert_eq!(seen.len(), 10_000);
}
