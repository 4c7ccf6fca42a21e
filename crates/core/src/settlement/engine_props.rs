//! Property-based tests for the year-end rollover.

use proptest::prelude::*;
use rust_decimal::Decimal;

use leavedesk_shared::types::Days;

use crate::settlement::engine::SettlementEngine;
use crate::settlement::types::{ClosingBalances, RolloverPolicy};

/// Balances between -10 and 40 days in half-day steps.
fn arb_days() -> impl Strategy<Value = Days> {
    (-20i64..=80).prop_map(|halves| Days::new(Decimal::new(halves * 5, 1)))
}

fn arb_default() -> impl Strategy<Value = Days> {
    (0i64..=30).prop_map(Days::whole)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_rollover_resets_medical_and_comp_off(
        casual in arb_days(),
        medical in arb_days(),
        comp_off in arb_days(),
        default_casual in arb_default(),
        default_medical in arb_default(),
        carry_forward in any::<bool>(),
    ) {
        let closing = ClosingBalances { casual, medical, comp_off };
        let policy = RolloverPolicy { default_casual, default_medical, carry_forward };
        let outcome = SettlementEngine::roll_over(closing, policy);

        prop_assert_eq!(outcome.new_medical, default_medical);
        prop_assert_eq!(outcome.new_comp_off, Days::ZERO);
        prop_assert!(!outcome.carried_forward_casual.is_negative());
        prop_assert!(!outcome.forfeited_comp_off.is_negative());
        prop_assert!(outcome.new_casual >= default_casual);
        prop_assert_eq!(outcome.new_casual, default_casual + outcome.carried_forward_casual);
        if !carry_forward {
            prop_assert_eq!(outcome.new_casual, default_casual);
        }
    }
}
