//! Property-based tests for ReversalService.
//!
//! - Accepted reversals never push the cumulative total past the source
//! - Generated ledger lines always balance

use backoffice_shared::AccountCodeMap;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::service::ReversalService;
use super::types::{RefundMethod, ReversalAmounts};
use crate::ledger::LedgerService;

fn cents(max: i64) -> impl Strategy<Value = Decimal> {
    (0i64..max).prop_map(|c| Decimal::new(c, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_cumulative_reversals_capped(
        source_total in cents(1_000_000),
        requests in prop::collection::vec(cents(200_000), 1..12),
    ) {
        let mut reversed = Decimal::ZERO;
        for requested in requests {
            if ReversalService::check_cap(source_total, reversed, requested).is_ok() {
                reversed += requested;
            }
            prop_assert!(reversed <= source_total + Decimal::new(1, 2));
        }
    }

    #[test]
    fn prop_reversal_lines_balance(
        subtotal in cents(1_000_000),
        tax in cents(100_000),
        restock in cents(500_000),
        cash in any::<bool>(),
    ) {
        prop_assume!(subtotal + tax > Decimal::ZERO);
        let amounts = ReversalAmounts {
            subtotal,
            tax_amount: tax,
            total_amount: subtotal + tax,
            restock_cost: restock,
        };
        let codes = AccountCodeMap::default();

        let note = ReversalService::credit_note_lines(&codes, &amounts);
        prop_assert!(LedgerService::validate_lines(&note).is_ok());

        let method = if cash { RefundMethod::Cash } else { RefundMethod::Bank };
        let refund = ReversalService::refund_lines(&codes, method, &amounts);
        prop_assert!(LedgerService::validate_lines(&refund).is_ok());
    }
}
