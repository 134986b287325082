//! Property-based tests for LedgerService.
//!
//! - Every accepted posting balances within the tolerance
//! - Reversing lines cancel the original posting exactly

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::error::LedgerError;
use super::service::LedgerService;
use super::types::{GlLineInput, PostingTotals};

/// Strategy to generate positive decimal amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Splits each amount into a debit line and a matching credit line.
fn balanced_lines(amounts: &[Decimal]) -> Vec<GlLineInput> {
    amounts
        .iter()
        .enumerate()
        .flat_map(|(i, amount)| {
            [
                GlLineInput::debit(format!("1{i:03}"), *amount),
                GlLineInput::credit(format!("4{i:03}"), *amount),
            ]
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_balanced_lines_accepted(amounts in prop::collection::vec(positive_amount(), 1..10)) {
        let lines = balanced_lines(&amounts);
        let totals = LedgerService::validate_lines(&lines).unwrap();
        let expected: Decimal = amounts.iter().copied().sum();
        prop_assert_eq!(totals.debit, expected);
        prop_assert_eq!(totals.credit, expected);
    }

    #[test]
    fn prop_accepted_postings_balance(
        amounts in prop::collection::vec(positive_amount(), 1..10),
        skew in 0i64..500i64,
    ) {
        let mut lines = balanced_lines(&amounts);
        if let Some(last) = lines.last_mut() {
            last.credit += Decimal::new(skew, 2);
        }
        match LedgerService::validate_lines(&lines) {
            Ok(totals) => prop_assert!((totals.debit - totals.credit).abs() <= Decimal::new(1, 2)),
            Err(LedgerError::UnbalancedEntry { debit, credit }) => {
                prop_assert!((debit - credit).abs() > Decimal::new(1, 2));
            }
            Err(other) => prop_assert!(false, "unexpected error: {other}"),
        }
    }

    #[test]
    fn prop_reversal_cancels_original(amounts in prop::collection::vec(positive_amount(), 1..10)) {
        let lines = balanced_lines(&amounts);
        let reversed = LedgerService::reversing_lines(&lines);

        let combined = PostingTotals::from_pairs(
            lines
                .iter()
                .chain(reversed.iter())
                .map(|l| (l.debit, l.credit)),
        );
        prop_assert_eq!(combined.debit, combined.credit);

        for (orig, rev) in lines.iter().zip(reversed.iter()) {
            prop_assert_eq!(orig.debit - orig.credit, rev.credit - rev.debit);
        }
    }
}
