//! Monetary tolerance and rounding.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Every monetary equality check in the system goes through
//! [`within_tolerance`] so the same 0.01 rule applies everywhere.

use rust_decimal::{Decimal, RoundingStrategy};

/// Largest absolute difference treated as equal for monetary amounts.
pub const BALANCE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Decimal places money is stored with.
pub const MONEY_SCALE: u32 = 2;

/// Returns true if `a` and `b` differ by no more than [`BALANCE_TOLERANCE`].
#[must_use]
pub fn within_tolerance(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() <= BALANCE_TOLERANCE
}

/// Returns true if `amount` exceeds `limit` by more than [`BALANCE_TOLERANCE`].
#[must_use]
pub fn exceeds(amount: Decimal, limit: Decimal) -> bool {
    amount - limit > BALANCE_TOLERANCE
}

/// Rounds to two decimal places using banker's rounding.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointNearestEven)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[test]
    fn test_tolerance_constant() {
        assert_eq!(BALANCE_TOLERANCE, dec!(0.01));
    }

    #[rstest]
    #[case(dec!(100.00), dec!(100.00), true)]
    #[case(dec!(100.00), dec!(100.01), true)]
    #[case(dec!(100.01), dec!(100.00), true)]
    #[case(dec!(100.00), dec!(100.02), false)]
    #[case(dec!(0), dec!(-0.011), false)]
    fn test_within_tolerance(#[case] a: Decimal, #[case] b: Decimal, #[case] expected: bool) {
        assert_eq!(within_tolerance(a, b), expected);
    }

    #[rstest]
    #[case(dec!(100.01), dec!(100), false)]
    #[case(dec!(100.02), dec!(100), true)]
    #[case(dec!(50), dec!(100), false)]
    fn test_exceeds(#[case] amount: Decimal, #[case] limit: Decimal, #[case] expected: bool) {
        assert_eq!(exceeds(amount, limit), expected);
    }

    #[test]
    fn test_round_money_bankers() {
        assert_eq!(round_money(dec!(1.005)), dec!(1.00));
        assert_eq!(round_money(dec!(1.015)), dec!(1.02));
        assert_eq!(round_money(dec!(2.3449)), dec!(2.34));
    }
}
