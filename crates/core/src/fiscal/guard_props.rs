//! Property-based tests for FiscalPeriodGuard.

use backoffice_shared::types::{BusinessId, FiscalPeriodId};
use chrono::{Days, NaiveDate};
use proptest::prelude::*;

use super::guard::FiscalPeriodGuard;
use super::period::{FiscalPeriod, FiscalPeriodStatus};

fn base() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

/// Strategy for a (start offset, length) pair in days.
fn range() -> impl Strategy<Value = (u64, u64)> {
    (0u64..365, 0u64..60)
}

fn period_at(offset: u64, len: u64) -> FiscalPeriod {
    let start = base() + Days::new(offset);
    FiscalPeriod {
        id: FiscalPeriodId::new(),
        business_id: BusinessId::new(),
        name: format!("P{offset}"),
        start_date: start,
        end_date: start + Days::new(len),
        status: FiscalPeriodStatus::Open,
        closed_by: None,
        closed_at: None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Accepted periods never share a day with an existing one.
    #[test]
    fn prop_accepted_periods_do_not_overlap((a_off, a_len) in range(), (b_off, b_len) in range()) {
        let existing = vec![period_at(a_off, a_len)];
        let candidate = period_at(b_off, b_len);

        let result = FiscalPeriodGuard::validate_new_period(
            &candidate.name,
            candidate.start_date,
            candidate.end_date,
            &existing,
        );

        let shares_day = (b_off..=b_off + b_len).any(|d| (a_off..=a_off + a_len).contains(&d));
        prop_assert_eq!(result.is_err(), shares_day);
    }

    /// A date inside an open period may post; inside a closed one it may not.
    #[test]
    fn prop_posting_follows_status((off, len) in range(), inside in 0u64..60, closed in any::<bool>()) {
        let mut p = period_at(off, len);
        if closed {
            p.status = FiscalPeriodStatus::Closed;
        }
        let day = p.start_date + Days::new(inside.min(len));
        prop_assert!(p.contains_date(day));
        prop_assert_eq!(FiscalPeriodGuard::check_posting(Some(&p), day).is_ok(), !closed);
    }
}
