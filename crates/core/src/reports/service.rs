//! Trial balance computation.

use backoffice_shared::types::{BusinessId, within_tolerance};
use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::error::ReportError;
use super::types::{AccountActivity, TrialBalance, TrialBalanceRow, TrialBalanceTotals};

/// Aggregates per-account ledger activity into a trial balance.
pub struct TrialBalanceCalculator;

impl TrialBalanceCalculator {
    /// Builds a trial balance as of `as_of` from summed account activity.
    ///
    /// Accounts without activity are omitted; rows are ordered by code.
    #[must_use]
    pub fn compute(
        business_id: BusinessId,
        as_of: NaiveDate,
        activity: Vec<AccountActivity>,
    ) -> TrialBalance {
        Self::build(business_id, None, as_of, activity)
    }

    /// Builds a trial balance restricted to `[from, to]`.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidDateRange` if `from > to`.
    pub fn compute_range(
        business_id: BusinessId,
        from: NaiveDate,
        to: NaiveDate,
        activity: Vec<AccountActivity>,
    ) -> Result<TrialBalance, ReportError> {
        Self::validate_range(from, to)?;
        Ok(Self::build(business_id, Some(from), to, activity))
    }

    /// Rejects ranges that end before they start.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidDateRange` if `from > to`.
    pub fn validate_range(from: NaiveDate, to: NaiveDate) -> Result<(), ReportError> {
        if from > to {
            return Err(ReportError::InvalidDateRange { start: from, end: to });
        }
        Ok(())
    }

    fn build(
        business_id: BusinessId,
        from: Option<NaiveDate>,
        as_of: NaiveDate,
        activity: Vec<AccountActivity>,
    ) -> TrialBalance {
        let mut rows: Vec<TrialBalanceRow> = activity
            .into_iter()
            .filter(|a| !a.total_debit.is_zero() || !a.total_credit.is_zero())
            .map(|a| TrialBalanceRow {
                balance: a.account_type.net_balance(a.total_debit, a.total_credit),
                account_id: a.account_id,
                code: a.code,
                name: a.name,
                account_type: a.account_type,
                total_debit: a.total_debit,
                total_credit: a.total_credit,
            })
            .collect();
        rows.sort_by(|a, b| a.code.cmp(&b.code));

        let total_debit: Decimal = rows.iter().map(|r| r.total_debit).sum();
        let total_credit: Decimal = rows.iter().map(|r| r.total_credit).sum();

        TrialBalance {
            business_id,
            from,
            as_of,
            rows,
            totals: TrialBalanceTotals {
                total_debit,
                total_credit,
            },
            balanced: within_tolerance(total_debit, total_credit),
        }
    }
}
