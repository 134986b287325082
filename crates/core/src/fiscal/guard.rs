//! Posting guard and state machine for fiscal periods.
//!
//! ```text
//! open ──close──▶ closed ──lock──▶ locked
//!   ▲               │
//!   └────reopen─────┘
//! ```

use backoffice_shared::Notice;
use chrono::NaiveDate;

use super::error::FiscalError;
use super::period::{FiscalPeriod, FiscalPeriodStatus};
use crate::ledger::PostingTotals;

/// Notice code returned when no period covers a posting date.
pub const NO_FISCAL_PERIOD: &str = "NO_FISCAL_PERIOD";

/// Pure rules for fiscal period transitions and posting permission.
pub struct FiscalPeriodGuard;

impl FiscalPeriodGuard {
    /// Decide whether posting on `date` is allowed.
    ///
    /// `period` is the business's period containing `date`, if any. Period
    /// control is opt-in: without a period the posting goes through and a
    /// warning notice is returned.
    ///
    /// # Errors
    ///
    /// Returns `FiscalError::PeriodClosed` if the period is closed or locked.
    pub fn check_posting(
        period: Option<&FiscalPeriod>,
        date: NaiveDate,
    ) -> Result<Option<Notice>, FiscalError> {
        match period {
            None => Ok(Some(Notice::warning(
                NO_FISCAL_PERIOD,
                format!("No fiscal period covers {date}; posting is not period-controlled"),
            ))),
            Some(p) if p.is_open() => Ok(None),
            Some(p) => Err(FiscalError::PeriodClosed {
                name: p.name.clone(),
                status: p.status,
            }),
        }
    }

    /// Validate a new period against the business's existing periods.
    ///
    /// # Errors
    ///
    /// Returns `EmptyName`, `InvalidDateRange` or `Overlap` naming the first
    /// colliding period.
    pub fn validate_new_period(
        name: &str,
        start: NaiveDate,
        end: NaiveDate,
        existing: &[FiscalPeriod],
    ) -> Result<(), FiscalError> {
        if name.trim().is_empty() {
            return Err(FiscalError::EmptyName);
        }
        if start > end {
            return Err(FiscalError::InvalidDateRange { start, end });
        }
        if let Some(collision) = existing.iter().find(|p| p.overlaps(start, end)) {
            return Err(FiscalError::Overlap(collision.name.clone()));
        }
        Ok(())
    }

    /// Validate closing a period given its own ledger totals.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the period is open, or
    /// `UnbalancedPeriod` if the totals differ by more than the tolerance.
    pub fn validate_close(period: &FiscalPeriod, totals: PostingTotals) -> Result<(), FiscalError> {
        if period.status != FiscalPeriodStatus::Open {
            return Err(Self::invalid(period, FiscalPeriodStatus::Closed));
        }
        if !totals.is_balanced() {
            return Err(FiscalError::UnbalancedPeriod {
                name: period.name.clone(),
                debit: totals.debit,
                credit: totals.credit,
            });
        }
        Ok(())
    }

    /// Validate reopening a period. Reopening an open period is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `PeriodLocked` if the period is locked.
    pub fn validate_reopen(period: &FiscalPeriod) -> Result<(), FiscalError> {
        match period.status {
            FiscalPeriodStatus::Locked => Err(FiscalError::PeriodLocked(period.name.clone())),
            FiscalPeriodStatus::Open | FiscalPeriodStatus::Closed => Ok(()),
        }
    }

    /// Validate locking a period. Only closed periods can be locked.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the period is closed.
    pub fn validate_lock(period: &FiscalPeriod) -> Result<(), FiscalError> {
        if period.status == FiscalPeriodStatus::Closed {
            Ok(())
        } else {
            Err(Self::invalid(period, FiscalPeriodStatus::Locked))
        }
    }

    fn invalid(period: &FiscalPeriod, to: FiscalPeriodStatus) -> FiscalError {
        FiscalError::InvalidTransition {
            name: period.name.clone(),
            from: period.status,
            to,
        }
    }
}
