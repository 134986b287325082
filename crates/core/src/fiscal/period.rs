//! Fiscal period types.

use backoffice_shared::types::{BusinessId, FiscalPeriodId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Status of a fiscal period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FiscalPeriodStatus {
    /// Period is open for posting.
    Open,
    /// Period is closed, no posting allowed. Can be reopened.
    Closed,
    /// Period is locked, no posting and no reopening.
    Locked,
}

impl FiscalPeriodStatus {
    /// Returns the storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Locked => "locked",
        }
    }
}

impl std::fmt::Display for FiscalPeriodStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fiscal period belonging to one business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalPeriod {
    /// Unique identifier.
    pub id: FiscalPeriodId,
    /// Business this period belongs to.
    pub business_id: BusinessId,
    /// Period name (e.g., "January 2024").
    pub name: String,
    /// First day of the period.
    pub start_date: NaiveDate,
    /// Last day of the period (inclusive).
    pub end_date: NaiveDate,
    /// Current status.
    pub status: FiscalPeriodStatus,
    /// Who closed the period.
    pub closed_by: Option<UserId>,
    /// When the period was closed.
    pub closed_at: Option<DateTime<Utc>>,
}

impl FiscalPeriod {
    /// Returns true if transactions can be posted to this period.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == FiscalPeriodStatus::Open
    }

    /// Returns true if the given date falls within this period.
    #[must_use]
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Returns true if `[start, end]` shares at least one day with this period.
    #[must_use]
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        start <= self.end_date && end >= self.start_date
    }
}
