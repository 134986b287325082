//! Trial balance data types.

use backoffice_shared::types::{AccountId, BusinessId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::AccountType;

/// Summed ledger activity for one account, as read from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountActivity {
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Sum of debits.
    pub total_debit: Decimal,
    /// Sum of credits.
    pub total_credit: Decimal,
}

/// One account row of a trial balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceRow {
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Total debit amount.
    pub total_debit: Decimal,
    /// Total credit amount.
    pub total_credit: Decimal,
    /// Net balance on the account's normal side.
    pub balance: Decimal,
}

/// Trial balance totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceTotals {
    /// Total debit.
    pub total_debit: Decimal,
    /// Total credit.
    pub total_credit: Decimal,
}

/// Trial balance report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialBalance {
    /// Business the report covers.
    pub business_id: BusinessId,
    /// First date included, if range-scoped.
    pub from: Option<NaiveDate>,
    /// Last date included.
    pub as_of: NaiveDate,
    /// Per-account rows ordered by code.
    pub rows: Vec<TrialBalanceRow>,
    /// Grand totals.
    pub totals: TrialBalanceTotals,
    /// Whether debits equal credits within the monetary tolerance.
    pub balanced: bool,
}
