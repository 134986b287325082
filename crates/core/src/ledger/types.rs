//! Domain types for general-ledger posting.

use backoffice_shared::types::{AccountId, BusinessId, UserId, within_tolerance};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account classification in the chart of accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Resources owned (cash, receivables, inventory).
    Asset,
    /// Obligations owed (payables, tax payable).
    Liability,
    /// Owner's residual interest.
    Equity,
    /// Revenue earned.
    Income,
    /// Costs incurred.
    Expense,
}

/// Side on which an account's balance normally sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalBalance {
    /// Debits increase the balance.
    Debit,
    /// Credits increase the balance.
    Credit,
}

impl AccountType {
    /// Returns the normal balance side for this account type.
    #[must_use]
    pub const fn normal_balance(self) -> NormalBalance {
        match self {
            Self::Asset | Self::Expense => NormalBalance::Debit,
            Self::Liability | Self::Equity | Self::Income => NormalBalance::Credit,
        }
    }

    /// Net balance on this type's normal side.
    #[must_use]
    pub fn net_balance(self, debit: Decimal, credit: Decimal) -> Decimal {
        match self.normal_balance() {
            NormalBalance::Debit => debit - credit,
            NormalBalance::Credit => credit - debit,
        }
    }

    /// Returns the storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Equity => "equity",
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asset" => Ok(Self::Asset),
            "liability" => Ok(Self::Liability),
            "equity" => Ok(Self::Equity),
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(format!("Unknown account type: {s}")),
        }
    }
}

/// Account data needed to resolve a posting line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    /// The account ID.
    pub id: AccountId,
    /// Chart-of-accounts code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Classification.
    pub account_type: AccountType,
}

/// One line of a posting request, addressed by account code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlLineInput {
    /// Account code to post to.
    pub account_code: String,
    /// Debit amount (zero when this is a credit line).
    #[serde(default)]
    pub debit: Decimal,
    /// Credit amount (zero when this is a debit line).
    #[serde(default)]
    pub credit: Decimal,
}

impl GlLineInput {
    /// Creates a debit line.
    #[must_use]
    pub fn debit(account_code: impl Into<String>, amount: Decimal) -> Self {
        Self {
            account_code: account_code.into(),
            debit: amount,
            credit: Decimal::ZERO,
        }
    }

    /// Creates a credit line.
    #[must_use]
    pub fn credit(account_code: impl Into<String>, amount: Decimal) -> Self {
        Self {
            account_code: account_code.into(),
            debit: Decimal::ZERO,
            credit: amount,
        }
    }
}

/// Input for posting one business transaction to the general ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostingRequest {
    /// Owning business.
    pub business_id: BusinessId,
    /// Accounting date of every line.
    pub transaction_date: NaiveDate,
    /// Description copied onto every line.
    pub description: String,
    /// Kind of source document (e.g. "invoice", "credit_note").
    pub reference_type: String,
    /// Source document ID, if any.
    pub reference_id: Option<Uuid>,
    /// Acting user.
    pub actor_id: UserId,
    /// Lines to write.
    pub lines: Vec<GlLineInput>,
}

/// A posting line after account resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLine {
    /// Resolved account ID.
    pub account_id: AccountId,
    /// Account code as requested.
    pub account_code: String,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
}

/// Debit and credit totals of a set of lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PostingTotals {
    /// Sum of debits.
    pub debit: Decimal,
    /// Sum of credits.
    pub credit: Decimal,
}

impl PostingTotals {
    /// Sums debit and credit over any line-like iterator.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Decimal, Decimal)>) -> Self {
        pairs
            .into_iter()
            .fold(Self::default(), |acc, (debit, credit)| Self {
                debit: acc.debit + debit,
                credit: acc.credit + credit,
            })
    }

    /// Returns true if debits equal credits within the monetary tolerance.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        within_tolerance(self.debit, self.credit)
    }
}

/// Typed patch for a chart-of-accounts entry. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountPatch {
    /// New code. Rejected once the account has ledger lines.
    pub code: Option<String>,
    /// New display name.
    pub name: Option<String>,
    /// New type. Rejected once the account has ledger lines.
    pub account_type: Option<AccountType>,
}

impl AccountPatch {
    /// Returns true if the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.code.is_none() && self.name.is_none() && self.account_type.is_none()
    }
}
