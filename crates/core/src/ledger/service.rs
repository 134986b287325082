//! Ledger service for posting validation and account resolution.
//!
//! This module provides the core business logic for validating and resolving
//! general-ledger postings before they are persisted to the database.

use backoffice_shared::types::GlBatchId;
use rust_decimal::Decimal;

use super::error::LedgerError;
use super::types::{AccountInfo, AccountPatch, GlLineInput, PostingRequest, PostingTotals, ResolvedLine};

/// Ledger service for posting validation and resolution.
///
/// This service contains pure business logic with no database dependencies.
pub struct LedgerService;

impl LedgerService {
    /// Validate the shape and balance of a set of lines.
    ///
    /// Checks, in order:
    /// 1. At least two lines
    /// 2. No negative amounts, no line with both sides, no empty line
    /// 3. Debits equal credits within the monetary tolerance
    ///
    /// # Errors
    ///
    /// Returns the first `LedgerError` contract violation found.
    pub fn validate_lines(lines: &[GlLineInput]) -> Result<PostingTotals, LedgerError> {
        if lines.len() < 2 {
            return Err(LedgerError::InsufficientLines);
        }

        for line in lines {
            if line.debit < Decimal::ZERO || line.credit < Decimal::ZERO {
                return Err(LedgerError::NegativeAmount(line.account_code.clone()));
            }
            if !line.debit.is_zero() && !line.credit.is_zero() {
                return Err(LedgerError::BothSides(line.account_code.clone()));
            }
            if line.debit.is_zero() && line.credit.is_zero() {
                return Err(LedgerError::ZeroLine(line.account_code.clone()));
            }
        }

        let totals = PostingTotals::from_pairs(lines.iter().map(|l| (l.debit, l.credit)));
        if !totals.is_balanced() {
            return Err(LedgerError::UnbalancedEntry {
                debit: totals.debit,
                credit: totals.credit,
            });
        }

        Ok(totals)
    }

    /// Validate a posting request and resolve every account code.
    ///
    /// # Arguments
    ///
    /// * `request` - The posting to validate
    /// * `lookup` - Resolves an account code for the request's business
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::UnknownAccount` for the first code `lookup`
    /// cannot resolve, or any error from [`Self::validate_lines`].
    pub fn validate_and_resolve<A>(
        request: &PostingRequest,
        lookup: A,
    ) -> Result<(Vec<ResolvedLine>, PostingTotals), LedgerError>
    where
        A: Fn(&str) -> Option<AccountInfo>,
    {
        let totals = Self::validate_lines(&request.lines)?;

        let resolved = request
            .lines
            .iter()
            .map(|line| {
                let account = lookup(&line.account_code)
                    .ok_or_else(|| LedgerError::UnknownAccount(line.account_code.clone()))?;
                Ok(ResolvedLine {
                    account_id: account.id,
                    account_code: line.account_code.clone(),
                    debit: line.debit,
                    credit: line.credit,
                })
            })
            .collect::<Result<Vec<_>, LedgerError>>()?;

        Ok((resolved, totals))
    }

    /// Build the compensating lines for a previously posted set.
    #[must_use]
    pub fn reversing_lines(lines: &[GlLineInput]) -> Vec<GlLineInput> {
        lines
            .iter()
            .map(|line| GlLineInput {
                account_code: line.account_code.clone(),
                debit: line.credit,
                credit: line.debit,
            })
            .collect()
    }

    /// Re-check the totals of a persisted batch.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::CorruptBatch` if the batch no longer balances.
    pub fn verify_batch(batch_id: GlBatchId, totals: PostingTotals) -> Result<(), LedgerError> {
        if totals.is_balanced() {
            Ok(())
        } else {
            Err(LedgerError::CorruptBatch {
                batch_id,
                debit: totals.debit,
                credit: totals.credit,
            })
        }
    }

    /// Validate an account patch against the current account.
    ///
    /// Code and type are frozen once the account is referenced by a posted line.
    ///
    /// # Errors
    ///
    /// Returns a business-rule `LedgerError` if the patch is not allowed.
    pub fn validate_account_patch(
        current: &AccountInfo,
        patch: &AccountPatch,
        has_entries: bool,
    ) -> Result<(), LedgerError> {
        if let Some(code) = &patch.code {
            if code.trim().is_empty() {
                return Err(LedgerError::EmptyAccountField("code"));
            }
            if has_entries && *code != current.code {
                return Err(LedgerError::AccountCodeImmutable(current.code.clone()));
            }
        }
        if let Some(name) = &patch.name
            && name.trim().is_empty()
        {
            return Err(LedgerError::EmptyAccountField("name"));
        }
        if let Some(account_type) = patch.account_type
            && has_entries
            && account_type != current.account_type
        {
            return Err(LedgerError::AccountTypeChangeNotAllowed(current.code.clone()));
        }
        Ok(())
    }

    /// Validate the fields of a new account.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::EmptyAccountField` if code or name is blank.
    pub fn validate_new_account(code: &str, name: &str) -> Result<(), LedgerError> {
        if code.trim().is_empty() {
            return Err(LedgerError::EmptyAccountField("code"));
        }
        if name.trim().is_empty() {
            return Err(LedgerError::EmptyAccountField("name"));
        }
        Ok(())
    }
}
