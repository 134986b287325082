//! Reversal rules for credit notes and refunds.
//!
//! Everything here is pure: amounts, the cumulative cap, the compensating
//! ledger lines and the derived document states. The database layer reads the
//! source document and prior reversals, calls in here, and persists the result
//! in one unit of work.

use backoffice_shared::AccountCodeMap;
use backoffice_shared::types::{BALANCE_TOLERANCE, exceeds, round_money, within_tolerance};
use rust_decimal::Decimal;

use super::error::ReversalError;
use super::types::{
    CreditNoteStatus, PaymentStatus, PosRefundStatus, RefundMethod, RefundType, ReversalAmounts,
    ReversalLineInput,
};
use crate::ledger::GlLineInput;

/// Stateless service for reversal documents.
pub struct ReversalService;

impl ReversalService {
    /// `quantity * unit_price`, rounded to cents.
    #[must_use]
    pub fn line_subtotal(line: &ReversalLineInput) -> Decimal {
        round_money(line.quantity * line.unit_price)
    }

    /// Validate lines and compute document totals.
    ///
    /// # Errors
    ///
    /// - `EmptyReversal` if there are no lines
    /// - `InvalidLine` for a non-positive quantity or a negative price, tax or cost
    /// - `ZeroTotal` if everything adds up to nothing
    pub fn compute_amounts(lines: &[ReversalLineInput]) -> Result<ReversalAmounts, ReversalError> {
        if lines.is_empty() {
            return Err(ReversalError::EmptyReversal);
        }

        let mut amounts = ReversalAmounts::default();
        for (index, line) in lines.iter().enumerate() {
            Self::validate_line(index, line)?;
            amounts.subtotal += Self::line_subtotal(line);
            amounts.tax_amount += round_money(line.tax_amount);
            if line.restock
                && let Some(cost) = line.unit_cost
            {
                amounts.restock_cost += round_money(line.quantity * cost);
            }
        }
        amounts.total_amount = amounts.subtotal + amounts.tax_amount;

        if amounts.total_amount <= Decimal::ZERO {
            return Err(ReversalError::ZeroTotal);
        }
        Ok(amounts)
    }

    fn validate_line(index: usize, line: &ReversalLineInput) -> Result<(), ReversalError> {
        let invalid = |reason: &str| ReversalError::InvalidLine {
            index,
            reason: reason.to_string(),
        };
        if line.quantity <= Decimal::ZERO {
            return Err(invalid("quantity must be positive"));
        }
        if line.unit_price < Decimal::ZERO {
            return Err(invalid("unit price cannot be negative"));
        }
        if line.tax_amount < Decimal::ZERO {
            return Err(invalid("tax cannot be negative"));
        }
        if line.unit_cost.is_some_and(|c| c < Decimal::ZERO) {
            return Err(invalid("unit cost cannot be negative"));
        }
        if line.restock && line.product_id.is_none() {
            return Err(invalid("restocked line needs a product"));
        }
        Ok(())
    }

    /// Enforce `already_reversed + requested <= source_total` within the tolerance.
    ///
    /// # Errors
    ///
    /// Returns `OverReversal` with the remaining allowance.
    pub fn check_cap(
        source_total: Decimal,
        already_reversed: Decimal,
        requested: Decimal,
    ) -> Result<(), ReversalError> {
        if exceeds(already_reversed + requested, source_total) {
            return Err(ReversalError::OverReversal {
                requested,
                already_reversed,
                remaining: (source_total - already_reversed).max(Decimal::ZERO),
            });
        }
        Ok(())
    }

    /// Compensating ledger lines for a credit note.
    ///
    /// Dr sales revenue and tax payable, Cr receivable. Restocked goods also
    /// move cost back: Dr inventory, Cr cost of goods sold.
    #[must_use]
    pub fn credit_note_lines(codes: &AccountCodeMap, amounts: &ReversalAmounts) -> Vec<GlLineInput> {
        Self::reversal_lines(codes, amounts, &codes.accounts_receivable)
    }

    /// Compensating ledger lines for a refund; the credit side is cash or bank.
    #[must_use]
    pub fn refund_lines(
        codes: &AccountCodeMap,
        method: RefundMethod,
        amounts: &ReversalAmounts,
    ) -> Vec<GlLineInput> {
        let settlement = match method {
            RefundMethod::Cash => &codes.cash,
            RefundMethod::Bank | RefundMethod::Card => &codes.bank,
        };
        Self::reversal_lines(codes, amounts, settlement)
    }

    fn reversal_lines(codes: &AccountCodeMap, amounts: &ReversalAmounts, credit_account: &str) -> Vec<GlLineInput> {
        let mut lines = Vec::with_capacity(5);
        if amounts.subtotal > Decimal::ZERO {
            lines.push(GlLineInput::debit(&codes.sales_revenue, amounts.subtotal));
        }
        if amounts.tax_amount > Decimal::ZERO {
            lines.push(GlLineInput::debit(&codes.sales_tax_payable, amounts.tax_amount));
        }
        lines.push(GlLineInput::credit(credit_account, amounts.total_amount));
        if amounts.restock_cost > Decimal::ZERO {
            lines.push(GlLineInput::debit(&codes.inventory, amounts.restock_cost));
            lines.push(GlLineInput::credit(&codes.cost_of_goods_sold, amounts.restock_cost));
        }
        lines
    }

    /// Full when cumulative refunds reach the transaction total.
    #[must_use]
    pub fn refund_type(source_total: Decimal, already_refunded: Decimal, this_refund: Decimal) -> RefundType {
        let cumulative = already_refunded + this_refund;
        if within_tolerance(cumulative, source_total) || cumulative > source_total {
            RefundType::Full
        } else {
            RefundType::Partial
        }
    }

    /// POS transaction status after a refund of the given type.
    #[must_use]
    pub const fn pos_status(refund_type: RefundType) -> PosRefundStatus {
        match refund_type {
            RefundType::Full => PosRefundStatus::Refunded,
            RefundType::Partial => PosRefundStatus::PartiallyRefunded,
        }
    }

    /// Amount to apply: `min(note_total, outstanding, requested)`, with the
    /// note total standing in for a missing request.
    ///
    /// # Errors
    ///
    /// Returns `InvalidApplyAmount` if `requested` is not positive, or
    /// `InvoiceSettled` if the invoice already reads as paid.
    pub fn apply_amount(
        invoice_number: &str,
        note_total: Decimal,
        invoice_total: Decimal,
        amount_paid: Decimal,
        requested: Option<Decimal>,
    ) -> Result<Decimal, ReversalError> {
        if let Some(amount) = requested
            && amount <= Decimal::ZERO
        {
            return Err(ReversalError::InvalidApplyAmount(amount));
        }
        if Self::payment_status(invoice_total, amount_paid) == PaymentStatus::Paid {
            return Err(ReversalError::InvoiceSettled(invoice_number.to_string()));
        }
        let outstanding = invoice_total - amount_paid;
        Ok(requested.unwrap_or(note_total).min(note_total).min(outstanding))
    }

    /// Only issued credit notes can be applied or cancelled.
    ///
    /// # Errors
    ///
    /// Returns `CreditNoteNotIssued` otherwise.
    pub fn require_issued(number: &str, status: CreditNoteStatus) -> Result<(), ReversalError> {
        if status == CreditNoteStatus::Issued {
            Ok(())
        } else {
            Err(ReversalError::CreditNoteNotIssued {
                number: number.to_string(),
                status,
            })
        }
    }

    /// Invoice payment status from the amount paid so far.
    ///
    /// A residue within the tolerance counts as settled only while it is
    /// smaller than what has been paid.
    #[must_use]
    pub fn payment_status(invoice_total: Decimal, paid: Decimal) -> PaymentStatus {
        let remaining = invoice_total - paid;
        if paid <= Decimal::ZERO {
            PaymentStatus::Unpaid
        } else if remaining <= Decimal::ZERO || (remaining <= BALANCE_TOLERANCE && remaining < paid) {
            PaymentStatus::Paid
        } else {
            PaymentStatus::PartiallyPaid
        }
    }
}
