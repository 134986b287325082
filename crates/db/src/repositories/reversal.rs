//! Reversal repository: credit notes against invoices and refunds against
//! POS transactions.
//!
//! The source document row is locked for the whole unit of work, so two
//! reversals of the same document serialize and the cumulative cap holds.

use std::collections::HashSet;

use backoffice_core::inventory::{MovementType, TransactionType};
use backoffice_core::ledger::{LedgerService, PostingRequest};
use backoffice_core::reversal::{
    PosRefundStatus, RefundMethod, ReversalError, ReversalKind, ReversalLineInput,
    ReversalService, next_document_number,
};
use backoffice_shared::AccountCodeMap;
use backoffice_shared::types::{
    BusinessId, CreditNoteId, CustomerId, GlBatchId, InvoiceId, PosTransactionId, RefundId,
    UserId, round_money,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult, QueryFilter,
    QuerySelect, Set,
};
use serde::Serialize;
use uuid::Uuid;

use super::inventory::{InventoryRepository, NewMovement, StockReference};
use super::ledger::{LedgerRepository, PostedBatch};
use crate::entities::{
    credit_note_items, credit_notes, customers, invoice_items, invoices, payment_allocations,
    pos_transaction_items, pos_transactions, refund_items, refunds,
    sea_orm_active_enums::{CreditNoteStatus, PaymentStatus},
    stock_movements,
};
use crate::error::StoreError;

/// Request to issue a credit note.
#[derive(Debug, Clone)]
pub struct IssueCreditNoteInput {
    /// Owning business.
    pub business_id: BusinessId,
    /// Invoice being reversed.
    pub invoice_id: InvoiceId,
    /// Returned lines.
    pub items: Vec<ReversalLineInput>,
    /// Why the note is issued.
    pub reason: Option<String>,
    /// Acting user.
    pub actor_id: UserId,
    /// Posting date of the compensating entry.
    pub date: NaiveDate,
}

/// Request to issue a refund.
#[derive(Debug, Clone)]
pub struct IssueRefundInput {
    /// Owning business.
    pub business_id: BusinessId,
    /// POS transaction being refunded.
    pub transaction_id: PosTransactionId,
    /// Returned lines.
    pub items: Vec<ReversalLineInput>,
    /// How the money goes back.
    pub refund_method: RefundMethod,
    /// Why the refund is given.
    pub reason: Option<String>,
    /// Acting user.
    pub actor_id: UserId,
    /// Posting date of the compensating entry.
    pub date: NaiveDate,
}

/// A persisted credit note with everything it caused.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedCreditNote {
    /// Header.
    pub credit_note: credit_notes::Model,
    /// Lines.
    pub items: Vec<credit_note_items::Model>,
    /// Compensating GL batch.
    pub posting: PostedBatch,
    /// Restock movements.
    pub movements: Vec<stock_movements::Model>,
}

/// A persisted refund with everything it caused.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedRefund {
    /// Header.
    pub refund: refunds::Model,
    /// Lines.
    pub items: Vec<refund_items::Model>,
    /// Compensating GL batch.
    pub posting: PostedBatch,
    /// Restock movements.
    pub movements: Vec<stock_movements::Model>,
    /// POS transaction state afterwards.
    pub transaction_status: PosRefundStatus,
}

/// Result of applying a credit note to an invoice.
#[derive(Debug, Clone, Serialize)]
pub struct AppliedCreditNote {
    /// The note, now applied.
    pub credit_note: credit_notes::Model,
    /// Allocation written.
    pub allocation: payment_allocations::Model,
    /// Target invoice with recomputed payment state.
    pub invoice: invoices::Model,
}

/// Result of cancelling a credit note.
#[derive(Debug, Clone, Serialize)]
pub struct CancelledCreditNote {
    /// The note, now cancelled.
    pub credit_note: credit_notes::Model,
    /// Mirror of the note's GL batch.
    pub posting: PostedBatch,
    /// Movements taking restocked goods back out.
    pub movements: Vec<stock_movements::Model>,
}

#[derive(Debug, FromQueryResult)]
struct SumRow {
    total: Option<Decimal>,
}

/// Credit note and refund persistence.
pub struct ReversalRepository;

impl ReversalRepository {
    /// Issues a credit note against an invoice.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceNotFound`, `OverReversal`, line errors, or any
    /// ledger, fiscal or inventory error raised by the compensating entries.
    #[tracing::instrument(
        skip(conn, codes, input),
        fields(business_id = %input.business_id, invoice_id = %input.invoice_id)
    )]
    pub async fn issue_credit_note<C: ConnectionTrait>(
        conn: &C,
        codes: &AccountCodeMap,
        input: IssueCreditNoteInput,
    ) -> Result<IssuedCreditNote, StoreError> {
        let amounts = ReversalService::compute_amounts(&input.items)?;

        let invoice = invoices::Entity::find_by_id(input.invoice_id.into_inner())
            .filter(invoices::Column::BusinessId.eq(input.business_id.into_inner()))
            .lock_exclusive()
            .one(conn)
            .await?
            .ok_or(ReversalError::InvoiceNotFound(input.invoice_id))?;

        let source_items: HashSet<Uuid> = invoice_items::Entity::find()
            .select_only()
            .column(invoice_items::Column::Id)
            .filter(invoice_items::Column::InvoiceId.eq(invoice.id))
            .into_tuple::<Uuid>()
            .all(conn)
            .await?
            .into_iter()
            .collect();
        check_source_items(&input.items, &source_items)?;

        let already = Self::credited_total(conn, input.invoice_id).await?;
        ReversalService::check_cap(invoice.total_amount, already, amounts.total_amount)?;

        let numbers: Vec<String> = credit_notes::Entity::find()
            .select_only()
            .column(credit_notes::Column::CreditNoteNumber)
            .filter(credit_notes::Column::BusinessId.eq(input.business_id.into_inner()))
            .into_tuple()
            .all(conn)
            .await?;
        let kind = ReversalKind::CreditNote;
        let number = next_document_number(kind.prefix(), &numbers);
        let credit_note_id = CreditNoteId::new();

        let posting = LedgerRepository::post(
            conn,
            &PostingRequest {
                business_id: input.business_id,
                transaction_date: input.date,
                description: format!("Credit note {number} for invoice {}", invoice.invoice_number),
                reference_type: kind.reference_type().to_string(),
                reference_id: Some(credit_note_id.into_inner()),
                actor_id: input.actor_id,
                lines: ReversalService::credit_note_lines(codes, &amounts),
            },
        )
        .await?;

        let now: DateTimeWithTimeZone = chrono::Utc::now().into();
        let credit_note = credit_notes::ActiveModel {
            id: Set(credit_note_id.into_inner()),
            business_id: Set(input.business_id.into_inner()),
            credit_note_number: Set(number),
            invoice_id: Set(invoice.id),
            customer_id: Set(invoice.customer_id),
            subtotal: Set(amounts.subtotal),
            tax_amount: Set(amounts.tax_amount),
            total_amount: Set(amounts.total_amount),
            status: Set(CreditNoteStatus::Issued),
            applied_to_invoice_id: Set(None),
            reason: Set(input.reason),
            gl_batch_id: Set(posting.batch_id.into_inner()),
            created_by: Set(input.actor_id.into_inner()),
            cancelled_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(conn)
        .await?;

        let mut items = Vec::with_capacity(input.items.len());
        for line in &input.items {
            let item = credit_note_items::ActiveModel {
                id: Set(Uuid::now_v7()),
                credit_note_id: Set(credit_note.id),
                invoice_item_id: Set(line.source_item_id),
                product_id: Set(line.product_id.map(|p| p.into_inner())),
                variant_id: Set(line.variant_id.map(|v| v.into_inner())),
                batch_id: Set(line.batch_id.map(|b| b.into_inner())),
                description: Set(line.description.clone()),
                quantity: Set(line.quantity),
                unit_price: Set(line.unit_price),
                tax_amount: Set(round_money(line.tax_amount)),
                total: Set(line_total(line)),
                unit_cost: Set(line.unit_cost),
                restock: Set(line.restock),
            }
            .insert(conn)
            .await?;
            items.push(item);
        }

        let reference = reversal_reference(kind, credit_note.id, input.actor_id);
        let movements = restock(conn, input.business_id, &input.items, &reference).await?;

        adjust_customer_balance(
            conn,
            input.business_id,
            CustomerId::from_uuid(invoice.customer_id),
            -amounts.total_amount,
        )
        .await?;

        tracing::info!(
            credit_note_number = %credit_note.credit_note_number,
            total = %amounts.total_amount,
            "credit note issued"
        );

        Ok(IssuedCreditNote {
            credit_note,
            items,
            posting,
            movements,
        })
    }

    /// Issues a refund against a POS transaction.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound`, `OverReversal`, line errors, or any
    /// ledger, fiscal or inventory error raised by the compensating entries.
    #[tracing::instrument(
        skip(conn, codes, input),
        fields(business_id = %input.business_id, transaction_id = %input.transaction_id)
    )]
    pub async fn issue_refund<C: ConnectionTrait>(
        conn: &C,
        codes: &AccountCodeMap,
        input: IssueRefundInput,
    ) -> Result<IssuedRefund, StoreError> {
        let amounts = ReversalService::compute_amounts(&input.items)?;

        let transaction = pos_transactions::Entity::find_by_id(input.transaction_id.into_inner())
            .filter(pos_transactions::Column::BusinessId.eq(input.business_id.into_inner()))
            .lock_exclusive()
            .one(conn)
            .await?
            .ok_or(ReversalError::TransactionNotFound(input.transaction_id))?;

        let source_items: HashSet<Uuid> = pos_transaction_items::Entity::find()
            .select_only()
            .column(pos_transaction_items::Column::Id)
            .filter(pos_transaction_items::Column::TransactionId.eq(transaction.id))
            .into_tuple::<Uuid>()
            .all(conn)
            .await?
            .into_iter()
            .collect();
        check_source_items(&input.items, &source_items)?;

        let already = Self::refunded_total(conn, input.transaction_id).await?;
        ReversalService::check_cap(transaction.total_amount, already, amounts.total_amount)?;
        let refund_type = ReversalService::refund_type(transaction.total_amount, already, amounts.total_amount);

        let numbers: Vec<String> = refunds::Entity::find()
            .select_only()
            .column(refunds::Column::RefundNumber)
            .filter(refunds::Column::BusinessId.eq(input.business_id.into_inner()))
            .into_tuple()
            .all(conn)
            .await?;
        let kind = ReversalKind::Refund;
        let number = next_document_number(kind.prefix(), &numbers);
        let refund_id = RefundId::new();

        let posting = LedgerRepository::post(
            conn,
            &PostingRequest {
                business_id: input.business_id,
                transaction_date: input.date,
                description: format!(
                    "Refund {number} for transaction {}",
                    transaction.transaction_number
                ),
                reference_type: kind.reference_type().to_string(),
                reference_id: Some(refund_id.into_inner()),
                actor_id: input.actor_id,
                lines: ReversalService::refund_lines(codes, input.refund_method, &amounts),
            },
        )
        .await?;

        let refund = refunds::ActiveModel {
            id: Set(refund_id.into_inner()),
            business_id: Set(input.business_id.into_inner()),
            transaction_id: Set(transaction.id),
            refund_number: Set(number),
            refund_type: Set(refund_type.into()),
            subtotal: Set(amounts.subtotal),
            tax_amount: Set(amounts.tax_amount),
            total_amount: Set(amounts.total_amount),
            refund_method: Set(input.refund_method.into()),
            status: Set("completed".to_string()),
            reason: Set(input.reason),
            gl_batch_id: Set(posting.batch_id.into_inner()),
            created_by: Set(input.actor_id.into_inner()),
            created_at: Set(chrono::Utc::now().into()),
        }
        .insert(conn)
        .await?;

        let mut items = Vec::with_capacity(input.items.len());
        for line in &input.items {
            let item = refund_items::ActiveModel {
                id: Set(Uuid::now_v7()),
                refund_id: Set(refund.id),
                transaction_item_id: Set(line.source_item_id),
                product_id: Set(line.product_id.map(|p| p.into_inner())),
                variant_id: Set(line.variant_id.map(|v| v.into_inner())),
                batch_id: Set(line.batch_id.map(|b| b.into_inner())),
                description: Set(line.description.clone()),
                quantity: Set(line.quantity),
                unit_price: Set(line.unit_price),
                tax_amount: Set(round_money(line.tax_amount)),
                total: Set(line_total(line)),
                unit_cost: Set(line.unit_cost),
                restock: Set(line.restock),
            }
            .insert(conn)
            .await?;
            items.push(item);
        }

        let reference = reversal_reference(kind, refund.id, input.actor_id);
        let movements = restock(conn, input.business_id, &input.items, &reference).await?;

        let transaction_status = ReversalService::pos_status(refund_type);
        let mut active: pos_transactions::ActiveModel = transaction.into();
        active.status = Set(transaction_status.into());
        active.updated_at = Set(chrono::Utc::now().into());
        active.update(conn).await?;

        tracing::info!(
            refund_number = %refund.refund_number,
            total = %amounts.total_amount,
            refund_type = ?refund_type,
            "refund issued"
        );

        Ok(IssuedRefund {
            refund,
            items,
            posting,
            movements,
            transaction_status,
        })
    }

    /// Applies an issued credit note to an invoice of the same customer.
    ///
    /// # Errors
    ///
    /// Returns `CreditNoteNotFound`, `CreditNoteNotIssued`, `InvoiceNotFound`,
    /// `CustomerMismatch`, `InvoiceSettled` or `InvalidApplyAmount`.
    #[tracing::instrument(skip(conn))]
    pub async fn apply_credit_note<C: ConnectionTrait>(
        conn: &C,
        business_id: BusinessId,
        credit_note_id: CreditNoteId,
        target_invoice_id: InvoiceId,
        amount: Option<Decimal>,
    ) -> Result<AppliedCreditNote, StoreError> {
        let note = Self::find_locked(conn, business_id, credit_note_id).await?;
        ReversalService::require_issued(&note.credit_note_number, note.status.into())?;

        let invoice = invoices::Entity::find_by_id(target_invoice_id.into_inner())
            .filter(invoices::Column::BusinessId.eq(business_id.into_inner()))
            .lock_exclusive()
            .one(conn)
            .await?
            .ok_or(ReversalError::InvoiceNotFound(target_invoice_id))?;
        if invoice.customer_id != note.customer_id {
            return Err(ReversalError::CustomerMismatch(note.credit_note_number).into());
        }

        let applied = ReversalService::apply_amount(
            &invoice.invoice_number,
            note.total_amount,
            invoice.total_amount,
            invoice.amount_paid,
            amount,
        )?;
        let now: DateTimeWithTimeZone = chrono::Utc::now().into();

        let allocation = payment_allocations::ActiveModel {
            id: Set(Uuid::now_v7()),
            business_id: Set(business_id.into_inner()),
            invoice_id: Set(invoice.id),
            credit_note_id: Set(Some(note.id)),
            amount: Set(applied),
            created_at: Set(now),
        }
        .insert(conn)
        .await?;

        let mut active_note: credit_notes::ActiveModel = note.into();
        active_note.status = Set(CreditNoteStatus::Applied);
        active_note.applied_to_invoice_id = Set(Some(invoice.id));
        active_note.updated_at = Set(now);
        let credit_note = active_note.update(conn).await?;

        let amount_paid = invoice.amount_paid + applied;
        let payment_status: PaymentStatus =
            ReversalService::payment_status(invoice.total_amount, amount_paid).into();

        let mut active_invoice: invoices::ActiveModel = invoice.into();
        active_invoice.amount_paid = Set(amount_paid);
        active_invoice.payment_status = Set(payment_status);
        active_invoice.updated_at = Set(now);
        let invoice = active_invoice.update(conn).await?;

        tracing::info!(
            credit_note_number = %credit_note.credit_note_number,
            %applied,
            payment_status = ?invoice.payment_status,
            "credit note applied"
        );

        Ok(AppliedCreditNote {
            credit_note,
            allocation,
            invoice,
        })
    }

    /// Cancels an issued credit note, mirroring its GL batch and stock effects.
    ///
    /// # Errors
    ///
    /// Returns `CreditNoteNotFound`, `CreditNoteNotIssued`, a fiscal error if
    /// the cancellation date is in a closed period, or `InsufficientStock` if
    /// restocked goods have since left their batch.
    #[tracing::instrument(skip(conn))]
    pub async fn cancel_credit_note<C: ConnectionTrait>(
        conn: &C,
        business_id: BusinessId,
        credit_note_id: CreditNoteId,
        actor_id: UserId,
        date: NaiveDate,
    ) -> Result<CancelledCreditNote, StoreError> {
        let note = Self::find_locked(conn, business_id, credit_note_id).await?;
        ReversalService::require_issued(&note.credit_note_number, note.status.into())?;

        let original =
            LedgerRepository::batch_lines(conn, business_id, GlBatchId::from_uuid(note.gl_batch_id)).await?;
        let kind = ReversalKind::CreditNote;
        let posting = LedgerRepository::post(
            conn,
            &PostingRequest {
                business_id,
                transaction_date: date,
                description: format!("Cancellation of credit note {}", note.credit_note_number),
                reference_type: kind.reference_type().to_string(),
                reference_id: Some(note.id),
                actor_id,
                lines: LedgerService::reversing_lines(&original),
            },
        )
        .await?;

        let items = credit_note_items::Entity::find()
            .filter(credit_note_items::Column::CreditNoteId.eq(note.id))
            .filter(credit_note_items::Column::Restock.eq(true))
            .all(conn)
            .await?;
        let reference = reversal_reference(kind, note.id, actor_id);
        let mut movements = Vec::with_capacity(items.len());
        for item in items {
            let Some(product_id) = item.product_id else {
                continue;
            };
            if let Some(batch_id) = item.batch_id {
                InventoryRepository::adjust_batch_quantity(
                    conn,
                    business_id,
                    batch_id.into(),
                    -item.quantity,
                )
                .await?;
            }
            let movement = InventoryRepository::record_movement(
                conn,
                NewMovement {
                    business_id,
                    product_id: product_id.into(),
                    variant_id: item.variant_id.map(Into::into),
                    batch_id: item.batch_id.map(Into::into),
                    quantity_change: -item.quantity,
                    movement_type: Some(MovementType::AdjustmentOut),
                    unit_cost: item.unit_cost,
                    reference: reference.clone(),
                },
            )
            .await?;
            movements.push(movement);
        }

        adjust_customer_balance(
            conn,
            business_id,
            CustomerId::from_uuid(note.customer_id),
            note.total_amount,
        )
        .await?;

        let mut active: credit_notes::ActiveModel = note.into();
        let now: DateTimeWithTimeZone = chrono::Utc::now().into();
        active.status = Set(CreditNoteStatus::Cancelled);
        active.cancelled_at = Set(Some(now));
        active.updated_at = Set(now);
        let credit_note = active.update(conn).await?;

        tracing::info!(credit_note_number = %credit_note.credit_note_number, "credit note cancelled");

        Ok(CancelledCreditNote {
            credit_note,
            posting,
            movements,
        })
    }

    /// Sum of non-cancelled credit notes issued against an invoice.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn credited_total<C: ConnectionTrait>(
        conn: &C,
        invoice_id: InvoiceId,
    ) -> Result<Decimal, StoreError> {
        let row = credit_notes::Entity::find()
            .select_only()
            .column_as(Expr::col(credit_notes::Column::TotalAmount).sum(), "total")
            .filter(credit_notes::Column::InvoiceId.eq(invoice_id.into_inner()))
            .filter(credit_notes::Column::Status.ne(CreditNoteStatus::Cancelled))
            .into_model::<SumRow>()
            .one(conn)
            .await?;
        Ok(row.and_then(|r| r.total).unwrap_or_default())
    }

    /// Sum of refunds issued against a POS transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn refunded_total<C: ConnectionTrait>(
        conn: &C,
        transaction_id: PosTransactionId,
    ) -> Result<Decimal, StoreError> {
        let row = refunds::Entity::find()
            .select_only()
            .column_as(Expr::col(refunds::Column::TotalAmount).sum(), "total")
            .filter(refunds::Column::TransactionId.eq(transaction_id.into_inner()))
            .into_model::<SumRow>()
            .one(conn)
            .await?;
        Ok(row.and_then(|r| r.total).unwrap_or_default())
    }

    async fn find_locked<C: ConnectionTrait>(
        conn: &C,
        business_id: BusinessId,
        credit_note_id: CreditNoteId,
    ) -> Result<credit_notes::Model, StoreError> {
        credit_notes::Entity::find_by_id(credit_note_id.into_inner())
            .filter(credit_notes::Column::BusinessId.eq(business_id.into_inner()))
            .lock_exclusive()
            .one(conn)
            .await?
            .ok_or_else(|| ReversalError::CreditNoteNotFound(credit_note_id).into())
    }
}

/// Every referenced source line must belong to the source document.
fn check_source_items(items: &[ReversalLineInput], source_items: &HashSet<Uuid>) -> Result<(), ReversalError> {
    for (index, line) in items.iter().enumerate() {
        if let Some(id) = line.source_item_id
            && !source_items.contains(&id)
        {
            return Err(ReversalError::InvalidLine {
                index,
                reason: format!("item {id} is not on the source document"),
            });
        }
    }
    Ok(())
}

fn line_total(line: &ReversalLineInput) -> Decimal {
    ReversalService::line_subtotal(line) + round_money(line.tax_amount)
}

fn reversal_reference(kind: ReversalKind, document_id: Uuid, actor_id: UserId) -> StockReference {
    StockReference {
        reference_type: Some(kind.reference_type().to_string()),
        reference_id: Some(document_id),
        actor_id: Some(actor_id),
        ..StockReference::new(TransactionType::Return)
    }
}

/// Puts restocked lines back into stock, and into their batch when named.
async fn restock<C: ConnectionTrait>(
    conn: &C,
    business_id: BusinessId,
    items: &[ReversalLineInput],
    reference: &StockReference,
) -> Result<Vec<stock_movements::Model>, StoreError> {
    let mut movements = Vec::new();
    for line in items.iter().filter(|l| l.restock) {
        let Some(product_id) = line.product_id else {
            continue;
        };
        if let Some(batch_id) = line.batch_id {
            InventoryRepository::adjust_batch_quantity(conn, business_id, batch_id, line.quantity).await?;
        }
        let movement = InventoryRepository::record_movement(
            conn,
            NewMovement {
                business_id,
                product_id,
                variant_id: line.variant_id,
                batch_id: line.batch_id,
                quantity_change: line.quantity,
                movement_type: Some(MovementType::Return),
                unit_cost: line.unit_cost,
                reference: reference.clone(),
            },
        )
        .await?;
        movements.push(movement);
    }
    Ok(movements)
}

async fn adjust_customer_balance<C: ConnectionTrait>(
    conn: &C,
    business_id: BusinessId,
    customer_id: CustomerId,
    delta: Decimal,
) -> Result<(), StoreError> {
    let result = customers::Entity::update_many()
        .col_expr(
            customers::Column::OutstandingBalance,
            Expr::col(customers::Column::OutstandingBalance).add(delta),
        )
        .col_expr(customers::Column::UpdatedAt, Expr::value(chrono::Utc::now().fixed_offset()))
        .filter(customers::Column::Id.eq(customer_id.into_inner()))
        .filter(customers::Column::BusinessId.eq(business_id.into_inner()))
        .exec(conn)
        .await?;
    if result.rows_affected == 0 {
        return Err(StoreError::NotFound {
            entity: "Customer",
            id: customer_id.into_inner(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use backoffice_shared::types::ProductId;
    use rust_decimal_macros::dec;

    fn line(source: Option<Uuid>) -> ReversalLineInput {
        ReversalLineInput {
            source_item_id: source,
            product_id: Some(ProductId::new()),
            variant_id: None,
            batch_id: None,
            description: None,
            quantity: dec!(3),
            unit_price: dec!(9.99),
            tax_amount: dec!(2.996),
            unit_cost: None,
            restock: false,
        }
    }

    #[test]
    fn test_source_items_must_belong_to_document() {
        let known = Uuid::now_v7();
        let source: HashSet<Uuid> = [known].into_iter().collect();

        assert!(check_source_items(&[line(Some(known)), line(None)], &source).is_ok());
        let err = check_source_items(&[line(None), line(Some(Uuid::now_v7()))], &source).unwrap_err();
        assert!(matches!(err, ReversalError::InvalidLine { index: 1, .. }));
    }

    #[test]
    fn test_line_total_rounds_parts() {
        assert_eq!(line_total(&line(None)), dec!(32.97));
    }

    #[test]
    fn test_reversal_reference() {
        let id = Uuid::now_v7();
        let reference = reversal_reference(ReversalKind::Refund, id, UserId::new());
        assert_eq!(reference.transaction_type, TransactionType::Return);
        assert_eq!(reference.reference_type.as_deref(), Some("refund"));
        assert_eq!(reference.reference_id, Some(id));
    }
}
