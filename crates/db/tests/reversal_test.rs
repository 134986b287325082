//! Integration tests for credit notes and refunds.

mod common;

use backoffice_core::reversal::{
    CreditNoteStatus, PaymentStatus, PosRefundStatus, RefundMethod, RefundType, ReversalError,
    ReversalLineInput,
};
use backoffice_db::StoreError;
use backoffice_db::entities::sea_orm_active_enums::{
    PaymentStatus as InvoicePaymentStatus, PosTransactionStatus,
};
use backoffice_db::entities::{
    batches, credit_notes, customers, invoices, pos_transactions, products, refunds,
};
use backoffice_db::repositories::{IssueCreditNoteInput, IssueRefundInput};
use backoffice_shared::AppError;
use backoffice_shared::types::{BatchId, CustomerId, InvoiceId, PosTransactionId, ProductId};
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use uuid::Uuid;

use common::{TestBusiness, days_from_today};

fn line(quantity: Decimal, unit_price: Decimal, tax: Decimal) -> ReversalLineInput {
    ReversalLineInput {
        source_item_id: None,
        product_id: None,
        variant_id: None,
        batch_id: None,
        description: Some("Returned goods".to_string()),
        quantity,
        unit_price,
        tax_amount: tax,
        unit_cost: None,
        restock: false,
    }
}

fn credit_note(biz: &TestBusiness, invoice_id: InvoiceId, items: Vec<ReversalLineInput>) -> IssueCreditNoteInput {
    IssueCreditNoteInput {
        business_id: biz.business_id,
        invoice_id,
        items,
        reason: Some("Damaged".to_string()),
        actor_id: biz.actor_id,
        date: Utc::now().date_naive(),
    }
}

fn refund(
    biz: &TestBusiness,
    transaction_id: PosTransactionId,
    amount: Decimal,
    method: RefundMethod,
) -> IssueRefundInput {
    IssueRefundInput {
        business_id: biz.business_id,
        transaction_id,
        items: vec![line(dec!(1), amount, dec!(0))],
        refund_method: method,
        reason: None,
        actor_id: biz.actor_id,
        date: Utc::now().date_naive(),
    }
}

async fn balance(biz: &TestBusiness, customer_id: CustomerId) -> Decimal {
    customers::Entity::find_by_id(customer_id.into_inner())
        .one(&biz.db)
        .await
        .unwrap()
        .unwrap()
        .outstanding_balance
}

async fn mark_paid(biz: &TestBusiness, invoice_id: InvoiceId, amount: Decimal) {
    let invoice = invoices::Entity::find_by_id(invoice_id.into_inner())
        .one(&biz.db)
        .await
        .unwrap()
        .unwrap();
    let mut active: invoices::ActiveModel = invoice.into();
    active.amount_paid = Set(amount);
    active.payment_status = Set(InvoicePaymentStatus::PartiallyPaid);
    active.update(&biz.db).await.unwrap();
}

async fn product_stock(biz: &TestBusiness, id: ProductId) -> Decimal {
    products::Entity::find_by_id(id.into_inner())
        .one(&biz.db)
        .await
        .unwrap()
        .unwrap()
        .stock
}

async fn batch_quantity(biz: &TestBusiness, id: BatchId) -> Decimal {
    batches::Entity::find_by_id(id.into_inner())
        .one(&biz.db)
        .await
        .unwrap()
        .unwrap()
        .quantity
}

#[tokio::test]
async fn test_credit_notes_are_capped_at_invoice_total() {
    let Some(biz) = common::setup().await else { return };
    let customer = biz.customer().await;
    let (invoice, _) = biz.invoice(customer, "INV-1", dec!(100)).await;

    let first = biz
        .ops
        .issue_credit_note(credit_note(&biz, invoice, vec![line(dec!(2), dec!(25), dec!(10))]))
        .await
        .unwrap();
    assert_eq!(first.credit_note.credit_note_number, "CN-000001");
    assert_eq!(first.credit_note.total_amount, dec!(60));
    assert_eq!(first.posting.lines.len(), 3);
    assert_eq!(balance(&biz, customer).await, dec!(-60));

    let err = biz
        .ops
        .issue_credit_note(credit_note(&biz, invoice, vec![line(dec!(1), dec!(50), dec!(0))]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Reversal(ReversalError::OverReversal { remaining, already_reversed, .. })
            if remaining == dec!(40) && already_reversed == dec!(60)
    ));

    let notes = credit_notes::Entity::find()
        .filter(credit_notes::Column::InvoiceId.eq(invoice.into_inner()))
        .count(&biz.db)
        .await
        .unwrap();
    assert_eq!(notes, 1);
    assert_eq!(balance(&biz, customer).await, dec!(-60));

    // Within the tolerance of the remaining allowance.
    let second = biz
        .ops
        .issue_credit_note(credit_note(&biz, invoice, vec![line(dec!(1), dec!(40.01), dec!(0))]))
        .await
        .unwrap();
    assert_eq!(second.credit_note.credit_note_number, "CN-000002");

    let tb = biz.ops.trial_balance(biz.business_id, Utc::now().date_naive()).await.unwrap();
    assert!(tb.balanced);
    let receivable = tb.rows.iter().find(|r| r.code == "1100").unwrap();
    assert_eq!(receivable.total_credit, dec!(100.01));
}

#[tokio::test]
async fn test_source_item_must_be_on_invoice() {
    let Some(biz) = common::setup().await else { return };
    let customer = biz.customer().await;
    let (invoice, item) = biz.invoice(customer, "INV-1", dec!(30)).await;

    let mut known = line(dec!(1), dec!(10), dec!(0));
    known.source_item_id = Some(item);
    let mut foreign = line(dec!(1), dec!(10), dec!(0));
    foreign.source_item_id = Some(Uuid::now_v7());

    let err = biz
        .ops
        .issue_credit_note(credit_note(&biz, invoice, vec![known, foreign]))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Reversal(ReversalError::InvalidLine { index: 1, .. })));
}

#[tokio::test]
async fn test_apply_credit_note_updates_payment_status() {
    let Some(biz) = common::setup().await else { return };
    let customer = biz.customer().await;
    let (invoice_a, _) = biz.invoice(customer, "INV-A", dec!(80)).await;
    let (invoice_b, _) = biz.invoice(customer, "INV-B", dec!(80)).await;

    let full = biz
        .ops
        .issue_credit_note(credit_note(&biz, invoice_a, vec![line(dec!(1), dec!(80), dec!(0))]))
        .await
        .unwrap();
    let applied = biz
        .ops
        .apply_credit_note(biz.business_id, full.credit_note.id.into(), invoice_a, None)
        .await
        .unwrap();
    assert_eq!(PaymentStatus::from(applied.invoice.payment_status), PaymentStatus::Paid);
    assert_eq!(applied.invoice.amount_paid, dec!(80));
    assert_eq!(CreditNoteStatus::from(applied.credit_note.status), CreditNoteStatus::Applied);

    let err = biz
        .ops
        .apply_credit_note(biz.business_id, full.credit_note.id.into(), invoice_a, None)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Reversal(ReversalError::CreditNoteNotIssued { .. })));

    let half = biz
        .ops
        .issue_credit_note(credit_note(&biz, invoice_b, vec![line(dec!(1), dec!(40), dec!(0))]))
        .await
        .unwrap();
    let applied = biz
        .ops
        .apply_credit_note(biz.business_id, half.credit_note.id.into(), invoice_b, Some(dec!(100)))
        .await
        .unwrap();
    assert_eq!(applied.allocation.amount, dec!(40));
    assert_eq!(PaymentStatus::from(applied.invoice.payment_status), PaymentStatus::PartiallyPaid);
}

#[tokio::test]
async fn test_apply_builds_on_existing_payments() {
    let Some(biz) = common::setup().await else { return };
    let customer = biz.customer().await;
    let (settled, _) = biz.invoice(customer, "INV-A", dec!(100)).await;
    let (open, _) = biz.invoice(customer, "INV-B", dec!(100)).await;
    for invoice in [settled, open] {
        mark_paid(&biz, invoice, dec!(60)).await;
    }

    let note = biz
        .ops
        .issue_credit_note(credit_note(&biz, settled, vec![line(dec!(1), dec!(40), dec!(0))]))
        .await
        .unwrap();
    let applied = biz
        .ops
        .apply_credit_note(biz.business_id, note.credit_note.id.into(), settled, None)
        .await
        .unwrap();
    assert_eq!(applied.allocation.amount, dec!(40));
    assert_eq!(applied.invoice.amount_paid, dec!(100));
    assert_eq!(PaymentStatus::from(applied.invoice.payment_status), PaymentStatus::Paid);

    let late = biz
        .ops
        .issue_credit_note(credit_note(&biz, settled, vec![line(dec!(1), dec!(10), dec!(0))]))
        .await
        .unwrap();
    let err = biz
        .ops
        .apply_credit_note(biz.business_id, late.credit_note.id.into(), settled, None)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Reversal(ReversalError::InvoiceSettled(ref n)) if n == "INV-A"));

    let oversized = biz
        .ops
        .issue_credit_note(credit_note(&biz, open, vec![line(dec!(1), dec!(50), dec!(0))]))
        .await
        .unwrap();
    let applied = biz
        .ops
        .apply_credit_note(biz.business_id, oversized.credit_note.id.into(), open, None)
        .await
        .unwrap();
    assert_eq!(applied.allocation.amount, dec!(40));
    assert_eq!(applied.invoice.amount_paid, dec!(100));
    assert_eq!(PaymentStatus::from(applied.invoice.payment_status), PaymentStatus::Paid);
}

#[tokio::test]
async fn test_apply_rejects_other_customers_invoice() {
    let Some(biz) = common::setup().await else { return };
    let alice = biz.customer().await;
    let bob = biz.customer().await;
    let (alice_invoice, _) = biz.invoice(alice, "INV-1", dec!(20)).await;
    let (bob_invoice, _) = biz.invoice(bob, "INV-2", dec!(20)).await;

    let note = biz
        .ops
        .issue_credit_note(credit_note(&biz, alice_invoice, vec![line(dec!(1), dec!(20), dec!(0))]))
        .await
        .unwrap();
    let err = biz
        .ops
        .apply_credit_note(biz.business_id, note.credit_note.id.into(), bob_invoice, None)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Reversal(ReversalError::CustomerMismatch(_))));
}

#[tokio::test]
async fn test_cancel_frees_allowance_and_restores_balance() {
    let Some(biz) = common::setup().await else { return };
    let customer = biz.customer().await;
    let (invoice, _) = biz.invoice(customer, "INV-1", dec!(50)).await;

    let note = biz
        .ops
        .issue_credit_note(credit_note(&biz, invoice, vec![line(dec!(1), dec!(50), dec!(0))]))
        .await
        .unwrap();
    assert_eq!(balance(&biz, customer).await, dec!(-50));

    let cancelled = biz
        .ops
        .cancel_credit_note(biz.business_id, note.credit_note.id.into(), biz.actor_id)
        .await
        .unwrap();
    assert_eq!(CreditNoteStatus::from(cancelled.credit_note.status), CreditNoteStatus::Cancelled);
    assert!(cancelled.credit_note.cancelled_at.is_some());
    assert_eq!(balance(&biz, customer).await, dec!(0));

    let tb = biz.ops.trial_balance(biz.business_id, Utc::now().date_naive()).await.unwrap();
    assert!(tb.rows.iter().all(|r| r.balance.is_zero()));

    biz.ops
        .issue_credit_note(credit_note(&biz, invoice, vec![line(dec!(1), dec!(50), dec!(0))]))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_restocked_credit_note_moves_goods_and_cost() {
    let Some(biz) = common::setup().await else { return };
    let customer = biz.customer().await;
    let (invoice, _) = biz.invoice(customer, "INV-1", dec!(100)).await;
    let product: ProductId = biz.product("KETTLE").await;
    let batch: BatchId = biz.batch(product, "K1", dec!(5), None).await;

    let mut returned = line(dec!(2), dec!(20), dec!(4));
    returned.product_id = Some(product);
    returned.batch_id = Some(batch);
    returned.unit_cost = Some(dec!(2.50));
    returned.restock = true;

    let note = biz
        .ops
        .issue_credit_note(credit_note(&biz, invoice, vec![returned]))
        .await
        .unwrap();
    assert_eq!(note.movements.len(), 1);
    assert_eq!(note.movements[0].quantity_change, dec!(2));
    let inventory_line = note.posting.lines.iter().find(|l| l.account_code == "1200").unwrap();
    assert_eq!(inventory_line.debit, dec!(5.00));

    let drift = biz.ops.reconcile_product_stock(biz.business_id, product).await.unwrap();
    assert_eq!(drift.recorded, dec!(7));
    assert!(!drift.has_drift());

    biz.ops
        .cancel_credit_note(biz.business_id, note.credit_note.id.into(), biz.actor_id)
        .await
        .unwrap();
    let drift = biz.ops.reconcile_product_stock(biz.business_id, product).await.unwrap();
    assert_eq!(drift.computed, dec!(5));
    assert!(!drift.has_drift());
}

#[tokio::test]
async fn test_restock_into_expired_batch_leaves_product_stock() {
    let Some(biz) = common::setup().await else { return };
    let customer = biz.customer().await;
    let (invoice, _) = biz.invoice(customer, "INV-1", dec!(100)).await;
    let product = biz.product("MILK").await;
    let fresh = biz.batch(product, "M-NEW", dec!(3), Some(days_from_today(20))).await;
    let stale = biz.batch(product, "M-OLD", dec!(4), Some(days_from_today(-3))).await;
    biz.ops.deactivate_expired(biz.business_id).await.unwrap();
    assert_eq!(product_stock(&biz, product).await, dec!(3));

    let mut returned = line(dec!(2), dec!(10), dec!(0));
    returned.product_id = Some(product);
    returned.batch_id = Some(stale);
    returned.unit_cost = Some(dec!(2.50));
    returned.restock = true;
    let note = biz
        .ops
        .issue_credit_note(credit_note(&biz, invoice, vec![returned]))
        .await
        .unwrap();
    assert_eq!(note.movements[0].quantity_change, dec!(2));
    assert_eq!(batch_quantity(&biz, stale).await, dec!(6));
    assert_eq!(product_stock(&biz, product).await, dec!(3));

    let drift = biz.ops.reconcile_product_stock(biz.business_id, product).await.unwrap();
    assert_eq!(drift.computed, dec!(3));
    assert!(!drift.has_drift());

    biz.ops
        .cancel_credit_note(biz.business_id, note.credit_note.id.into(), biz.actor_id)
        .await
        .unwrap();
    assert_eq!(batch_quantity(&biz, stale).await, dec!(4));
    assert_eq!(batch_quantity(&biz, fresh).await, dec!(3));
    assert_eq!(product_stock(&biz, product).await, dec!(3));
}

#[tokio::test]
async fn test_refunds_track_type_and_pos_status() {
    let Some(biz) = common::setup().await else { return };
    let transaction = biz.pos_transaction("POS-1", dec!(50)).await;

    let partial = biz
        .ops
        .issue_refund(refund(&biz, transaction, dec!(20), RefundMethod::Card))
        .await
        .unwrap();
    assert_eq!(partial.refund.refund_number, "RF-000001");
    assert_eq!(RefundType::from(partial.refund.refund_type), RefundType::Partial);
    assert_eq!(partial.transaction_status, PosRefundStatus::PartiallyRefunded);
    let bank = partial.posting.lines.iter().find(|l| l.account_code == "1010").unwrap();
    assert_eq!(bank.credit, dec!(20));

    let err = biz
        .ops
        .issue_refund(refund(&biz, transaction, dec!(30.02), RefundMethod::Cash))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Reversal(ReversalError::OverReversal { .. })));

    let rest = biz
        .ops
        .issue_refund(refund(&biz, transaction, dec!(30), RefundMethod::Cash))
        .await
        .unwrap();
    assert_eq!(RefundType::from(rest.refund.refund_type), RefundType::Full);

    let row = pos_transactions::Entity::find_by_id(transaction.into_inner())
        .one(&biz.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.status, PosTransactionStatus::Refunded);

    let count = refunds::Entity::find()
        .filter(refunds::Column::TransactionId.eq(transaction.into_inner()))
        .count(&biz.db)
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn test_missing_source_document() {
    let Some(biz) = common::setup().await else { return };

    let err = biz
        .ops
        .issue_credit_note(credit_note(&biz, InvoiceId::new(), vec![line(dec!(1), dec!(5), dec!(0))]))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Reversal(ReversalError::InvoiceNotFound(_))));
    assert_eq!(AppError::from(err).status_code(), 404);
}
