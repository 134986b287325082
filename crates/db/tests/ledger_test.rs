//! Integration tests for posting, fiscal periods and the trial balance.

mod common;

use backoffice_core::fiscal::{FiscalError, FiscalPeriodStatus, NO_FISCAL_PERIOD};
use backoffice_core::ledger::{GlLineInput, LedgerError, PostingRequest};
use backoffice_db::StoreError;
use backoffice_db::entities::gl_entries;
use backoffice_shared::Severity;
use chrono::NaiveDate;
use futures::future::join_all;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter};

use common::TestBusiness;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn sale(biz: &TestBusiness, on: NaiveDate, amount: rust_decimal::Decimal) -> PostingRequest {
    PostingRequest {
        business_id: biz.business_id,
        transaction_date: on,
        description: "Cash sale".to_string(),
        reference_type: "manual".to_string(),
        reference_id: None,
        actor_id: biz.actor_id,
        lines: vec![GlLineInput::debit("1000", amount), GlLineInput::credit("4000", amount)],
    }
}

async fn entry_count(biz: &TestBusiness) -> u64 {
    gl_entries::Entity::find()
        .filter(gl_entries::Column::BusinessId.eq(biz.business_id.into_inner()))
        .count(&biz.db)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_post_balanced_batch_and_verify() {
    let Some(biz) = common::setup().await else { return };

    let posted = biz.ops.post_ledger_entry(sale(&biz, date(2024, 3, 5), dec!(120.50))).await.unwrap();
    assert_eq!(posted.lines.len(), 2);
    assert_eq!(posted.totals.debit, dec!(120.50));
    assert!(posted.totals.is_balanced());

    // No fiscal period covers the date: allowed, with a warning.
    assert_eq!(posted.notices.len(), 1);
    assert_eq!(posted.notices[0].code, NO_FISCAL_PERIOD);
    assert_eq!(posted.notices[0].severity, Severity::Warning);

    let totals = biz.ops.verify_batch(biz.business_id, posted.batch_id).await.unwrap();
    assert_eq!(totals.credit, dec!(120.50));
}

#[tokio::test]
async fn test_unbalanced_posting_writes_nothing() {
    let Some(biz) = common::setup().await else { return };

    let mut request = sale(&biz, date(2024, 3, 5), dec!(100));
    request.lines[1].credit = dec!(99.98);

    let err = biz.ops.post_ledger_entry(request).await.unwrap_err();
    assert!(matches!(err, StoreError::Ledger(LedgerError::UnbalancedEntry { .. })));
    assert_eq!(err.severity(), Severity::Fatal);
    assert_eq!(entry_count(&biz).await, 0);
}

#[tokio::test]
async fn test_unknown_account_rejected() {
    let Some(biz) = common::setup().await else { return };

    let mut request = sale(&biz, date(2024, 3, 5), dec!(10));
    request.lines[1].account_code = "9999".to_string();

    let err = biz.ops.post_ledger_entry(request).await.unwrap_err();
    assert!(matches!(err, StoreError::Ledger(LedgerError::UnknownAccount(code)) if code == "9999"));
    assert_eq!(entry_count(&biz).await, 0);
}

#[tokio::test]
async fn test_period_lifecycle_guards_posting() {
    let Some(biz) = common::setup().await else { return };
    let ops = &biz.ops;

    let march = ops
        .create_fiscal_period(biz.business_id, "March 2024", date(2024, 3, 1), date(2024, 3, 31))
        .await
        .unwrap();
    let posted = ops.post_ledger_entry(sale(&biz, date(2024, 3, 10), dec!(50))).await.unwrap();
    assert!(posted.notices.is_empty());

    let closed = ops.close_fiscal_period(biz.business_id, march.id, biz.actor_id).await.unwrap();
    assert_eq!(closed.status, FiscalPeriodStatus::Closed);
    assert_eq!(closed.closed_by, Some(biz.actor_id));

    let err = ops.post_ledger_entry(sale(&biz, date(2024, 3, 11), dec!(5))).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::Fiscal(FiscalError::PeriodClosed { ref name, .. }) if name == "March 2024"
    ));

    let reopened = ops.reopen_fiscal_period(biz.business_id, march.id).await.unwrap();
    assert_eq!(reopened.status, FiscalPeriodStatus::Open);
    assert_eq!(reopened.closed_by, None);
    ops.post_ledger_entry(sale(&biz, date(2024, 3, 11), dec!(5))).await.unwrap();

    ops.close_fiscal_period(biz.business_id, march.id, biz.actor_id).await.unwrap();
    let locked = ops.lock_fiscal_period(biz.business_id, march.id, biz.actor_id).await.unwrap();
    assert_eq!(locked.status, FiscalPeriodStatus::Locked);

    let err = ops.reopen_fiscal_period(biz.business_id, march.id).await.unwrap_err();
    assert!(matches!(err, StoreError::Fiscal(FiscalError::PeriodLocked(_))));
}

#[tokio::test]
async fn test_lock_requires_closed_period() {
    let Some(biz) = common::setup().await else { return };

    let period = biz
        .ops
        .create_fiscal_period(biz.business_id, "Q2", date(2024, 4, 1), date(2024, 6, 30))
        .await
        .unwrap();
    let err = biz
        .ops
        .lock_fiscal_period(biz.business_id, period.id, biz.actor_id)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Fiscal(FiscalError::InvalidTransition { .. })));

    let periods = biz.ops.list_fiscal_periods(biz.business_id).await.unwrap();
    assert_eq!(periods[0].status, FiscalPeriodStatus::Open);
}

#[tokio::test]
async fn test_overlapping_period_rejected() {
    let Some(biz) = common::setup().await else { return };

    biz.ops
        .create_fiscal_period(biz.business_id, "FY24 H1", date(2024, 1, 1), date(2024, 6, 30))
        .await
        .unwrap();
    let err = biz
        .ops
        .create_fiscal_period(biz.business_id, "Q2", date(2024, 4, 1), date(2024, 6, 30))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Fiscal(FiscalError::Overlap(ref name)) if name == "FY24 H1"));
}

#[tokio::test]
async fn test_concurrent_overlapping_periods_create_one() {
    let Some(biz) = common::setup().await else { return };

    let names: Vec<String> = (1..=8).map(|m| format!("From month {m}")).collect();
    let attempts = names.iter().zip(1..=8).map(|(name, m)| {
        biz.ops
            .create_fiscal_period(biz.business_id, name, date(2025, m, 1), date(2025, 12, 31))
    });
    let results = join_all(attempts).await;

    let created = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(created, 1);
    for err in results.into_iter().filter_map(Result::err) {
        assert!(matches!(err, StoreError::Fiscal(FiscalError::Overlap(_))));
    }

    let periods = biz.ops.list_fiscal_periods(biz.business_id).await.unwrap();
    assert_eq!(periods.len(), 1);
    for (i, a) in periods.iter().enumerate() {
        for b in &periods[i + 1..] {
            assert!(!a.overlaps(b.start_date, b.end_date));
        }
    }
}

#[tokio::test]
async fn test_trial_balance_as_of() {
    let Some(biz) = common::setup().await else { return };

    for (day, amount) in [(1, dec!(10.10)), (15, dec!(20.20)), (28, dec!(30.30))] {
        biz.ops.post_ledger_entry(sale(&biz, date(2024, 2, day), amount)).await.unwrap();
    }

    let tb = biz.ops.trial_balance(biz.business_id, date(2024, 2, 15)).await.unwrap();
    assert!(tb.balanced);
    assert_eq!(tb.totals.total_debit, dec!(30.30));
    assert_eq!(tb.rows.len(), 2);

    let cash = tb.rows.iter().find(|r| r.code == "1000").unwrap();
    assert_eq!(cash.balance, dec!(30.30));
    let revenue = tb.rows.iter().find(|r| r.code == "4000").unwrap();
    assert_eq!(revenue.balance, dec!(30.30));

    let range = biz
        .ops
        .trial_balance_range(biz.business_id, date(2024, 2, 2), date(2024, 2, 29))
        .await
        .unwrap();
    assert_eq!(range.totals.total_credit, dec!(50.50));
}

#[tokio::test]
async fn test_gl_entries_are_immutable() {
    let Some(biz) = common::setup().await else { return };

    biz.ops.post_ledger_entry(sale(&biz, date(2024, 5, 1), dec!(1))).await.unwrap();
    let result = biz
        .db
        .execute_unprepared(&format!(
            "UPDATE gl_entries SET debit = debit + 1 WHERE business_id = '{}'",
            biz.business_id
        ))
        .await;
    assert!(result.is_err());
}
