//! Report repository: trial balance reads over `gl_entries`.
//!
//! Sums are pushed down to Postgres and grouped per account; the pure
//! [`TrialBalanceCalculator`] turns them into rows, totals and a verdict.

use std::collections::HashMap;

use backoffice_core::ledger::PostingTotals;
use backoffice_core::reports::{AccountActivity, TrialBalance, TrialBalanceCalculator};
use backoffice_shared::types::{AccountId, BusinessId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult, QueryFilter, QuerySelect};
use uuid::Uuid;

use crate::entities::{accounts, gl_entries};
use crate::error::StoreError;

#[derive(Debug, FromQueryResult)]
struct ActivityRow {
    account_id: Uuid,
    total_debit: Option<Decimal>,
    total_credit: Option<Decimal>,
}

#[derive(Debug, FromQueryResult)]
struct TotalsRow {
    total_debit: Option<Decimal>,
    total_credit: Option<Decimal>,
}

/// Read-side ledger aggregation. Safe to call concurrently.
pub struct ReportRepository;

impl ReportRepository {
    /// Trial balance over every line dated on or before `as_of`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn trial_balance<C: ConnectionTrait>(
        conn: &C,
        business_id: BusinessId,
        as_of: NaiveDate,
    ) -> Result<TrialBalance, StoreError> {
        let activity = Self::account_activity(conn, business_id, None, as_of).await?;
        Ok(TrialBalanceCalculator::compute(business_id, as_of, activity))
    }

    /// Trial balance over lines dated within `[from, to]`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` if `from > to`, or a database error.
    pub async fn trial_balance_range<C: ConnectionTrait>(
        conn: &C,
        business_id: BusinessId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<TrialBalance, StoreError> {
        TrialBalanceCalculator::validate_range(from, to)?;
        let activity = Self::account_activity(conn, business_id, Some(from), to).await?;
        Ok(TrialBalanceCalculator::compute_range(business_id, from, to, activity)?)
    }

    /// Grand debit/credit totals for `[from, to]`, used when closing a period.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn period_totals<C: ConnectionTrait>(
        conn: &C,
        business_id: BusinessId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<PostingTotals, StoreError> {
        let row = gl_entries::Entity::find()
            .select_only()
            .column_as(Expr::col(gl_entries::Column::Debit).sum(), "total_debit")
            .column_as(Expr::col(gl_entries::Column::Credit).sum(), "total_credit")
            .filter(gl_entries::Column::BusinessId.eq(business_id.into_inner()))
            .filter(gl_entries::Column::TransactionDate.gte(from))
            .filter(gl_entries::Column::TransactionDate.lte(to))
            .into_model::<TotalsRow>()
            .one(conn)
            .await?;

        Ok(row.map_or_else(PostingTotals::default, |r| PostingTotals {
            debit: r.total_debit.unwrap_or_default(),
            credit: r.total_credit.unwrap_or_default(),
        }))
    }

    /// Per-account debit and credit sums, optionally bounded below by `from`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn account_activity<C: ConnectionTrait>(
        conn: &C,
        business_id: BusinessId,
        from: Option<NaiveDate>,
        to: NaiveDate,
    ) -> Result<Vec<AccountActivity>, StoreError> {
        let mut query = gl_entries::Entity::find()
            .select_only()
            .column(gl_entries::Column::AccountId)
            .column_as(Expr::col(gl_entries::Column::Debit).sum(), "total_debit")
            .column_as(Expr::col(gl_entries::Column::Credit).sum(), "total_credit")
            .filter(gl_entries::Column::BusinessId.eq(business_id.into_inner()))
            .filter(gl_entries::Column::TransactionDate.lte(to))
            .group_by(gl_entries::Column::AccountId);

        if let Some(from) = from {
            query = query.filter(gl_entries::Column::TransactionDate.gte(from));
        }

        let rows = query.into_model::<ActivityRow>().all(conn).await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|r| r.account_id).collect();
        let accounts: HashMap<Uuid, accounts::Model> = accounts::Entity::find()
            .filter(accounts::Column::Id.is_in(ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let account = accounts.get(&row.account_id)?;
                Some(AccountActivity {
                    account_id: AccountId::from_uuid(account.id),
                    code: account.code.clone(),
                    name: account.name.clone(),
                    account_type: account.account_type.into(),
                    total_debit: row.total_debit.unwrap_or_default(),
                    total_credit: row.total_credit.unwrap_or_default(),
                })
            })
            .collect())
    }
}
