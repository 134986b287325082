//! Ledger repository: balanced, atomic GL posting.

use backoffice_core::ledger::{
    GlLineInput, LedgerError, LedgerService, PostingRequest, PostingTotals, ResolvedLine,
};
use backoffice_shared::Notice;
use backoffice_shared::types::{BusinessId, GlBatchId, GlEntryId};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult, JoinType, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait, Set,
};
use serde::Serialize;

use super::account::{AccountRepository, distinct_codes};
use super::fiscal::FiscalRepository;
use crate::entities::{accounts, gl_entries};
use crate::error::StoreError;

/// The result of a successful posting.
#[derive(Debug, Clone, Serialize)]
pub struct PostedBatch {
    /// ID shared by every line of the posting.
    pub batch_id: GlBatchId,
    /// Lines as written.
    pub lines: Vec<PostedLine>,
    /// Debit and credit totals.
    pub totals: PostingTotals,
    /// Non-fatal conditions, e.g. no fiscal period covering the date.
    pub notices: Vec<Notice>,
}

/// One persisted GL line.
#[derive(Debug, Clone, Serialize)]
pub struct PostedLine {
    /// Entry ID.
    pub id: GlEntryId,
    /// Account code posted to.
    pub account_code: String,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
}

#[derive(Debug, FromQueryResult)]
struct BatchLineRow {
    account_code: String,
    debit: Decimal,
    credit: Decimal,
}

/// Writes and re-reads GL batches. Entries are never updated.
pub struct LedgerRepository;

impl LedgerRepository {
    /// Posts a balanced set of lines as one batch.
    ///
    /// Order of checks: line shape and balance, account resolution, then the
    /// fiscal period guard. Nothing is written unless all pass.
    ///
    /// # Errors
    ///
    /// Returns a contract `LedgerError` (unbalanced, unknown account, bad
    /// line shape) or `PeriodClosed` from the guard.
    #[tracing::instrument(
        skip(conn, request),
        fields(business_id = %request.business_id, reference_type = %request.reference_type)
    )]
    pub async fn post<C: ConnectionTrait>(
        conn: &C,
        request: &PostingRequest,
    ) -> Result<PostedBatch, StoreError> {
        LedgerService::validate_lines(&request.lines)?;

        let codes = distinct_codes(request.lines.iter().map(|l| l.account_code.as_str()));
        let accounts = AccountRepository::find_by_codes(conn, request.business_id, &codes).await?;
        let (resolved, totals) =
            LedgerService::validate_and_resolve(request, |code| accounts.get(code).cloned())?;

        let notice =
            FiscalRepository::assert_open(conn, request.business_id, request.transaction_date)
                .await?;

        let batch_id = GlBatchId::new();
        let lines = Self::insert_lines(conn, request, batch_id, resolved).await?;

        tracing::info!(
            batch_id = %batch_id,
            lines = lines.len(),
            debit = %totals.debit,
            "ledger batch posted"
        );

        Ok(PostedBatch {
            batch_id,
            lines,
            totals,
            notices: notice.into_iter().collect(),
        })
    }

    async fn insert_lines<C: ConnectionTrait>(
        conn: &C,
        request: &PostingRequest,
        batch_id: GlBatchId,
        resolved: Vec<ResolvedLine>,
    ) -> Result<Vec<PostedLine>, StoreError> {
        let now: sea_orm::prelude::DateTimeWithTimeZone = chrono::Utc::now().into();
        let mut models = Vec::with_capacity(resolved.len());
        let mut lines = Vec::with_capacity(resolved.len());

        for line in resolved {
            let id = GlEntryId::new();
            models.push(gl_entries::ActiveModel {
                id: Set(id.into_inner()),
                business_id: Set(request.business_id.into_inner()),
                batch_id: Set(batch_id.into_inner()),
                account_id: Set(line.account_id.into_inner()),
                transaction_date: Set(request.transaction_date),
                debit: Set(line.debit),
                credit: Set(line.credit),
                description: Set(request.description.clone()),
                reference_type: Set(request.reference_type.clone()),
                reference_id: Set(request.reference_id),
                created_by: Set(request.actor_id.into_inner()),
                created_at: Set(now),
            });
            lines.push(PostedLine {
                id,
                account_code: line.account_code,
                debit: line.debit,
                credit: line.credit,
            });
        }

        gl_entries::Entity::insert_many(models).exec(conn).await?;
        Ok(lines)
    }

    /// Reads a batch back as posting lines, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `BatchNotFound` if the batch has no lines for the business.
    pub async fn batch_lines<C: ConnectionTrait>(
        conn: &C,
        business_id: BusinessId,
        batch_id: GlBatchId,
    ) -> Result<Vec<GlLineInput>, StoreError> {
        let rows = gl_entries::Entity::find()
            .select_only()
            .column_as(accounts::Column::Code, "account_code")
            .column(gl_entries::Column::Debit)
            .column(gl_entries::Column::Credit)
            .join(JoinType::InnerJoin, gl_entries::Relation::Accounts.def())
            .filter(gl_entries::Column::BusinessId.eq(business_id.into_inner()))
            .filter(gl_entries::Column::BatchId.eq(batch_id.into_inner()))
            .order_by_asc(gl_entries::Column::CreatedAt)
            .order_by_asc(gl_entries::Column::Id)
            .into_model::<BatchLineRow>()
            .all(conn)
            .await?;

        if rows.is_empty() {
            return Err(LedgerError::BatchNotFound(batch_id).into());
        }

        Ok(rows
            .into_iter()
            .map(|r| GlLineInput {
                account_code: r.account_code,
                debit: r.debit,
                credit: r.credit,
            })
            .collect())
    }

    /// Re-reads a posted batch and re-checks its balance.
    ///
    /// # Errors
    ///
    /// Returns `BatchNotFound`, or `CorruptBatch` if it no longer balances.
    pub async fn verify_batch<C: ConnectionTrait>(
        conn: &C,
        business_id: BusinessId,
        batch_id: GlBatchId,
    ) -> Result<PostingTotals, StoreError> {
        let lines = Self::batch_lines(conn, business_id, batch_id).await?;
        let totals = PostingTotals::from_pairs(lines.iter().map(|l| (l.debit, l.credit)));
        if let Err(err) = LedgerService::verify_batch(batch_id, totals) {
            tracing::error!(batch_id = %batch_id, debit = %totals.debit, credit = %totals.credit, "ledger batch failed verification");
            return Err(err.into());
        }
        Ok(totals)
    }
}
