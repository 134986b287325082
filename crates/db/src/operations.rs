//! The `Operations` facade: one unit of work per top-level call.
//!
//! Repositories take a transaction handle and never commit. Callers outside
//! this crate (HTTP handlers, binaries) go through here, so every operation
//! either persists completely or not at all.

use backoffice_core::fiscal::FiscalPeriod;
use backoffice_core::inventory::{
    AllocationPlan, AllocationRequest, AllocationStrategy, BatchPatch, StockDrift,
};
use backoffice_core::ledger::{AccountPatch, PostingRequest, PostingTotals};
use backoffice_core::reports::TrialBalance;
use backoffice_shared::AppConfig;
use backoffice_shared::config::{AccountCodeMap, InventoryConfig};
use backoffice_shared::types::{
    AccountId, BatchId, BusinessId, CreditNoteId, CustomerId, FiscalPeriodId, GlBatchId,
    InvoiceId, ProductId, UserId, WarehouseId,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;

use crate::entities::{accounts, batches, serial_units, stock_movements};
use crate::error::StoreError;
use crate::repositories::{
    AccountRepository, AppliedCreditNote, CancelledCreditNote, ConsumedStock, CreateAccountInput,
    ExpirySweep, FiscalRepository, InventoryRepository, IssueCreditNoteInput, IssueRefundInput,
    IssuedCreditNote, IssuedRefund, LedgerRepository, NewMovement, PostedBatch,
    ReceiveBatchInput, ReportRepository, ReversalRepository, StockReference,
};
use crate::unit_of_work::UnitOfWork;

/// Runs each operation in its own transaction.
#[derive(Clone)]
pub struct Operations {
    db: DatabaseConnection,
    codes: AccountCodeMap,
    inventory: InventoryConfig,
}

impl Operations {
    /// Creates the facade over a connection pool.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: &AppConfig) -> Self {
        Self {
            db,
            codes: config.ledger.account_codes.clone(),
            inventory: config.inventory.clone(),
        }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Account roles used by automated postings.
    #[must_use]
    pub const fn account_codes(&self) -> &AccountCodeMap {
        &self.codes
    }

    fn today() -> NaiveDate {
        chrono::Utc::now().date_naive()
    }

    // Accounts

    /// Creates an account in the business's chart.
    ///
    /// # Errors
    ///
    /// Returns a ledger error for an invalid or duplicate code.
    #[tracing::instrument(skip(self, input), fields(code = %input.code))]
    pub async fn create_account(
        &self,
        business_id: BusinessId,
        input: CreateAccountInput,
    ) -> Result<accounts::Model, StoreError> {
        let uow = UnitOfWork::begin(&self.db).await?;
        let result = AccountRepository::create(uow.transaction(), business_id, input).await;
        uow.finish(result).await
    }

    /// Applies a typed patch to an account.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound`, or a ledger error if the code of an
    /// account with entries would change.
    #[tracing::instrument(skip(self, patch))]
    pub async fn update_account(
        &self,
        business_id: BusinessId,
        account_id: AccountId,
        patch: AccountPatch,
    ) -> Result<accounts::Model, StoreError> {
        let uow = UnitOfWork::begin(&self.db).await?;
        let result = AccountRepository::update(uow.transaction(), business_id, account_id, patch).await;
        uow.finish(result).await
    }

    /// Lists the chart of accounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_accounts(&self, business_id: BusinessId) -> Result<Vec<accounts::Model>, StoreError> {
        AccountRepository::list(&self.db, business_id).await
    }

    /// Seeds the default chart; accounts that already exist are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    #[tracing::instrument(skip(self))]
    pub async fn seed_default_chart(&self, business_id: BusinessId) -> Result<Vec<accounts::Model>, StoreError> {
        let uow = UnitOfWork::begin(&self.db).await?;
        let result = AccountRepository::seed_default_chart(uow.transaction(), business_id, &self.codes).await;
        uow.finish(result).await
    }

    // Ledger

    /// Posts a balanced batch of GL lines.
    ///
    /// # Errors
    ///
    /// See [`LedgerRepository::post`].
    #[tracing::instrument(skip(self, request), fields(business_id = %request.business_id))]
    pub async fn post_ledger_entry(&self, request: PostingRequest) -> Result<PostedBatch, StoreError> {
        let uow = UnitOfWork::begin(&self.db).await?;
        let result = LedgerRepository::post(uow.transaction(), &request).await;
        uow.finish(result).await
    }

    /// Re-reads a batch and checks it still balances.
    ///
    /// # Errors
    ///
    /// Returns `BatchNotFound` or `CorruptBatch`.
    pub async fn verify_batch(
        &self,
        business_id: BusinessId,
        batch_id: GlBatchId,
    ) -> Result<PostingTotals, StoreError> {
        LedgerRepository::verify_batch(&self.db, business_id, batch_id).await
    }

    // Fiscal periods

    /// Creates an open fiscal period.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange`, `Overlap` or `NotFound` for an unknown
    /// business.
    #[tracing::instrument(skip(self))]
    pub async fn create_fiscal_period(
        &self,
        business_id: BusinessId,
        name: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<FiscalPeriod, StoreError> {
        let uow = UnitOfWork::begin(&self.db).await?;
        let result = FiscalRepository::create(uow.transaction(), business_id, name, start_date, end_date).await;
        uow.finish(result).await
    }

    /// Lists fiscal periods by start date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_fiscal_periods(&self, business_id: BusinessId) -> Result<Vec<FiscalPeriod>, StoreError> {
        FiscalRepository::list(&self.db, business_id).await
    }

    /// Closes a period whose own entries balance.
    ///
    /// # Errors
    ///
    /// Returns `UnbalancedPeriod`, `InvalidTransition` or `PeriodNotFound`.
    #[tracing::instrument(skip(self))]
    pub async fn close_fiscal_period(
        &self,
        business_id: BusinessId,
        period_id: FiscalPeriodId,
        actor_id: UserId,
    ) -> Result<FiscalPeriod, StoreError> {
        let uow = UnitOfWork::begin(&self.db).await?;
        let result = FiscalRepository::close(uow.transaction(), business_id, period_id, actor_id).await;
        uow.finish(result).await
    }

    /// Reopens a closed period.
    ///
    /// # Errors
    ///
    /// Returns `PeriodLocked` or `PeriodNotFound`.
    #[tracing::instrument(skip(self))]
    pub async fn reopen_fiscal_period(
        &self,
        business_id: BusinessId,
        period_id: FiscalPeriodId,
    ) -> Result<FiscalPeriod, StoreError> {
        let uow = UnitOfWork::begin(&self.db).await?;
        let result = FiscalRepository::reopen(uow.transaction(), business_id, period_id).await;
        uow.finish(result).await
    }

    /// Locks a closed period for good.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` or `PeriodNotFound`.
    #[tracing::instrument(skip(self))]
    pub async fn lock_fiscal_period(
        &self,
        business_id: BusinessId,
        period_id: FiscalPeriodId,
        actor_id: UserId,
    ) -> Result<FiscalPeriod, StoreError> {
        let uow = UnitOfWork::begin(&self.db).await?;
        let result = FiscalRepository::lock(uow.transaction(), business_id, period_id, actor_id).await;
        uow.finish(result).await
    }

    // Reports

    /// Trial balance over every entry dated on or before `as_of`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn trial_balance(&self, business_id: BusinessId, as_of: NaiveDate) -> Result<TrialBalance, StoreError> {
        ReportRepository::trial_balance(&self.db, business_id, as_of).await
    }

    /// Trial balance over entries dated within `from..=to`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` or a database error.
    pub async fn trial_balance_range(
        &self,
        business_id: BusinessId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<TrialBalance, StoreError> {
        ReportRepository::trial_balance_range(&self.db, business_id, from, to).await
    }

    // Inventory

    fn allocation_request(
        &self,
        product_id: ProductId,
        quantity: Decimal,
        strategy: AllocationStrategy,
    ) -> AllocationRequest {
        AllocationRequest {
            product_id,
            quantity,
            strategy,
            today: Self::today(),
            near_expiry_days: self.inventory.near_expiry_days,
        }
    }

    /// Plans an allocation without changing stock.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientStock`, `InvalidQuantity` or `ProductNotFound`.
    #[tracing::instrument(skip(self))]
    pub async fn allocate_stock(
        &self,
        business_id: BusinessId,
        product_id: ProductId,
        quantity: Decimal,
        warehouse_id: Option<WarehouseId>,
        strategy: AllocationStrategy,
    ) -> Result<AllocationPlan, StoreError> {
        let request = self.allocation_request(product_id, quantity, strategy);
        InventoryRepository::allocate(&self.db, business_id, &request, warehouse_id).await
    }

    /// Allocates and draws stock down, retrying the whole unit of work when
    /// a batch changed underneath it.
    ///
    /// # Errors
    ///
    /// Returns `AllocationConflict` once retries run out, or any allocation error.
    #[tracing::instrument(skip(self, reference))]
    pub async fn consume_stock(
        &self,
        business_id: BusinessId,
        product_id: ProductId,
        quantity: Decimal,
        warehouse_id: Option<WarehouseId>,
        strategy: AllocationStrategy,
        reference: StockReference,
    ) -> Result<ConsumedStock, StoreError> {
        let request = self.allocation_request(product_id, quantity, strategy);
        let mut attempt = 0;
        loop {
            let uow = UnitOfWork::begin(&self.db).await?;
            let result =
                InventoryRepository::consume(uow.transaction(), business_id, &request, warehouse_id, &reference)
                    .await;
            match uow.finish(result).await {
                Err(err) if err.is_retryable() && attempt < self.inventory.max_conflict_retries => {
                    attempt += 1;
                    tracing::warn!(attempt, error = %err, "stock consumption conflicted, retrying");
                }
                other => return other,
            }
        }
    }

    /// Records a signed stock movement.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuantity` or `ProductNotFound`.
    #[tracing::instrument(skip(self, movement), fields(product_id = %movement.product_id))]
    pub async fn record_stock_movement(&self, movement: NewMovement) -> Result<stock_movements::Model, StoreError> {
        let uow = UnitOfWork::begin(&self.db).await?;
        let result = InventoryRepository::record_movement(uow.transaction(), movement).await;
        uow.finish(result).await
    }

    /// Receives a new batch.
    ///
    /// # Errors
    ///
    /// Returns `InvalidBatch`, `InvalidQuantity` or `ProductNotFound`.
    #[tracing::instrument(skip(self, input), fields(product_id = %input.product_id))]
    pub async fn receive_batch(&self, input: ReceiveBatchInput) -> Result<batches::Model, StoreError> {
        let uow = UnitOfWork::begin(&self.db).await?;
        let result = InventoryRepository::receive_batch(uow.transaction(), input).await;
        uow.finish(result).await
    }

    /// Applies a typed patch to a batch.
    ///
    /// # Errors
    ///
    /// Returns `BatchNotFound` or `InvalidBatch`.
    #[tracing::instrument(skip(self, patch))]
    pub async fn update_batch(
        &self,
        business_id: BusinessId,
        batch_id: BatchId,
        patch: BatchPatch,
    ) -> Result<batches::Model, StoreError> {
        let uow = UnitOfWork::begin(&self.db).await?;
        let result = InventoryRepository::update_batch(uow.transaction(), business_id, batch_id, patch).await;
        uow.finish(result).await
    }

    /// Reserves quantity on a batch.
    ///
    /// # Errors
    ///
    /// Returns `OverReservation`, `BatchNotActive` or `BatchNotFound`.
    #[tracing::instrument(skip(self))]
    pub async fn reserve_batch(
        &self,
        business_id: BusinessId,
        batch_id: BatchId,
        quantity: Decimal,
    ) -> Result<batches::Model, StoreError> {
        let uow = UnitOfWork::begin(&self.db).await?;
        let result = InventoryRepository::reserve(uow.transaction(), business_id, batch_id, quantity).await;
        uow.finish(result).await
    }

    /// Releases reserved quantity on a batch.
    ///
    /// # Errors
    ///
    /// Returns `OverRelease` or `BatchNotFound`.
    #[tracing::instrument(skip(self))]
    pub async fn release_batch(
        &self,
        business_id: BusinessId,
        batch_id: BatchId,
        quantity: Decimal,
    ) -> Result<batches::Model, StoreError> {
        let uow = UnitOfWork::begin(&self.db).await?;
        let result = InventoryRepository::release(uow.transaction(), business_id, batch_id, quantity).await;
        uow.finish(result).await
    }

    /// Expires one business's batches past their date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    #[tracing::instrument(skip(self))]
    pub async fn deactivate_expired(&self, business_id: BusinessId) -> Result<ExpirySweep, StoreError> {
        self.deactivate_expired_on(business_id, Self::today()).await
    }

    async fn deactivate_expired_on(
        &self,
        business_id: BusinessId,
        today: NaiveDate,
    ) -> Result<ExpirySweep, StoreError> {
        let uow = UnitOfWork::begin(&self.db).await?;
        let result = InventoryRepository::deactivate_expired(uow.transaction(), business_id, today).await;
        uow.finish(result).await
    }

    /// Runs the expiry sweep for every business with something due, one
    /// unit of work per business. A failing business is logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the businesses cannot be listed.
    pub async fn sweep_all_expired(&self) -> Result<Vec<(BusinessId, ExpirySweep)>, StoreError> {
        let today = Self::today();
        let due = InventoryRepository::businesses_with_expired(&self.db, today).await?;
        let mut swept = Vec::with_capacity(due.len());
        for business_id in due {
            match self.deactivate_expired_on(business_id, today).await {
                Ok(sweep) => swept.push((business_id, sweep)),
                Err(err) => {
                    tracing::error!(business_id = %business_id, error = %err, "expiry sweep failed");
                }
            }
        }
        Ok(swept)
    }

    /// Recomputes a product's stock from its batches.
    ///
    /// # Errors
    ///
    /// Returns `ProductNotFound`.
    #[tracing::instrument(skip(self))]
    pub async fn reconcile_product_stock(
        &self,
        business_id: BusinessId,
        product_id: ProductId,
    ) -> Result<StockDrift, StoreError> {
        let uow = UnitOfWork::begin(&self.db).await?;
        let result = InventoryRepository::reconcile_product_stock(uow.transaction(), business_id, product_id).await;
        uow.finish(result).await
    }

    /// Marks a serialized unit sold.
    ///
    /// # Errors
    ///
    /// Returns `SerialNotFound` or `SerialAlreadySold`.
    #[tracing::instrument(skip(self))]
    pub async fn sell_serial_unit(
        &self,
        business_id: BusinessId,
        serial_number: &str,
        customer_id: Option<CustomerId>,
        invoice_id: Option<InvoiceId>,
    ) -> Result<serial_units::Model, StoreError> {
        let uow = UnitOfWork::begin(&self.db).await?;
        let result = InventoryRepository::sell_serial_unit(
            uow.transaction(),
            business_id,
            serial_number,
            customer_id,
            invoice_id,
        )
        .await;
        uow.finish(result).await
    }

    // Reversals

    /// Issues a credit note against an invoice.
    ///
    /// # Errors
    ///
    /// See [`ReversalRepository::issue_credit_note`].
    pub async fn issue_credit_note(&self, input: IssueCreditNoteInput) -> Result<IssuedCreditNote, StoreError> {
        let uow = UnitOfWork::begin(&self.db).await?;
        let result = ReversalRepository::issue_credit_note(uow.transaction(), &self.codes, input).await;
        uow.finish(result).await
    }

    /// Issues a refund against a POS transaction.
    ///
    /// # Errors
    ///
    /// See [`ReversalRepository::issue_refund`].
    pub async fn issue_refund(&self, input: IssueRefundInput) -> Result<IssuedRefund, StoreError> {
        let uow = UnitOfWork::begin(&self.db).await?;
        let result = ReversalRepository::issue_refund(uow.transaction(), &self.codes, input).await;
        uow.finish(result).await
    }

    /// Applies an issued credit note to an invoice.
    ///
    /// # Errors
    ///
    /// See [`ReversalRepository::apply_credit_note`].
    pub async fn apply_credit_note(
        &self,
        business_id: BusinessId,
        credit_note_id: CreditNoteId,
        target_invoice_id: InvoiceId,
        amount: Option<Decimal>,
    ) -> Result<AppliedCreditNote, StoreError> {
        let uow = UnitOfWork::begin(&self.db).await?;
        let result = ReversalRepository::apply_credit_note(
            uow.transaction(),
            business_id,
            credit_note_id,
            target_invoice_id,
            amount,
        )
        .await;
        uow.finish(result).await
    }

    /// Cancels an issued credit note as of today.
    ///
    /// # Errors
    ///
    /// See [`ReversalRepository::cancel_credit_note`].
    pub async fn cancel_credit_note(
        &self,
        business_id: BusinessId,
        credit_note_id: CreditNoteId,
        actor_id: UserId,
    ) -> Result<CancelledCreditNote, StoreError> {
        let uow = UnitOfWork::begin(&self.db).await?;
        let result = ReversalRepository::cancel_credit_note(
            uow.transaction(),
            business_id,
            credit_note_id,
            actor_id,
            Self::today(),
        )
        .await;
        uow.finish(result).await
    }
}
