//! Fiscal period repository: creation, posting guard and transitions.

use backoffice_core::fiscal::{FiscalError, FiscalPeriod, FiscalPeriodGuard};
use backoffice_shared::Notice;
use backoffice_shared::types::{BusinessId, FiscalPeriodId, UserId};
use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use super::report::ReportRepository;
use crate::entities::{businesses, fiscal_periods, sea_orm_active_enums::FiscalPeriodStatus};
use crate::error::StoreError;

/// Fiscal period persistence. Every transition rule lives in
/// [`FiscalPeriodGuard`]; this layer loads, locks and writes.
pub struct FiscalRepository;

impl FiscalRepository {
    /// Creates an open period after checking it against existing ones.
    ///
    /// The business row is locked first, so concurrent creators for one
    /// business check overlap one after another.
    ///
    /// # Errors
    ///
    /// Returns `EmptyName`, `InvalidDateRange`, `Overlap` or `NotFound` for
    /// an unknown business.
    pub async fn create<C: ConnectionTrait>(
        conn: &C,
        business_id: BusinessId,
        name: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<FiscalPeriod, StoreError> {
        businesses::Entity::find_by_id(business_id.into_inner())
            .lock_exclusive()
            .one(conn)
            .await?
            .ok_or(StoreError::NotFound {
                entity: "Business",
                id: business_id.into_inner(),
            })?;
        let existing = Self::list(conn, business_id).await?;
        FiscalPeriodGuard::validate_new_period(name, start_date, end_date, &existing)?;

        let now = Utc::now().into();
        let period = fiscal_periods::ActiveModel {
            id: Set(FiscalPeriodId::new().into_inner()),
            business_id: Set(business_id.into_inner()),
            name: Set(name.trim().to_string()),
            start_date: Set(start_date),
            end_date: Set(end_date),
            status: Set(FiscalPeriodStatus::Open),
            closed_by: Set(None),
            closed_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(conn)
        .await?;

        tracing::info!(
            business_id = %business_id,
            period = %period.name,
            %start_date,
            %end_date,
            "fiscal period created"
        );
        Ok(to_domain(period))
    }

    /// Lists a business's periods ordered by start date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list<C: ConnectionTrait>(
        conn: &C,
        business_id: BusinessId,
    ) -> Result<Vec<FiscalPeriod>, StoreError> {
        let periods = fiscal_periods::Entity::find()
            .filter(fiscal_periods::Column::BusinessId.eq(business_id.into_inner()))
            .order_by_asc(fiscal_periods::Column::StartDate)
            .all(conn)
            .await?;
        Ok(periods.into_iter().map(to_domain).collect())
    }

    /// Blocks posting into a closed or locked period.
    ///
    /// The period row is share-locked so a concurrent close waits for this
    /// unit of work. No period means posting is allowed with a warning.
    ///
    /// # Errors
    ///
    /// Returns `PeriodClosed` naming the period.
    pub async fn assert_open<C: ConnectionTrait>(
        conn: &C,
        business_id: BusinessId,
        date: NaiveDate,
    ) -> Result<Option<Notice>, StoreError> {
        let period = fiscal_periods::Entity::find()
            .filter(fiscal_periods::Column::BusinessId.eq(business_id.into_inner()))
            .filter(fiscal_periods::Column::StartDate.lte(date))
            .filter(fiscal_periods::Column::EndDate.gte(date))
            .lock_shared()
            .one(conn)
            .await?
            .map(to_domain);

        Ok(FiscalPeriodGuard::check_posting(period.as_ref(), date)?)
    }

    /// Closes a period whose own entries balance.
    ///
    /// # Errors
    ///
    /// Returns `PeriodNotFound`, `InvalidTransition` or `UnbalancedPeriod`.
    /// A failed close leaves the status unchanged.
    pub async fn close<C: ConnectionTrait>(
        conn: &C,
        business_id: BusinessId,
        period_id: FiscalPeriodId,
        actor_id: UserId,
    ) -> Result<FiscalPeriod, StoreError> {
        let model = Self::find_locked(conn, business_id, period_id).await?;
        let period = to_domain(model.clone());

        let totals =
            ReportRepository::period_totals(conn, business_id, period.start_date, period.end_date)
                .await?;
        FiscalPeriodGuard::validate_close(&period, totals)?;

        let mut active: fiscal_periods::ActiveModel = model.into();
        let now = Utc::now().into();
        active.status = Set(FiscalPeriodStatus::Closed);
        active.closed_by = Set(Some(actor_id.into_inner()));
        active.closed_at = Set(Some(now));
        active.updated_at = Set(now);

        let closed = active.update(conn).await?;
        tracing::info!(business_id = %business_id, period = %closed.name, "fiscal period closed");
        Ok(to_domain(closed))
    }

    /// Reopens a closed period and clears its closer metadata.
    ///
    /// # Errors
    ///
    /// Returns `PeriodNotFound` or `PeriodLocked`.
    pub async fn reopen<C: ConnectionTrait>(
        conn: &C,
        business_id: BusinessId,
        period_id: FiscalPeriodId,
    ) -> Result<FiscalPeriod, StoreError> {
        let model = Self::find_locked(conn, business_id, period_id).await?;
        let period = to_domain(model.clone());
        FiscalPeriodGuard::validate_reopen(&period)?;

        if period.is_open() {
            return Ok(period);
        }

        let mut active: fiscal_periods::ActiveModel = model.into();
        active.status = Set(FiscalPeriodStatus::Open);
        active.closed_by = Set(None);
        active.closed_at = Set(None);
        active.updated_at = Set(Utc::now().into());

        let reopened = active.update(conn).await?;
        tracing::info!(business_id = %business_id, period = %reopened.name, "fiscal period reopened");
        Ok(to_domain(reopened))
    }

    /// Locks a closed period permanently.
    ///
    /// # Errors
    ///
    /// Returns `PeriodNotFound` or `InvalidTransition`.
    pub async fn lock<C: ConnectionTrait>(
        conn: &C,
        business_id: BusinessId,
        period_id: FiscalPeriodId,
        actor_id: UserId,
    ) -> Result<FiscalPeriod, StoreError> {
        let model = Self::find_locked(conn, business_id, period_id).await?;
        FiscalPeriodGuard::validate_lock(&to_domain(model.clone()))?;

        let mut active: fiscal_periods::ActiveModel = model.into();
        active.status = Set(FiscalPeriodStatus::Locked);
        active.updated_at = Set(Utc::now().into());

        let locked = active.update(conn).await?;
        tracing::warn!(
            business_id = %business_id,
            period = %locked.name,
            actor_id = %actor_id,
            "fiscal period locked"
        );
        Ok(to_domain(locked))
    }

    async fn find_locked<C: ConnectionTrait>(
        conn: &C,
        business_id: BusinessId,
        period_id: FiscalPeriodId,
    ) -> Result<fiscal_periods::Model, StoreError> {
        fiscal_periods::Entity::find_by_id(period_id.into_inner())
            .filter(fiscal_periods::Column::BusinessId.eq(business_id.into_inner()))
            .lock_exclusive()
            .one(conn)
            .await?
            .ok_or_else(|| FiscalError::PeriodNotFound(period_id).into())
    }
}

fn to_domain(model: fiscal_periods::Model) -> FiscalPeriod {
    FiscalPeriod {
        id: FiscalPeriodId::from_uuid(model.id),
        business_id: BusinessId::from_uuid(model.business_id),
        name: model.name,
        start_date: model.start_date,
        end_date: model.end_date,
        status: model.status.into(),
        closed_by: model.closed_by.map(UserId::from_uuid),
        closed_at: model.closed_at.map(|t| t.with_timezone(&Utc)),
    }
}
