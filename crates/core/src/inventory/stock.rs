//! Reservation, expiry and stock-level rules.

use backoffice_shared::types::{BatchId, ProductId};
use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::error::InventoryError;
use super::types::{BatchPatch, BatchStatus, SerialStatus, StockDrift};

/// A batch's stock-relevant state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLevel {
    /// On-hand quantity.
    pub quantity: Decimal,
    /// Reserved quantity.
    pub reserved_quantity: Decimal,
    /// Status.
    pub status: BatchStatus,
    /// Soft-delete flag.
    pub is_deleted: bool,
}

/// Fields of a batch being received.
#[derive(Debug, Clone, Copy)]
pub struct NewBatchFields {
    /// Quantity received.
    pub quantity: Decimal,
    /// Unit cost.
    pub cost_price: Decimal,
    /// Maximum retail price.
    pub mrp: Decimal,
    /// Expiry date.
    pub expiry_date: Option<NaiveDate>,
    /// Manufacturing date.
    pub manufacturing_date: Option<NaiveDate>,
}

/// Pure stock rules shared by the inventory ledger.
pub struct StockRules;

impl StockRules {
    /// New reserved quantity after reserving `requested`.
    ///
    /// # Errors
    ///
    /// - `InvalidQuantity` if `requested` is not positive
    /// - `BatchNotActive` if the batch is expired or deleted
    /// - `OverReservation` if it would drive `quantity - reserved` below zero
    pub fn reserve(
        batch_id: BatchId,
        level: &BatchLevel,
        requested: Decimal,
    ) -> Result<Decimal, InventoryError> {
        Self::require_positive(requested)?;
        if level.status != BatchStatus::Active || level.is_deleted {
            return Err(InventoryError::BatchNotActive(batch_id));
        }
        let available = level.quantity - level.reserved_quantity;
        if requested > available {
            return Err(InventoryError::OverReservation {
                batch_id,
                requested,
                available,
            });
        }
        Ok(level.reserved_quantity + requested)
    }

    /// New reserved quantity after releasing `requested`.
    ///
    /// # Errors
    ///
    /// - `InvalidQuantity` if `requested` is not positive
    /// - `OverRelease` if more is released than is reserved
    pub fn release(
        batch_id: BatchId,
        level: &BatchLevel,
        requested: Decimal,
    ) -> Result<Decimal, InventoryError> {
        Self::require_positive(requested)?;
        if requested > level.reserved_quantity {
            return Err(InventoryError::OverRelease {
                batch_id,
                requested,
                reserved: level.reserved_quantity,
            });
        }
        Ok(level.reserved_quantity - requested)
    }

    /// Returns true if a batch with this expiry must be flipped to expired.
    #[must_use]
    pub fn is_expired(expiry_date: Option<NaiveDate>, today: NaiveDate) -> bool {
        expiry_date.is_some_and(|exp| exp < today)
    }

    /// Only active, non-deleted batches count toward product stock.
    #[must_use]
    pub fn counts_toward_stock(level: &BatchLevel) -> bool {
        level.status == BatchStatus::Active && !level.is_deleted
    }

    /// Product stock derived from its batches: active, non-deleted quantity.
    pub fn active_stock<'a>(levels: impl IntoIterator<Item = &'a BatchLevel>) -> Decimal {
        levels
            .into_iter()
            .filter(|l| Self::counts_toward_stock(l))
            .map(|l| l.quantity)
            .sum()
    }

    /// Compare recorded stock against the batch-derived value.
    #[must_use]
    pub fn drift(product_id: ProductId, recorded: Decimal, computed: Decimal) -> StockDrift {
        StockDrift {
            product_id,
            recorded,
            computed,
        }
    }

    /// A movement must change something.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuantity` for a zero change.
    pub fn validate_movement(quantity_change: Decimal) -> Result<(), InventoryError> {
        if quantity_change.is_zero() {
            return Err(InventoryError::InvalidQuantity(quantity_change));
        }
        Ok(())
    }

    /// Validate a batch being received.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuantity` or `InvalidBatch`.
    pub fn validate_new_batch(batch_number: &str, fields: &NewBatchFields) -> Result<(), InventoryError> {
        Self::require_positive(fields.quantity)?;
        if batch_number.trim().is_empty() {
            return Err(InventoryError::InvalidBatch("batch number is empty".into()));
        }
        if fields.cost_price < Decimal::ZERO || fields.mrp < Decimal::ZERO {
            return Err(InventoryError::InvalidBatch("prices cannot be negative".into()));
        }
        if let (Some(mfg), Some(exp)) = (fields.manufacturing_date, fields.expiry_date)
            && exp < mfg
        {
            return Err(InventoryError::InvalidBatch(format!(
                "expiry {exp} is before manufacturing {mfg}"
            )));
        }
        Ok(())
    }

    /// Validate a patch against the batch's current dates.
    ///
    /// # Errors
    ///
    /// Returns `InvalidBatch` for an empty lot number, negative prices or
    /// an expiry that would fall before manufacturing.
    pub fn validate_batch_patch(
        patch: &BatchPatch,
        current_expiry: Option<NaiveDate>,
        current_manufacturing: Option<NaiveDate>,
    ) -> Result<(), InventoryError> {
        if patch.batch_number.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(InventoryError::InvalidBatch("batch number is empty".into()));
        }
        if patch.cost_price.is_some_and(|p| p < Decimal::ZERO) || patch.mrp.is_some_and(|p| p < Decimal::ZERO) {
            return Err(InventoryError::InvalidBatch("prices cannot be negative".into()));
        }
        let expiry = patch.expiry_date.or(current_expiry);
        let manufacturing = patch.manufacturing_date.or(current_manufacturing);
        if let (Some(mfg), Some(exp)) = (manufacturing, expiry)
            && exp < mfg
        {
            return Err(InventoryError::InvalidBatch(format!(
                "expiry {exp} is before manufacturing {mfg}"
            )));
        }
        Ok(())
    }

    /// Serialized units only move from in stock to sold.
    ///
    /// # Errors
    ///
    /// Returns `SerialAlreadySold` if the unit is not in stock.
    pub fn validate_serial_sale(serial_number: &str, status: SerialStatus) -> Result<(), InventoryError> {
        match status {
            SerialStatus::InStock => Ok(()),
            SerialStatus::Sold => Err(InventoryError::SerialAlreadySold(serial_number.to_string())),
        }
    }

    fn require_positive(quantity: Decimal) -> Result<(), InventoryError> {
        if quantity <= Decimal::ZERO {
            return Err(InventoryError::InvalidQuantity(quantity));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn level(quantity: Decimal, reserved: Decimal) -> BatchLevel {
        BatchLevel {
            quantity,
            reserved_quantity: reserved,
            status: BatchStatus::Active,
            is_deleted: false,
        }
    }

    #[test]
    fn test_reserve_within_available() {
        let id = BatchId::new();
        assert_eq!(StockRules::reserve(id, &level(dec!(10), dec!(4)), dec!(6)).unwrap(), dec!(10));
    }

    #[test]
    fn test_over_reservation_rejected() {
        let id = BatchId::new();
        let err = StockRules::reserve(id, &level(dec!(10), dec!(4)), dec!(7)).unwrap_err();
        assert!(matches!(
            err,
            InventoryError::OverReservation { requested, available, .. } if requested == dec!(7) && available == dec!(6)
        ));
    }

    #[test]
    fn test_reserve_on_expired_batch_rejected() {
        let mut l = level(dec!(10), dec!(0));
        l.status = BatchStatus::Expired;
        assert!(matches!(
            StockRules::reserve(BatchId::new(), &l, dec!(1)),
            Err(InventoryError::BatchNotActive(_))
        ));
    }

    #[test]
    fn test_release_never_below_zero() {
        let id = BatchId::new();
        assert_eq!(StockRules::release(id, &level(dec!(10), dec!(4)), dec!(4)).unwrap(), dec!(0));
        assert!(matches!(
            StockRules::release(id, &level(dec!(10), dec!(4)), dec!(5)),
            Err(InventoryError::OverRelease { .. })
        ));
    }

    #[test]
    fn test_is_expired() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        assert!(StockRules::is_expired(NaiveDate::from_ymd_opt(2024, 5, 9), today));
        assert!(!StockRules::is_expired(Some(today), today));
        assert!(!StockRules::is_expired(None, today));
    }

    #[test]
    fn test_active_stock_excludes_expired_and_deleted() {
        let mut expired = level(dec!(5), dec!(0));
        expired.status = BatchStatus::Expired;
        let mut deleted = level(dec!(7), dec!(0));
        deleted.is_deleted = true;
        let levels = [level(dec!(3), dec!(1)), expired, deleted, level(dec!(2.5), dec!(0))];
        assert_eq!(StockRules::active_stock(&levels), dec!(5.5));
        assert!(StockRules::counts_toward_stock(&levels[0]));
        assert!(!StockRules::counts_toward_stock(&levels[1]));
        assert!(!StockRules::counts_toward_stock(&levels[2]));
    }

    #[test]
    fn test_drift() {
        let d = StockRules::drift(ProductId::new(), dec!(12), dec!(10));
        assert_eq!(d.drift(), dec!(-2));
        assert!(d.has_drift());
    }

    #[test]
    fn test_new_batch_validation() {
        let mut fields = NewBatchFields {
            quantity: dec!(10),
            cost_price: dec!(1.20),
            mrp: dec!(2.00),
            expiry_date: NaiveDate::from_ymd_opt(2025, 1, 1),
            manufacturing_date: NaiveDate::from_ymd_opt(2024, 1, 1),
        };
        assert!(StockRules::validate_new_batch("LOT-1", &fields).is_ok());
        assert!(StockRules::validate_new_batch(" ", &fields).is_err());

        fields.expiry_date = NaiveDate::from_ymd_opt(2023, 1, 1);
        assert!(matches!(
            StockRules::validate_new_batch("LOT-1", &fields),
            Err(InventoryError::InvalidBatch(_))
        ));
    }

    #[test]
    fn test_batch_patch_checks_merged_dates() {
        let mfg = NaiveDate::from_ymd_opt(2024, 3, 1);
        let patch = BatchPatch {
            expiry_date: NaiveDate::from_ymd_opt(2024, 2, 1),
            ..BatchPatch::default()
        };
        assert!(StockRules::validate_batch_patch(&patch, None, mfg).is_err());
        assert!(StockRules::validate_batch_patch(&BatchPatch::default(), None, mfg).is_ok());

        let renamed = BatchPatch {
            batch_number: Some(String::new()),
            ..BatchPatch::default()
        };
        assert!(StockRules::validate_batch_patch(&renamed, None, None).is_err());
    }

    #[test]
    fn test_serial_only_sells_once() {
        assert!(StockRules::validate_serial_sale("SN-1", SerialStatus::InStock).is_ok());
        assert!(matches!(
            StockRules::validate_serial_sale("SN-1", SerialStatus::Sold),
            Err(InventoryError::SerialAlreadySold(_))
        ));
    }

    #[test]
    fn test_zero_movement_rejected() {
        assert!(StockRules::validate_movement(dec!(0)).is_err());
        assert!(StockRules::validate_movement(dec!(-3)).is_ok());
    }
}
