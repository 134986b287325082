//! Greedy FEFO/FIFO lot allocation.

use std::cmp::Ordering;

use backoffice_shared::Notice;
use backoffice_shared::types::ProductId;
use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;

use super::error::InventoryError;
use super::types::{AllocationLine, AllocationPlan, AllocationStrategy, BatchCandidate};

/// Notice code for lots drawn close to their expiry date.
pub const NEAR_EXPIRY: &str = "NEAR_EXPIRY";

/// Parameters for one allocation.
#[derive(Debug, Clone, Copy)]
pub struct AllocationRequest {
    /// Product to allocate.
    pub product_id: ProductId,
    /// Quantity to cover exactly.
    pub quantity: Decimal,
    /// Draw order.
    pub strategy: AllocationStrategy,
    /// Business date used for expiry checks.
    pub today: NaiveDate,
    /// Lots expiring within this many days raise a notice.
    pub near_expiry_days: u32,
}

/// Plans which batches satisfy a quantity. Never mutates batches.
pub struct LotAllocator;

impl LotAllocator {
    /// Build an allocation plan over `candidates`.
    ///
    /// Batches with nothing available or already past expiry are skipped.
    /// The rest are ordered by the strategy and drawn greedily, each giving
    /// `min(available, remaining)`. Either the whole quantity is covered or
    /// nothing is returned.
    ///
    /// # Errors
    ///
    /// - `InvalidQuantity` if the request is not positive
    /// - `InsufficientStock { needed, available }` if the batches run out
    pub fn plan(
        request: &AllocationRequest,
        mut candidates: Vec<BatchCandidate>,
    ) -> Result<AllocationPlan, InventoryError> {
        if request.quantity <= Decimal::ZERO {
            return Err(InventoryError::InvalidQuantity(request.quantity));
        }

        candidates.retain(|c| {
            c.available() > Decimal::ZERO && c.expiry_date.is_none_or(|exp| exp >= request.today)
        });
        Self::sort(&mut candidates, request.strategy);

        let mut remaining = request.quantity;
        let mut lines = Vec::new();
        for batch in &candidates {
            if remaining.is_zero() {
                break;
            }
            let take = batch.available().min(remaining);
            remaining -= take;
            lines.push(AllocationLine {
                batch_id: batch.batch_id,
                batch_number: batch.batch_number.clone(),
                quantity: take,
                cost_price: batch.cost_price,
                expiry_date: batch.expiry_date,
                created_at: batch.created_at,
            });
        }

        if remaining > Decimal::ZERO {
            return Err(InventoryError::InsufficientStock {
                needed: request.quantity,
                available: request.quantity - remaining,
            });
        }

        let total_cost = lines.iter().map(AllocationLine::line_cost).sum();
        let notices = Self::near_expiry_notices(&lines, request.today, request.near_expiry_days);

        Ok(AllocationPlan {
            product_id: request.product_id,
            strategy: request.strategy,
            requested: request.quantity,
            lines,
            total_cost,
            notices,
        })
    }

    /// Order candidates for the given strategy.
    ///
    /// FEFO: expiry ascending with undated batches last. FIFO: receipt time.
    /// Ties fall back to receipt time, then batch ID.
    pub fn sort(candidates: &mut [BatchCandidate], strategy: AllocationStrategy) {
        candidates.sort_by(|a, b| {
            let primary = match strategy {
                AllocationStrategy::Fefo => Self::cmp_expiry(a.expiry_date, b.expiry_date),
                AllocationStrategy::Fifo => Ordering::Equal,
            };
            primary
                .then_with(|| a.created_at.cmp(&b.created_at))
                .then_with(|| a.batch_id.cmp(&b.batch_id))
        });
    }

    fn cmp_expiry(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
        match (a, b) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }

    fn near_expiry_notices(lines: &[AllocationLine], today: NaiveDate, days: u32) -> Vec<Notice> {
        let Some(horizon) = today.checked_add_days(Days::new(u64::from(days))) else {
            return Vec::new();
        };
        lines
            .iter()
            .filter_map(|line| {
                let expiry = line.expiry_date?;
                (expiry <= horizon).then(|| {
                    Notice::warning(
                        NEAR_EXPIRY,
                        format!(
                            "Batch {} expires on {expiry}, {} units allocated",
                            line.batch_number, line.quantity
                        ),
                    )
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backoffice_shared::types::BatchId;
    use chrono::{DateTime, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 6, day, 9, 0, 0).unwrap()
    }

    fn batch(number: &str, qty: Decimal, expiry: Option<NaiveDate>, created: DateTime<Utc>) -> BatchCandidate {
        BatchCandidate {
            batch_id: BatchId::new(),
            batch_number: number.to_string(),
            quantity: qty,
            reserved_quantity: Decimal::ZERO,
            cost_price: dec!(2.50),
            expiry_date: expiry,
            created_at: created,
        }
    }

    fn request(quantity: Decimal, strategy: AllocationStrategy) -> AllocationRequest {
        AllocationRequest {
            product_id: ProductId::new(),
            quantity,
            strategy,
            today: date(2023, 12, 1),
            near_expiry_days: 0,
        }
    }

    #[test]
    fn test_fefo_draws_earliest_expiry_first() {
        let b1 = batch("B1", dec!(5), Some(date(2024, 1, 1)), at(2));
        let b2 = batch("B2", dec!(5), Some(date(2024, 3, 1)), at(1));
        let (id1, id2) = (b1.batch_id, b2.batch_id);

        let plan = LotAllocator::plan(&request(dec!(7), AllocationStrategy::Fefo), vec![b2, b1]).unwrap();

        assert_eq!(plan.lines.len(), 2);
        assert_eq!((plan.lines[0].batch_id, plan.lines[0].quantity), (id1, dec!(5)));
        assert_eq!((plan.lines[1].batch_id, plan.lines[1].quantity), (id2, dec!(2)));
        assert_eq!(plan.total_cost, dec!(17.50));
    }

    #[test]
    fn test_fifo_ignores_expiry() {
        let older = batch("OLD", dec!(5), Some(date(2024, 6, 1)), at(1));
        let newer = batch("NEW", dec!(5), Some(date(2024, 1, 1)), at(2));
        let (old_id, new_id) = (older.batch_id, newer.batch_id);

        let plan = LotAllocator::plan(&request(dec!(7), AllocationStrategy::Fifo), vec![newer, older]).unwrap();

        assert_eq!((plan.lines[0].batch_id, plan.lines[0].quantity), (old_id, dec!(5)));
        assert_eq!((plan.lines[1].batch_id, plan.lines[1].quantity), (new_id, dec!(2)));
    }

    #[test]
    fn test_fefo_puts_undated_batches_last() {
        let undated = batch("ND", dec!(10), None, at(1));
        let dated = batch("D", dec!(10), Some(date(2025, 1, 1)), at(2));
        let dated_id = dated.batch_id;

        let plan = LotAllocator::plan(&request(dec!(3), AllocationStrategy::Fefo), vec![undated, dated]).unwrap();
        assert_eq!(plan.lines.len(), 1);
        assert_eq!(plan.lines[0].batch_id, dated_id);
    }

    #[test]
    fn test_respects_reservations() {
        let mut b = batch("R", dec!(10), None, at(1));
        b.reserved_quantity = dec!(8);
        let err = LotAllocator::plan(&request(dec!(3), AllocationStrategy::Fifo), vec![b]).unwrap_err();
        assert!(matches!(
            err,
            InventoryError::InsufficientStock { needed, available } if needed == dec!(3) && available == dec!(2)
        ));
    }

    #[test]
    fn test_insufficient_stock_returns_nothing() {
        let batches = vec![
            batch("A", dec!(4), None, at(1)),
            batch("B", dec!(4), None, at(2)),
        ];
        let err = LotAllocator::plan(&request(dec!(9), AllocationStrategy::Fefo), batches).unwrap_err();
        assert!(matches!(
            err,
            InventoryError::InsufficientStock { needed, available } if needed == dec!(9) && available == dec!(8)
        ));
    }

    #[test]
    fn test_rejects_non_positive_quantity() {
        assert!(matches!(
            LotAllocator::plan(&request(dec!(0), AllocationStrategy::Fefo), vec![]),
            Err(InventoryError::InvalidQuantity(_))
        ));
    }

    #[test]
    fn test_skips_batches_past_expiry() {
        let stale = batch("STALE", dec!(10), Some(date(2023, 11, 30)), at(1));
        let err = LotAllocator::plan(&request(dec!(1), AllocationStrategy::Fefo), vec![stale]).unwrap_err();
        assert!(matches!(err, InventoryError::InsufficientStock { .. }));
    }

    #[test]
    fn test_fractional_quantities() {
        let b = batch("KG", dec!(2.750), None, at(1));
        let plan = LotAllocator::plan(&request(dec!(1.125), AllocationStrategy::Fifo), vec![b]).unwrap();
        assert_eq!(plan.lines[0].quantity, dec!(1.125));
    }

    #[test]
    fn test_near_expiry_notice() {
        let soon = batch("SOON", dec!(5), Some(date(2023, 12, 10)), at(1));
        let mut req = request(dec!(2), AllocationStrategy::Fefo);
        req.near_expiry_days = 30;

        let plan = LotAllocator::plan(&req, vec![soon]).unwrap();
        assert_eq!(plan.notices.len(), 1);
        assert_eq!(plan.notices[0].code, NEAR_EXPIRY);
        assert!(plan.notices[0].message.contains("SOON"));
    }
}
