//! Property-based tests for LotAllocator.
//!
//! - A plan covers exactly the requested quantity
//! - No batch gives more than it has available
//! - Failure reports the true available total

use backoffice_shared::types::{BatchId, ProductId};
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::allocator::{AllocationRequest, LotAllocator};
use super::error::InventoryError;
use super::types::{AllocationStrategy, BatchCandidate};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

/// (quantity, reserved, expiry offset in days or none, created offset in hours)
fn batch_strategy() -> impl Strategy<Value = BatchCandidate> {
    (1i64..10_000, 0i64..100, prop::option::of(0i64..720), 0i64..10_000).prop_map(
        |(qty, reserved_pct, expiry, created)| {
            let quantity = Decimal::new(qty, 2);
            BatchCandidate {
                batch_id: BatchId::new(),
                batch_number: format!("B{created}"),
                quantity,
                reserved_quantity: (quantity * Decimal::new(reserved_pct, 2)).round_dp(2),
                cost_price: Decimal::new(150, 2),
                expiry_date: expiry.map(|d| today() + Duration::days(d)),
                created_at: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap() + Duration::hours(created),
            }
        },
    )
}

fn strategy() -> impl Strategy<Value = AllocationStrategy> {
    prop_oneof![Just(AllocationStrategy::Fefo), Just(AllocationStrategy::Fifo)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_plan_covers_exact_quantity(
        batches in prop::collection::vec(batch_strategy(), 0..8),
        cents in 1i64..20_000,
        strategy in strategy(),
    ) {
        let quantity = Decimal::new(cents, 2);
        let total_available: Decimal = batches.iter().map(BatchCandidate::available).sum();
        let request = AllocationRequest {
            product_id: ProductId::new(),
            quantity,
            strategy,
            today: today(),
            near_expiry_days: 0,
        };

        match LotAllocator::plan(&request, batches.clone()) {
            Ok(plan) => {
                let allocated: Decimal = plan.lines.iter().map(|l| l.quantity).sum();
                prop_assert_eq!(allocated, quantity);
                for line in &plan.lines {
                    let source = batches.iter().find(|b| b.batch_id == line.batch_id).unwrap();
                    prop_assert!(line.quantity > Decimal::ZERO);
                    prop_assert!(line.quantity <= source.available());
                }
            }
            Err(InventoryError::InsufficientStock { needed, available }) => {
                prop_assert_eq!(needed, quantity);
                prop_assert_eq!(available, total_available);
                prop_assert!(available < quantity);
            }
            Err(other) => prop_assert!(false, "unexpected error: {other}"),
        }
    }

    #[test]
    fn prop_fefo_lines_ordered_by_expiry(
        batches in prop::collection::vec(batch_strategy(), 1..8),
        cents in 1i64..20_000,
    ) {
        let request = AllocationRequest {
            product_id: ProductId::new(),
            quantity: Decimal::new(cents, 2),
            strategy: AllocationStrategy::Fefo,
            today: today(),
            near_expiry_days: 0,
        };
        if let Ok(plan) = LotAllocator::plan(&request, batches) {
            for pair in plan.lines.windows(2) {
                match (pair[0].expiry_date, pair[1].expiry_date) {
                    (Some(a), Some(b)) => prop_assert!(a <= b),
                    (None, Some(_)) => prop_assert!(false, "undated batch drawn before dated one"),
                    (_, None) => {}
                }
            }
        }
    }
}
