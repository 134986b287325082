//! The all-businesses expiry sweep driven by the sweeper worker.
//!
//! Lives in its own test binary: it touches every business, so it must not
//! run in parallel with tests asserting on a single business's sweep.

mod common;

use backoffice_db::entities::{batches, sea_orm_active_enums::BatchStatus};
use rust_decimal_macros::dec;
use sea_orm::EntityTrait;

use common::days_from_today;

#[tokio::test]
async fn test_sweep_all_covers_each_business_once() {
    let Some(a) = common::setup().await else { return };
    let Some(b) = common::setup().await else { return };

    let milk = a.product("MILK").await;
    let stale_a = a.batch(milk, "A-OLD", dec!(3), Some(days_from_today(-2))).await;
    let bread = b.product("BREAD").await;
    let stale_b = b.batch(bread, "B-OLD", dec!(2), Some(days_from_today(-1))).await;
    let fresh_b = b.batch(bread, "B-NEW", dec!(5), Some(days_from_today(10))).await;

    let swept = a.ops.sweep_all_expired().await.unwrap();

    let for_a = swept.iter().find(|(id, _)| *id == a.business_id).map(|(_, s)| s);
    let for_b = swept.iter().find(|(id, _)| *id == b.business_id).map(|(_, s)| s);
    assert_eq!(for_a.map(|s| s.expired_batches.clone()), Some(vec![stale_a]));
    assert_eq!(for_b.map(|s| s.expired_batches.clone()), Some(vec![stale_b]));

    let fresh = batches::Entity::find_by_id(fresh_b.into_inner())
        .one(&b.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fresh.status, BatchStatus::Active);

    let again = a.ops.sweep_all_expired().await.unwrap();
    assert!(again.iter().all(|(id, _)| *id != a.business_id && *id != b.business_id));
}
