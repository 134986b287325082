//! Demo data seeder for local development.
//!
//! Seeds one business with the default chart of accounts, a fiscal period
//! for the current year, a perishable product with three lots, a customer and
//! an unpaid invoice. Safe to run repeatedly.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use backoffice_core::inventory::NewBatchFields;
use backoffice_db::entities::{
    businesses, customers, invoice_items, invoices, products, sea_orm_active_enums::PaymentStatus,
};
use backoffice_db::repositories::ReceiveBatchInput;
use backoffice_db::{Operations, StoreError, connect};
use backoffice_shared::AppConfig;
use backoffice_shared::types::{BusinessId, ProductId, UserId};
use chrono::{Datelike, Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

/// Demo business ID (consistent for all seeds)
const DEMO_BUSINESS_ID: Uuid = Uuid::from_u128(1);
/// Demo user recorded on seeded postings
const DEMO_USER_ID: Uuid = Uuid::from_u128(2);
const DEMO_CUSTOMER_ID: Uuid = Uuid::from_u128(3);
const DEMO_INVOICE_ID: Uuid = Uuid::from_u128(4);
const DEMO_SKU: &str = "PARA-500";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;

    println!("Connecting to database...");
    let db = connect(&config.database).await.context("failed to connect to database")?;
    let ops = Operations::new(db.clone(), &config);
    let business_id = BusinessId::from_uuid(DEMO_BUSINESS_ID);

    println!("Seeding demo business...");
    seed_business(&db).await?;

    println!("Seeding chart of accounts...");
    let accounts = ops.seed_default_chart(business_id).await?;
    println!("  {} accounts present", accounts.len());

    println!("Seeding fiscal period...");
    seed_fiscal_year(&ops, business_id).await?;

    println!("Seeding product and lots...");
    let product_id = seed_product(&db).await?;
    seed_lots(&ops, business_id, product_id).await?;

    println!("Seeding customer and invoice...");
    seed_customer_invoice(&db).await?;

    println!("Seeding complete!");
    println!("  X-Business-Id: {DEMO_BUSINESS_ID}");
    println!("  X-Actor-Id:    {DEMO_USER_ID}");
    Ok(())
}

async fn seed_business(db: &DatabaseConnection) -> anyhow::Result<()> {
    if businesses::Entity::find_by_id(DEMO_BUSINESS_ID).one(db).await?.is_some() {
        println!("  Demo business already exists, skipping...");
        return Ok(());
    }

    let now = Utc::now().fixed_offset();
    businesses::ActiveModel {
        id: Set(DEMO_BUSINESS_ID),
        name: Set("Demo Pharmacy".to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;
    Ok(())
}

async fn seed_fiscal_year(ops: &Operations, business_id: BusinessId) -> anyhow::Result<()> {
    let year = Utc::now().year();
    let (Some(start), Some(end)) = (
        NaiveDate::from_ymd_opt(year, 1, 1),
        NaiveDate::from_ymd_opt(year, 12, 31),
    ) else {
        anyhow::bail!("invalid calendar year {year}");
    };

    match ops
        .create_fiscal_period(business_id, &format!("FY{year}"), start, end)
        .await
    {
        Ok(period) => println!("  Created {}", period.name),
        Err(StoreError::Fiscal(err)) => println!("  Skipping: {err}"),
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

async fn seed_product(db: &DatabaseConnection) -> anyhow::Result<ProductId> {
    if let Some(existing) = products::Entity::find()
        .filter(products::Column::BusinessId.eq(DEMO_BUSINESS_ID))
        .filter(products::Column::Sku.eq(DEMO_SKU))
        .one(db)
        .await?
    {
        println!("  Product {DEMO_SKU} already exists, skipping...");
        return Ok(ProductId::from_uuid(existing.id));
    }

    let id = ProductId::new();
    let now = Utc::now().fixed_offset();
    products::ActiveModel {
        id: Set(id.into_inner()),
        business_id: Set(DEMO_BUSINESS_ID),
        sku: Set(DEMO_SKU.to_string()),
        name: Set("Paracetamol 500mg (strip of 10)".to_string()),
        stock: Set(Decimal::ZERO),
        is_serialized: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;
    Ok(id)
}

async fn seed_lots(ops: &Operations, business_id: BusinessId, product_id: ProductId) -> anyhow::Result<()> {
    let today = Utc::now().date_naive();
    let lots = [
        ("LOT-A", 40, today.checked_add_days(Days::new(20))),
        ("LOT-B", 120, today.checked_add_days(Days::new(200))),
        ("LOT-C", 60, None),
    ];

    let mut inserted = 0;
    for (number, quantity, expiry_date) in lots {
        let result = ops
            .receive_batch(ReceiveBatchInput {
                business_id,
                product_id,
                batch_number: number.to_string(),
                fields: NewBatchFields {
                    quantity: Decimal::from(quantity),
                    cost_price: Decimal::new(180, 2),
                    mrp: Decimal::new(350, 2),
                    expiry_date,
                    manufacturing_date: None,
                },
                warehouse_id: None,
                actor_id: Some(UserId::from_uuid(DEMO_USER_ID)),
            })
            .await;

        match result {
            Ok(_) => inserted += 1,
            Err(StoreError::Inventory(err)) => println!("  Skipping {number}: {err}"),
            Err(err) => return Err(err.into()),
        }
    }
    println!("  Inserted {inserted} lots");
    Ok(())
}

async fn seed_customer_invoice(db: &DatabaseConnection) -> anyhow::Result<()> {
    let now = Utc::now().fixed_offset();

    if customers::Entity::find_by_id(DEMO_CUSTOMER_ID).one(db).await?.is_none() {
        customers::ActiveModel {
            id: Set(DEMO_CUSTOMER_ID),
            business_id: Set(DEMO_BUSINESS_ID),
            name: Set("City Clinic".to_string()),
            outstanding_balance: Set(Decimal::ZERO),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;
    }

    if invoices::Entity::find_by_id(DEMO_INVOICE_ID).one(db).await?.is_some() {
        println!("  Demo invoice already exists, skipping...");
        return Ok(());
    }

    let unit_price = Decimal::new(350, 2);
    let quantity = Decimal::from(20);
    let subtotal = unit_price * quantity;
    let tax = Decimal::new(350, 2);
    invoices::ActiveModel {
        id: Set(DEMO_INVOICE_ID),
        business_id: Set(DEMO_BUSINESS_ID),
        customer_id: Set(DEMO_CUSTOMER_ID),
        invoice_number: Set("INV-000001".to_string()),
        invoice_date: Set(Utc::now().date_naive()),
        subtotal: Set(subtotal),
        tax_amount: Set(tax),
        total_amount: Set(subtotal + tax),
        amount_paid: Set(Decimal::ZERO),
        payment_status: Set(PaymentStatus::Unpaid),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;

    invoice_items::ActiveModel {
        id: Set(Uuid::now_v7()),
        invoice_id: Set(DEMO_INVOICE_ID),
        product_id: Set(None),
        description: Set(format!("{DEMO_SKU} x {quantity}")),
        quantity: Set(quantity),
        unit_price: Set(unit_price),
        tax_amount: Set(tax),
        total: Set(subtotal + tax),
    }
    .insert(db)
    .await?;
    println!("  Inserted invoice INV-000001");
    Ok(())
}
