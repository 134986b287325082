//! Initial database migration.
//!
//! Creates the enums, the ledger and inventory tables, the reference records
//! the reversal engine reads and updates, and the balance trigger on
//! `gl_entries`.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: TENANTS & CHART OF ACCOUNTS
        // ============================================================
        db.execute_unprepared(BUSINESSES_SQL).await?;
        db.execute_unprepared(ACCOUNTS_SQL).await?;

        // ============================================================
        // PART 3: FISCAL PERIODS & GENERAL LEDGER
        // ============================================================
        db.execute_unprepared(FISCAL_PERIODS_SQL).await?;
        db.execute_unprepared(GL_ENTRIES_SQL).await?;

        // ============================================================
        // PART 4: INVENTORY
        // ============================================================
        db.execute_unprepared(PRODUCTS_SQL).await?;
        db.execute_unprepared(BATCHES_SQL).await?;
        db.execute_unprepared(SERIAL_UNITS_SQL).await?;
        db.execute_unprepared(STOCK_MOVEMENTS_SQL).await?;

        // ============================================================
        // PART 5: SALES DOCUMENTS
        // ============================================================
        db.execute_unprepared(CUSTOMERS_SQL).await?;
        db.execute_unprepared(INVOICES_SQL).await?;
        db.execute_unprepared(POS_TRANSACTIONS_SQL).await?;

        // ============================================================
        // PART 6: REVERSALS
        // ============================================================
        db.execute_unprepared(CREDIT_NOTES_SQL).await?;
        db.execute_unprepared(REFUNDS_SQL).await?;
        db.execute_unprepared(PAYMENT_ALLOCATIONS_SQL).await?;

        // ============================================================
        // PART 7: TRIGGERS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
CREATE TYPE account_type AS ENUM ('asset', 'liability', 'equity', 'income', 'expense');

CREATE TYPE fiscal_period_status AS ENUM ('open', 'closed', 'locked');

CREATE TYPE batch_status AS ENUM ('active', 'expired');

CREATE TYPE serial_status AS ENUM ('in_stock', 'sold');

CREATE TYPE movement_type AS ENUM (
    'purchase',
    'sale',
    'return',
    'adjustment_in',
    'adjustment_out'
);

CREATE TYPE stock_transaction_type AS ENUM (
    'sale',
    'purchase',
    'return',
    'adjustment',
    'production',
    'transfer'
);

CREATE TYPE credit_note_status AS ENUM ('issued', 'applied', 'cancelled');

CREATE TYPE refund_type AS ENUM ('full', 'partial');

CREATE TYPE refund_method AS ENUM ('cash', 'bank', 'card');

CREATE TYPE payment_status AS ENUM ('unpaid', 'partially_paid', 'paid');

CREATE TYPE pos_transaction_status AS ENUM ('completed', 'partially_refunded', 'refunded');
";

const BUSINESSES_SQL: &str = r"
CREATE TABLE businesses (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    business_id UUID NOT NULL REFERENCES businesses(id) ON DELETE CASCADE,
    code VARCHAR(20) NOT NULL,
    name VARCHAR(255) NOT NULL,
    account_type account_type NOT NULL,
    is_system BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (business_id, code)
);
";

const FISCAL_PERIODS_SQL: &str = r"
CREATE TABLE fiscal_periods (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    business_id UUID NOT NULL REFERENCES businesses(id) ON DELETE CASCADE,
    name VARCHAR(100) NOT NULL,
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    status fiscal_period_status NOT NULL DEFAULT 'open',
    closed_by UUID,
    closed_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_period_dates CHECK (end_date >= start_date),
    UNIQUE (business_id, start_date)
);

CREATE INDEX idx_fiscal_periods_business_date ON fiscal_periods(business_id, start_date, end_date);
";

const GL_ENTRIES_SQL: &str = r"
CREATE TABLE gl_entries (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    business_id UUID NOT NULL REFERENCES businesses(id) ON DELETE CASCADE,
    batch_id UUID NOT NULL,
    account_id UUID NOT NULL REFERENCES accounts(id),
    transaction_date DATE NOT NULL,
    debit NUMERIC(19, 4) NOT NULL DEFAULT 0,
    credit NUMERIC(19, 4) NOT NULL DEFAULT 0,
    description TEXT NOT NULL,
    reference_type VARCHAR(50) NOT NULL,
    reference_id UUID,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_gl_debit_non_negative CHECK (debit >= 0),
    CONSTRAINT chk_gl_credit_non_negative CHECK (credit >= 0),
    CONSTRAINT chk_gl_one_side CHECK (debit = 0 OR credit = 0)
);

CREATE INDEX idx_gl_entries_business_date ON gl_entries(business_id, transaction_date);
CREATE INDEX idx_gl_entries_batch ON gl_entries(batch_id);
CREATE INDEX idx_gl_entries_account ON gl_entries(account_id, transaction_date);
CREATE INDEX idx_gl_entries_reference ON gl_entries(reference_type, reference_id);
";

const PRODUCTS_SQL: &str = r"
CREATE TABLE products (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    business_id UUID NOT NULL REFERENCES businesses(id) ON DELETE CASCADE,
    sku VARCHAR(100) NOT NULL,
    name VARCHAR(255) NOT NULL,
    stock NUMERIC(19, 4) NOT NULL DEFAULT 0,
    is_serialized BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (business_id, sku)
);

CREATE TABLE product_variants (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    business_id UUID NOT NULL REFERENCES businesses(id) ON DELETE CASCADE,
    product_id UUID NOT NULL REFERENCES products(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    stock NUMERIC(19, 4) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const BATCHES_SQL: &str = r"
CREATE TABLE batches (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    business_id UUID NOT NULL REFERENCES businesses(id) ON DELETE CASCADE,
    product_id UUID NOT NULL REFERENCES products(id) ON DELETE CASCADE,
    warehouse_id UUID,
    batch_number VARCHAR(100) NOT NULL,
    quantity NUMERIC(19, 4) NOT NULL DEFAULT 0,
    reserved_quantity NUMERIC(19, 4) NOT NULL DEFAULT 0,
    cost_price NUMERIC(19, 4) NOT NULL DEFAULT 0,
    mrp NUMERIC(19, 4) NOT NULL DEFAULT 0,
    expiry_date DATE,
    manufacturing_date DATE,
    status batch_status NOT NULL DEFAULT 'active',
    is_deleted BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_batch_reserved CHECK (reserved_quantity >= 0 AND reserved_quantity <= quantity),
    UNIQUE (business_id, product_id, batch_number)
);

CREATE INDEX idx_batches_allocation ON batches(business_id, product_id, status)
    WHERE is_deleted = false;
CREATE INDEX idx_batches_expiry ON batches(business_id, expiry_date)
    WHERE status = 'active' AND is_deleted = false;
";

const SERIAL_UNITS_SQL: &str = r"
CREATE TABLE serial_units (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    business_id UUID NOT NULL REFERENCES businesses(id) ON DELETE CASCADE,
    product_id UUID NOT NULL REFERENCES products(id) ON DELETE CASCADE,
    batch_id UUID REFERENCES batches(id),
    serial_number VARCHAR(100) NOT NULL,
    status serial_status NOT NULL DEFAULT 'in_stock',
    customer_id UUID,
    invoice_id UUID,
    sold_at TIMESTAMPTZ,
    is_deleted BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (business_id, serial_number)
);
";

const STOCK_MOVEMENTS_SQL: &str = r"
CREATE TABLE stock_movements (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    business_id UUID NOT NULL REFERENCES businesses(id) ON DELETE CASCADE,
    product_id UUID NOT NULL REFERENCES products(id) ON DELETE CASCADE,
    variant_id UUID REFERENCES product_variants(id),
    batch_id UUID REFERENCES batches(id),
    movement_type movement_type NOT NULL,
    transaction_type stock_transaction_type NOT NULL,
    quantity_change NUMERIC(19, 4) NOT NULL,
    unit_cost NUMERIC(19, 4),
    reference_type VARCHAR(50),
    reference_id UUID,
    notes TEXT,
    created_by UUID,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_movement_nonzero CHECK (quantity_change <> 0)
);

CREATE INDEX idx_stock_movements_product ON stock_movements(business_id, product_id, created_at);
CREATE INDEX idx_stock_movements_reference ON stock_movements(reference_type, reference_id);
";

const CUSTOMERS_SQL: &str = r"
CREATE TABLE customers (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    business_id UUID NOT NULL REFERENCES businesses(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    outstanding_balance NUMERIC(19, 4) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const INVOICES_SQL: &str = r"
CREATE TABLE invoices (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    business_id UUID NOT NULL REFERENCES businesses(id) ON DELETE CASCADE,
    customer_id UUID NOT NULL REFERENCES customers(id),
    invoice_number VARCHAR(50) NOT NULL,
    invoice_date DATE NOT NULL,
    subtotal NUMERIC(19, 4) NOT NULL DEFAULT 0,
    tax_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    total_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    amount_paid NUMERIC(19, 4) NOT NULL DEFAULT 0,
    payment_status payment_status NOT NULL DEFAULT 'unpaid',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (business_id, invoice_number)
);

CREATE TABLE invoice_items (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    invoice_id UUID NOT NULL REFERENCES invoices(id) ON DELETE CASCADE,
    product_id UUID REFERENCES products(id),
    description TEXT NOT NULL,
    quantity NUMERIC(19, 4) NOT NULL,
    unit_price NUMERIC(19, 4) NOT NULL,
    tax_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    total NUMERIC(19, 4) NOT NULL
);
";

const POS_TRANSACTIONS_SQL: &str = r"
CREATE TABLE pos_transactions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    business_id UUID NOT NULL REFERENCES businesses(id) ON DELETE CASCADE,
    customer_id UUID REFERENCES customers(id),
    transaction_number VARCHAR(50) NOT NULL,
    total_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    status pos_transaction_status NOT NULL DEFAULT 'completed',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (business_id, transaction_number)
);

CREATE TABLE pos_transaction_items (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    transaction_id UUID NOT NULL REFERENCES pos_transactions(id) ON DELETE CASCADE,
    product_id UUID REFERENCES products(id),
    quantity NUMERIC(19, 4) NOT NULL,
    unit_price NUMERIC(19, 4) NOT NULL,
    tax_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    total NUMERIC(19, 4) NOT NULL
);
";

const CREDIT_NOTES_SQL: &str = r"
CREATE TABLE credit_notes (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    business_id UUID NOT NULL REFERENCES businesses(id) ON DELETE CASCADE,
    credit_note_number VARCHAR(50) NOT NULL,
    invoice_id UUID NOT NULL REFERENCES invoices(id),
    customer_id UUID NOT NULL REFERENCES customers(id),
    subtotal NUMERIC(19, 4) NOT NULL,
    tax_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    total_amount NUMERIC(19, 4) NOT NULL,
    status credit_note_status NOT NULL DEFAULT 'issued',
    applied_to_invoice_id UUID REFERENCES invoices(id),
    reason TEXT,
    gl_batch_id UUID NOT NULL,
    created_by UUID NOT NULL,
    cancelled_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_credit_note_total CHECK (total_amount > 0),
    UNIQUE (business_id, credit_note_number)
);

CREATE INDEX idx_credit_notes_invoice ON credit_notes(invoice_id) WHERE status <> 'cancelled';

CREATE TABLE credit_note_items (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    credit_note_id UUID NOT NULL REFERENCES credit_notes(id) ON DELETE CASCADE,
    invoice_item_id UUID REFERENCES invoice_items(id),
    product_id UUID REFERENCES products(id),
    variant_id UUID REFERENCES product_variants(id),
    batch_id UUID REFERENCES batches(id),
    description TEXT,
    quantity NUMERIC(19, 4) NOT NULL,
    unit_price NUMERIC(19, 4) NOT NULL,
    tax_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    total NUMERIC(19, 4) NOT NULL,
    unit_cost NUMERIC(19, 4),
    restock BOOLEAN NOT NULL DEFAULT false
);
";

const REFUNDS_SQL: &str = r"
CREATE TABLE refunds (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    business_id UUID NOT NULL REFERENCES businesses(id) ON DELETE CASCADE,
    transaction_id UUID NOT NULL REFERENCES pos_transactions(id),
    refund_number VARCHAR(50) NOT NULL,
    refund_type refund_type NOT NULL,
    subtotal NUMERIC(19, 4) NOT NULL,
    tax_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    total_amount NUMERIC(19, 4) NOT NULL,
    refund_method refund_method NOT NULL,
    status VARCHAR(20) NOT NULL DEFAULT 'completed',
    reason TEXT,
    gl_batch_id UUID NOT NULL,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_refund_total CHECK (total_amount > 0),
    UNIQUE (business_id, refund_number)
);

CREATE INDEX idx_refunds_transaction ON refunds(transaction_id);

CREATE TABLE refund_items (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    refund_id UUID NOT NULL REFERENCES refunds(id) ON DELETE CASCADE,
    transaction_item_id UUID REFERENCES pos_transaction_items(id),
    product_id UUID REFERENCES products(id),
    variant_id UUID REFERENCES product_variants(id),
    batch_id UUID REFERENCES batches(id),
    description TEXT,
    quantity NUMERIC(19, 4) NOT NULL,
    unit_price NUMERIC(19, 4) NOT NULL,
    tax_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    total NUMERIC(19, 4) NOT NULL,
    unit_cost NUMERIC(19, 4),
    restock BOOLEAN NOT NULL DEFAULT false
);
";

const PAYMENT_ALLOCATIONS_SQL: &str = r"
CREATE TABLE payment_allocations (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    business_id UUID NOT NULL REFERENCES businesses(id) ON DELETE CASCADE,
    invoice_id UUID NOT NULL REFERENCES invoices(id),
    credit_note_id UUID REFERENCES credit_notes(id),
    amount NUMERIC(19, 4) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_allocation_amount CHECK (amount > 0)
);

CREATE INDEX idx_payment_allocations_invoice ON payment_allocations(invoice_id);
";

const TRIGGERS_SQL: &str = r"
-- ============================================================
-- FUNCTION: check_gl_batch_balance
-- Every GL batch must balance (within 0.01) at commit time.
-- ============================================================
CREATE OR REPLACE FUNCTION check_gl_batch_balance()
RETURNS TRIGGER AS $$
DECLARE
    total_debit NUMERIC(19, 4);
    total_credit NUMERIC(19, 4);
BEGIN
    SELECT
        COALESCE(SUM(debit), 0),
        COALESCE(SUM(credit), 0)
    INTO total_debit, total_credit
    FROM gl_entries
    WHERE batch_id = NEW.batch_id;

    IF ABS(total_debit - total_credit) > 0.01 THEN
        RAISE EXCEPTION 'GL batch % is not balanced. Debit: %, Credit: %',
            NEW.batch_id, total_debit, total_credit;
    END IF;

    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE CONSTRAINT TRIGGER trg_check_gl_batch_balance
AFTER INSERT ON gl_entries
DEFERRABLE INITIALLY DEFERRED
FOR EACH ROW
EXECUTE FUNCTION check_gl_batch_balance();

-- ============================================================
-- FUNCTION: prevent_gl_modification
-- GL lines are immutable; corrections are new reversing lines.
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_gl_modification()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'GL entries are immutable';
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_prevent_gl_modification
BEFORE UPDATE OR DELETE ON gl_entries
FOR EACH ROW
EXECUTE FUNCTION prevent_gl_modification();
";

const DROP_ALL_SQL: &str = r"
-- ============================================================
-- DROP ALL: Rollback migration
-- Order matters due to foreign key constraints
-- ============================================================

DROP TRIGGER IF EXISTS trg_prevent_gl_modification ON gl_entries;
DROP TRIGGER IF EXISTS trg_check_gl_batch_balance ON gl_entries;

DROP FUNCTION IF EXISTS prevent_gl_modification();
DROP FUNCTION IF EXISTS check_gl_batch_balance();

DROP TABLE IF EXISTS payment_allocations CASCADE;
DROP TABLE IF EXISTS refund_items CASCADE;
DROP TABLE IF EXISTS refunds CASCADE;
DROP TABLE IF EXISTS credit_note_items CASCADE;
DROP TABLE IF EXISTS credit_notes CASCADE;
DROP TABLE IF EXISTS pos_transaction_items CASCADE;
DROP TABLE IF EXISTS pos_transactions CASCADE;
DROP TABLE IF EXISTS invoice_items CASCADE;
DROP TABLE IF EXISTS invoices CASCADE;
DROP TABLE IF EXISTS customers CASCADE;
DROP TABLE IF EXISTS stock_movements CASCADE;
DROP TABLE IF EXISTS serial_units CASCADE;
DROP TABLE IF EXISTS batches CASCADE;
DROP TABLE IF EXISTS product_variants CASCADE;
DROP TABLE IF EXISTS products CASCADE;
DROP TABLE IF EXISTS gl_entries CASCADE;
DROP TABLE IF EXISTS fiscal_periods CASCADE;
DROP TABLE IF EXISTS accounts CASCADE;
DROP TABLE IF EXISTS businesses CASCADE;

DROP TYPE IF EXISTS pos_transaction_status;
DROP TYPE IF EXISTS payment_status;
DROP TYPE IF EXISTS refund_method;
DROP TYPE IF EXISTS refund_type;
DROP TYPE IF EXISTS credit_note_status;
DROP TYPE IF EXISTS stock_transaction_type;
DROP TYPE IF EXISTS movement_type;
DROP TYPE IF EXISTS serial_status;
DROP TYPE IF EXISTS batch_status;
DROP TYPE IF EXISTS fiscal_period_status;
DROP TYPE IF EXISTS account_type;
";
