//! `SeaORM` Entity for `credit_notes` table.

use super::sea_orm_active_enums::CreditNoteStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "credit_notes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub business_id: Uuid,
    pub credit_note_number: String,
    pub invoice_id: Uuid,
    pub customer_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub subtotal: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub tax_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total_amount: Decimal,
    pub status: CreditNoteStatus,
    pub applied_to_invoice_id: Option<Uuid>,
    pub reason: Option<String>,
    pub gl_batch_id: Uuid,
    pub created_by: Uuid,
    pub cancelled_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::invoices::Entity",
        from = "Column::InvoiceId",
        to = "super::invoices::Column::Id"
    )]
    Invoices,
    #[sea_orm(has_many = "super::credit_note_items::Entity")]
    CreditNoteItems,
}

impl Related<super::invoices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoices.def()
    }
}

impl Related<super::credit_note_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CreditNoteItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
