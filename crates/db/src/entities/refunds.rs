//! `SeaORM` Entity for refunds table.

use super::sea_orm_active_enums::{RefundMethod, RefundType};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "refunds")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub business_id: Uuid,
    pub transaction_id: Uuid,
    pub refund_number: String,
    pub refund_type: RefundType,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub subtotal: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub tax_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total_amount: Decimal,
    pub refund_method: RefundMethod,
    pub status: String,
    pub reason: Option<String>,
    pub gl_batch_id: Uuid,
    pub created_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::pos_transactions::Entity",
        from = "Column::TransactionId",
        to = "super::pos_transactions::Column::Id"
    )]
    PosTransactions,
    #[sea_orm(has_many = "super::refund_items::Entity")]
    RefundItems,
}

impl Related<super::pos_transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PosTransactions.def()
    }
}

impl Related<super::refund_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RefundItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
