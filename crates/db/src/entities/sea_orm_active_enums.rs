//! `SeaORM` active enums mirroring the Postgres enum types.

use backoffice_core::fiscal::FiscalPeriodStatus as DomainPeriodStatus;
use backoffice_core::inventory::{
    BatchStatus as DomainBatchStatus, MovementType as DomainMovementType,
    SerialStatus as DomainSerialStatus, TransactionType as DomainTransactionType,
};
use backoffice_core::ledger::AccountType as DomainAccountType;
use backoffice_core::reversal::{
    CreditNoteStatus as DomainCreditNoteStatus, PaymentStatus as DomainPaymentStatus,
    PosRefundStatus, RefundMethod as DomainRefundMethod, RefundType as DomainRefundType,
};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "account_type")]
pub enum AccountType {
    #[sea_orm(string_value = "asset")]
    Asset,
    #[sea_orm(string_value = "liability")]
    Liability,
    #[sea_orm(string_value = "equity")]
    Equity,
    #[sea_orm(string_value = "income")]
    Income,
    #[sea_orm(string_value = "expense")]
    Expense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "fiscal_period_status")]
pub enum FiscalPeriodStatus {
    #[sea_orm(string_value = "open")]
    Open,
    #[sea_orm(string_value = "closed")]
    Closed,
    #[sea_orm(string_value = "locked")]
    Locked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "batch_status")]
pub enum BatchStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "expired")]
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "serial_status")]
pub enum SerialStatus {
    #[sea_orm(string_value = "in_stock")]
    InStock,
    #[sea_orm(string_value = "sold")]
    Sold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "movement_type")]
pub enum MovementType {
    #[sea_orm(string_value = "purchase")]
    Purchase,
    #[sea_orm(string_value = "sale")]
    Sale,
    #[sea_orm(string_value = "return")]
    Return,
    #[sea_orm(string_value = "adjustment_in")]
    AdjustmentIn,
    #[sea_orm(string_value = "adjustment_out")]
    AdjustmentOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "stock_transaction_type")]
pub enum StockTransactionType {
    #[sea_orm(string_value = "sale")]
    Sale,
    #[sea_orm(string_value = "purchase")]
    Purchase,
    #[sea_orm(string_value = "return")]
    Return,
    #[sea_orm(string_value = "adjustment")]
    Adjustment,
    #[sea_orm(string_value = "production")]
    Production,
    #[sea_orm(string_value = "transfer")]
    Transfer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "credit_note_status")]
pub enum CreditNoteStatus {
    #[sea_orm(string_value = "issued")]
    Issued,
    #[sea_orm(string_value = "applied")]
    Applied,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "refund_type")]
pub enum RefundType {
    #[sea_orm(string_value = "full")]
    Full,
    #[sea_orm(string_value = "partial")]
    Partial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "refund_method")]
pub enum RefundMethod {
    #[sea_orm(string_value = "cash")]
    Cash,
    #[sea_orm(string_value = "bank")]
    Bank,
    #[sea_orm(string_value = "card")]
    Card,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payment_status")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "unpaid")]
    Unpaid,
    #[sea_orm(string_value = "partially_paid")]
    PartiallyPaid,
    #[sea_orm(string_value = "paid")]
    Paid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "pos_transaction_status")]
pub enum PosTransactionStatus {
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "partially_refunded")]
    PartiallyRefunded,
    #[sea_orm(string_value = "refunded")]
    Refunded,
}

/// Two-way mapping between a storage enum and its domain counterpart.
macro_rules! mirror_enum {
    ($db:ident <=> $domain:ident { $($variant:ident),+ $(,)? }) => {
        impl From<$domain> for $db {
            fn from(value: $domain) -> Self {
                match value {
                    $($domain::$variant => Self::$variant,)+
                }
            }
        }

        impl From<$db> for $domain {
            fn from(value: $db) -> Self {
                match value {
                    $($db::$variant => Self::$variant,)+
                }
            }
        }
    };
}

mirror_enum!(AccountType <=> DomainAccountType { Asset, Liability, Equity, Income, Expense });
mirror_enum!(FiscalPeriodStatus <=> DomainPeriodStatus { Open, Closed, Locked });
mirror_enum!(BatchStatus <=> DomainBatchStatus { Active, Expired });
mirror_enum!(SerialStatus <=> DomainSerialStatus { InStock, Sold });
mirror_enum!(MovementType <=> DomainMovementType {
    Purchase,
    Sale,
    Return,
    AdjustmentIn,
    AdjustmentOut,
});
mirror_enum!(StockTransactionType <=> DomainTransactionType {
    Sale,
    Purchase,
    Return,
    Adjustment,
    Production,
    Transfer,
});
mirror_enum!(CreditNoteStatus <=> DomainCreditNoteStatus { Issued, Applied, Cancelled });
mirror_enum!(RefundType <=> DomainRefundType { Full, Partial });
mirror_enum!(RefundMethod <=> DomainRefundMethod { Cash, Bank, Card });
mirror_enum!(PaymentStatus <=> DomainPaymentStatus { Unpaid, PartiallyPaid, Paid });

impl From<PosRefundStatus> for PosTransactionStatus {
    fn from(value: PosRefundStatus) -> Self {
        match value {
            PosRefundStatus::PartiallyRefunded => Self::PartiallyRefunded,
            PosRefundStatus::Refunded => Self::Refunded,
        }
    }
}
