//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `ProductId` where a `BatchId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(BusinessId, "Unique identifier for a business (tenant).");
typed_id!(UserId, "Unique identifier for the acting user.");
typed_id!(AccountId, "Unique identifier for a chart of accounts entry.");
typed_id!(GlEntryId, "Unique identifier for a single general-ledger line.");
typed_id!(
    GlBatchId,
    "Identifier shared by every line written by one posting."
);
typed_id!(FiscalPeriodId, "Unique identifier for a fiscal period.");
typed_id!(ProductId, "Unique identifier for a product.");
typed_id!(VariantId, "Unique identifier for a product variant.");
typed_id!(BatchId, "Unique identifier for a stock batch (lot).");
typed_id!(WarehouseId, "Unique identifier for a warehouse.");
typed_id!(SerialUnitId, "Unique identifier for a serialized unit.");
typed_id!(StockMovementId, "Unique identifier for a stock movement.");
typed_id!(CustomerId, "Unique identifier for a customer.");
typed_id!(InvoiceId, "Unique identifier for a sales invoice.");
typed_id!(
    PosTransactionId,
    "Unique identifier for a point-of-sale transaction."
);
typed_id!(CreditNoteId, "Unique identifier for a credit note.");
typed_id!(RefundId, "Unique identifier for a refund.");

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_typed_id_roundtrips_uuid() {
        let uuid = Uuid::new_v4();
        let id = BatchId::from_uuid(uuid);
        assert_eq!(id.into_inner(), uuid);
        assert_eq!(Uuid::from(id), uuid);
        assert_eq!(id.to_string(), uuid.to_string());
    }

    #[test]
    fn test_typed_id_from_str() {
        let uuid = Uuid::new_v4();
        let id = ProductId::from_str(&uuid.to_string()).unwrap();
        assert_eq!(id.into_inner(), uuid);
        assert!(ProductId::from_str("invalid").is_err());
    }

    #[test]
    fn test_new_ids_are_unique() {
        let a = GlEntryId::new();
        let b = GlEntryId::new();
        assert_ne!(a, b);
        assert_eq!(a.into_inner().get_version_num(), 7);
    }

    #[test]
    fn test_serde_transparent() {
        let id = CreditNoteId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
    }
}
