//! Unit of work: one database transaction spanning a logical operation.
//!
//! Repository functions never open transactions of their own; they take a
//! `&C where C: ConnectionTrait` handle. Top-level callers open a
//! [`UnitOfWork`], pass [`UnitOfWork::transaction`] down, and finish it with
//! the operation's result.
//!
//! ```ignore
//! let uow = UnitOfWork::begin(&db).await?;
//! let result = LedgerRepository::post(uow.transaction(), &request).await;
//! let posted = uow.finish(result).await?;
//! ```

use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait};

use crate::error::StoreError;

/// A database transaction that is either committed or rolled back explicitly.
pub struct UnitOfWork {
    txn: DatabaseTransaction,
}

impl UnitOfWork {
    /// Begins a new transaction on a pooled connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be started.
    pub async fn begin(db: &DatabaseConnection) -> Result<Self, DbErr> {
        let txn = db.begin().await?;
        Ok(Self { txn })
    }

    /// Returns the transaction handle to pass to repositories.
    #[must_use]
    pub fn transaction(&self) -> &DatabaseTransaction {
        &self.txn
    }

    /// Commits the transaction, persisting all changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails.
    pub async fn commit(self) -> Result<(), DbErr> {
        self.txn.commit().await
    }

    /// Rolls back the transaction, discarding all changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback fails.
    pub async fn rollback(self) -> Result<(), DbErr> {
        self.txn.rollback().await
    }

    /// Commits on `Ok`, rolls back on `Err`, and hands the result back.
    ///
    /// A failed rollback is logged; the original error is still returned.
    ///
    /// # Errors
    ///
    /// Returns the operation's error, or the commit error.
    pub async fn finish<T>(self, result: Result<T, StoreError>) -> Result<T, StoreError> {
        match result {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.rollback().await {
                    tracing::error!(error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }
}

