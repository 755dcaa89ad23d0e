//! Transaction contracts shared by every repository.
//!
//! A unit of work runs against one transaction handle obtained from a
//! [`TransactionManager`]. The handle is passed explicitly to each repository
//! call through [`Conn`]; nested work receives `&mut Tx` and reuses it instead
//! of opening a second transaction.
//!
//! Handles are finished by value: `commit` and `rollback` consume them, so each
//! transaction ends exactly once. A handle dropped without being finished (the
//! unit of work panicked, or the caller's future was cancelled) must roll back.

use std::fmt::Display;

use async_trait::async_trait;

use crate::error::StoreError;

/// An open database transaction.
#[async_trait]
pub trait Transaction: Send + Sized + 'static {
    /// Makes every write performed through this handle durable.
    async fn commit(self) -> Result<(), StoreError>;

    /// Discards every write performed through this handle.
    async fn rollback(self) -> Result<(), StoreError>;
}

/// Opens transactions against a backend.
#[async_trait]
pub trait TransactionManager: Send + Sync {
    type Tx: Transaction;

    /// Begins a new transaction.
    async fn begin(&self) -> Result<Self::Tx, StoreError>;
}

/// Where a repository call executes.
///
/// `Tx` runs on the caller's open transaction and sees its uncommitted writes.
/// `Pool` runs as a standalone statement on a pooled connection.
pub enum Conn<'a, T> {
    Pool,
    Tx(&'a mut T),
}

impl<'a, T> From<&'a mut T> for Conn<'a, T> {
    fn from(tx: &'a mut T) -> Self {
        Conn::Tx(tx)
    }
}

impl<T> std::fmt::Debug for Conn<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Conn::Pool => f.write_str("Conn::Pool"),
            Conn::Tx(_) => f.write_str("Conn::Tx"),
        }
    }
}

/// Ends a unit of work according to its outcome.
///
/// Commits on `Ok`. On `Err` rolls back and returns the original error; a
/// failed rollback is logged rather than replacing it.
pub async fn finish<T, R, E>(tx: T, outcome: Result<R, E>) -> Result<R, E>
where
    T: Transaction,
    E: From<StoreError> + Display,
{
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!(
                    error = %rollback_err,
                    original = %err,
                    "failed to roll back transaction"
                );
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::DomainError;

    #[derive(Default)]
    struct Counters {
        commits: AtomicUsize,
        rollbacks: AtomicUsize,
    }

    struct RecordingTx {
        counters: Arc<Counters>,
        fail_rollback: bool,
    }

    #[async_trait]
    impl Transaction for RecordingTx {
        async fn commit(self) -> Result<(), StoreError> {
            self.counters.commits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn rollback(self) -> Result<(), StoreError> {
            self.counters.rollbacks.fetch_add(1, Ordering::SeqCst);
            if self.fail_rollback {
                return Err(StoreError::backend(
                    "failed to rollback transaction",
                    std::io::Error::other("connection closed"),
                ));
            }
            Ok(())
        }
    }

    fn tx(counters: &Arc<Counters>, fail_rollback: bool) -> RecordingTx {
        RecordingTx {
            counters: counters.clone(),
            fail_rollback,
        }
    }

    #[tokio::test]
    async fn test_finish_commits_on_success() {
        let counters = Arc::new(Counters::default());

        let result: Result<u32, DomainError> = finish(tx(&counters, false), Ok(7)).await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(counters.commits.load(Ordering::SeqCst), 1);
        assert_eq!(counters.rollbacks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_finish_rolls_back_and_keeps_original_error() {
        let counters = Arc::new(Counters::default());
        let outcome: Result<(), DomainError> =
            Err(DomainError::OrderNotFound(common::OrderId::new()));

        let result = finish(tx(&counters, true), outcome).await;

        assert!(matches!(result, Err(DomainError::OrderNotFound(_))));
        assert_eq!(counters.commits.load(Ordering::SeqCst), 0);
        assert_eq!(counters.rollbacks.load(Ordering::SeqCst), 1);
    }
}
