//! PostgreSQL transactions and connection resolution.

use std::ops::{Deref, DerefMut};

use async_trait::async_trait;
use domain::{Conn, StoreError, Transaction, TransactionManager};
use sqlx::pool::PoolConnection;
use sqlx::{PgConnection, PgPool, Postgres};

use crate::error::db_error;

/// An open PostgreSQL transaction.
///
/// Dropping it without calling `commit` or `rollback` rolls it back when the
/// connection returns to the pool.
pub struct PgTransaction {
    inner: sqlx::Transaction<'static, Postgres>,
}

impl PgTransaction {
    pub(crate) fn connection(&mut self) -> &mut PgConnection {
        &mut self.inner
    }
}

#[async_trait]
impl Transaction for PgTransaction {
    async fn commit(self) -> Result<(), StoreError> {
        self.inner
            .commit()
            .await
            .map_err(db_error("failed to commit transaction"))
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.inner
            .rollback()
            .await
            .map_err(db_error("failed to rollback transaction"))
    }
}

/// Opens transactions on a connection pool.
///
/// Transactions run at the server's default isolation (READ COMMITTED). Stock
/// is only ever decremented by a single conditional `UPDATE`, whose row lock
/// serializes concurrent reservations of the same product.
#[derive(Debug, Clone)]
pub struct PgTransactionManager {
    pool: PgPool,
}

impl PgTransactionManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionManager for PgTransactionManager {
    type Tx = PgTransaction;

    async fn begin(&self) -> Result<PgTransaction, StoreError> {
        let inner = self
            .pool
            .begin()
            .await
            .map_err(db_error("failed to begin transaction"))?;
        Ok(PgTransaction { inner })
    }
}

/// The connection a repository call runs on.
pub(crate) enum Executor<'a> {
    Pooled(PoolConnection<Postgres>),
    Borrowed(&'a mut PgConnection),
}

impl Deref for Executor<'_> {
    type Target = PgConnection;

    fn deref(&self) -> &PgConnection {
        match self {
            Executor::Pooled(conn) => conn,
            Executor::Borrowed(conn) => conn,
        }
    }
}

impl DerefMut for Executor<'_> {
    fn deref_mut(&mut self) -> &mut PgConnection {
        match self {
            Executor::Pooled(conn) => conn,
            Executor::Borrowed(conn) => conn,
        }
    }
}

/// Resolves `conn` to the caller's transaction or a fresh pooled connection.
pub(crate) async fn executor<'a>(
    pool: &PgPool,
    conn: Conn<'a, PgTransaction>,
) -> Result<Executor<'a>, StoreError> {
    match conn {
        Conn::Tx(tx) => Ok(Executor::Borrowed(tx.connection())),
        Conn::Pool => pool
            .acquire()
            .await
            .map(Executor::Pooled)
            .map_err(db_error("failed to acquire connection")),
    }
}
