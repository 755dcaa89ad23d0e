//! In-memory backend for every repository contract.
//!
//! All tables live behind one async mutex. A transaction holds the lock for
//! its whole lifetime, so transactions are fully serialized. Writes go
//! straight into the tables; the copy taken at `begin` is restored on
//! rollback or when the handle is dropped unfinished.
//!
//! `Conn::Pool` calls take the lock for a single operation. Issuing one while
//! the same task holds an open [`MemoryTx`] would wait on itself, so work
//! inside a transaction must go through `Conn::Tx`.

use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderId, Pagination, ProductId, UserId};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::StoreError;
use crate::order::{Order, OrderRepository};
use crate::product::{Product, ProductRepository};
use crate::transaction::{Conn, Transaction, TransactionManager};
use crate::user::{Email, User, UserRepository};

#[derive(Debug, Clone, Default)]
struct Tables {
    // Insertion order doubles as creation order for "newest first" listings.
    products: Vec<Product>,
    orders: Vec<Order>,
    users: Vec<User>,
}

/// Shared handle to the in-memory tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryDatabase {
    /// Creates an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transactions(&self) -> InMemoryTransactionManager {
        InMemoryTransactionManager { db: self.clone() }
    }

    pub fn products(&self) -> InMemoryProductRepository {
        InMemoryProductRepository { db: self.clone() }
    }

    pub fn orders(&self) -> InMemoryOrderRepository {
        InMemoryOrderRepository { db: self.clone() }
    }

    pub fn users(&self) -> InMemoryUserRepository {
        InMemoryUserRepository { db: self.clone() }
    }

    async fn with_tables<R>(
        &self,
        conn: Conn<'_, MemoryTx>,
        f: impl FnOnce(&mut Tables) -> R,
    ) -> R {
        match conn {
            Conn::Tx(tx) => f(&mut *tx.guard),
            Conn::Pool => {
                let mut guard = self.tables.lock().await;
                f(&mut *guard)
            }
        }
    }
}

/// An open in-memory transaction.
pub struct MemoryTx {
    guard: OwnedMutexGuard<Tables>,
    snapshot: Option<Tables>,
}

impl Drop for MemoryTx {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            *self.guard = snapshot;
            tracing::debug!("in-memory transaction dropped unfinished, rolled back");
        }
    }
}

#[async_trait]
impl Transaction for MemoryTx {
    async fn commit(mut self) -> Result<(), StoreError> {
        self.snapshot = None;
        Ok(())
    }

    async fn rollback(mut self) -> Result<(), StoreError> {
        if let Some(snapshot) = self.snapshot.take() {
            *self.guard = snapshot;
        }
        Ok(())
    }
}

/// Opens [`MemoryTx`] transactions.
#[derive(Debug, Clone)]
pub struct InMemoryTransactionManager {
    db: MemoryDatabase,
}

#[async_trait]
impl TransactionManager for InMemoryTransactionManager {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx, StoreError> {
        let guard = self.db.tables.clone().lock_owned().await;
        let snapshot = Some((*guard).clone());
        Ok(MemoryTx { guard, snapshot })
    }
}

/// In-memory [`ProductRepository`].
#[derive(Debug, Clone)]
pub struct InMemoryProductRepository {
    db: MemoryDatabase,
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    type Tx = MemoryTx;

    async fn create(&self, conn: Conn<'_, MemoryTx>, product: &Product) -> Result<(), StoreError> {
        self.db
            .with_tables(conn, |t| {
                if t.products.iter().any(|p| p.id() == product.id()) {
                    return Err(StoreError::Duplicate("product id".into()));
                }
                t.products.push(product.clone());
                Ok(())
            })
            .await
    }

    async fn get_by_id(
        &self,
        conn: Conn<'_, MemoryTx>,
        id: ProductId,
    ) -> Result<Product, StoreError> {
        self.db
            .with_tables(conn, |t| {
                t.products
                    .iter()
                    .find(|p| p.id() == id)
                    .cloned()
                    .ok_or(StoreError::ProductNotFound(id))
            })
            .await
    }

    async fn list(
        &self,
        conn: Conn<'_, MemoryTx>,
        page: Pagination,
    ) -> Result<Vec<Product>, StoreError> {
        self.db
            .with_tables(conn, |t| {
                Ok(t.products
                    .iter()
                    .rev()
                    .skip(page.offset() as usize)
                    .take(page.limit() as usize)
                    .cloned()
                    .collect())
            })
            .await
    }

    async fn update(&self, conn: Conn<'_, MemoryTx>, product: &Product) -> Result<(), StoreError> {
        self.db
            .with_tables(conn, |t| {
                let stored = t
                    .products
                    .iter_mut()
                    .find(|p| p.id() == product.id())
                    .ok_or(StoreError::ProductNotFound(product.id()))?;
                *stored = Product::restore(
                    product.id(),
                    product.description().to_string(),
                    product.tags().to_vec(),
                    product.price(),
                    stored.inventory(),
                    stored.created_at(),
                    product.updated_at(),
                );
                Ok(())
            })
            .await
    }

    async fn delete(&self, conn: Conn<'_, MemoryTx>, id: ProductId) -> Result<(), StoreError> {
        self.db
            .with_tables(conn, |t| {
                let index = t
                    .products
                    .iter()
                    .position(|p| p.id() == id)
                    .ok_or(StoreError::ProductNotFound(id))?;
                t.products.remove(index);
                Ok(())
            })
            .await
    }

    async fn reserve_stock(
        &self,
        conn: Conn<'_, MemoryTx>,
        id: ProductId,
        quantity: i32,
    ) -> Result<(), StoreError> {
        self.db
            .with_tables(conn, |t| {
                let product = t
                    .products
                    .iter_mut()
                    .find(|p| p.id() == id)
                    .ok_or(StoreError::ProductNotFound(id))?;
                product
                    .reserve(quantity)
                    .map_err(|_| StoreError::InsufficientStock {
                        product_id: id,
                        requested: quantity,
                    })
            })
            .await
    }

    async fn adjust_stock(
        &self,
        conn: Conn<'_, MemoryTx>,
        id: ProductId,
        delta: i32,
    ) -> Result<(), StoreError> {
        self.db
            .with_tables(conn, |t| {
                let product = t
                    .products
                    .iter_mut()
                    .find(|p| p.id() == id)
                    .ok_or(StoreError::ProductNotFound(id))?;
                product.adjust_stock(delta).map_err(|_| {
                    if delta < 0 {
                        StoreError::InsufficientStock {
                            product_id: id,
                            requested: delta.saturating_neg(),
                        }
                    } else {
                        StoreError::StockOverflow {
                            product_id: id,
                            delta,
                        }
                    }
                })
            })
            .await
    }
}

/// In-memory [`OrderRepository`].
#[derive(Debug, Clone)]
pub struct InMemoryOrderRepository {
    db: MemoryDatabase,
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    type Tx = MemoryTx;

    async fn create(&self, conn: Conn<'_, MemoryTx>, order: &Order) -> Result<(), StoreError> {
        self.db
            .with_tables(conn, |t| {
                if t.orders.iter().any(|o| o.id() == order.id()) {
                    return Err(StoreError::Duplicate("order id".into()));
                }
                t.orders.push(order.clone());
                Ok(())
            })
            .await
    }

    async fn get_by_id(
        &self,
        conn: Conn<'_, MemoryTx>,
        id: OrderId,
    ) -> Result<Order, StoreError> {
        self.db
            .with_tables(conn, |t| {
                t.orders
                    .iter()
                    .find(|o| o.id() == id)
                    .cloned()
                    .ok_or(StoreError::OrderNotFound(id))
            })
            .await
    }

    async fn get_by_user_id(
        &self,
        conn: Conn<'_, MemoryTx>,
        user_id: UserId,
        page: Pagination,
    ) -> Result<Vec<Order>, StoreError> {
        self.db
            .with_tables(conn, |t| {
                Ok(t.orders
                    .iter()
                    .rev()
                    .filter(|o| o.user_id() == user_id)
                    .skip(page.offset() as usize)
                    .take(page.limit() as usize)
                    .cloned()
                    .collect())
            })
            .await
    }

    async fn update(&self, conn: Conn<'_, MemoryTx>, order: &Order) -> Result<(), StoreError> {
        self.db
            .with_tables(conn, |t| {
                let stored = t
                    .orders
                    .iter_mut()
                    .find(|o| o.id() == order.id())
                    .ok_or(StoreError::OrderNotFound(order.id()))?;
                *stored = order.clone();
                Ok(())
            })
            .await
    }

    async fn delete(&self, conn: Conn<'_, MemoryTx>, id: OrderId) -> Result<(), StoreError> {
        self.db
            .with_tables(conn, |t| {
                let index = t
                    .orders
                    .iter()
                    .position(|o| o.id() == id)
                    .ok_or(StoreError::OrderNotFound(id))?;
                t.orders.remove(index);
                Ok(())
            })
            .await
    }
}

/// In-memory [`UserRepository`]. Emails are unique.
#[derive(Debug, Clone)]
pub struct InMemoryUserRepository {
    db: MemoryDatabase,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    type Tx = MemoryTx;

    async fn create(&self, conn: Conn<'_, MemoryTx>, user: &User) -> Result<(), StoreError> {
        self.db
            .with_tables(conn, |t| {
                if t.users.iter().any(|u| u.email() == user.email()) {
                    return Err(StoreError::Duplicate("email".into()));
                }
                if t.users.iter().any(|u| u.id() == user.id()) {
                    return Err(StoreError::Duplicate("user id".into()));
                }
                t.users.push(user.clone());
                Ok(())
            })
            .await
    }

    async fn get_by_id(&self, conn: Conn<'_, MemoryTx>, id: UserId) -> Result<User, StoreError> {
        self.db
            .with_tables(conn, |t| {
                t.users
                    .iter()
                    .find(|u| u.id() == id)
                    .cloned()
                    .ok_or_else(|| StoreError::UserNotFound(id.to_string()))
            })
            .await
    }

    async fn get_by_email(
        &self,
        conn: Conn<'_, MemoryTx>,
        email: &Email,
    ) -> Result<User, StoreError> {
        self.db
            .with_tables(conn, |t| {
                t.users
                    .iter()
                    .find(|u| u.email() == email)
                    .cloned()
                    .ok_or_else(|| StoreError::UserNotFound(email.to_string()))
            })
            .await
    }

    async fn update(&self, conn: Conn<'_, MemoryTx>, user: &User) -> Result<(), StoreError> {
        self.db
            .with_tables(conn, |t| {
                if t
                    .users
                    .iter()
                    .any(|u| u.id() != user.id() && u.email() == user.email())
                {
                    return Err(StoreError::Duplicate("email".into()));
                }
                let stored = t
                    .users
                    .iter_mut()
                    .find(|u| u.id() == user.id())
                    .ok_or_else(|| StoreError::UserNotFound(user.id().to_string()))?;
                *stored = user.clone();
                Ok(())
            })
            .await
    }

    async fn delete(&self, conn: Conn<'_, MemoryTx>, id: UserId) -> Result<(), StoreError> {
        self.db
            .with_tables(conn, |t| {
                let index = t
                    .users
                    .iter()
                    .position(|u| u.id() == id)
                    .ok_or_else(|| StoreError::UserNotFound(id.to_string()))?;
                t.users.remove(index);
                Ok(())
            })
            .await
    }
}
