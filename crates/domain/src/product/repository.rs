use async_trait::async_trait;
use common::{Pagination, ProductId};

use super::Product;
use crate::error::StoreError;
use crate::transaction::Conn;

/// Persistence contract for catalog products.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    type Tx: Send;

    async fn create(&self, conn: Conn<'_, Self::Tx>, product: &Product) -> Result<(), StoreError>;

    /// Fails with [`StoreError::ProductNotFound`] if no product has the id.
    async fn get_by_id(&self, conn: Conn<'_, Self::Tx>, id: ProductId)
    -> Result<Product, StoreError>;

    /// Lists products, newest first.
    async fn list(
        &self,
        conn: Conn<'_, Self::Tx>,
        page: Pagination,
    ) -> Result<Vec<Product>, StoreError>;

    /// Overwrites description, tags, price and `updated_at`.
    ///
    /// The stored quantity is never written here; stock only moves through
    /// [`ProductRepository::adjust_stock`] and
    /// [`ProductRepository::reserve_stock`].
    async fn update(&self, conn: Conn<'_, Self::Tx>, product: &Product) -> Result<(), StoreError>;

    async fn delete(&self, conn: Conn<'_, Self::Tx>, id: ProductId) -> Result<(), StoreError>;

    /// Atomically takes `quantity` units from stock.
    ///
    /// Implementations must perform a single conditional decrement that only
    /// succeeds while the resulting quantity stays non-negative, so two
    /// concurrent reservations can never oversell. Fails with
    /// [`StoreError::InsufficientStock`] when the condition does not hold and
    /// [`StoreError::ProductNotFound`] when the row does not exist.
    async fn reserve_stock(
        &self,
        conn: Conn<'_, Self::Tx>,
        id: ProductId,
        quantity: i32,
    ) -> Result<(), StoreError>;

    /// Atomically changes the stock level by a signed `delta`.
    ///
    /// Applied as a single conditional write against the stored level. Fails
    /// with [`StoreError::InsufficientStock`] when a negative delta would take
    /// the level below zero, with [`StoreError::StockOverflow`] when a
    /// positive one would exceed the largest storable quantity, and with
    /// [`StoreError::ProductNotFound`] when the row does not exist. A zero
    /// delta only checks that the product exists.
    async fn adjust_stock(
        &self,
        conn: Conn<'_, Self::Tx>,
        id: ProductId,
        delta: i32,
    ) -> Result<(), StoreError>;
}
