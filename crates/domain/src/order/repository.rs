use async_trait::async_trait;
use common::{OrderId, Pagination, UserId};

use super::Order;
use crate::error::StoreError;
use crate::transaction::Conn;

/// Persistence contract for orders and their items.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    type Tx: Send;

    /// Writes the order row and all of its items as one batch.
    async fn create(&self, conn: Conn<'_, Self::Tx>, order: &Order) -> Result<(), StoreError>;

    /// Loads an order with its items in their original order.
    async fn get_by_id(&self, conn: Conn<'_, Self::Tx>, id: OrderId) -> Result<Order, StoreError>;

    /// Lists a user's orders, newest first.
    async fn get_by_user_id(
        &self,
        conn: Conn<'_, Self::Tx>,
        user_id: UserId,
        page: Pagination,
    ) -> Result<Vec<Order>, StoreError>;

    /// Persists status and `updated_at`. Fails with
    /// [`StoreError::OrderNotFound`] if the order does not exist.
    async fn update(&self, conn: Conn<'_, Self::Tx>, order: &Order) -> Result<(), StoreError>;

    /// Removes an order and its items.
    async fn delete(&self, conn: Conn<'_, Self::Tx>, id: OrderId) -> Result<(), StoreError>;
}
