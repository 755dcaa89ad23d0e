use async_trait::async_trait;
use common::UserId;

use super::{Email, User};
use crate::error::StoreError;
use crate::transaction::Conn;

/// Persistence contract for user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    type Tx: Send;

    /// Fails with [`StoreError::Duplicate`] if the email is taken.
    async fn create(&self, conn: Conn<'_, Self::Tx>, user: &User) -> Result<(), StoreError>;

    async fn get_by_id(&self, conn: Conn<'_, Self::Tx>, id: UserId) -> Result<User, StoreError>;

    async fn get_by_email(
        &self,
        conn: Conn<'_, Self::Tx>,
        email: &Email,
    ) -> Result<User, StoreError>;

    async fn update(&self, conn: Conn<'_, Self::Tx>, user: &User) -> Result<(), StoreError>;

    async fn delete(&self, conn: Conn<'_, Self::Tx>, id: UserId) -> Result<(), StoreError>;
}
