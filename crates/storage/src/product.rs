use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Pagination, ProductId};
use domain::{Conn, Inventory, Money, Product, ProductRepository, StoreError};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::error::{db_error, decode_error};
use crate::transaction::{PgTransaction, executor};

/// PostgreSQL-backed [`ProductRepository`].
#[derive(Debug, Clone)]
pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_product(row: PgRow) -> Result<Product, StoreError> {
        let id: Uuid = row.try_get("id").map_err(db_error("failed to read product"))?;
        let price: Decimal = row.try_get("price").map_err(db_error("failed to read product"))?;
        let quantity: i32 = row
            .try_get("quantity")
            .map_err(db_error("failed to read product"))?;
        let created_at: DateTime<Utc> = row
            .try_get("created_at")
            .map_err(db_error("failed to read product"))?;
        let updated_at: DateTime<Utc> = row
            .try_get("updated_at")
            .map_err(db_error("failed to read product"))?;

        Ok(Product::restore(
            ProductId::from_uuid(id),
            row.try_get("description")
                .map_err(db_error("failed to read product"))?,
            row.try_get("tags").map_err(db_error("failed to read product"))?,
            Money::new(price).map_err(|e| decode_error("product price", e))?,
            Inventory::new(quantity).map_err(|e| decode_error("product quantity", e))?,
            created_at,
            updated_at,
        ))
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    type Tx = PgTransaction;

    async fn create(
        &self,
        conn: Conn<'_, PgTransaction>,
        product: &Product,
    ) -> Result<(), StoreError> {
        let mut exec = executor(&self.pool, conn).await?;
        sqlx::query(
            r#"
            INSERT INTO products (id, description, tags, price, quantity, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(product.id().as_uuid())
        .bind(product.description())
        .bind(product.tags())
        .bind(product.price().amount())
        .bind(product.quantity())
        .bind(product.created_at())
        .bind(product.updated_at())
        .execute(&mut *exec)
        .await
        .map_err(db_error("failed to insert product"))?;
        Ok(())
    }

    async fn get_by_id(
        &self,
        conn: Conn<'_, PgTransaction>,
        id: ProductId,
    ) -> Result<Product, StoreError> {
        let mut exec = executor(&self.pool, conn).await?;
        let row = sqlx::query(
            r#"
            SELECT id, description, tags, price, quantity, created_at, updated_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *exec)
        .await
        .map_err(db_error("failed to fetch product"))?
        .ok_or(StoreError::ProductNotFound(id))?;

        Self::row_to_product(row)
    }

    async fn list(
        &self,
        conn: Conn<'_, PgTransaction>,
        page: Pagination,
    ) -> Result<Vec<Product>, StoreError> {
        let mut exec = executor(&self.pool, conn).await?;
        let rows = sqlx::query(
            r#"
            SELECT id, description, tags, price, quantity, created_at, updated_at
            FROM products
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&mut *exec)
        .await
        .map_err(db_error("failed to list products"))?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn update(
        &self,
        conn: Conn<'_, PgTransaction>,
        product: &Product,
    ) -> Result<(), StoreError> {
        let mut exec = executor(&self.pool, conn).await?;
        let result = sqlx::query(
            r#"
            UPDATE products
            SET description = $2, tags = $3, price = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(product.id().as_uuid())
        .bind(product.description())
        .bind(product.tags())
        .bind(product.price().amount())
        .bind(product.updated_at())
        .execute(&mut *exec)
        .await
        .map_err(db_error("failed to update product"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::ProductNotFound(product.id()));
        }
        Ok(())
    }

    async fn delete(
        &self,
        conn: Conn<'_, PgTransaction>,
        id: ProductId,
    ) -> Result<(), StoreError> {
        let mut exec = executor(&self.pool, conn).await?;
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *exec)
            .await
            .map_err(db_error("failed to delete product"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::ProductNotFound(id));
        }
        Ok(())
    }

    async fn reserve_stock(
        &self,
        conn: Conn<'_, PgTransaction>,
        id: ProductId,
        quantity: i32,
    ) -> Result<(), StoreError> {
        let mut exec = executor(&self.pool, conn).await?;

        // Check and decrement in one statement; the row lock it takes makes
        // concurrent reservations wait for each other.
        let result = sqlx::query(
            r#"
            UPDATE products
            SET quantity = quantity - $2, updated_at = NOW()
            WHERE id = $1 AND $2 > 0 AND quantity >= $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(quantity)
        .execute(&mut *exec)
        .await
        .map_err(db_error("failed to reserve stock"))?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        if product_exists(&mut exec, id, "failed to reserve stock").await? {
            Err(StoreError::InsufficientStock {
                product_id: id,
                requested: quantity,
            })
        } else {
            Err(StoreError::ProductNotFound(id))
        }
    }

    async fn adjust_stock(
        &self,
        conn: Conn<'_, PgTransaction>,
        id: ProductId,
        delta: i32,
    ) -> Result<(), StoreError> {
        let mut exec = executor(&self.pool, conn).await?;

        // The new level is computed from the stored one under the row lock
        // and widened to BIGINT so the range check itself cannot overflow.
        let result = sqlx::query(
            r#"
            UPDATE products
            SET quantity = quantity + $2,
                updated_at = CASE WHEN $2 = 0 THEN updated_at ELSE NOW() END
            WHERE id = $1 AND quantity::BIGINT + $2 BETWEEN 0 AND 2147483647
            "#,
        )
        .bind(id.as_uuid())
        .bind(delta)
        .execute(&mut *exec)
        .await
        .map_err(db_error("failed to adjust stock"))?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        if !product_exists(&mut exec, id, "failed to adjust stock").await? {
            Err(StoreError::ProductNotFound(id))
        } else if delta < 0 {
            Err(StoreError::InsufficientStock {
                product_id: id,
                requested: delta.saturating_neg(),
            })
        } else {
            Err(StoreError::StockOverflow {
                product_id: id,
                delta,
            })
        }
    }
}

async fn product_exists(
    exec: &mut PgConnection,
    id: ProductId,
    context: &'static str,
) -> Result<bool, StoreError> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM products WHERE id = $1)")
        .bind(id.as_uuid())
        .fetch_one(exec)
        .await
        .map_err(db_error(context))
}
