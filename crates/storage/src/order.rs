use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, OrderItemId, Pagination, ProductId, UserId};
use domain::{Conn, Money, Order, OrderItem, OrderRepository, OrderStatus, StoreError};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::error::{db_error, decode_error};
use crate::transaction::{PgTransaction, executor};

/// PostgreSQL-backed [`OrderRepository`].
///
/// Orders live in `orders`, their lines in `order_items` keyed by position so
/// they load back in the order they were placed.
#[derive(Debug, Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert(conn: &mut PgConnection, order: &Order) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, status, total_price, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(order.user_id().as_uuid())
        .bind(order.status().as_str())
        .bind(order.total_price().amount())
        .bind(order.created_at())
        .bind(order.updated_at())
        .execute(&mut *conn)
        .await
        .map_err(db_error("failed to insert order"))?;

        let items = order.items();
        let ids: Vec<Uuid> = items.iter().map(|i| i.id().as_uuid()).collect();
        let order_ids: Vec<Uuid> = items.iter().map(|i| i.order_id().as_uuid()).collect();
        let positions: Vec<i32> = (0..items.len() as i32).collect();
        let product_ids: Vec<Uuid> = items.iter().map(|i| i.product_id().as_uuid()).collect();
        let descriptions: Vec<String> = items
            .iter()
            .map(|i| i.product_description().to_string())
            .collect();
        let prices: Vec<Decimal> = items.iter().map(|i| i.product_price().amount()).collect();
        let quantities: Vec<i32> = items.iter().map(OrderItem::quantity).collect();
        let created: Vec<DateTime<Utc>> = items.iter().map(OrderItem::created_at).collect();

        sqlx::query(
            r#"
            INSERT INTO order_items
                (id, order_id, position, product_id, product_description, product_price,
                 quantity, created_at)
            SELECT * FROM UNNEST(
                $1::uuid[], $2::uuid[], $3::int4[], $4::uuid[],
                $5::text[], $6::numeric[], $7::int4[], $8::timestamptz[]
            )
            "#,
        )
        .bind(&ids)
        .bind(&order_ids)
        .bind(&positions)
        .bind(&product_ids)
        .bind(&descriptions)
        .bind(&prices)
        .bind(&quantities)
        .bind(&created)
        .execute(&mut *conn)
        .await
        .map_err(db_error("failed to insert order items"))?;

        Ok(())
    }

    async fn items_for(
        conn: &mut PgConnection,
        order_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<OrderItem>>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, order_id, product_id, product_description, product_price, quantity,
                   created_at
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY order_id, position
            "#,
        )
        .bind(order_ids)
        .fetch_all(&mut *conn)
        .await
        .map_err(db_error("failed to fetch order items"))?;

        let mut grouped: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            let item = Self::row_to_item(&row)?;
            grouped
                .entry(item.order_id().as_uuid())
                .or_default()
                .push(item);
        }
        Ok(grouped)
    }

    fn row_to_item(row: &PgRow) -> Result<OrderItem, StoreError> {
        let read = db_error("failed to read order item");
        let decode = |row: &PgRow| -> Result<_, sqlx::Error> {
            Ok((
                row.try_get::<Uuid, _>("id")?,
                row.try_get::<Uuid, _>("order_id")?,
                row.try_get::<Uuid, _>("product_id")?,
                row.try_get::<String, _>("product_description")?,
                row.try_get::<Decimal, _>("product_price")?,
                row.try_get::<i32, _>("quantity")?,
                row.try_get::<DateTime<Utc>, _>("created_at")?,
            ))
        };
        let (id, order_id, product_id, description, price, quantity, created_at) =
            decode(row).map_err(read)?;

        OrderItem::restore(
            OrderItemId::from_uuid(id),
            OrderId::from_uuid(order_id),
            ProductId::from_uuid(product_id),
            description,
            Money::new(price).map_err(|e| decode_error("order item price", e))?,
            quantity,
            created_at,
        )
        .map_err(|e| decode_error("order item line total", e))
    }

    fn row_to_order(row: &PgRow, items: Vec<OrderItem>) -> Result<Order, StoreError> {
        let read = db_error("failed to read order");
        let decode = |row: &PgRow| -> Result<_, sqlx::Error> {
            Ok((
                row.try_get::<Uuid, _>("id")?,
                row.try_get::<Uuid, _>("user_id")?,
                row.try_get::<String, _>("status")?,
                row.try_get::<Decimal, _>("total_price")?,
                row.try_get::<DateTime<Utc>, _>("created_at")?,
                row.try_get::<DateTime<Utc>, _>("updated_at")?,
            ))
        };
        let (id, user_id, status, total, created_at, updated_at) = decode(row).map_err(read)?;

        let status: OrderStatus = status
            .parse()
            .map_err(|e| decode_error("order status", e))?;

        Ok(Order::restore(
            OrderId::from_uuid(id),
            UserId::from_uuid(user_id),
            items,
            status,
            Money::new(total).map_err(|e| decode_error("order total", e))?,
            created_at,
            updated_at,
        ))
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    type Tx = PgTransaction;

    async fn create(&self, conn: Conn<'_, PgTransaction>, order: &Order) -> Result<(), StoreError> {
        match conn {
            Conn::Tx(tx) => Self::insert(tx.connection(), order).await,
            Conn::Pool => {
                // Order and items must land together even without a caller
                // transaction.
                let mut tx = self
                    .pool
                    .begin()
                    .await
                    .map_err(db_error("failed to begin transaction"))?;
                Self::insert(&mut tx, order).await?;
                tx.commit()
                    .await
                    .map_err(db_error("failed to commit transaction"))
            }
        }
    }

    async fn get_by_id(
        &self,
        conn: Conn<'_, PgTransaction>,
        id: OrderId,
    ) -> Result<Order, StoreError> {
        let mut exec = executor(&self.pool, conn).await?;
        let row = sqlx::query(
            r#"
            SELECT id, user_id, status, total_price, created_at, updated_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *exec)
        .await
        .map_err(db_error("failed to fetch order"))?
        .ok_or(StoreError::OrderNotFound(id))?;

        let mut items = Self::items_for(&mut exec, &[id.as_uuid()]).await?;
        Self::row_to_order(&row, items.remove(&id.as_uuid()).unwrap_or_default())
    }

    async fn get_by_user_id(
        &self,
        conn: Conn<'_, PgTransaction>,
        user_id: UserId,
        page: Pagination,
    ) -> Result<Vec<Order>, StoreError> {
        let mut exec = executor(&self.pool, conn).await?;
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, status, total_price, created_at, updated_at
            FROM orders
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&mut *exec)
        .await
        .map_err(db_error("failed to list orders"))?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids = rows
            .iter()
            .map(|row| row.try_get::<Uuid, _>("id"))
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_error("failed to read order"))?;
        let mut items = Self::items_for(&mut exec, &ids).await?;

        rows.iter()
            .zip(&ids)
            .map(|(row, id)| Self::row_to_order(row, items.remove(id).unwrap_or_default()))
            .collect()
    }

    async fn update(&self, conn: Conn<'_, PgTransaction>, order: &Order) -> Result<(), StoreError> {
        let mut exec = executor(&self.pool, conn).await?;
        let result = sqlx::query("UPDATE orders SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(order.id().as_uuid())
            .bind(order.status().as_str())
            .bind(order.updated_at())
            .execute(&mut *exec)
            .await
            .map_err(db_error("failed to update order"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::OrderNotFound(order.id()));
        }
        Ok(())
    }

    async fn delete(&self, conn: Conn<'_, PgTransaction>, id: OrderId) -> Result<(), StoreError> {
        let mut exec = executor(&self.pool, conn).await?;
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *exec)
            .await
            .map_err(db_error("failed to delete order"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::OrderNotFound(id));
        }
        Ok(())
    }
}
