//! Order line items.

use chrono::{DateTime, Utc};
use common::{OrderId, OrderItemId, ProductId};
use serde::Serialize;

use super::OrderError;
use crate::product::Money;

/// A line item in an order.
///
/// Description and price are copied from the product when the order is
/// placed, so later catalog changes never alter a historical order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderItem {
    id: OrderItemId,
    order_id: OrderId,
    product_id: ProductId,
    product_description: String,
    product_price: Money,
    quantity: i32,
    line_total: Money,
    created_at: DateTime<Utc>,
}

impl OrderItem {
    /// Creates a new order item.
    ///
    /// Quantity must be greater than zero and price × quantity must be
    /// representable; the latter fails with [`OrderError::TotalOverflow`].
    pub fn new(
        order_id: OrderId,
        product_id: ProductId,
        product_description: impl Into<String>,
        product_price: Money,
        quantity: i32,
    ) -> Result<Self, OrderError> {
        if quantity <= 0 {
            return Err(OrderError::InvalidQuantity { quantity });
        }
        Self::restore(
            OrderItemId::new(),
            order_id,
            product_id,
            product_description.into(),
            product_price,
            quantity,
            Utc::now(),
        )
    }

    /// Rebuilds an item from persisted state, recomputing its line total.
    pub fn restore(
        id: OrderItemId,
        order_id: OrderId,
        product_id: ProductId,
        product_description: String,
        product_price: Money,
        quantity: i32,
        created_at: DateTime<Utc>,
    ) -> Result<Self, OrderError> {
        let line_total = product_price
            .checked_mul(quantity)
            .ok_or(OrderError::TotalOverflow)?;
        Ok(Self {
            id,
            order_id,
            product_id,
            product_description,
            product_price,
            quantity,
            line_total,
            created_at,
        })
    }

    pub fn id(&self) -> OrderItemId {
        self.id
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn product_description(&self) -> &str {
        &self.product_description
    }

    pub fn product_price(&self) -> Money {
        self.product_price
    }

    pub fn quantity(&self) -> i32 {
        self.quantity
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns price × quantity.
    pub fn line_total(&self) -> Money {
        self.line_total
    }
}
