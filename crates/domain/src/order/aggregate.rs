//! Order aggregate.

use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use serde::Serialize;

use super::{OrderError, OrderItem, OrderStatus};
use crate::product::Money;

/// An order and its line items, persisted and validated as one unit.
///
/// Orders are only created by the placement workflow. The total is computed
/// once at construction and carried as stored state afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    id: OrderId,
    user_id: UserId,
    items: Vec<OrderItem>,
    status: OrderStatus,
    total_price: Money,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates a pending order from its items.
    ///
    /// Fails with [`OrderError::EmptyOrder`] when there are no items, with
    /// [`OrderError::ForeignItem`] when an item was built for another order,
    /// and with [`OrderError::TotalOverflow`] when the total cannot be
    /// represented.
    pub fn new(id: OrderId, user_id: UserId, items: Vec<OrderItem>) -> Result<Self, OrderError> {
        if items.is_empty() {
            return Err(OrderError::EmptyOrder);
        }
        if let Some(item) = items.iter().find(|item| item.order_id() != id) {
            return Err(OrderError::ForeignItem {
                item_id: item.id(),
                item_order_id: item.order_id(),
                order_id: id,
            });
        }

        let total_price = Money::checked_sum(items.iter().map(OrderItem::line_total))
            .ok_or(OrderError::TotalOverflow)?;
        let now = Utc::now();
        Ok(Self {
            id,
            user_id,
            items,
            status: OrderStatus::Pending,
            total_price,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuilds an order from persisted state.
    pub fn restore(
        id: OrderId,
        user_id: UserId,
        items: Vec<OrderItem>,
        status: OrderStatus,
        total_price: Money,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            items,
            status,
            total_price,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn total_price(&self) -> Money {
        self.total_price
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns true if the order can still be modified.
    pub fn can_be_modified(&self) -> bool {
        self.status == OrderStatus::Pending
    }

    /// Pending → Confirmed.
    pub fn confirm(&mut self) -> Result<(), OrderError> {
        self.transition(OrderStatus::Confirmed, "confirm", OrderStatus::can_confirm)
    }

    /// Pending or Confirmed → Cancelled.
    pub fn cancel(&mut self) -> Result<(), OrderError> {
        self.transition(OrderStatus::Cancelled, "cancel", OrderStatus::can_cancel)
    }

    /// Confirmed → Completed.
    pub fn complete(&mut self) -> Result<(), OrderError> {
        self.transition(OrderStatus::Completed, "complete", OrderStatus::can_complete)
    }

    fn transition(
        &mut self,
        to: OrderStatus,
        action: &'static str,
        allowed: fn(&OrderStatus) -> bool,
    ) -> Result<(), OrderError> {
        if !allowed(&self.status) {
            return Err(OrderError::InvalidStatusTransition {
                current: self.status,
                action,
            });
        }
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }
}
