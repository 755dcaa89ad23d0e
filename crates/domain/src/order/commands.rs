//! Order commands.

use common::{ProductId, UserId};
use serde::{Deserialize, Serialize};

/// One requested line of a new order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: i32,
}

impl OrderLine {
    pub fn new(product_id: ProductId, quantity: i32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// Command to place an order.
///
/// Lines are processed in the given order; the same product may appear more
/// than once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrder {
    pub user_id: UserId,
    pub lines: Vec<OrderLine>,
}

impl PlaceOrder {
    /// Creates a new PlaceOrder command.
    pub fn new(user_id: UserId, lines: Vec<OrderLine>) -> Self {
        Self { user_id, lines }
    }

    /// Adds a line.
    pub fn with_line(mut self, product_id: ProductId, quantity: i32) -> Self {
        self.lines.push(OrderLine::new(product_id, quantity));
        self
    }
}
