//! Order aggregate and related types.

mod aggregate;
mod commands;
mod repository;
mod service;
mod state;
mod value_objects;

pub use aggregate::Order;
pub use commands::{OrderLine, PlaceOrder};
pub use repository::OrderRepository;
pub use service::OrderService;
pub use state::OrderStatus;
pub use value_objects::OrderItem;

use common::{OrderId, OrderItemId};
use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// An order must contain at least one item.
    #[error("Order has no items")]
    EmptyOrder,

    /// Invalid quantity.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: i32 },

    /// Order is not in the expected status.
    #[error("Invalid status transition: cannot {action} from {current} status")]
    InvalidStatusTransition {
        current: OrderStatus,
        action: &'static str,
    },

    /// A line total or the order total is too large to represent.
    #[error("Order total is too large to represent")]
    TotalOverflow,

    /// An item was built for a different order.
    #[error("Item {item_id} belongs to order {item_order_id}, not {order_id}")]
    ForeignItem {
        item_id: OrderItemId,
        item_order_id: OrderId,
        order_id: OrderId,
    },

    /// A stored status string is not a known status.
    #[error("Unknown order status: {0}")]
    UnknownStatus(String),
}
