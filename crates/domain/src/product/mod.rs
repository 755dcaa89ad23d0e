//! Product catalog: money and inventory value types, the product entity, its
//! repository contract, and the catalog service.

mod commands;
mod entity;
mod repository;
mod service;
mod value_objects;

pub use commands::{AdjustStock, CreateProduct, UpdatePrice};
pub use entity::Product;
pub use repository::ProductRepository;
pub use service::ProductService;
pub use value_objects::{Inventory, Money};

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by product value types and the product entity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductError {
    /// Money amounts cannot be negative.
    #[error("Amount cannot be negative: {0}")]
    NegativeAmount(Decimal),

    /// Stock levels cannot be negative.
    #[error("Inventory cannot be negative: {0}")]
    NegativeInventory(i32),

    /// A reservation asked for more than is on hand.
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: i32, available: i32 },

    /// Quantity must be greater than zero.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: i32 },

    /// Description is empty after trimming.
    #[error("Product description cannot be empty")]
    EmptyDescription,
}
