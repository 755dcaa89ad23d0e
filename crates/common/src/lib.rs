//! Shared types used across the storefront crates.

mod pagination;
mod types;

pub use pagination::Pagination;
pub use types::{OrderId, OrderItemId, ProductId, UserId};
