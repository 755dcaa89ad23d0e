//! Domain error types.

use common::{OrderId, ProductId};
use thiserror::Error;

use crate::order::OrderError;
use crate::product::ProductError;
use crate::user::UserError;

/// Boxed source error from a storage backend.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors reported by repositories and transaction managers.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No product row exists for the id.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// No order row exists for the id.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// No user matches the lookup key (id or email).
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// The conditional stock decrement matched no row.
    #[error("Insufficient stock for product {product_id}: requested {requested}")]
    InsufficientStock {
        product_id: ProductId,
        requested: i32,
    },

    /// Adding stock would push the level past the largest storable quantity.
    #[error("Stock overflow for product {product_id}: cannot add {delta}")]
    StockOverflow { product_id: ProductId, delta: i32 },

    /// A unique constraint rejected the write.
    #[error("Duplicate {0}")]
    Duplicate(String),

    /// Persisted data could not be turned back into a domain value.
    #[error("Corrupt stored data: {0}")]
    Decode(String),

    /// The backend itself failed (connection, query, begin/commit/rollback).
    #[error("{context}: {source}")]
    Backend {
        context: &'static str,
        #[source]
        source: BoxError,
    },
}

impl StoreError {
    /// Wraps a backend error with a short description of what was attempted.
    pub fn backend(context: &'static str, source: impl Into<BoxError>) -> Self {
        StoreError::Backend {
            context,
            source: source.into(),
        }
    }
}

/// Coarse classification used by callers to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller-correctable input problems, rejected before any I/O.
    Validation,
    /// The referenced entity does not exist.
    NotFound,
    /// A business rule rejected the request (stock, status, duplicates).
    Conflict,
    /// Credentials did not match.
    Unauthorized,
    /// The database or another collaborator failed.
    Infrastructure,
}

impl ErrorKind {
    /// Returns a stable lowercase label, used for metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Infrastructure => "infrastructure",
        }
    }
}

/// Errors surfaced by the domain services.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Insufficient stock for product {product_id}: requested {requested}")]
    InsufficientStock {
        product_id: ProductId,
        requested: i32,
    },

    #[error(transparent)]
    Product(#[from] ProductError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    User(#[from] UserError),

    /// Storage failure that is not a domain outcome.
    #[error("Storage error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ProductNotFound(id) => DomainError::ProductNotFound(id),
            StoreError::OrderNotFound(id) => DomainError::OrderNotFound(id),
            StoreError::UserNotFound(key) => DomainError::UserNotFound(key),
            StoreError::InsufficientStock {
                product_id,
                requested,
            } => DomainError::InsufficientStock {
                product_id,
                requested,
            },
            StoreError::StockOverflow { delta, .. } => {
                DomainError::Product(ProductError::InvalidQuantity { quantity: delta })
            }
            other => DomainError::Store(other),
        }
    }
}

impl DomainError {
    /// Returns the error's category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::ProductNotFound(_)
            | DomainError::OrderNotFound(_)
            | DomainError::UserNotFound(_) => ErrorKind::NotFound,
            DomainError::InsufficientStock { .. } => ErrorKind::Conflict,
            DomainError::Product(err) => match err {
                ProductError::InsufficientStock { .. } => ErrorKind::Conflict,
                _ => ErrorKind::Validation,
            },
            DomainError::Order(err) => match err {
                OrderError::InvalidStatusTransition { .. } => ErrorKind::Conflict,
                _ => ErrorKind::Validation,
            },
            DomainError::User(err) => match err {
                UserError::AlreadyExists(_) => ErrorKind::Conflict,
                UserError::InvalidCredentials => ErrorKind::Unauthorized,
                _ => ErrorKind::Validation,
            },
            DomainError::Store(StoreError::Duplicate(_)) => ErrorKind::Conflict,
            DomainError::Store(_) => ErrorKind::Infrastructure,
        }
    }
}
