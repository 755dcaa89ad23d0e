//! PostgreSQL storage for the storefront backend.
//!
//! Implements every repository contract and the transaction manager from the
//! `domain` crate over `sqlx`, plus bounded-retry pool bootstrap and schema
//! migrations.

mod error;
mod order;
mod pool;
mod product;
mod transaction;
mod user;

pub use error::RetriesExhausted;
pub use order::PgOrderRepository;
pub use pool::{DatabaseConfig, PgStore, RetryPolicy, connect_with_retry};
pub use product::PgProductRepository;
pub use transaction::{PgTransaction, PgTransactionManager};
pub use user::PgUserRepository;
