//! Domain layer for the storefront backend.
//!
//! This crate provides:
//! - Money and inventory value types and the catalog product entity
//! - The order aggregate with its status state machine
//! - User accounts with registration and authentication
//! - Repository and transaction contracts implemented by storage backends
//! - Services orchestrating the above inside explicit transactions
//! - An in-memory backend for tests and database-less runs

pub mod error;
pub mod memory;
pub mod order;
pub mod product;
pub mod transaction;
pub mod user;

pub use error::{DomainError, ErrorKind, StoreError};
pub use memory::{
    InMemoryOrderRepository, InMemoryProductRepository, InMemoryTransactionManager,
    InMemoryUserRepository, MemoryDatabase, MemoryTx,
};
pub use order::{
    Order, OrderError, OrderItem, OrderLine, OrderRepository, OrderService, OrderStatus,
    PlaceOrder,
};
pub use product::{
    AdjustStock, CreateProduct, Inventory, Money, Product, ProductError, ProductRepository,
    ProductService, UpdatePrice,
};
pub use transaction::{Conn, Transaction, TransactionManager, finish};
pub use user::{
    Email, FullName, PasswordHash, PasswordHasher, RegisterUser, User, UserError,
    UserRepository, UserService,
};
