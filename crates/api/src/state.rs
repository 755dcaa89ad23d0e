//! Shared application state and the storage backends it can run on.

use domain::{
    InMemoryOrderRepository, InMemoryProductRepository, InMemoryTransactionManager,
    InMemoryUserRepository, MemoryDatabase, OrderRepository, OrderService, ProductRepository,
    ProductService, TransactionManager, UserRepository, UserService,
};
use storage::{
    PgOrderRepository, PgProductRepository, PgStore, PgTransactionManager, PgUserRepository,
};

use crate::security::SaltedSha256Hasher;

/// A complete set of repositories sharing one transaction type.
pub trait Backend: Send + Sync + 'static {
    type Transactions: TransactionManager + 'static;
    type Products: ProductRepository<Tx = <Self::Transactions as TransactionManager>::Tx>
        + 'static;
    type Orders: OrderRepository<Tx = <Self::Transactions as TransactionManager>::Tx> + 'static;
    type Users: UserRepository<Tx = <Self::Transactions as TransactionManager>::Tx> + 'static;
}

/// Process-local tables; data is lost on restart.
#[derive(Debug)]
pub struct InMemory;

impl Backend for InMemory {
    type Transactions = InMemoryTransactionManager;
    type Products = InMemoryProductRepository;
    type Orders = InMemoryOrderRepository;
    type Users = InMemoryUserRepository;
}

/// PostgreSQL through a shared connection pool.
#[derive(Debug)]
pub struct Postgres;

impl Backend for Postgres {
    type Transactions = PgTransactionManager;
    type Products = PgProductRepository;
    type Orders = PgOrderRepository;
    type Users = PgUserRepository;
}

/// Shared application state accessible from all handlers.
pub struct AppState<B: Backend> {
    pub service_name: String,
    pub users: UserService<B::Users, B::Transactions, SaltedSha256Hasher>,
    pub products: ProductService<B::Products, B::Transactions>,
    pub orders: OrderService<B::Orders, B::Products, B::Transactions>,
    /// Pinged by `/health`; `None` for the in-memory backend.
    pub database: Option<PgStore>,
}

impl AppState<InMemory> {
    pub fn in_memory(service_name: impl Into<String>, hasher: SaltedSha256Hasher) -> Self {
        let db = MemoryDatabase::new();
        Self {
            service_name: service_name.into(),
            users: UserService::new(db.users(), db.transactions(), hasher),
            products: ProductService::new(db.products(), db.transactions()),
            orders: OrderService::new(db.orders(), db.products(), db.transactions()),
            database: None,
        }
    }
}

impl AppState<Postgres> {
    pub fn postgres(
        service_name: impl Into<String>,
        store: PgStore,
        hasher: SaltedSha256Hasher,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            users: UserService::new(store.users(), store.transactions(), hasher),
            products: ProductService::new(store.products(), store.transactions()),
            orders: OrderService::new(store.orders(), store.products(), store.transactions()),
            database: Some(store),
        }
    }
}
