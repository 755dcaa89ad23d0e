//! Integration tests across the user, catalog and order services.
//!
//! These tests wire the services onto one in-memory database the way the
//! server does and drive complete workflows through the public API.

use common::{Pagination, ProductId, UserId};
use domain::{
    AdjustStock, CreateProduct, DomainError, ErrorKind, InMemoryOrderRepository,
    InMemoryProductRepository, InMemoryTransactionManager, InMemoryUserRepository,
    MemoryDatabase, OrderService, OrderStatus, PasswordHasher, PlaceOrder, ProductService,
    RegisterUser, UpdatePrice, UserService,
};
use rust_decimal_macros::dec;

struct ReversingHasher;

impl PasswordHasher for ReversingHasher {
    fn hash(&self, password: &str) -> String {
        password.chars().rev().collect()
    }

    fn verify(&self, hash: &str, password: &str) -> bool {
        self.hash(password) == hash
    }
}

struct Store {
    users: UserService<InMemoryUserRepository, InMemoryTransactionManager, ReversingHasher>,
    products: ProductService<InMemoryProductRepository, InMemoryTransactionManager>,
    orders: OrderService<
        InMemoryOrderRepository,
        InMemoryProductRepository,
        InMemoryTransactionManager,
    >,
}

fn create_store() -> Store {
    let db = MemoryDatabase::new();
    Store {
        users: UserService::new(db.users(), db.transactions(), ReversingHasher),
        products: ProductService::new(db.products(), db.transactions()),
        orders: OrderService::new(db.orders(), db.products(), db.transactions()),
    }
}

fn registration(email: &str, age: i32) -> RegisterUser {
    RegisterUser {
        first_name: "Grace".into(),
        last_name: "Hopper".into(),
        email: email.into(),
        age,
        is_married: true,
        password: "cobol-forever".into(),
    }
}

mod order_lifecycle {
    use super::*;

    #[tokio::test]
    async fn register_create_place_confirm() {
        let store = create_store();

        let user = store
            .users
            .register(registration("grace@example.com", 25))
            .await
            .unwrap();

        let product = store
            .products
            .create_product(CreateProduct::new("Compiler manual", vec![], dec!(10.50), 100))
            .await
            .unwrap();

        let order = store
            .orders
            .place_order(PlaceOrder::new(user.id(), vec![]).with_line(product.id(), 2))
            .await
            .unwrap();

        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.total_price().amount(), dec!(21.00));
        let product_after = store.products.get_product(product.id()).await.unwrap();
        assert_eq!(product_after.quantity(), 98);

        let confirmed = store.orders.confirm_order(order.id()).await.unwrap();
        assert_eq!(confirmed.status(), OrderStatus::Confirmed);

        let completed = store.orders.complete_order(order.id()).await.unwrap();
        assert_eq!(completed.status(), OrderStatus::Completed);
    }

    #[tokio::test]
    async fn catalog_changes_do_not_rewrite_history() {
        let store = create_store();
        let product = store
            .products
            .create_product(CreateProduct::new("Punch cards", vec![], dec!(3.00), 10))
            .await
            .unwrap();

        let order = store
            .orders
            .place_order(PlaceOrder::new(UserId::new(), vec![]).with_line(product.id(), 3))
            .await
            .unwrap();

        store
            .products
            .update_price(UpdatePrice::new(product.id(), dec!(99.00)))
            .await
            .unwrap();

        let loaded = store.orders.get_order(order.id()).await.unwrap();
        assert_eq!(loaded.items()[0].product_price().amount(), dec!(3.00));
        assert_eq!(loaded.total_price().amount(), dec!(9.00));
    }

    #[tokio::test]
    async fn restock_allows_previously_rejected_order() {
        let store = create_store();
        let product = store
            .products
            .create_product(CreateProduct::new("Vacuum tube", vec![], dec!(1.25), 1))
            .await
            .unwrap();
        let request = PlaceOrder::new(UserId::new(), vec![]).with_line(product.id(), 5);

        let err = store.orders.place_order(request.clone()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        store
            .products
            .adjust_stock(AdjustStock::new(product.id(), 4))
            .await
            .unwrap();
        store.orders.place_order(request).await.unwrap();

        let product = store.products.get_product(product.id()).await.unwrap();
        assert_eq!(product.quantity(), 0);
    }
}

mod failures {
    use super::*;

    #[tokio::test]
    async fn unknown_product_leaves_no_trace() {
        let store = create_store();
        let user_id = UserId::new();

        let err = store
            .orders
            .place_order(PlaceOrder::new(user_id, vec![]).with_line(ProductId::new(), 1))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::ProductNotFound(_)));
        let orders = store
            .orders
            .get_user_orders(user_id, Pagination::default())
            .await
            .unwrap();
        assert!(orders.is_empty());
    }

    #[tokio::test]
    async fn authentication_after_registration() {
        let store = create_store();
        store
            .users
            .register(registration("grace@example.com", 40))
            .await
            .unwrap();

        assert!(
            store
                .users
                .authenticate("grace@example.com", "cobol-forever")
                .await
                .is_ok()
        );
        let err = store
            .users
            .authenticate("grace@example.com", "fortran")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }
}
