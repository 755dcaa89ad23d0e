//! Catalog service.

use common::{Pagination, ProductId};

use super::{
    AdjustStock, CreateProduct, Inventory, Money, Product, ProductError, ProductRepository,
    UpdatePrice,
};
use crate::error::DomainError;
use crate::transaction::{Conn, TransactionManager, finish};

/// Service for managing catalog products.
///
/// Validation happens before any I/O; every write runs inside one
/// transaction opened from the injected [`TransactionManager`].
pub struct ProductService<P, T> {
    products: P,
    transactions: T,
}

impl<P, T> ProductService<P, T>
where
    T: TransactionManager,
    P: ProductRepository<Tx = T::Tx>,
{
    /// Creates a new product service.
    pub fn new(products: P, transactions: T) -> Self {
        Self {
            products,
            transactions,
        }
    }

    /// Adds a product to the catalog.
    #[tracing::instrument(skip(self, cmd), fields(description = %cmd.description))]
    pub async fn create_product(&self, cmd: CreateProduct) -> Result<Product, DomainError> {
        let price = Money::new(cmd.price)?;
        let inventory = Inventory::new(cmd.quantity)?;
        let product = Product::new(&cmd.description, cmd.tags, price, inventory)?;

        let mut tx = self.transactions.begin().await?;
        let outcome = self
            .products
            .create(Conn::Tx(&mut tx), &product)
            .await
            .map_err(DomainError::from);
        finish(tx, outcome).await?;

        metrics::counter!("products_created_total").increment(1);
        tracing::info!(product_id = %product.id(), "product created");
        Ok(product)
    }

    /// Loads a product by ID.
    #[tracing::instrument(skip(self))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, DomainError> {
        Ok(self.products.get_by_id(Conn::Pool, id).await?)
    }

    /// Lists products, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_products(&self, page: Pagination) -> Result<Vec<Product>, DomainError> {
        Ok(self.products.list(Conn::Pool, page).await?)
    }

    /// Replaces a product's price.
    #[tracing::instrument(skip(self))]
    pub async fn update_price(&self, cmd: UpdatePrice) -> Result<Product, DomainError> {
        let price = Money::new(cmd.price)?;

        let mut tx = self.transactions.begin().await?;
        let outcome = self.apply_price(&mut tx, cmd.product_id, price).await;
        finish(tx, outcome).await
    }

    /// Adds or removes stock according to the sign of the delta.
    #[tracing::instrument(skip(self))]
    pub async fn adjust_stock(&self, cmd: AdjustStock) -> Result<Product, DomainError> {
        let mut tx = self.transactions.begin().await?;
        let outcome = self.apply_stock(&mut tx, cmd.product_id, cmd.delta).await;
        finish(tx, outcome).await
    }

    /// Reserves stock in a transaction of its own.
    #[tracing::instrument(skip(self))]
    pub async fn reserve_stock(&self, id: ProductId, quantity: i32) -> Result<(), DomainError> {
        let mut tx = self.transactions.begin().await?;
        let outcome = self.reserve_stock_within(&mut tx, id, quantity).await;
        finish(tx, outcome).await
    }

    /// Reserves stock on a transaction the caller already holds.
    pub async fn reserve_stock_within(
        &self,
        tx: &mut T::Tx,
        id: ProductId,
        quantity: i32,
    ) -> Result<(), DomainError> {
        if quantity <= 0 {
            return Err(ProductError::InvalidQuantity { quantity }.into());
        }
        self.products
            .reserve_stock(Conn::Tx(tx), id, quantity)
            .await?;
        metrics::counter!("stock_reserved_units_total").increment(quantity as u64);
        Ok(())
    }

    async fn apply_price(
        &self,
        tx: &mut T::Tx,
        id: ProductId,
        price: Money,
    ) -> Result<Product, DomainError> {
        let mut product = self.products.get_by_id(Conn::Tx(&mut *tx), id).await?;
        product.update_price(price);
        self.products.update(Conn::Tx(&mut *tx), &product).await?;
        // Reload so the returned quantity is the stored one, not the copy read above.
        Ok(self.products.get_by_id(Conn::Tx(tx), id).await?)
    }

    async fn apply_stock(
        &self,
        tx: &mut T::Tx,
        id: ProductId,
        delta: i32,
    ) -> Result<Product, DomainError> {
        self.products
            .adjust_stock(Conn::Tx(&mut *tx), id, delta)
            .await?;
        Ok(self.products.get_by_id(Conn::Tx(tx), id).await?)
    }
}
