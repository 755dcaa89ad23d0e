//! Order placement and lifecycle service.

use std::time::Instant;

use common::{OrderId, Pagination, UserId};

use super::{Order, OrderError, OrderItem, OrderRepository, PlaceOrder};
use crate::error::DomainError;
use crate::product::ProductRepository;
use crate::transaction::{Conn, TransactionManager, finish};

/// Service for placing orders and moving them through their lifecycle.
///
/// Placement validates the request, then within one transaction looks up
/// each product, checks availability, snapshots description and price into a
/// line item and reserves the stock before moving on to the next line. The
/// order and its items are written last. Any failure rolls the whole
/// transaction back, reservations included.
pub struct OrderService<O, P, T> {
    orders: O,
    products: P,
    transactions: T,
}

impl<O, P, T> OrderService<O, P, T>
where
    T: TransactionManager,
    O: OrderRepository<Tx = T::Tx>,
    P: ProductRepository<Tx = T::Tx>,
{
    /// Creates a new order service.
    pub fn new(orders: O, products: P, transactions: T) -> Self {
        Self {
            orders,
            products,
            transactions,
        }
    }

    /// Places an order in a transaction of its own.
    #[tracing::instrument(skip(self, cmd), fields(user_id = %cmd.user_id, lines = cmd.lines.len()))]
    pub async fn place_order(&self, cmd: PlaceOrder) -> Result<Order, DomainError> {
        let started = Instant::now();

        let result = match validate(&cmd) {
            Ok(()) => match self.transactions.begin().await {
                Ok(mut tx) => {
                    let outcome = self.place_order_within(&mut tx, &cmd).await;
                    finish(tx, outcome).await
                }
                Err(err) => Err(err.into()),
            },
            Err(err) => Err(err.into()),
        };

        match &result {
            Ok(order) => {
                metrics::counter!("orders_placed_total").increment(1);
                metrics::histogram!("order_placement_duration_seconds")
                    .record(started.elapsed().as_secs_f64());
                tracing::info!(
                    order_id = %order.id(),
                    total = %order.total_price(),
                    "order placed"
                );
            }
            Err(err) => {
                metrics::counter!("orders_rejected_total", "reason" => err.kind().as_str())
                    .increment(1);
                tracing::warn!(error = %err, "order rejected");
            }
        }
        result
    }

    /// Places an order on a transaction the caller already holds.
    ///
    /// Nothing is committed here; the caller decides the outcome of `tx`.
    pub async fn place_order_within(
        &self,
        tx: &mut T::Tx,
        cmd: &PlaceOrder,
    ) -> Result<Order, DomainError> {
        validate(cmd)?;

        let order_id = OrderId::new();
        let mut items = Vec::with_capacity(cmd.lines.len());

        for line in &cmd.lines {
            let product = self
                .products
                .get_by_id(Conn::Tx(&mut *tx), line.product_id)
                .await?;

            if !product.is_available(line.quantity) {
                return Err(DomainError::InsufficientStock {
                    product_id: line.product_id,
                    requested: line.quantity,
                });
            }

            items.push(OrderItem::new(
                order_id,
                product.id(),
                product.description(),
                product.price(),
                line.quantity,
            )?);

            // Later lines for the same product see the reduced quantity.
            self.products
                .reserve_stock(Conn::Tx(&mut *tx), line.product_id, line.quantity)
                .await?;
            metrics::counter!("stock_reserved_units_total").increment(line.quantity as u64);
        }

        let order = Order::new(order_id, cmd.user_id, items)?;
        self.orders.create(Conn::Tx(tx), &order).await?;
        Ok(order)
    }

    /// Loads an order by ID.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, id: OrderId) -> Result<Order, DomainError> {
        Ok(self.orders.get_by_id(Conn::Pool, id).await?)
    }

    /// Lists a user's orders, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn get_user_orders(
        &self,
        user_id: UserId,
        page: Pagination,
    ) -> Result<Vec<Order>, DomainError> {
        Ok(self.orders.get_by_user_id(Conn::Pool, user_id, page).await?)
    }

    /// Pending → Confirmed.
    #[tracing::instrument(skip(self))]
    pub async fn confirm_order(&self, id: OrderId) -> Result<Order, DomainError> {
        self.transition(id, Order::confirm).await
    }

    /// Pending or Confirmed → Cancelled.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(&self, id: OrderId) -> Result<Order, DomainError> {
        self.transition(id, Order::cancel).await
    }

    /// Confirmed → Completed.
    #[tracing::instrument(skip(self))]
    pub async fn complete_order(&self, id: OrderId) -> Result<Order, DomainError> {
        self.transition(id, Order::complete).await
    }

    async fn transition(
        &self,
        id: OrderId,
        apply: fn(&mut Order) -> Result<(), OrderError>,
    ) -> Result<Order, DomainError> {
        let mut tx = self.transactions.begin().await?;
        let outcome = self.transition_within(&mut tx, id, apply).await;
        let order = finish(tx, outcome).await?;

        metrics::counter!("order_status_transitions_total", "to" => order.status().as_str())
            .increment(1);
        tracing::info!(order_id = %id, status = %order.status(), "order status changed");
        Ok(order)
    }

    async fn transition_within(
        &self,
        tx: &mut T::Tx,
        id: OrderId,
        apply: fn(&mut Order) -> Result<(), OrderError>,
    ) -> Result<Order, DomainError> {
        let mut order = self.orders.get_by_id(Conn::Tx(&mut *tx), id).await?;
        apply(&mut order)?;
        self.orders.update(Conn::Tx(tx), &order).await?;
        Ok(order)
    }
}

/// Rejects requests that can never succeed before any I/O happens.
fn validate(cmd: &PlaceOrder) -> Result<(), OrderError> {
    if cmd.lines.is_empty() {
        return Err(OrderError::EmptyOrder);
    }
    if let Some(line) = cmd.lines.iter().find(|line| line.quantity <= 0) {
        return Err(OrderError::InvalidQuantity {
            quantity: line.quantity,
        });
    }
    Ok(())
}
