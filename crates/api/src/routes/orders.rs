//! Order placement and lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{OrderId, ProductId, UserId};
use domain::{Money, Order, OrderItem, OrderLine, OrderStatus, PlaceOrder};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, parse_id};
use crate::routes::products::PageParams;
use crate::state::{AppState, Backend};

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub user_id: String,
    pub items: Vec<OrderLineRequest>,
}

#[derive(Debug, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: String,
    pub quantity: i32,
}

impl PlaceOrderRequest {
    fn into_command(self) -> Result<PlaceOrder, ApiError> {
        let user_id: UserId = parse_id(&self.user_id, "user")?;
        let lines = self
            .items
            .iter()
            .map(|line| -> Result<OrderLine, ApiError> {
                let product_id: ProductId = parse_id(&line.product_id, "product")?;
                Ok(OrderLine::new(product_id, line.quantity))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PlaceOrder::new(user_id, lines))
    }
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub user_id: String,
    pub status: OrderStatus,
    pub total_price: Money,
    pub items: Vec<OrderItemResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub id: String,
    pub product_id: String,
    pub product_description: String,
    pub product_price: Money,
    pub quantity: i32,
    pub line_total: Money,
}

impl From<&OrderItem> for OrderItemResponse {
    fn from(item: &OrderItem) -> Self {
        Self {
            id: item.id().to_string(),
            product_id: item.product_id().to_string(),
            product_description: item.product_description().to_string(),
            product_price: item.product_price(),
            quantity: item.quantity(),
            line_total: item.line_total(),
        }
    }
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id().to_string(),
            user_id: order.user_id().to_string(),
            status: order.status(),
            total_price: order.total_price(),
            items: order.items().iter().map(OrderItemResponse::from).collect(),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
        }
    }
}

// -- Handlers --

/// POST /v1/orders: place an order, reserving stock for every line.
#[tracing::instrument(skip(state, req), fields(user_id = %req.user_id, lines = req.items.len()))]
pub async fn create<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let cmd = req.into_command()?;
    let order = state.orders.place_order(cmd).await?;
    Ok((StatusCode::CREATED, Json(OrderResponse::from(&order))))
}

/// GET /v1/orders/{id}: load an order with its items.
#[tracing::instrument(skip(state))]
pub async fn get<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let id: OrderId = parse_id(&id, "order")?;
    let order = state.orders.get_order(id).await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// PUT /v1/orders/{id}/confirm: Pending → Confirmed.
#[tracing::instrument(skip(state))]
pub async fn confirm<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let id: OrderId = parse_id(&id, "order")?;
    let order = state.orders.confirm_order(id).await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// PUT /v1/orders/{id}/cancel: Pending or Confirmed → Cancelled.
#[tracing::instrument(skip(state))]
pub async fn cancel<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let id: OrderId = parse_id(&id, "order")?;
    let order = state.orders.cancel_order(id).await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// PUT /v1/orders/{id}/complete: Confirmed → Completed.
#[tracing::instrument(skip(state))]
pub async fn complete<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let id: OrderId = parse_id(&id, "order")?;
    let order = state.orders.complete_order(id).await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// GET /v1/users/{user_id}/orders: a user's orders, newest first.
#[tracing::instrument(skip(state))]
pub async fn list_for_user<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
    Path(user_id): Path<String>,
    Query(page): Query<PageParams>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let user_id: UserId = parse_id(&user_id, "user")?;
    let orders = state
        .orders
        .get_user_orders(user_id, page.into())
        .await?;
    Ok(Json(orders.iter().map(OrderResponse::from).collect()))
}
