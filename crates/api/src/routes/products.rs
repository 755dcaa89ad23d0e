//! Catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{Pagination, ProductId};
use domain::{AdjustStock, CreateProduct, Money, Product, UpdatePrice};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, parse_id};
use crate::state::{AppState, Backend};

// -- Request types --

/// `?limit=&offset=` on listing endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl From<PageParams> for Pagination {
    fn from(params: PageParams) -> Self {
        Pagination::new(params.limit, params.offset)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdatePriceRequest {
    pub price: Decimal,
}

/// Signed change applied to the stock level.
#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    #[serde(alias = "delta")]
    pub quantity: i32,
}

// -- Response types --

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub description: String,
    pub tags: Vec<String>,
    pub price: Money,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Product> for ProductResponse {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id().to_string(),
            description: product.description().to_string(),
            tags: product.tags().to_vec(),
            price: product.price(),
            quantity: product.quantity(),
            created_at: product.created_at(),
            updated_at: product.updated_at(),
        }
    }
}

// -- Handlers --

/// POST /v1/products: add a product to the catalog.
#[tracing::instrument(skip(state, req), fields(description = %req.description))]
pub async fn create<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
    Json(req): Json<CreateProduct>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let product = state.products.create_product(req).await?;
    Ok((StatusCode::CREATED, Json(ProductResponse::from(&product))))
}

/// GET /v1/products: list the catalog, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
    Query(page): Query<PageParams>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state.products.list_products(page.into()).await?;
    Ok(Json(products.iter().map(ProductResponse::from).collect()))
}

/// GET /v1/products/{id}: load a product.
#[tracing::instrument(skip(state))]
pub async fn get<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let id: ProductId = parse_id(&id, "product")?;
    let product = state.products.get_product(id).await?;
    Ok(Json(ProductResponse::from(&product)))
}

/// PUT /v1/products/{id}/price: change the list price.
#[tracing::instrument(skip(state))]
pub async fn update_price<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdatePriceRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    let id: ProductId = parse_id(&id, "product")?;
    let product = state
        .products
        .update_price(UpdatePrice::new(id, req.price))
        .await?;
    Ok(Json(ProductResponse::from(&product)))
}

/// PUT /v1/products/{id}/stock: restock or write off units.
#[tracing::instrument(skip(state))]
pub async fn adjust_stock<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
    Path(id): Path<String>,
    Json(req): Json<AdjustStockRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    let id: ProductId = parse_id(&id, "product")?;
    let product = state
        .products
        .adjust_stock(AdjustStock::new(id, req.quantity))
        .await?;
    Ok(Json(ProductResponse::from(&product)))
}
