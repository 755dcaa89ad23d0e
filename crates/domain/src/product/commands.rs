//! Inputs for catalog operations.

use common::ProductId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Command to add a product to the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProduct {
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub price: Decimal,
    pub quantity: i32,
}

impl CreateProduct {
    pub fn new(
        description: impl Into<String>,
        tags: Vec<String>,
        price: Decimal,
        quantity: i32,
    ) -> Self {
        Self {
            description: description.into(),
            tags,
            price,
            quantity,
        }
    }
}

/// Command to replace a product's price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePrice {
    pub product_id: ProductId,
    pub price: Decimal,
}

impl UpdatePrice {
    pub fn new(product_id: ProductId, price: Decimal) -> Self {
        Self { product_id, price }
    }
}

/// Command to change a product's stock level by a signed delta.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustStock {
    pub product_id: ProductId,
    pub delta: i32,
}

impl AdjustStock {
    pub fn new(product_id: ProductId, delta: i32) -> Self {
        Self { product_id, delta }
    }
}
