//! The catalog product entity.

use chrono::{DateTime, Utc};
use common::ProductId;
use serde::Serialize;

use super::{Inventory, Money, ProductError};

/// A catalog item with a price and a stock level.
///
/// Price and stock change only through [`Product::update_price`] and
/// [`Product::adjust_stock`] (or [`Product::reserve`]); each mutation bumps
/// `updated_at`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    id: ProductId,
    description: String,
    tags: Vec<String>,
    price: Money,
    inventory: Inventory,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates a new product with a fresh identity.
    ///
    /// The description is trimmed and must not be empty. Tags are trimmed and
    /// blank ones are dropped.
    pub fn new(
        description: &str,
        tags: Vec<String>,
        price: Money,
        inventory: Inventory,
    ) -> Result<Self, ProductError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(ProductError::EmptyDescription);
        }

        let now = Utc::now();
        Ok(Self {
            id: ProductId::new(),
            description: description.to_string(),
            tags: clean_tags(tags),
            price,
            inventory,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuilds a product from persisted state.
    pub fn restore(
        id: ProductId,
        description: String,
        tags: Vec<String>,
        price: Money,
        inventory: Inventory,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            description,
            tags,
            price,
            inventory,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> ProductId {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn inventory(&self) -> Inventory {
        self.inventory
    }

    /// Shorthand for `inventory().quantity()`.
    pub fn quantity(&self) -> i32 {
        self.inventory.quantity()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Replaces the price.
    pub fn update_price(&mut self, price: Money) {
        self.price = price;
        self.touch();
    }

    /// Changes the stock level by `delta`.
    ///
    /// A positive delta adds stock, a negative one reserves `-delta` units,
    /// and zero leaves the product untouched.
    pub fn adjust_stock(&mut self, delta: i32) -> Result<(), ProductError> {
        match delta {
            0 => return Ok(()),
            d if d > 0 => self.inventory.add(d)?,
            d => {
                let quantity = d
                    .checked_neg()
                    .ok_or(ProductError::InvalidQuantity { quantity: d })?;
                self.inventory.reserve(quantity)?
            }
        }
        self.touch();
        Ok(())
    }

    /// Returns true if `quantity` units are on hand.
    pub fn is_available(&self, quantity: i32) -> bool {
        self.inventory.is_available(quantity)
    }

    /// Takes `quantity` units from stock.
    pub fn reserve(&mut self, quantity: i32) -> Result<(), ProductError> {
        self.inventory.reserve(quantity)?;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}
