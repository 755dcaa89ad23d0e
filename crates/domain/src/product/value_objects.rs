//! Value objects for the product catalog.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ProductError;

/// A non-negative decimal amount of money.
///
/// Serialized as a decimal string (`"10.50"`) so no precision is lost in
/// transit. Deserialization goes through [`Money::new`], so a negative amount
/// can never be smuggled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    /// Creates a money amount, rejecting negative values.
    pub fn new(amount: Decimal) -> Result<Self, ProductError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(ProductError::NegativeAmount(amount));
        }
        Ok(Self(amount))
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Returns the amount.
    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Multiplies by a line quantity.
    ///
    /// Returns `None` for a negative quantity or when the product does not
    /// fit in a [`Decimal`].
    pub fn checked_mul(&self, quantity: i32) -> Option<Self> {
        if quantity < 0 {
            return None;
        }
        self.0.checked_mul(Decimal::from(quantity)).map(Self)
    }

    /// Adds two amounts, returning `None` on overflow.
    pub fn checked_add(&self, other: Money) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Sums amounts, returning `None` as soon as the running total overflows.
    pub fn checked_sum<I: IntoIterator<Item = Money>>(amounts: I) -> Option<Self> {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |total, amount| total.checked_add(amount))
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl TryFrom<Decimal> for Money {
    type Error = ProductError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Money::new(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Units of a product on hand. Never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Inventory(i32);

impl Inventory {
    /// Creates an inventory level, rejecting negative quantities.
    pub fn new(quantity: i32) -> Result<Self, ProductError> {
        if quantity < 0 {
            return Err(ProductError::NegativeInventory(quantity));
        }
        Ok(Self(quantity))
    }

    /// Returns the quantity on hand.
    pub fn quantity(&self) -> i32 {
        self.0
    }

    /// Returns true if `requested` units can be taken.
    pub fn is_available(&self, requested: i32) -> bool {
        requested <= self.0
    }

    /// Takes `quantity` units. On failure the level is left untouched.
    pub fn reserve(&mut self, quantity: i32) -> Result<(), ProductError> {
        if quantity <= 0 {
            return Err(ProductError::InvalidQuantity { quantity });
        }
        if quantity > self.0 {
            return Err(ProductError::InsufficientStock {
                requested: quantity,
                available: self.0,
            });
        }
        self.0 -= quantity;
        Ok(())
    }

    /// Puts `quantity` units back on hand.
    pub fn add(&mut self, quantity: i32) -> Result<(), ProductError> {
        if quantity <= 0 {
            return Err(ProductError::InvalidQuantity { quantity });
        }
        self.0 = self
            .0
            .checked_add(quantity)
            .ok_or(ProductError::InvalidQuantity { quantity })?;
        Ok(())
    }
}

impl TryFrom<i32> for Inventory {
    type Error = ProductError;

    fn try_from(quantity: i32) -> Result<Self, Self::Error> {
        Inventory::new(quantity)
    }
}

impl From<Inventory> for i32 {
    fn from(inventory: Inventory) -> Self {
        inventory.0
    }
}
