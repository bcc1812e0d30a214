use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CartError {
    #[error("cart line name is empty")]
    EmptyName,

    #[error("quantity must be positive: {0}")]
    NonPositiveQuantity(u32),

    #[error("unit price must not be negative: {0}")]
    NegativePrice(Decimal),
}

/// A single line of a client cart.
///
/// Immutable once handed to the receipt calculator; validation happens at
/// construction so the calculators can assume well-formed input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl CartLine {
    /// Build a validated cart line.
    pub fn new(
        name: impl Into<String>,
        quantity: u32,
        unit_price: Decimal,
    ) -> Result<Self, CartError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CartError::EmptyName);
        }
        if quantity == 0 {
            return Err(CartError::NonPositiveQuantity(quantity));
        }
        if unit_price.is_sign_negative() {
            return Err(CartError::NegativePrice(unit_price));
        }
        Ok(Self {
            name,
            quantity,
            unit_price,
        })
    }

    /// quantity × unit price, full precision.
    pub fn line_total(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_price
    }
}
