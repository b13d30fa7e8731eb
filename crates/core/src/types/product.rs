//! Catalog products, cart entries and stock levels.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// Display data for a product, as returned by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDetails {
    pub id: ProductId,
    pub title: String,
    pub price: Price,
    pub image: String,
}

/// A product held in the cart.
///
/// `amount` is non-zero by construction; an entry whose quantity would drop
/// to zero is removed from the cart instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub price: Price,
    pub image: String,
    pub amount: NonZeroU32,
}

impl Product {
    /// Build a cart entry from catalog details.
    #[must_use]
    pub fn from_details(details: ProductDetails, amount: NonZeroU32) -> Self {
        Self {
            id: details.id,
            title: details.title,
            price: details.price,
            image: details.image,
            amount,
        }
    }

    /// Quantity held in the cart.
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.amount.get()
    }

    /// Unit price multiplied by quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price * self.amount.get()
    }
}

/// Units of a product available from the warehouse.
///
/// The warehouse may report zero or a negative figure (oversold); both mean
/// nothing can be held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    pub id: ProductId,
    pub amount: i64,
}

impl Stock {
    /// Whether `requested` units can be held in the cart.
    #[must_use]
    pub fn allows(&self, requested: u32) -> bool {
        i64::from(requested) <= self.amount
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn details() -> ProductDetails {
        ProductDetails {
            id: ProductId::new(1),
            title: "Tênis de Caminhada Leve Confortável".to_string(),
            price: Price::from_cents(17990),
            image: "https://images.example.com/shoe-1.jpg".to_string(),
        }
    }

    #[test]
    fn test_from_details_keeps_display_fields() {
        let product = Product::from_details(details(), NonZeroU32::new(2).unwrap());
        assert_eq!(product.id, ProductId::new(1));
        assert_eq!(product.title, "Tênis de Caminhada Leve Confortável");
        assert_eq!(product.quantity(), 2);
    }

    #[test]
    fn test_line_total() {
        let product = Product::from_details(details(), NonZeroU32::new(3).unwrap());
        assert_eq!(product.line_total(), Price::from_cents(53970));
    }

    #[test]
    fn test_zero_amount_is_rejected_on_decode() {
        let json = r#"{"id":1,"title":"x","price":"1.00","image":"","amount":0}"#;
        assert!(serde_json::from_str::<Product>(json).is_err());
    }

    #[test]
    fn test_details_decode_ignores_unknown_fields() {
        let json = r#"{"id":3,"title":"Tênis","price":139.9,"image":"i.jpg","brand":"x"}"#;
        let details: ProductDetails = serde_json::from_str(json).unwrap();
        assert_eq!(details.id, ProductId::new(3));
        assert_eq!(details.price, Price::from_cents(13990));
    }

    #[test]
    fn test_stock_allows() {
        let stock = Stock {
            id: ProductId::new(1),
            amount: 5,
        };
        assert!(stock.allows(5));
        assert!(!stock.allows(6));
        assert!(stock.allows(0));
    }

    #[test]
    fn test_negative_stock_allows_nothing() {
        let stock: Stock = serde_json::from_str(r#"{"id":1,"amount":-1}"#).unwrap();
        assert_eq!(stock.amount, -1);
        assert!(!stock.allows(1));
        assert!(!stock.allows(u32::MAX));
    }
}
