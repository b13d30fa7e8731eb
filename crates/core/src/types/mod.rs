//! Core types for Rocket Shoes.
//!
//! This module provides type-safe wrappers for the cart domain.

pub mod cart;
pub mod id;
pub mod price;
pub mod product;

pub use cart::{Cart, DuplicateProductError, SnapshotError};
pub use id::*;
pub use price::{CurrencyCode, Price};
pub use product::{Product, ProductDetails, Stock};
