//! Cart state management.
//!
//! [`CartManager`] owns the in-memory cart, checks quantity increases against
//! a [`StockLookup`](crate::api::StockLookup), and mirrors every successful
//! change to a [`KeyValueStore`](crate::storage::KeyValueStore).
//!
//! # Consistency
//!
//! - Mutations are serialized by one async lock held from reading the
//!   current quantity until the new cart is published
//! - A new cart is staged, persisted, and only then published; a failed
//!   lookup or write leaves both memory and store untouched
//! - Readers get the last published `Arc<Cart>` and never wait on a mutation

mod manager;

pub use manager::{CartManager, CartServices};

use rocket_shoes_core::ProductId;

/// How to treat an unreadable snapshot when the manager starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPolicy {
    /// Log and start with an empty cart.
    #[default]
    Lenient,
    /// Fail construction.
    Strict,
}

/// Request to set a product's quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateProductAmount {
    pub product_id: ProductId,
    /// Requested absolute quantity; values below 1 are ignored.
    pub amount: i32,
}

/// Notice texts shown to the user.
pub mod messages {
    pub const OUT_OF_STOCK: &str = "Requested quantity is out of stock";
    pub const ADD_FAILED: &str = "Failed to add product to cart";
    pub const REMOVE_FAILED: &str = "Failed to remove product from cart";
    pub const UPDATE_FAILED: &str = "Failed to update product quantity";
}
