//! Cart operation outcomes.
//!
//! Every cart operation returns `Result<CartUpdate, CartError>`. Rejections
//! (out of stock, not in cart) and failures (lookup, storage) are distinct
//! variants so callers can tell them apart without inspecting notice text.
//! Whatever the variant, an `Err` means the cart was left exactly as it was.

use rocket_shoes_core::{ProductId, SnapshotError};
use thiserror::Error;

use crate::api::ApiError;
use crate::storage::StorageError;

/// What a successful operation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartUpdate {
    /// The new cart was persisted and published.
    Applied,
    /// The request was a no-op (quantity below 1).
    Ignored,
}

/// Why an operation left the cart unchanged.
#[derive(Debug, Error)]
pub enum CartError {
    /// Requested quantity exceeds available stock.
    #[error("Product {product_id} is out of stock ({requested} requested, {available} available)")]
    OutOfStock {
        product_id: ProductId,
        requested: u32,
        /// Stock reported at the time of the request; may be negative.
        available: i64,
    },

    /// Product is not in the cart.
    #[error("Product {0} is not in the cart")]
    NotFound(ProductId),

    /// Stock or catalog lookup failed.
    #[error("Lookup failed: {0}")]
    Transport(#[from] ApiError),

    /// Persisted store failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Snapshot could not be encoded or decoded.
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
}

impl CartError {
    /// Whether this is a validated rejection rather than a failure.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::OutOfStock { .. } | Self::NotFound(_))
    }
}

/// Result type alias for cart operations.
pub type Result<T> = std::result::Result<T, CartError>;
