//! Catalog and stock lookups.
//!
//! # Architecture
//!
//! - [`StockLookup`] and [`CatalogLookup`] are the seams the cart manager
//!   depends on; tests substitute in-memory fakes
//! - [`ApiClient`] implements both against the storefront's JSON REST API
//!   using `reqwest`
//! - Catalog details are cached in memory via `moka`; stock is always fetched
//!
//! # Endpoints
//!
//! - `GET {base}/stock/{id}` → `{"id": 1, "amount": 3}`
//! - `GET {base}/products/{id}` → `{"id": 1, "title": "…", "price": 179.9, "image": "…"}`

mod client;

pub use client::ApiClient;

use async_trait::async_trait;
use rocket_shoes_core::{ProductDetails, ProductId, Stock};
use thiserror::Error;

/// Errors that can occur when talking to the catalog/stock API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Response body could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The base URL cannot have paths appended.
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
}

/// Source of current stock levels.
#[async_trait]
pub trait StockLookup: Send + Sync {
    /// Units of `id` currently available.
    async fn stock(&self, id: ProductId) -> Result<Stock, ApiError>;
}

/// Source of product display data.
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    /// Catalog details for `id`.
    async fn product(&self, id: ProductId) -> Result<ProductDetails, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ApiError::NotFound("/stock/9".to_string());
        assert_eq!(err.to_string(), "Not found: /stock/9");

        let err = ApiError::Api {
            status: 503,
            message: "maintenance".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 503 - maintenance");
    }

    #[test]
    fn test_rate_limited_error() {
        let err = ApiError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
    }
}
