//! REST client for the catalog/stock API.
//!
//! Uses `reqwest` for HTTP. Caches catalog details using `moka`; stock is
//! never cached so every cart operation sees the current figure.

use std::sync::Arc;

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use rocket_shoes_core::{ProductDetails, ProductId, Stock};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::{ApiError, CatalogLookup, StockLookup};
use crate::config::ApiConfig;

/// Client for the catalog/stock API.
///
/// Cheaply cloneable; clones share the HTTP connection pool and the catalog
/// cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    /// `None` when the configured TTL is zero.
    catalog: Option<Cache<ProductId, ProductDetails>>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(token) = &config.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| ApiError::Parse(format!("Invalid API token format: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        let catalog = (!config.catalog_cache_ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(1000)
                .time_to_live(config.catalog_cache_ttl)
                .build()
        });

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                catalog,
            }),
        })
    }

    /// Get the current stock level for a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the product has no stock record or the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_stock(&self, id: ProductId) -> Result<Stock, ApiError> {
        let url = self.endpoint("stock", id)?;
        let stock: Stock = self.get_json(url).await?;
        debug!(available = stock.amount, "Fetched stock");
        Ok(stock)
    }

    /// Get catalog details for a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<ProductDetails, ApiError> {
        if let Some(cache) = &self.inner.catalog
            && let Some(product) = cache.get(&id).await
        {
            debug!("Cache hit for product");
            return Ok(product);
        }

        let url = self.endpoint("products", id)?;
        let product: ProductDetails = self.get_json(url).await?;

        if let Some(cache) = &self.inner.catalog {
            cache.insert(id, product.clone()).await;
        }

        Ok(product)
    }

    /// Build `{base}/{resource}/{id}`, keeping any path prefix on the base.
    fn endpoint(&self, resource: &str, id: ProductId) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .push(resource)
            .push(&id.to_string());
        Ok(url)
    }

    /// Execute a GET and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let path = url.path().to_string();
        let response = self.inner.client.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(path));
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        // Read as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                path = %path,
                body = %body.chars().take(500).collect::<String>(),
                "API returned non-success status"
            );
            return Err(ApiError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                path = %path,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse API response"
            );
            ApiError::Parse(e.to_string())
        })
    }
}

#[async_trait]
impl StockLookup for ApiClient {
    async fn stock(&self, id: ProductId) -> Result<Stock, ApiError> {
        self.get_stock(id).await
    }
}

#[async_trait]
impl CatalogLookup for ApiClient {
    async fn product(&self, id: ProductId) -> Result<ProductDetails, ApiError> {
        self.get_product(id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(&ApiConfig::new(Url::parse(base).unwrap())).unwrap()
    }

    #[test]
    fn test_endpoint_from_root() {
        let url = client("http://localhost:3333")
            .endpoint("stock", ProductId::new(4))
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:3333/stock/4");
    }

    #[test]
    fn test_endpoint_keeps_path_prefix() {
        let url = client("https://api.rocketshoes.test/v1")
            .endpoint("products", ProductId::new(12))
            .unwrap();
        assert_eq!(url.as_str(), "https://api.rocketshoes.test/v1/products/12");

        let url = client("https://api.rocketshoes.test/v1/")
            .endpoint("products", ProductId::new(12))
            .unwrap();
        assert_eq!(url.as_str(), "https://api.rocketshoes.test/v1/products/12");
    }

    #[test]
    fn test_endpoint_rejects_opaque_base() {
        let err = client("mailto:shop@rocketshoes.test")
            .endpoint("stock", ProductId::new(1))
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidUrl(_)));
    }

    #[test]
    fn test_zero_ttl_disables_catalog_cache() {
        let mut config = ApiConfig::new(Url::parse("http://localhost:3333").unwrap());
        config.catalog_cache_ttl = std::time::Duration::ZERO;
        let client = ApiClient::new(&config).unwrap();
        assert!(client.inner.catalog.is_none());
    }
}
