//! CLI command implementations.

pub mod cart;

use std::sync::Arc;

use rocket_shoes_storefront::CartError;
use rocket_shoes_storefront::api::{ApiClient, ApiError};
use rocket_shoes_storefront::cart::{CartManager, CartServices};
use rocket_shoes_storefront::config::{ConfigError, StorefrontConfig};
use rocket_shoes_storefront::notify::TracingNotifier;
use rocket_shoes_storefront::storage::FileStore;
use thiserror::Error;
use tracing::debug;

/// Errors surfaced to `main`.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to build API client: {0}")]
    Client(#[from] ApiError),

    #[error(transparent)]
    Cart(#[from] CartError),
}

/// Build a cart manager from environment configuration.
///
/// # Errors
///
/// Returns an error if configuration is missing or invalid, or if the
/// persisted snapshot is unreadable under a strict load policy.
pub async fn open_manager() -> Result<CartManager, CliError> {
    let config = StorefrontConfig::from_env()?;
    debug!(
        api = %config.api.base_url,
        storage = %config.storage_dir.display(),
        "Loaded configuration"
    );

    let api = Arc::new(ApiClient::new(&config.api)?);
    let services = CartServices {
        stock: api.clone(),
        catalog: api,
        store: Arc::new(FileStore::new(&config.storage_dir)),
        notifier: Arc::new(TracingNotifier),
    };

    Ok(CartManager::load(services, &config.cart_key, config.load_policy).await?)
}
