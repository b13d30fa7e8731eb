//! Rocket Shoes Storefront library.
//!
//! Client-side cart management: a [`CartManager`](cart::CartManager) that
//! validates quantity changes against live stock and mirrors every change to
//! a key-value store.
//!
//! # Modules
//!
//! - [`cart`] - Cart manager and its request types
//! - [`api`] - Stock/catalog lookup traits and the HTTP client
//! - [`storage`] - Key-value stores for cart snapshots
//! - [`notify`] - User-visible notices
//! - [`config`] - Environment configuration
//! - [`error`] - Operation outcomes
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rocket_shoes_storefront::{api::ApiClient, cart::*, notify::TracingNotifier, storage::FileStore};
//!
//! let api = Arc::new(ApiClient::new(&config.api)?);
//! let services = CartServices {
//!     stock: api.clone(),
//!     catalog: api,
//!     store: Arc::new(FileStore::new(&config.storage_dir)),
//!     notifier: Arc::new(TracingNotifier),
//! };
//! let manager = CartManager::load(services, &config.cart_key, config.load_policy).await?;
//! manager.add_product(ProductId::new(1)).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod config;
pub mod error;
pub mod notify;
pub mod storage;

pub use error::{CartError, CartUpdate};
