//! The cart manager.

use std::num::NonZeroU32;
use std::sync::{Arc, PoisonError, RwLock};

use rocket_shoes_core::{Cart, ProductId, Stock};
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use super::{LoadPolicy, UpdateProductAmount, messages};
use crate::api::{ApiError, CatalogLookup, StockLookup};
use crate::error::{CartError, CartUpdate, Result};
use crate::notify::{Notice, NotificationSink};
use crate::storage::KeyValueStore;

/// Collaborators injected into a [`CartManager`].
#[derive(Clone)]
pub struct CartServices {
    pub stock: Arc<dyn StockLookup>,
    pub catalog: Arc<dyn CatalogLookup>,
    pub store: Arc<dyn KeyValueStore>,
    pub notifier: Arc<dyn NotificationSink>,
}

#[derive(Debug, Clone, Copy)]
enum Operation {
    Add,
    Remove,
    Update,
}

impl Operation {
    const fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Update => "update",
        }
    }

    const fn failure_message(self) -> &'static str {
        match self {
            Self::Add => messages::ADD_FAILED,
            Self::Remove => messages::REMOVE_FAILED,
            Self::Update => messages::UPDATE_FAILED,
        }
    }
}

/// Authoritative cart state for one shopper.
///
/// Cheaply cloneable; clones share the same cart, so concurrent operations
/// from several tasks are serialized against each other.
#[derive(Clone)]
pub struct CartManager {
    inner: Arc<CartManagerInner>,
}

struct CartManagerInner {
    services: CartServices,
    key: String,
    published: RwLock<Arc<Cart>>,
    mutation: Mutex<()>,
}

impl CartManager {
    /// Restore the cart persisted under `key`.
    ///
    /// A missing snapshot yields an empty cart. What happens to an unreadable
    /// one depends on `policy`. Nothing is written back until the first
    /// successful mutation.
    ///
    /// # Errors
    ///
    /// With [`LoadPolicy::Strict`], returns `CartError::Storage` if the store
    /// read fails and `CartError::Snapshot` if the snapshot cannot be decoded.
    #[instrument(skip(services))]
    pub async fn load(services: CartServices, key: &str, policy: LoadPolicy) -> Result<Self> {
        let cart = match services.store.read(key).await {
            Ok(Some(snapshot)) => match Cart::from_snapshot(&snapshot) {
                Ok(cart) => {
                    debug!(products = cart.len(), "Restored cart");
                    cart
                }
                Err(e) if policy == LoadPolicy::Strict => return Err(e.into()),
                Err(e) => {
                    warn!(error = %e, "Discarding unreadable cart snapshot");
                    Cart::new()
                }
            },
            Ok(None) => Cart::new(),
            Err(e) if policy == LoadPolicy::Strict => return Err(e.into()),
            Err(e) => {
                warn!(error = %e, "Failed to read cart snapshot, starting empty");
                Cart::new()
            }
        };

        Ok(Self {
            inner: Arc::new(CartManagerInner {
                services,
                key: key.to_string(),
                published: RwLock::new(Arc::new(cart)),
                mutation: Mutex::new(()),
            }),
        })
    }

    /// The current cart.
    #[must_use]
    pub fn cart(&self) -> Arc<Cart> {
        Arc::clone(
            &self
                .inner
                .published
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    /// Key the cart is persisted under.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// Add one unit of a product.
    ///
    /// New products are fetched from the catalog and appended with quantity 1;
    /// products already in the cart have their quantity incremented.
    ///
    /// # Errors
    ///
    /// - `CartError::OutOfStock` if one more unit exceeds available stock
    /// - `CartError::Transport` if the stock or catalog lookup fails
    /// - `CartError::Storage` / `CartError::Snapshot` if persisting fails
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_product(&self, product_id: ProductId) -> Result<CartUpdate> {
        let _guard = self.inner.mutation.lock().await;
        let staged = self.stage_add(product_id).await;
        self.apply(Operation::Add, staged).await
    }

    /// Remove a product entirely.
    ///
    /// # Errors
    ///
    /// - `CartError::NotFound` if the product is not in the cart
    /// - `CartError::Storage` / `CartError::Snapshot` if persisting fails
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_product(&self, product_id: ProductId) -> Result<CartUpdate> {
        let _guard = self.inner.mutation.lock().await;
        let staged = self
            .cart()
            .without(product_id)
            .ok_or(CartError::NotFound(product_id));
        self.apply(Operation::Remove, staged).await
    }

    /// Set a product's quantity to exactly `request.amount`.
    ///
    /// Amounts below 1 are ignored without any lookup or notice; removal goes
    /// through [`CartManager::remove_product`]. A product not in the cart is
    /// an error (`NotFound`, checked before stock is consulted), not a silent
    /// no-op; removal reports a missing product the same way.
    ///
    /// # Errors
    ///
    /// - `CartError::NotFound` if the product is not in the cart
    /// - `CartError::OutOfStock` if the amount exceeds available stock
    /// - `CartError::Transport` if the stock lookup fails
    /// - `CartError::Storage` / `CartError::Snapshot` if persisting fails
    #[instrument(
        skip(self, request),
        fields(product_id = %request.product_id, amount = request.amount)
    )]
    pub async fn update_product_amount(&self, request: UpdateProductAmount) -> Result<CartUpdate> {
        let Some(amount) = u32::try_from(request.amount)
            .ok()
            .and_then(NonZeroU32::new)
        else {
            debug!("Ignoring quantity below 1");
            return Ok(CartUpdate::Ignored);
        };

        let _guard = self.inner.mutation.lock().await;
        let staged = self.stage_update(request.product_id, amount).await;
        self.apply(Operation::Update, staged).await
    }

    async fn stage_add(&self, product_id: ProductId) -> Result<Cart> {
        let current = self.cart();
        let held = current.quantity_of(product_id);
        let stock = self.stock_for(product_id).await?;

        let requested = held.saturating_add(1);
        let out_of_stock = CartError::OutOfStock {
            product_id,
            requested,
            available: stock.amount,
        };
        if !stock.allows(requested) {
            return Err(out_of_stock);
        }

        let staged = if current.contains(product_id) {
            current.with_incremented(product_id)
        } else {
            let details = self.inner.services.catalog.product(product_id).await?;
            if details.id != product_id {
                return Err(ApiError::Parse(format!(
                    "catalog returned product {} for {product_id}",
                    details.id
                ))
                .into());
            }
            current.with_new_product(details)
        };

        // Only reachable when the held quantity is already u32::MAX.
        staged.ok_or(out_of_stock)
    }

    async fn stage_update(&self, product_id: ProductId, amount: NonZeroU32) -> Result<Cart> {
        let current = self.cart();
        if !current.contains(product_id) {
            return Err(CartError::NotFound(product_id));
        }

        let stock = self.stock_for(product_id).await?;
        if !stock.allows(amount.get()) {
            return Err(CartError::OutOfStock {
                product_id,
                requested: amount.get(),
                available: stock.amount,
            });
        }

        current
            .with_amount(product_id, amount)
            .ok_or(CartError::NotFound(product_id))
    }

    async fn stock_for(&self, product_id: ProductId) -> Result<Stock> {
        let stock = self.inner.services.stock.stock(product_id).await?;
        if stock.id != product_id {
            return Err(ApiError::Parse(format!(
                "stock service returned product {} for {product_id}",
                stock.id
            ))
            .into());
        }
        Ok(stock)
    }

    /// Persist and publish a staged cart, or report why there is none.
    async fn apply(&self, operation: Operation, staged: Result<Cart>) -> Result<CartUpdate> {
        let outcome = match staged {
            Ok(next) => self.commit(next).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => Ok(CartUpdate::Applied),
            Err(e) => {
                self.report(operation, &e);
                Err(e)
            }
        }
    }

    async fn commit(&self, next: Cart) -> Result<()> {
        let snapshot = next.to_snapshot()?;
        self.inner
            .services
            .store
            .write(&self.inner.key, &snapshot)
            .await?;

        debug!(
            products = next.len(),
            quantity = next.total_quantity(),
            "Cart updated"
        );
        *self
            .inner
            .published
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(next);
        Ok(())
    }

    fn report(&self, operation: Operation, err: &CartError) {
        let message = match err {
            CartError::OutOfStock {
                requested,
                available,
                ..
            } => {
                info!(
                    requested = *requested,
                    available = *available,
                    "Rejected: out of stock"
                );
                messages::OUT_OF_STOCK
            }
            CartError::NotFound(_) => {
                warn!(operation = operation.name(), "Rejected: product not in cart");
                operation.failure_message()
            }
            _ => {
                error!(error = %err, operation = operation.name(), "Cart operation failed");
                operation.failure_message()
            }
        };

        self.inner.services.notifier.notify(Notice::error(message));
    }
}
