//! Integration tests for Rocket Shoes.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p rocket-shoes-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_manager` - Cart operations against in-memory collaborators
//! - `cart_properties` - Randomized operation sequences
//! - `api_client` - HTTP client against a local fake API server
//!
//! This library holds the shared test doubles. Every double counts its calls
//! so tests can assert that a rejected request never reached a collaborator.

use std::collections::{HashMap, HashSet};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use rocket_shoes_core::{Cart, Price, Product, ProductDetails, ProductId, Stock};
use rocket_shoes_storefront::api::{ApiError, CatalogLookup, StockLookup};
use rocket_shoes_storefront::cart::{CartManager, CartServices, LoadPolicy};
use rocket_shoes_storefront::notify::NoticeLog;
use rocket_shoes_storefront::storage::{KeyValueStore, MemoryStore, StorageError};

/// Key used by every test cart.
pub const CART_KEY: &str = "@RocketShoes:cart";

/// Catalog details for `id`: priced at `id * 10 + 9.90`.
#[must_use]
pub fn details(id: i32) -> ProductDetails {
    ProductDetails {
        id: ProductId::new(id),
        title: format!("Tênis {id}"),
        price: Price::from_cents(i64::from(id) * 1000 + 990),
        image: format!("https://cdn.rocketshoes.test/{id}.jpg"),
    }
}

/// Encoded snapshot of a cart holding `(id, quantity)` entries in order.
///
/// # Panics
///
/// Panics on a zero quantity or a repeated id.
#[must_use]
pub fn snapshot_of(entries: &[(i32, u32)]) -> String {
    let products: Vec<Product> = entries
        .iter()
        .map(|&(id, quantity)| {
            let amount = NonZeroU32::new(quantity)
                .unwrap_or_else(|| panic!("product {id} seeded with zero quantity"));
            Product::from_details(details(id), amount)
        })
        .collect();
    let cart = Cart::try_from(products).unwrap_or_else(|e| panic!("invalid seed: {e}"));
    cart.to_snapshot()
        .unwrap_or_else(|e| panic!("seed failed to encode: {e}"))
}

// =============================================================================
// Stock
// =============================================================================

/// Stock levels held in memory.
///
/// Unknown products report zero units. Products marked with
/// [`FakeStock::fail`] return a transport error; products set up with
/// [`FakeStock::misreport`] answer with another product's id.
#[derive(Debug, Default)]
pub struct FakeStock {
    levels: Mutex<HashMap<ProductId, i64>>,
    failing: Mutex<HashSet<ProductId>>,
    misreported: Mutex<HashMap<ProductId, ProductId>>,
    calls: AtomicUsize,
}

impl FakeStock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, id: i32, amount: i64) {
        self.levels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(ProductId::new(id), amount);
    }

    pub fn fail(&self, id: i32) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(ProductId::new(id));
    }

    /// Answer lookups for `id` as if they were for `reported`.
    pub fn misreport(&self, id: i32, reported: i32) {
        self.misreported
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(ProductId::new(id), ProductId::new(reported));
    }

    /// Number of lookups served, including failed ones.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StockLookup for FakeStock {
    async fn stock(&self, id: ProductId) -> Result<Stock, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // Give other tasks a chance to interleave mid-operation.
        tokio::task::yield_now().await;

        if self
            .failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&id)
        {
            return Err(ApiError::Api {
                status: 503,
                message: "stock service unavailable".to_string(),
            });
        }

        let amount = self
            .levels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .copied()
            .unwrap_or(0);
        let id = self
            .misreported
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .copied()
            .unwrap_or(id);
        Ok(Stock { id, amount })
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Catalog serving [`details`] for every product not explicitly overridden.
#[derive(Debug, Default)]
pub struct FakeCatalog {
    overrides: Mutex<HashMap<ProductId, ProductDetails>>,
    missing: Mutex<HashSet<ProductId>>,
    calls: AtomicUsize,
}

impl FakeCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `product` when `id` is requested, whatever its own id is.
    pub fn insert(&self, id: i32, product: ProductDetails) {
        self.overrides
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(ProductId::new(id), product);
    }

    /// Answer `id` with not found.
    pub fn remove(&self, id: i32) {
        self.missing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(ProductId::new(id));
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogLookup for FakeCatalog {
    async fn product(&self, id: ProductId) -> Result<ProductDetails, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        if self
            .missing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&id)
        {
            return Err(ApiError::NotFound(format!("/products/{id}")));
        }

        let overridden = self
            .overrides
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned();
        Ok(overridden.unwrap_or_else(|| details(id.as_i32())))
    }
}

// =============================================================================
// Store
// =============================================================================

/// [`MemoryStore`] whose reads and writes can be switched off.
#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl FlakyStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_entry(key: &str, value: &str) -> Self {
        Self {
            inner: MemoryStore::with_entry(key, value),
            ..Self::default()
        }
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Value currently persisted under [`CART_KEY`].
    #[must_use]
    pub fn snapshot(&self) -> Option<String> {
        self.inner.get(CART_KEY).ok().flatten()
    }
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("reads disabled".to_string()));
        }
        self.inner.read(key).await
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("writes disabled".to_string()));
        }
        self.inner.write(key, value).await?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// =============================================================================
// Context
// =============================================================================

/// A cart manager wired to test doubles, with handles on each of them.
pub struct TestContext {
    pub manager: CartManager,
    pub stock: Arc<FakeStock>,
    pub catalog: Arc<FakeCatalog>,
    pub store: Arc<FlakyStore>,
    pub notices: Arc<NoticeLog>,
}

impl TestContext {
    /// Manager over an empty store.
    ///
    /// # Panics
    ///
    /// Panics if the manager fails to load, which an empty store never causes.
    pub async fn new() -> Self {
        Self::with_store(FlakyStore::new(), LoadPolicy::Lenient)
            .await
            .unwrap_or_else(|e| panic!("empty store failed to load: {e}"))
    }

    /// Manager over a store already holding `(id, quantity)` entries.
    ///
    /// # Panics
    ///
    /// Panics if the seed is invalid.
    pub async fn seeded(entries: &[(i32, u32)]) -> Self {
        Self::with_store(
            FlakyStore::with_entry(CART_KEY, &snapshot_of(entries)),
            LoadPolicy::Strict,
        )
        .await
        .unwrap_or_else(|e| panic!("seeded store failed to load: {e}"))
    }

    /// Manager over `store`, loaded with `policy`.
    ///
    /// # Errors
    ///
    /// Returns the manager's load error.
    pub async fn with_store(
        store: FlakyStore,
        policy: LoadPolicy,
    ) -> Result<Self, rocket_shoes_storefront::CartError> {
        let stock = Arc::new(FakeStock::new());
        let catalog = Arc::new(FakeCatalog::new());
        let store = Arc::new(store);
        let notices = Arc::new(NoticeLog::new());

        let services = CartServices {
            stock: stock.clone(),
            catalog: catalog.clone(),
            store: store.clone(),
            notifier: notices.clone(),
        };
        let manager = CartManager::load(services, CART_KEY, policy).await?;

        Ok(Self {
            manager,
            stock,
            catalog,
            store,
            notices,
        })
    }

    /// Notice messages received so far, oldest first.
    #[must_use]
    pub fn notice_messages(&self) -> Vec<String> {
        self.notices
            .notices()
            .into_iter()
            .map(|n| n.message)
            .collect()
    }

    /// `(id, quantity)` pairs of the published cart, in cart order.
    #[must_use]
    pub fn quantities(&self) -> Vec<(i32, u32)> {
        self.manager
            .cart()
            .iter()
            .map(|p| (p.id.as_i32(), p.quantity()))
            .collect()
    }
}
