//! The shopping cart and its persisted snapshot format.
//!
//! A [`Cart`] is an insertion-ordered collection of [`Product`] entries,
//! unique by [`ProductId`]. Mutations are copy-on-write: every `with_*` /
//! `without` method returns a new cart and leaves `self` untouched, so a
//! caller can stage a change, persist it, and only then publish it.
//!
//! # Snapshot format
//!
//! The snapshot is a JSON array of products in cart order:
//!
//! ```json
//! [{"id":1,"title":"Tênis","price":"179.90","image":"https://…","amount":2}]
//! ```
//!
//! Decoding rejects duplicate ids and zero amounts, so a decoded snapshot
//! always satisfies the cart invariants.

use std::num::NonZeroU32;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::id::ProductId;
use super::price::Price;
use super::product::{Product, ProductDetails};

/// A snapshot listed the same product more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("product {0} appears more than once")]
pub struct DuplicateProductError(pub ProductId);

/// Errors encoding or decoding a cart snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The cart could not be serialized.
    #[error("failed to encode cart snapshot: {0}")]
    Encode(#[source] serde_json::Error),

    /// The snapshot is not a valid cart.
    #[error("failed to decode cart snapshot: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Ordered cart entries keyed by product.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Product>", into = "Vec<Product>")]
pub struct Cart {
    entries: IndexMap<ProductId, Product>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a persisted snapshot.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError::Decode` if the text is not a JSON array of
    /// products, or if it violates a cart invariant.
    pub fn from_snapshot(snapshot: &str) -> Result<Self, SnapshotError> {
        serde_json::from_str(snapshot).map_err(SnapshotError::Decode)
    }

    /// Encode the cart as a snapshot.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError::Encode` if serialization fails.
    pub fn to_snapshot(&self) -> Result<String, SnapshotError> {
        serde_json::to_string(self).map_err(SnapshotError::Encode)
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cart holds no products.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.entries.get(&id)
    }

    /// Whether the product is in the cart.
    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Quantity held for a product, 0 if absent.
    #[must_use]
    pub fn quantity_of(&self, id: ProductId) -> u32 {
        self.get(id).map_or(0, Product::quantity)
    }

    /// Entries in cart order.
    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.entries.values()
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.iter().map(|p| u64::from(p.quantity())).sum()
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.iter().map(Product::line_total).sum()
    }

    /// A cart with `details` appended at quantity 1.
    ///
    /// Returns `None` if the product is already present.
    #[must_use]
    pub fn with_new_product(&self, details: ProductDetails) -> Option<Self> {
        if self.contains(details.id) {
            return None;
        }
        let mut next = self.clone();
        next.entries
            .insert(details.id, Product::from_details(details, NonZeroU32::MIN));
        Some(next)
    }

    /// A cart with the product's quantity incremented by one.
    ///
    /// Returns `None` if the product is absent or the quantity would overflow.
    #[must_use]
    pub fn with_incremented(&self, id: ProductId) -> Option<Self> {
        let amount = self.get(id)?.amount.checked_add(1)?;
        self.with_amount(id, amount)
    }

    /// A cart with the product's quantity set to exactly `amount`.
    ///
    /// Position in the cart is preserved. Returns `None` if the product is
    /// absent.
    #[must_use]
    pub fn with_amount(&self, id: ProductId, amount: NonZeroU32) -> Option<Self> {
        let mut next = self.clone();
        next.entries.get_mut(&id)?.amount = amount;
        Some(next)
    }

    /// A cart without the product, other entries keeping their order.
    ///
    /// Returns `None` if the product is absent.
    #[must_use]
    pub fn without(&self, id: ProductId) -> Option<Self> {
        let mut next = self.clone();
        next.entries.shift_remove(&id)?;
        Some(next)
    }
}

// Order is part of a cart's identity, unlike `IndexMap`'s own equality.
impl PartialEq for Cart {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self.entries.values().eq(other.entries.values())
    }
}

impl Eq for Cart {}

impl TryFrom<Vec<Product>> for Cart {
    type Error = DuplicateProductError;

    fn try_from(products: Vec<Product>) -> Result<Self, Self::Error> {
        let mut entries = IndexMap::with_capacity(products.len());
        for product in products {
            let id = product.id;
            if entries.insert(id, product).is_some() {
                return Err(DuplicateProductError(id));
            }
        }
        Ok(Self { entries })
    }
}

impl From<Cart> for Vec<Product> {
    fn from(cart: Cart) -> Self {
        cart.entries.into_values().collect()
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a Product;
    type IntoIter = indexmap::map::Values<'a, ProductId, Product>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn details(id: i32) -> ProductDetails {
        ProductDetails {
            id: ProductId::new(id),
            title: format!("Tênis {id}"),
            price: Price::from_cents(i64::from(id) * 1000 + 990),
            image: format!("https://images.example.com/{id}.jpg"),
        }
    }

    fn amount(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    fn ids(cart: &Cart) -> Vec<i32> {
        cart.iter().map(|p| p.id.as_i32()).collect()
    }

    #[test]
    fn test_new_product_starts_at_one() {
        let cart = Cart::new().with_new_product(details(1)).unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.quantity_of(ProductId::new(1)), 1);
        assert_eq!(cart.quantity_of(ProductId::new(2)), 0);
    }

    #[test]
    fn test_new_product_rejects_duplicate() {
        let cart = Cart::new().with_new_product(details(1)).unwrap();
        assert!(cart.with_new_product(details(1)).is_none());
    }

    #[test]
    fn test_staging_leaves_original_untouched() {
        let cart = Cart::new().with_new_product(details(1)).unwrap();
        let staged = cart.with_incremented(ProductId::new(1)).unwrap();
        assert_eq!(cart.quantity_of(ProductId::new(1)), 1);
        assert_eq!(staged.quantity_of(ProductId::new(1)), 2);
    }

    #[test]
    fn test_with_amount_preserves_order() {
        let cart = Cart::new()
            .with_new_product(details(1))
            .and_then(|c| c.with_new_product(details(2)))
            .and_then(|c| c.with_new_product(details(3)))
            .unwrap();
        let updated = cart.with_amount(ProductId::new(1), amount(7)).unwrap();
        assert_eq!(ids(&updated), vec![1, 2, 3]);
        assert_eq!(updated.quantity_of(ProductId::new(1)), 7);
    }

    #[test]
    fn test_with_amount_absent() {
        assert!(Cart::new().with_amount(ProductId::new(9), amount(1)).is_none());
    }

    #[test]
    fn test_without_preserves_order() {
        let cart = Cart::new()
            .with_new_product(details(1))
            .and_then(|c| c.with_new_product(details(2)))
            .and_then(|c| c.with_new_product(details(3)))
            .unwrap();
        let removed = cart.without(ProductId::new(2)).unwrap();
        assert_eq!(ids(&removed), vec![1, 3]);
        assert!(removed.without(ProductId::new(2)).is_none());
    }

    #[test]
    fn test_totals() {
        let cart = Cart::new()
            .with_new_product(details(1))
            .and_then(|c| c.with_new_product(details(2)))
            .and_then(|c| c.with_amount(ProductId::new(2), amount(3)))
            .unwrap();
        assert_eq!(cart.total_quantity(), 4);
        // 19.90 + 3 * 29.90
        assert_eq!(cart.subtotal(), Price::from_cents(10960));
    }

    #[test]
    fn test_equality_is_order_sensitive() {
        let a = Cart::new()
            .with_new_product(details(1))
            .and_then(|c| c.with_new_product(details(2)))
            .unwrap();
        let b = Cart::new()
            .with_new_product(details(2))
            .and_then(|c| c.with_new_product(details(1)))
            .unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_snapshot_format() {
        let cart = Cart::new().with_new_product(details(1)).unwrap();
        let snapshot = cart.to_snapshot().unwrap();
        let value: serde_json::Value = serde_json::from_str(&snapshot).unwrap();
        assert!(value.is_array());
        assert_eq!(value[0]["id"], 1);
        assert_eq!(value[0]["amount"], 1);
        assert_eq!(value[0]["price"], "19.90");
    }

    #[test]
    fn test_snapshot_accepts_numeric_prices() {
        let snapshot = r#"[{"id":1,"title":"Tênis","price":179.9,"image":"a.jpg","amount":2}]"#;
        let cart = Cart::from_snapshot(snapshot).unwrap();
        assert_eq!(cart.quantity_of(ProductId::new(1)), 2);
        assert_eq!(cart.subtotal(), Price::from_cents(35980));
    }

    #[test]
    fn test_snapshot_rejects_duplicates() {
        let snapshot = r#"[
            {"id":1,"title":"a","price":"1.00","image":"","amount":1},
            {"id":1,"title":"a","price":"1.00","image":"","amount":2}
        ]"#;
        let err = Cart::from_snapshot(snapshot).unwrap_err();
        assert!(matches!(err, SnapshotError::Decode(_)));
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_snapshot_rejects_zero_amount() {
        let snapshot = r#"[{"id":1,"title":"a","price":"1.00","image":"","amount":0}]"#;
        assert!(Cart::from_snapshot(snapshot).is_err());
    }

    #[test]
    fn test_snapshot_rejects_garbage() {
        assert!(Cart::from_snapshot("not json").is_err());
        assert!(Cart::from_snapshot("{}").is_err());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(i32),
        Increment(i32),
        Set(i32, u32),
        Remove(i32),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (1..6i32).prop_map(Op::Add),
            (1..6i32).prop_map(Op::Increment),
            (1..6i32, 1..20u32).prop_map(|(id, n)| Op::Set(id, n)),
            (1..6i32).prop_map(Op::Remove),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: any sequence of staged mutations keeps ids unique and
        /// amounts positive, and every intermediate cart survives a snapshot
        /// round trip unchanged.
        #[test]
        fn staged_mutations_preserve_invariants(ops in prop::collection::vec(op(), 0..40)) {
            let mut cart = Cart::new();

            for op in ops {
                let next = match op {
                    Op::Add(id) => cart.with_new_product(details(id)),
                    Op::Increment(id) => cart.with_incremented(ProductId::new(id)),
                    Op::Set(id, n) => cart.with_amount(ProductId::new(id), amount(n)),
                    Op::Remove(id) => cart.without(ProductId::new(id)),
                };
                if let Some(next) = next {
                    cart = next;
                }

                let ids = ids(&cart);
                let mut unique = ids.clone();
                unique.sort_unstable();
                unique.dedup();
                prop_assert_eq!(unique.len(), ids.len());
                prop_assert!(cart.iter().all(|p| p.quantity() >= 1));

                let decoded = Cart::from_snapshot(&cart.to_snapshot().unwrap()).unwrap();
                prop_assert_eq!(&decoded, &cart);
            }
        }
    }
}
