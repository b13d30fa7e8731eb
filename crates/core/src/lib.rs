//! Rocket Shoes Core - Shared types library.
//!
//! This crate provides the types used across all Rocket Shoes components:
//! - `storefront` - Cart manager, catalog/stock client and storage backends
//! - `cli` - Command-line front end for the cart
//!
//! # Architecture
//!
//! The core crate contains only types and pure transformations - no I/O, no
//! HTTP clients, no storage. This keeps the cart invariants testable in
//! isolation.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, prices, products, stock and the cart itself

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
