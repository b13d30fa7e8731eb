//! Cart commands.
//!
//! Every mutation prints the resulting cart on success. Failures have already
//! been reported as a notice by the manager; the error is returned so the
//! process exits non-zero.

use rocket_shoes_core::{Cart, CurrencyCode, ProductId};
use rocket_shoes_storefront::CartUpdate;
use rocket_shoes_storefront::cart::{CartManager, UpdateProductAmount};
use tracing::info;

use super::CliError;

/// Print the cart.
///
/// # Errors
///
/// Returns an error if `json` is set and the snapshot cannot be encoded.
#[allow(clippy::print_stdout)]
pub fn show(manager: &CartManager, json: bool) -> Result<(), CliError> {
    let cart = manager.cart();
    if json {
        let snapshot = cart.to_snapshot().map_err(rocket_shoes_storefront::CartError::from)?;
        println!("{snapshot}");
    } else {
        print_cart(&cart);
    }
    Ok(())
}

/// Add one unit of `id`.
///
/// # Errors
///
/// Returns the manager's error if the product could not be added.
pub async fn add(manager: &CartManager, id: ProductId) -> Result<(), CliError> {
    manager.add_product(id).await?;
    info!(product_id = %id, quantity = manager.cart().quantity_of(id), "Added to cart");
    print_cart(&manager.cart());
    Ok(())
}

/// Remove `id` from the cart.
///
/// # Errors
///
/// Returns the manager's error if the product could not be removed.
pub async fn remove(manager: &CartManager, id: ProductId) -> Result<(), CliError> {
    manager.remove_product(id).await?;
    info!(product_id = %id, "Removed from cart");
    print_cart(&manager.cart());
    Ok(())
}

/// Set the quantity of `id`.
///
/// # Errors
///
/// Returns the manager's error if the quantity could not be updated.
pub async fn update(manager: &CartManager, id: ProductId, amount: i32) -> Result<(), CliError> {
    let request = UpdateProductAmount {
        product_id: id,
        amount,
    };
    match manager.update_product_amount(request).await? {
        CartUpdate::Applied => info!(product_id = %id, amount, "Updated quantity"),
        CartUpdate::Ignored => info!(amount, "Quantity below 1 ignored; use `remove` instead"),
    }
    print_cart(&manager.cart());
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_cart(cart: &Cart) {
    if cart.is_empty() {
        println!("Cart is empty");
        return;
    }

    let currency = CurrencyCode::default();
    println!("{:<6} {:<40} {:>5} {:>14}", "ID", "TITLE", "QTY", "TOTAL");
    for product in cart {
        println!(
            "{:<6} {:<40} {:>5} {:>14}",
            product.id,
            truncate(&product.title, 40),
            product.quantity(),
            product.line_total().display(currency),
        );
    }
    println!(
        "{} items, subtotal {}",
        cart.total_quantity(),
        cart.subtotal().display(currency)
    );
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{head}...")
    }
}
