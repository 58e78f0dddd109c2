//! Cart commands.

use marketplace_client::Marketplace;
use marketplace_client::collections::LineItemCollection;
use marketplace_client::models::ProductSnapshot;
use marketplace_core::ProductId;

use super::CliError;

/// Print every cart line and the totals.
#[allow(clippy::print_stdout)]
pub fn list(app: &Marketplace) {
    let cart = app.cart();
    if cart.is_empty() {
        println!("Cart is empty");
        return;
    }

    for entry in cart.entries() {
        println!(
            "{:<16} {:<32} {:>4} x {:>10} = {:>10}",
            entry.product.id,
            entry.product.name,
            entry.quantity,
            entry.product.price,
            entry.line_total()
        );
    }
    println!(
        "{} items, {} products, total {}",
        cart.item_count(),
        cart.distinct_count(),
        cart.total()
    );
}

/// Add a product.
#[allow(clippy::print_stdout)]
pub fn add(app: &mut Marketplace, product: ProductSnapshot, quantity: u32) -> Result<(), CliError> {
    let id = product.id.clone();
    app.cart_mut().add(product, quantity)?;
    println!("{id}: quantity {}", app.cart().quantity_of(&id));
    Ok(())
}

/// Remove a product.
#[allow(clippy::print_stdout)]
pub fn remove(app: &mut Marketplace, id: &str) -> Result<(), CliError> {
    let id = ProductId::new(id);
    if app.cart_mut().remove(&id)? {
        println!("Removed {id}");
    } else {
        println!("{id} was not in the cart");
    }
    Ok(())
}

/// Overwrite a product's quantity.
#[allow(clippy::print_stdout)]
pub fn set(app: &mut Marketplace, id: &str, quantity: u32) -> Result<(), CliError> {
    let id = ProductId::new(id);
    if app.cart_mut().set_quantity(&id, quantity)? {
        println!("{id}: quantity {}", app.cart().quantity_of(&id));
    } else {
        println!("{id} was not in the cart");
    }
    Ok(())
}

/// Empty the cart.
#[allow(clippy::print_stdout)]
pub fn clear(app: &mut Marketplace) -> Result<(), CliError> {
    app.cart_mut().clear()?;
    println!("Cart cleared");
    Ok(())
}
