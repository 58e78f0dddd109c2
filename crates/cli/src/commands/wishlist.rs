//! Wishlist commands.

use marketplace_client::Marketplace;
use marketplace_client::collections::LineItemCollection;
use marketplace_client::models::ProductSnapshot;

use super::CliError;

/// Print saved products.
#[allow(clippy::print_stdout)]
pub fn list(app: &Marketplace) {
    let wishlist = app.wishlist();
    if wishlist.is_empty() {
        println!("Wishlist is empty");
        return;
    }

    for product in wishlist.entries() {
        println!("{:<16} {:<32} {:>10}", product.id, product.name, product.price);
    }
    println!("{} saved, worth {}", wishlist.distinct_count(), wishlist.total());
}

/// Save or unsave a product.
#[allow(clippy::print_stdout)]
pub fn toggle(app: &mut Marketplace, product: ProductSnapshot) -> Result<(), CliError> {
    let id = product.id.clone();
    if app.wishlist_mut().toggle(product)? {
        println!("Saved {id}");
    } else {
        println!("Removed {id}");
    }
    Ok(())
}

/// Empty the wishlist.
#[allow(clippy::print_stdout)]
pub fn clear(app: &mut Marketplace) -> Result<(), CliError> {
    app.wishlist_mut().clear()?;
    println!("Wishlist cleared");
    Ok(())
}
