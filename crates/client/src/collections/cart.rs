//! Shopping cart.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use marketplace_core::{Price, ProductId};

use super::{DurableList, Keyed, LineItemCollection};
use crate::models::ProductSnapshot;
use crate::storage::{KeyValueStore, StorageError, keys};

/// A product and how many of it are in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    pub product: ProductSnapshot,
    pub quantity: u32,
}

impl CartEntry {
    /// Price of this line: unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price.times(self.quantity)
    }
}

impl Keyed for CartEntry {
    fn key(&self) -> &ProductId {
        &self.product.id
    }
}

/// The shopper's cart, persisted under the `cart` record.
pub struct Cart {
    list: DurableList<CartEntry>,
}

impl std::fmt::Debug for Cart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cart")
            .field("entries", &self.list.entries())
            .finish_non_exhaustive()
    }
}

impl Cart {
    /// Load the cart from `store`.
    ///
    /// A missing or damaged record yields an empty cart. Entries with a
    /// zero quantity are dropped.
    #[must_use]
    pub fn open(store: Arc<dyn KeyValueStore>) -> Self {
        let mut list = DurableList::<CartEntry>::hydrate(store, keys::CART);
        list.entries.retain(|entry| entry.quantity > 0);
        Self { list }
    }

    /// Add `quantity` of a product.
    ///
    /// An existing entry has its quantity increased (saturating); its
    /// snapshot is kept. A new product is appended. A zero quantity does
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the new cart cannot be persisted.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub fn add(&mut self, product: ProductSnapshot, quantity: u32) -> Result<(), StorageError> {
        if quantity == 0 {
            return Ok(());
        }

        match self.list.position(&product.id) {
            Some(index) => self.list.update(|entries| {
                if let Some(entry) = entries.get_mut(index) {
                    entry.quantity = entry.quantity.saturating_add(quantity);
                }
            }),
            None => self
                .list
                .update(|entries| entries.push(CartEntry { product, quantity })),
        }
    }

    /// Overwrite the quantity of a product already in the cart.
    ///
    /// A quantity of zero removes the entry. Returns whether the product
    /// was in the cart; an absent product is left absent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the new cart cannot be persisted.
    #[instrument(skip(self))]
    pub fn set_quantity(&mut self, id: &ProductId, quantity: u32) -> Result<bool, StorageError> {
        if quantity == 0 {
            return self.list.remove(id);
        }

        let Some(index) = self.list.position(id) else {
            return Ok(false);
        };
        if self.list.entries.get(index).is_some_and(|e| e.quantity == quantity) {
            return Ok(true);
        }

        self.list.update(|entries| {
            if let Some(entry) = entries.get_mut(index) {
                entry.quantity = quantity;
            }
        })?;
        Ok(true)
    }

    /// Quantity of a product, zero when absent.
    #[must_use]
    pub fn quantity_of(&self, id: &ProductId) -> u32 {
        self.list.get(id).map_or(0, |entry| entry.quantity)
    }
}

impl LineItemCollection for Cart {
    type Entry = CartEntry;

    fn entries(&self) -> &[CartEntry] {
        self.list.entries()
    }

    fn contains(&self, id: &ProductId) -> bool {
        self.list.get(id).is_some()
    }

    fn remove(&mut self, id: &ProductId) -> Result<bool, StorageError> {
        self.list.remove(id)
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.list.clear()
    }

    fn item_count(&self) -> u64 {
        self.list
            .entries()
            .iter()
            .map(|entry| u64::from(entry.quantity))
            .sum()
    }

    fn total(&self) -> Price {
        self.list.entries().iter().map(CartEntry::line_total).sum()
    }
}
