//! Wishlist: saved products, no quantities.

use std::sync::Arc;

use tracing::instrument;

use marketplace_core::{Price, ProductId};

use super::{DurableList, Keyed, LineItemCollection};
use crate::models::ProductSnapshot;
use crate::storage::{KeyValueStore, StorageError, keys};

impl Keyed for ProductSnapshot {
    fn key(&self) -> &ProductId {
        &self.id
    }
}

/// Saved products, persisted under the `wishlist` record.
pub struct Wishlist {
    list: DurableList<ProductSnapshot>,
}

impl std::fmt::Debug for Wishlist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wishlist")
            .field("entries", &self.list.entries())
            .finish_non_exhaustive()
    }
}

impl Wishlist {
    /// Load the wishlist from `store`; a missing or damaged record yields an
    /// empty wishlist.
    #[must_use]
    pub fn open(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            list: DurableList::hydrate(store, keys::WISHLIST),
        }
    }

    /// Save a product. Returns `false` if it was already saved.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the new wishlist cannot be persisted.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub fn add(&mut self, product: ProductSnapshot) -> Result<bool, StorageError> {
        if self.contains(&product.id) {
            return Ok(false);
        }
        self.list.update(|entries| entries.push(product))?;
        Ok(true)
    }

    /// Remove the product if saved, save it otherwise.
    ///
    /// Returns whether the product is saved afterwards.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the new wishlist cannot be persisted.
    pub fn toggle(&mut self, product: ProductSnapshot) -> Result<bool, StorageError> {
        if self.contains(&product.id) {
            self.list.remove(&product.id)?;
            Ok(false)
        } else {
            self.add(product)
        }
    }
}

impl LineItemCollection for Wishlist {
    type Entry = ProductSnapshot;

    fn entries(&self) -> &[ProductSnapshot] {
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
        self.list.entries().len() as u64
    }

    fn total(&self) -> Price {
        self.list.entries().iter().map(|product| product.price).sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::collections::test_support::FailingStore;
    use crate::storage::MemoryStore;

    fn product(id: &str) -> ProductSnapshot {
        ProductSnapshot {
            id: ProductId::new(id),
            name: id.to_uppercase(),
            price: Price::from_cents(1999),
            image: Some(format!("https://cdn.example.com/{id}.jpg")),
            vendor_id: None,
        }
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut wishlist = Wishlist::open(Arc::new(MemoryStore::new()));
        assert!(wishlist.add(product("p1")).unwrap());
        assert!(!wishlist.add(product("p1")).unwrap());
        assert_eq!(wishlist.distinct_count(), 1);
        assert_eq!(wishlist.item_count(), 1);
    }

    #[test]
    fn test_toggle_is_its_own_inverse() {
        let store = Arc::new(MemoryStore::new());
        let mut wishlist = Wishlist::open(store.clone());
        wishlist.add(product("keep")).unwrap();
        let id = ProductId::new("p1");

        for initially_saved in [false, true] {
            assert_eq!(wishlist.contains(&id), initially_saved);
            wishlist.toggle(product("p1")).unwrap();
            wishlist.toggle(product("p1")).unwrap();
            assert_eq!(wishlist.contains(&id), initially_saved);
            assert_eq!(
                Wishlist::open(store.clone()).contains(&id),
                initially_saved
            );
            wishlist.add(product("p1")).unwrap();
        }
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut wishlist = Wishlist::open(Arc::new(MemoryStore::new()));
        assert!(!wishlist.remove(&ProductId::new("ghost")).unwrap());
    }

    #[test]
    fn test_clear_then_reload_is_empty() {
        let store = Arc::new(MemoryStore::new());
        let mut wishlist = Wishlist::open(store.clone());
        wishlist.add(product("a")).unwrap();
        wishlist.add(product("b")).unwrap();
        assert_eq!(wishlist.total(), Price::from_cents(3998));

        wishlist.clear().unwrap();
        assert!(wishlist.is_empty());
        assert!(Wishlist::open(store).is_empty());
    }

    #[test]
    fn test_corrupt_record_hydrates_empty() {
        let store = Arc::new(MemoryStore::new());
        store.set(keys::WISHLIST, "[{\"id\": 42}]").unwrap();
        assert!(Wishlist::open(store).is_empty());
    }

    #[test]
    fn test_failed_toggle_keeps_memory() {
        let mut wishlist = Wishlist::open(Arc::new(FailingStore));
        assert!(wishlist.toggle(product("p1")).is_err());
        assert!(!wishlist.contains(&ProductId::new("p1")));
    }
}
