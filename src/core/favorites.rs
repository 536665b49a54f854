use tracing::debug;

use super::catalog::{Product, ProductCatalog};
use super::error::Result;
use super::storage::KeyValueStore;

pub const FAVORITES_KEY: &str = "glowup_favorites";

/// Favorite product ids, kept as a single JSON list. Ids are not checked
/// against the catalog on write.
pub struct Favorites<'a, S: KeyValueStore> {
    store: &'a mut S,
}

impl<'a, S: KeyValueStore> Favorites<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    /// Ids in the order they were added.
    pub fn get_all(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = Vec::new();
        for id in self.store.get_json::<Vec<u32>>(FAVORITES_KEY).unwrap_or_default() {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }

    pub fn is_favorite(&self, product_id: u32) -> bool {
        self.get_all().contains(&product_id)
    }

    /// Returns `true` if the id was newly added.
    pub fn add(&mut self, product_id: u32) -> Result<bool> {
        let mut ids = self.get_all();
        if ids.contains(&product_id) {
            return Ok(false);
        }
        ids.push(product_id);
        self.store.set_json(FAVORITES_KEY, &ids)?;
        debug!(product_id, "favorite added");
        Ok(true)
    }

    /// Removing an absent id is a no-op. Always returns `true`.
    pub fn remove(&mut self, product_id: u32) -> Result<bool> {
        let ids: Vec<u32> = self.get_all().into_iter().filter(|id| *id != product_id).collect();
        self.store.set_json(FAVORITES_KEY, &ids)?;
        debug!(product_id, "favorite removed");
        Ok(true)
    }

    /// Returns whether the product is a favorite afterwards.
    pub fn toggle(&mut self, product_id: u32) -> Result<bool> {
        if self.is_favorite(product_id) {
            self.remove(product_id)?;
            Ok(false)
        } else {
            self.add(product_id)?;
            Ok(true)
        }
    }

    /// Favorite products in favorites order; ids no longer in the catalog are
    /// skipped.
    pub fn favorite_products(&self, catalog: &ProductCatalog) -> Vec<Product> {
        self.get_all()
            .into_iter()
            .filter_map(|id| catalog.get_by_id(id).ok())
            .collect()
    }
}
