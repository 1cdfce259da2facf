use cartkeep_core::{CartSnapshot, Error, Result, SavedCart};
use chrono::Utc;
use tracing::{debug, info};

use crate::kv::{KeyValueStore, KeyValueStoreExt};

pub const SAVED_CARTS_KEY: &str = "savedCarts";

/// Whether a save created a new entry or replaced one with the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Created,
    Updated,
}

/// Ordered, name-keyed list of saved carts kept under `savedCarts`.
pub struct SavedCartStore<S> {
    store: S,
}

impl<S: KeyValueStore> SavedCartStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn list(&self) -> Result<Vec<SavedCart>> {
        Ok(self.store.get::<Vec<SavedCart>>(SAVED_CARTS_KEY)?.unwrap_or_default())
    }

    pub fn get(&self, index: usize) -> Result<SavedCart> {
        self.list()?.into_iter().nth(index).ok_or_else(not_found)
    }

    pub fn find(&self, name: &str) -> Result<Option<(usize, SavedCart)>> {
        Ok(self
            .list()?
            .into_iter()
            .enumerate()
            .find(|(_, c)| c.name == name))
    }

    /// Upsert by name: an existing entry keeps its position, a new one is appended.
    pub fn save(&self, name: &str, products: CartSnapshot) -> Result<SaveOutcome> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("Please enter a cart name".to_string()));
        }
        if products.is_empty() {
            return Err(Error::Validation("Cart is empty".to_string()));
        }
        products.validate()?;

        let mut carts = self.list()?;
        let entry = SavedCart::new(name, products);
        let outcome = match carts.iter().position(|c| c.name == name) {
            Some(index) => {
                carts[index] = entry;
                SaveOutcome::Updated
            }
            None => {
                carts.push(entry);
                SaveOutcome::Created
            }
        };
        self.store.set(SAVED_CARTS_KEY, &carts)?;
        info!(name, outcome = ?outcome, "Saved cart");
        Ok(outcome)
    }

    /// Replace the lines of an existing entry, keeping its name and position.
    pub fn overwrite(&self, index: usize, products: CartSnapshot) -> Result<SavedCart> {
        if products.is_empty() {
            return Err(Error::Validation(
                "Current cart is empty. Cannot overwrite with empty cart.".to_string(),
            ));
        }
        products.validate()?;

        let mut carts = self.list()?;
        let slot = carts.get_mut(index).ok_or_else(not_found)?;
        slot.products = products;
        slot.saved_at = Utc::now();
        let updated = slot.clone();
        self.store.set(SAVED_CARTS_KEY, &carts)?;
        info!(name = %updated.name, index, "Overwrote saved cart");
        Ok(updated)
    }

    pub fn delete(&self, index: usize) -> Result<SavedCart> {
        let mut carts = self.list()?;
        if index >= carts.len() {
            return Err(not_found());
        }
        let removed = carts.remove(index);
        self.store.set(SAVED_CARTS_KEY, &carts)?;
        debug!(name = %removed.name, index, "Deleted saved cart");
        Ok(removed)
    }
}

fn not_found() -> Error {
    Error::NotFound("Cart not found".to_string())
}
