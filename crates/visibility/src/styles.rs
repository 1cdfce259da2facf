use std::collections::HashMap;

use crate::page::ElementId;

/// Pre-hide `display` values, keyed by element.
#[derive(Debug, Default)]
pub struct OriginalStyles {
    values: HashMap<ElementId, String>,
}

impl OriginalStyles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` unless something is already remembered for `id`.
    /// Returns `true` if this call stored it.
    pub fn remember(&mut self, id: ElementId, value: String) -> bool {
        if self.values.contains_key(&id) {
            return false;
        }
        self.values.insert(id, value);
        true
    }

    pub fn get(&self, id: ElementId) -> Option<&str> {
        self.values.get(&id).map(String::as_str)
    }

    /// Remembered entries, kept in place.
    pub fn iter(&self) -> impl Iterator<Item = (ElementId, &str)> {
        self.values.iter().map(|(id, v)| (*id, v.as_str()))
    }

    /// Remove and return every remembered entry.
    pub fn take_all(&mut self) -> Vec<(ElementId, String)> {
        self.values.drain().collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}
