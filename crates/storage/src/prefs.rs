use cartkeep_core::Result;

use crate::kv::{KeyValueStore, KeyValueStoreExt};

pub const PRICE_DIVS_HIDDEN_KEY: &str = "priceDivsHidden";

/// Persisted price-visibility intent. Unset reads as "shown".
pub fn price_divs_hidden<S: KeyValueStore + ?Sized>(store: &S) -> Result<bool> {
    Ok(store.get::<bool>(PRICE_DIVS_HIDDEN_KEY)?.unwrap_or(false))
}

pub fn set_price_divs_hidden<S: KeyValueStore + ?Sized>(store: &S, hidden: bool) -> Result<()> {
    store.set(PRICE_DIVS_HIDDEN_KEY, &hidden)
}
