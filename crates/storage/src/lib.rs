pub mod kv;
pub mod local;
pub mod prefs;
pub mod saved_carts;

pub use kv::{KeyValueStore, KeyValueStoreExt, MemoryStore};
pub use local::LocalStore;
pub use prefs::{price_divs_hidden, set_price_divs_hidden, PRICE_DIVS_HIDDEN_KEY};
pub use saved_carts::{SaveOutcome, SavedCartStore, SAVED_CARTS_KEY};
