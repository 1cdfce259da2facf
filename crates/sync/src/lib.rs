pub mod client;
pub mod engine;
pub mod http;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

use async_trait::async_trait;
use cartkeep_core::{CartContents, Result};
use serde_json::Value;

/// The shop's server-side cart, keyed by the session the implementation
/// carries. Every method is a single remote call with no retry; there is no
/// transaction spanning several calls.
#[async_trait]
pub trait CartService: Send + Sync {
    async fn get_cart(&self) -> Result<CartContents>;
    async fn add_line(&self, product_id: &str, quantity: u32) -> Result<Value>;
    async fn update_line(&self, product_id: &str, quantity: u32) -> Result<Value>;
    async fn remove_line(&self, product_id: &str) -> Result<Value>;
}

pub use client::build_http_client;
pub use engine::{BatchOutcome, BatchResult, CartSyncEngine, LineFailure, LineResult};
pub use http::HttpCartService;
