//! In-memory [`CartService`] that records every call, for tests.

use async_trait::async_trait;
use cartkeep_core::{CartContents, CartLine, CartSnapshot, Error, RemoteCartLine, Result};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::CartService;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Get,
    Add(String, u32),
    Update(String, u32),
    Remove(String),
}

#[derive(Default)]
struct State {
    lines: Vec<CartLine>,
    calls: Vec<Call>,
    fail_get: Option<u16>,
    fail_add: HashMap<String, u16>,
    fail_remove: HashMap<String, u16>,
}

/// A cart that behaves like the remote one, with per-product failure injection.
#[derive(Default)]
pub struct FakeCartService {
    state: Mutex<State>,
}

impl FakeCartService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lines(lines: &[(&str, u32)]) -> Self {
        let fake = Self::new();
        fake.set_lines(lines);
        fake
    }

    /// Replace the remote contents as if the user had shopped elsewhere.
    pub fn set_lines(&self, lines: &[(&str, u32)]) {
        self.state().lines = lines.iter().map(|(id, q)| CartLine::new(*id, *q)).collect();
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn fail_get(&self, status: u16) {
        self.state().fail_get = Some(status);
    }

    pub fn fail_add(&self, product_id: &str, status: u16) {
        self.state().fail_add.insert(product_id.to_string(), status);
    }

    pub fn fail_remove(&self, product_id: &str, status: u16) {
        self.state().fail_remove.insert(product_id.to_string(), status);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn lines(&self) -> CartSnapshot {
        self.state().lines.iter().cloned().collect()
    }
}

fn service_error(status: u16, what: &str) -> Error {
    Error::Service {
        status,
        body: format!("{} rejected", what),
    }
}

#[async_trait]
impl CartService for FakeCartService {
    async fn get_cart(&self) -> Result<CartContents> {
        let mut state = self.state();
        state.calls.push(Call::Get);
        if let Some(status) = state.fail_get {
            return Err(service_error(status, "cart"));
        }
        let products: Vec<RemoteCartLine> = state
            .lines
            .iter()
            .map(|l| RemoteCartLine {
                product_id: l.product_id.clone(),
                quantity: l.quantity,
                extra: Map::new(),
            })
            .collect();
        let count = state.lines.iter().map(|l| l.quantity).sum();
        Ok(CartContents { products, count })
    }

    async fn add_line(&self, product_id: &str, quantity: u32) -> Result<Value> {
        let mut state = self.state();
        state.calls.push(Call::Add(product_id.to_string(), quantity));
        if let Some(status) = state.fail_add.get(product_id).copied() {
            return Err(service_error(status, product_id));
        }
        match state.lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => line.quantity += quantity,
            None => state.lines.push(CartLine::new(product_id, quantity)),
        }
        Ok(json!({ "productId": product_id, "quantity": quantity }))
    }

    async fn update_line(&self, product_id: &str, quantity: u32) -> Result<Value> {
        let mut state = self.state();
        state.calls.push(Call::Update(product_id.to_string(), quantity));
        match state.lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => {
                line.quantity = quantity;
                Ok(json!({ "productId": product_id, "quantity": quantity }))
            }
            None => Err(service_error(404, product_id)),
        }
    }

    async fn remove_line(&self, product_id: &str) -> Result<Value> {
        let mut state = self.state();
        state.calls.push(Call::Remove(product_id.to_string()));
        if let Some(status) = state.fail_remove.get(product_id).copied() {
            return Err(service_error(status, product_id));
        }
        let before = state.lines.len();
        state.lines.retain(|l| l.product_id != product_id);
        if state.lines.len() == before {
            return Err(service_error(404, product_id));
        }
        Ok(Value::Null)
    }
}
