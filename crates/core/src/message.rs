use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, ErrorKind, Result};

/// Command tags understood by the page context.
pub mod actions {
    pub const GET_CART: &str = "getCart";
    pub const LOAD_CART: &str = "loadCart";
    pub const CLEAR_CART: &str = "clearCart";
    pub const TOGGLE_PRICE_DIVS: &str = "togglePriceDivs";
    pub const KEYBOARD_TOGGLE_PRICES: &str = "keyboardTogglePrices";
}

/// A cross-context request: `{"action": tag, ...params}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub action: String,
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl Request {
    pub fn new(action: &str) -> Self {
        Self {
            action: action.to_string(),
            params: Map::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: Value) -> Self {
        self.params.insert(key.to_string(), value);
        self
    }

    /// Parameters as a JSON object, for handlers that deserialize them.
    pub fn params_value(&self) -> Value {
        Value::Object(self.params.clone())
    }

    pub fn get_cart() -> Self {
        Self::new(actions::GET_CART)
    }

    pub fn load_cart(products: &crate::types::CartSnapshot) -> Self {
        let products = serde_json::to_value(products).unwrap_or(Value::Array(Vec::new()));
        Self::new(actions::LOAD_CART).with_param("products", products)
    }

    pub fn clear_cart() -> Self {
        Self::new(actions::CLEAR_CART)
    }

    pub fn toggle_price_divs(hide: bool) -> Self {
        Self::new(actions::TOGGLE_PRICE_DIVS).with_param("hide", Value::Bool(hide))
    }

    pub fn keyboard_toggle_prices() -> Self {
        Self::new(actions::KEYBOARD_TOGGLE_PRICES)
    }
}

/// A cross-context response: `{"success": bool, "data"?, "error"?, ...}`.
///
/// Command-specific fields (`loaded`, `cleared`, `hidden`, `count`,
/// `successes`, `errors`, ...) live in `fields` and are flattened on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Response {
    pub fn ok() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            error_kind: None,
            status: None,
            fields: Map::new(),
        }
    }

    pub fn ok_with_data(data: Value) -> Self {
        Self {
            data: Some(data),
            ..Self::ok()
        }
    }

    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            error_kind: Some(kind),
            ..Self::ok()
        }
    }

    pub fn from_error(err: &Error) -> Self {
        let mut response = Self::failure(err.kind(), err.to_string());
        response.status = err.status();
        response
    }

    pub fn with(mut self, key: &str, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.fields.insert(key.to_string(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn error_message(&self) -> &str {
        self.error.as_deref().unwrap_or("Unknown error")
    }

    /// `Ok(self)` on success, otherwise the failure as an [`Error::Rejected`].
    pub fn into_result(self) -> Result<Self> {
        if self.success {
            return Ok(self);
        }
        Err(Error::Rejected {
            kind: self.error_kind.unwrap_or(ErrorKind::Internal),
            message: self.error_message().to_string(),
            status: self.status,
        })
    }
}

impl From<Error> for Response {
    fn from(err: Error) -> Self {
        Self::from_error(&err)
    }
}
