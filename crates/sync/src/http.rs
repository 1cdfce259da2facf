use async_trait::async_trait;
use cartkeep_core::{CartContents, Config, Error, Result};
use reqwest::{Client, Method, RequestBuilder};
use serde_json::{json, Value};
use tracing::{debug, error};
use url::Url;

use crate::client::build_http_client;
use crate::CartService;

/// [`CartService`] over the shop's AJAX cart endpoint:
/// `GET /cart`, `POST /cart`, `PUT /cart/{id}`, `DELETE /cart/{id}`.
pub struct HttpCartService {
    client: Client,
    api_base: Url,
}

impl HttpCartService {
    pub fn new(config: &Config) -> Result<Self> {
        let client = build_http_client(config)?;
        Self::with_client(client, config.api_base())
    }

    pub fn with_client(client: Client, api_base: &str) -> Result<Self> {
        let api_base = Url::parse(api_base.trim_end_matches('/'))
            .map_err(|e| Error::Config(format!("Invalid cart API base '{}': {}", api_base, e)))?;
        if api_base.cannot_be_a_base() {
            return Err(Error::Config(format!("Cart API base '{}' cannot take a path", api_base)));
        }
        Ok(Self { client, api_base })
    }

    pub fn api_base(&self) -> &str {
        self.api_base.as_str()
    }

    /// `{base}/{product_id}` with the id percent-encoded as one path segment.
    fn line_url(&self, product_id: &str) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(product_id);
        }
        url
    }

    async fn send(&self, builder: RequestBuilder, what: &str) -> Result<Value> {
        let response = builder
            .send()
            .await
            .map_err(|e| Error::Network(format!("{} failed: {}", what, e)))?;

        let status = response.status();
        let raw_body = response
            .text()
            .await
            .map_err(|e| Error::Network(format!("{}: failed to read body: {}", what, e)))?;

        if !status.is_success() {
            error!(status = %status, body = %raw_body, "{} rejected by cart API", what);
            return Err(Error::Service {
                status: status.as_u16(),
                body: raw_body,
            });
        }

        debug!(status = %status, bytes = raw_body.len(), "{} ok", what);
        if raw_body.trim().is_empty() {
            return Ok(Value::Null);
        }
        // Some endpoints answer 2xx with a bare confirmation string instead of JSON.
        Ok(serde_json::from_str(&raw_body).unwrap_or(Value::String(raw_body)))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client.request(method, url)
    }
}

#[async_trait]
impl CartService for HttpCartService {
    async fn get_cart(&self) -> Result<CartContents> {
        let body = self
            .send(self.request(Method::GET, self.api_base.clone()), "GET cart")
            .await?;
        if body.is_null() {
            return Ok(CartContents::default());
        }
        serde_json::from_value(body)
            .map_err(|e| Error::Network(format!("Failed to parse cart response: {}", e)))
    }

    async fn add_line(&self, product_id: &str, quantity: u32) -> Result<Value> {
        let builder = self
            .request(Method::POST, self.api_base.clone())
            .json(&json!({ "productId": product_id, "quantity": quantity }));
        self.send(builder, "POST cart line").await
    }

    async fn update_line(&self, product_id: &str, quantity: u32) -> Result<Value> {
        let builder = self
            .request(Method::PUT, self.line_url(product_id))
            .json(&json!({ "quantity": quantity }));
        self.send(builder, "PUT cart line").await
    }

    async fn remove_line(&self, product_id: &str) -> Result<Value> {
        self.send(self.request(Method::DELETE, self.line_url(product_id)), "DELETE cart line")
            .await
    }
}
