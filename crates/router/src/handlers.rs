use async_trait::async_trait;
use cartkeep_core::{actions, CartSnapshot, Error, Request, Response, Result};
use cartkeep_visibility::ToggleOutcome;
use serde_json::Value;
use tracing::info;

use crate::{CommandHandler, RouterContext};

fn toggle_response(outcome: ToggleOutcome) -> Response {
    Response::ok()
        .with("hidden", outcome.hidden)
        .with("count", outcome.count)
}

pub struct GetCartHandler;

#[async_trait]
impl CommandHandler for GetCartHandler {
    fn action(&self) -> &'static str {
        actions::GET_CART
    }

    async fn handle(&self, ctx: RouterContext, _request: Request) -> Result<Response> {
        let contents = ctx.cart.fetch_cart().await?;
        Ok(Response::ok_with_data(serde_json::to_value(contents)?))
    }
}

pub struct LoadCartHandler;

impl LoadCartHandler {
    fn products(request: &Request) -> Result<CartSnapshot> {
        match request.params.get("products") {
            None | Some(Value::Null) => Err(Error::Validation("No products to load".to_string())),
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| Error::Validation(format!("Invalid products: {}", e))),
        }
    }
}

#[async_trait]
impl CommandHandler for LoadCartHandler {
    fn action(&self) -> &'static str {
        actions::LOAD_CART
    }

    fn validate(&self, request: &Request) -> Result<()> {
        Self::products(request).map(|_| ())
    }

    async fn handle(&self, ctx: RouterContext, request: Request) -> Result<Response> {
        let products = Self::products(&request)?;
        info!(lines = products.len(), "Loading cart");
        Ok(ctx.cart.replace_cart(&products).await?.into())
    }
}

pub struct ClearCartHandler;

#[async_trait]
impl CommandHandler for ClearCartHandler {
    fn action(&self) -> &'static str {
        actions::CLEAR_CART
    }

    async fn handle(&self, ctx: RouterContext, _request: Request) -> Result<Response> {
        Ok(ctx.cart.clear_cart().await?.into())
    }
}

pub struct TogglePriceDivsHandler;

impl TogglePriceDivsHandler {
    fn hide(request: &Request) -> Result<bool> {
        request
            .params
            .get("hide")
            .and_then(Value::as_bool)
            .ok_or_else(|| Error::Validation("Missing boolean 'hide' parameter".to_string()))
    }
}

#[async_trait]
impl CommandHandler for TogglePriceDivsHandler {
    fn action(&self) -> &'static str {
        actions::TOGGLE_PRICE_DIVS
    }

    fn validate(&self, request: &Request) -> Result<()> {
        Self::hide(request).map(|_| ())
    }

    async fn handle(&self, ctx: RouterContext, request: Request) -> Result<Response> {
        let outcome = ctx.visibility.set_hidden(Self::hide(&request)?).await?;
        Ok(toggle_response(outcome))
    }
}

/// Flip from whatever is persisted; the shortcut carries no target state.
pub struct KeyboardTogglePricesHandler;

#[async_trait]
impl CommandHandler for KeyboardTogglePricesHandler {
    fn action(&self) -> &'static str {
        actions::KEYBOARD_TOGGLE_PRICES
    }

    async fn handle(&self, ctx: RouterContext, _request: Request) -> Result<Response> {
        let outcome = ctx.visibility.toggle().await?;
        Ok(toggle_response(outcome))
    }
}
