use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use cartkeep_core::{Error, Request, Response};
use tracing::{debug, error, warn};

use crate::handlers::{
    ClearCartHandler, GetCartHandler, KeyboardTogglePricesHandler, LoadCartHandler,
    TogglePriceDivsHandler,
};
use crate::{CommandHandler, RouterContext};

/// Dispatch table from action tag to handler.
#[derive(Clone)]
pub struct CommandRouter {
    handlers: HashMap<String, Arc<dyn CommandHandler>>,
    ctx: RouterContext,
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}

impl CommandRouter {
    pub fn new(ctx: RouterContext) -> Self {
        Self {
            handlers: HashMap::new(),
            ctx,
        }
    }

    pub fn with_defaults(ctx: RouterContext) -> Self {
        let mut router = Self::new(ctx);
        router.register(Arc::new(GetCartHandler));
        router.register(Arc::new(LoadCartHandler));
        router.register(Arc::new(ClearCartHandler));
        router.register(Arc::new(TogglePriceDivsHandler));
        router.register(Arc::new(KeyboardTogglePricesHandler));
        router
    }

    pub fn register(&mut self, handler: Arc<dyn CommandHandler>) {
        let action = handler.action();
        debug!(action, "Registering command handler");
        self.handlers.insert(action.to_string(), handler);
    }

    pub fn get(&self, action: &str) -> Option<&Arc<dyn CommandHandler>> {
        self.handlers.get(action)
    }

    pub fn actions(&self) -> Vec<String> {
        let mut actions: Vec<String> = self.handlers.keys().cloned().collect();
        actions.sort();
        actions
    }

    pub fn context(&self) -> &RouterContext {
        &self.ctx
    }

    /// Run one request to completion. Never fails: unknown tags, handler
    /// errors and handler panics all come back as failure responses.
    pub async fn dispatch(&self, request: Request) -> Response {
        let action = request.action.clone();
        let Some(handler) = self.get(&action).cloned() else {
            warn!(action = %action, "Unknown action");
            return Response::from(Error::UnknownCommand(action));
        };

        if let Err(e) = handler.validate(&request) {
            warn!(action = %action, error = %e, "Command validation failed");
            return Response::from(e);
        }

        let ctx = self.ctx.clone();
        let task = tokio::spawn(async move { handler.handle(ctx, request).await });
        match task.await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                error!(action = %action, error = %e, "Command failed");
                Response::from(e)
            }
            Err(join_error) if join_error.is_panic() => {
                let message = panic_message(join_error.into_panic());
                error!(action = %action, panic = %message, "Command handler panicked");
                Response::from(Error::Internal(format!("{} failed: {}", action, message)))
            }
            Err(join_error) => {
                error!(action = %action, error = %join_error, "Command task cancelled");
                Response::from(Error::Internal(format!("{} was cancelled", action)))
            }
        }
    }
}
