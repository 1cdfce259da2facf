pub mod bus;
pub mod handlers;
pub mod registry;
pub mod shortcut;
pub mod workflow;

use async_trait::async_trait;
use cartkeep_core::{Request, Response, Result};
use cartkeep_sync::CartSyncEngine;
use cartkeep_visibility::VisibilityController;

pub use bus::{CommandBus, CommandClient};
pub use registry::CommandRouter;
pub use shortcut::ShortcutDispatcher;
pub use workflow::CartWorkflows;

/// Everything a handler may touch. Cloned into each command task.
#[derive(Clone)]
pub struct RouterContext {
    pub cart: CartSyncEngine,
    pub visibility: VisibilityController,
}

/// One command tag and the operation behind it.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    fn action(&self) -> &'static str;

    /// Reject malformed parameters before any work starts.
    fn validate(&self, _request: &Request) -> Result<()> {
        Ok(())
    }

    async fn handle(&self, ctx: RouterContext, request: Request) -> Result<Response>;
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use cartkeep_core::config::VisibilityConfig;
    use cartkeep_storage::MemoryStore;
    use cartkeep_sync::testing::FakeCartService;
    use cartkeep_sync::CartSyncEngine;
    use cartkeep_visibility::{Document, ElementSpec, VisibilityController};

    use crate::RouterContext;

    /// A router context over a fake cart and a page with one price element.
    pub fn context(fake: FakeCartService) -> (RouterContext, Arc<FakeCartService>, Document) {
        context_with_store(fake, MemoryStore::new())
    }

    pub fn context_with_store(
        fake: FakeCartService,
        store: MemoryStore,
    ) -> (RouterContext, Arc<FakeCartService>, Document) {
        let fake = Arc::new(fake);
        let doc = Document::new();
        doc.append(None, ElementSpec::new("span").class("price").text("€ 4,99"));
        let visibility = VisibilityController::new(
            Arc::new(doc.clone()),
            Arc::new(store),
            &VisibilityConfig::default(),
            "Alt+Shift+H",
        )
        .unwrap();
        let ctx = RouterContext {
            cart: CartSyncEngine::new(fake.clone()),
            visibility,
        };
        (ctx, fake, doc)
    }
}
