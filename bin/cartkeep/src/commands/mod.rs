pub mod cart;
pub mod onboard;
pub mod prices;
pub mod saved;
pub mod shortcut;
pub mod status;

use std::sync::Arc;

use cartkeep_core::{Config, Paths, Response};
use cartkeep_router::{CartWorkflows, CommandBus, CommandClient, CommandRouter, RouterContext};
use cartkeep_storage::{KeyValueStore, LocalStore};
use cartkeep_sync::{CartSyncEngine, HttpCartService};
use cartkeep_visibility::{Document, VisibilityController};
use serde_json::Value;

/// Everything a command needs: the page side (router behind a bus) and the
/// popup side (workflows over local storage).
pub struct Session {
    pub config: Config,
    pub store: Arc<dyn KeyValueStore>,
    pub client: CommandClient,
    pub workflows: CartWorkflows,
}

impl Session {
    pub fn open() -> anyhow::Result<Self> {
        let paths = Paths::new();
        paths.ensure_dirs()?;
        let config = Config::load_or_default(&paths)?;
        let store: Arc<dyn KeyValueStore> = Arc::new(LocalStore::new(&paths));

        let service = HttpCartService::new(&config)?;
        let cart = CartSyncEngine::new(Arc::new(service))
            .with_pre_clear_policy(config.sync.pre_clear_policy);
        // No page is open from the command line; visibility still persists.
        let visibility =
            VisibilityController::from_config(Arc::new(Document::new()), store.clone(), &config)?;

        let router = CommandRouter::with_defaults(RouterContext { cart, visibility });
        let (client, bus) = CommandBus::from_config(&config.router);
        tokio::spawn(bus.serve(Arc::new(router)));

        let workflows = CartWorkflows::new(client.clone(), store.clone());
        Ok(Self {
            config,
            store,
            client,
            workflows,
        })
    }
}

/// Print a command response; a failure becomes the command's error.
pub fn report(response: &Response) -> anyhow::Result<()> {
    for (key, value) in &response.fields {
        match value {
            Value::Array(items) => {
                println!("{}:", key);
                for item in items {
                    println!("  - {}", item);
                }
            }
            other => println!("{}: {}", key, other),
        }
    }
    if response.success {
        Ok(())
    } else {
        anyhow::bail!("{}", response.error_message())
    }
}
