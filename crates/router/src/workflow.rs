//! Saved-cart operations as the popup performs them: talk to the page
//! through the bus, keep named snapshots in local storage.

use std::sync::Arc;

use cartkeep_core::{CartContents, Error, Request, Response, Result, SavedCart};
use cartkeep_storage::{price_divs_hidden, KeyValueStore, SaveOutcome, SavedCartStore};
use tracing::info;

use crate::bus::CommandClient;

pub struct CartWorkflows {
    client: CommandClient,
    store: Arc<dyn KeyValueStore>,
    carts: SavedCartStore<Arc<dyn KeyValueStore>>,
}

impl CartWorkflows {
    pub fn new(client: CommandClient, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            client,
            carts: SavedCartStore::new(Arc::clone(&store)),
            store,
        }
    }

    pub async fn current_cart(&self) -> Result<CartContents> {
        let response = self.client.send(Request::get_cart()).await.into_result()?;
        match response.data {
            Some(data) => Ok(serde_json::from_value(data)?),
            None => Ok(CartContents::default()),
        }
    }

    pub async fn cart_count(&self) -> Result<u32> {
        Ok(self.current_cart().await?.count)
    }

    pub fn list(&self) -> Result<Vec<SavedCart>> {
        self.carts.list()
    }

    /// Index of the saved cart called `name`.
    pub fn position(&self, name: &str) -> Result<usize> {
        self.carts
            .find(name.trim())?
            .map(|(index, _)| index)
            .ok_or_else(|| Error::NotFound("Cart not found".to_string()))
    }

    pub async fn save(&self, name: &str) -> Result<SaveOutcome> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("Please enter a cart name".to_string()));
        }
        let snapshot = self.current_cart().await?.to_snapshot();
        if snapshot.is_empty() {
            return Err(Error::Validation("Cart is empty".to_string()));
        }
        self.carts.save(name, snapshot)
    }

    /// Push a saved cart to the remote. The page's response is returned as
    /// is so a partial failure keeps its `successes`/`errors` lists.
    pub async fn load(&self, index: usize) -> Result<Response> {
        let cart = self.carts.get(index)?;
        info!(name = %cart.name, lines = cart.products.len(), "Loading saved cart");
        Ok(self.client.send(Request::load_cart(&cart.products)).await)
    }

    pub async fn overwrite(&self, index: usize) -> Result<SavedCart> {
        self.carts.get(index)?;
        let snapshot = self.current_cart().await?.to_snapshot();
        if snapshot.is_empty() {
            return Err(Error::Validation(
                "Current cart is empty. Cannot overwrite with empty cart.".to_string(),
            ));
        }
        self.carts.overwrite(index, snapshot)
    }

    pub fn delete(&self, index: usize) -> Result<SavedCart> {
        self.carts.delete(index)
    }

    pub async fn clear_cart(&self) -> Response {
        self.client.send(Request::clear_cart()).await
    }

    /// Flip the persisted price flag through the page.
    pub async fn toggle_prices(&self) -> Result<Response> {
        let hidden = price_divs_hidden(self.store.as_ref())?;
        self.client
            .send(Request::toggle_price_divs(!hidden))
            .await
            .into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::CommandBus;
    use crate::registry::CommandRouter;
    use crate::testing::context_with_store;
    use cartkeep_core::{CartLine, ErrorKind};
    use cartkeep_storage::MemoryStore;
    use cartkeep_sync::testing::{Call, FakeCartService};
    use serde_json::json;
    use std::time::Duration;

    fn workflows(fake: FakeCartService) -> (CartWorkflows, Arc<FakeCartService>, MemoryStore) {
        let store = MemoryStore::new();
        let (ctx, fake, _) = context_with_store(fake, store.clone());
        let (client, bus) = CommandBus::new(8, Duration::from_secs(5));
        tokio::spawn(bus.serve(Arc::new(CommandRouter::with_defaults(ctx))));
        (CartWorkflows::new(client, Arc::new(store.clone())), fake, store)
    }

    #[tokio::test]
    async fn test_save_creates_then_updates_in_place() {
        let (wf, fake, _) = workflows(FakeCartService::with_lines(&[("A", 1)]));
        assert_eq!(wf.save("  Weekly  ").await.unwrap(), SaveOutcome::Created);

        fake.set_lines(&[("B", 3)]);
        assert_eq!(wf.save("Other").await.unwrap(), SaveOutcome::Created);
        assert_eq!(wf.save("Weekly").await.unwrap(), SaveOutcome::Updated);

        let carts = wf.list().unwrap();
        assert_eq!(carts.len(), 2);
        assert_eq!(carts[0].name, "Weekly");
        assert_eq!(carts[0].products.lines(), &[CartLine::new("B", 3)]);
        assert_eq!(carts[1].name, "Other");
    }

    #[tokio::test]
    async fn test_save_validation() {
        let (wf, fake, _) = workflows(FakeCartService::new());
        let err = wf.save("   ").await.unwrap_err();
        assert_eq!(err.to_string(), "Please enter a cart name");
        assert!(fake.calls().is_empty());

        let err = wf.save("Empty").await.unwrap_err();
        assert_eq!(err.to_string(), "Cart is empty");
        assert!(wf.list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_skips_lines_without_quantity() {
        let (wf, fake, _) = workflows(FakeCartService::with_lines(&[("A", 0)]));
        let err = wf.save("Ghost").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(err.to_string(), "Cart is empty");

        fake.set_lines(&[("A", 0), ("B", 2)]);
        wf.save("Partial").await.unwrap();
        assert_eq!(wf.list().unwrap()[0].products.lines(), &[CartLine::new("B", 2)]);
    }

    #[tokio::test]
    async fn test_load_replaces_remote_cart() {
        let (wf, fake, _) = workflows(FakeCartService::with_lines(&[("A", 2), ("B", 1)]));
        wf.save("Saved").await.unwrap();
        fake.set_lines(&[("C", 5)]);

        let resp = wf.load(0).await.unwrap();
        assert!(resp.success);
        assert_eq!(resp.get("loaded"), Some(&json!(2)));
        assert_eq!(fake.lines().lines(), &[CartLine::new("A", 2), CartLine::new("B", 1)]);
    }

    #[tokio::test]
    async fn test_missing_index_is_not_found() {
        let (wf, fake, _) = workflows(FakeCartService::with_lines(&[("A", 1)]));
        assert_eq!(wf.load(3).await.unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(wf.overwrite(0).await.unwrap_err().to_string(), "Cart not found");
        assert_eq!(wf.delete(0).unwrap_err().kind(), ErrorKind::NotFound);
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_overwrite_keeps_name_and_rejects_empty_cart() {
        let (wf, fake, _) = workflows(FakeCartService::with_lines(&[("A", 1)]));
        wf.save("Mine").await.unwrap();

        fake.set_lines(&[("Z", 9)]);
        let updated = wf.overwrite(0).await.unwrap();
        assert_eq!(updated.name, "Mine");
        assert_eq!(updated.products.lines(), &[CartLine::new("Z", 9)]);

        fake.set_lines(&[]);
        let err = wf.overwrite(0).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Current cart is empty. Cannot overwrite with empty cart."
        );
        assert_eq!(wf.list().unwrap()[0].products.lines(), &[CartLine::new("Z", 9)]);
    }

    #[tokio::test]
    async fn test_delete_keeps_order() {
        let (wf, fake, _) = workflows(FakeCartService::with_lines(&[("A", 1)]));
        for name in ["one", "two", "three"] {
            wf.save(name).await.unwrap();
        }
        assert_eq!(wf.position(" three ").unwrap(), 2);
        let removed = wf.delete(1).unwrap();
        assert_eq!(removed.name, "two");
        let names: Vec<String> = wf.list().unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["one", "three"]);
        assert_eq!(wf.position("two").unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(fake.calls().iter().filter(|c| **c == Call::Get).count(), 3);
    }

    #[tokio::test]
    async fn test_toggle_prices_flips_persisted_flag() {
        let (wf, _, store) = workflows(FakeCartService::new());
        let resp = wf.toggle_prices().await.unwrap();
        assert_eq!(resp.get("hidden"), Some(&json!(true)));
        assert!(price_divs_hidden(&store).unwrap());

        let resp = wf.toggle_prices().await.unwrap();
        assert_eq!(resp.get("hidden"), Some(&json!(false)));
        assert!(!price_divs_hidden(&store).unwrap());
    }

    #[tokio::test]
    async fn test_cart_count_and_failures() {
        let (wf, fake, _) = workflows(FakeCartService::with_lines(&[("A", 2), ("B", 3)]));
        assert_eq!(wf.cart_count().await.unwrap(), 5);

        fake.fail_get(500);
        let err = wf.cart_count().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Service);
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn test_clear_cart_through_bus() {
        let (wf, fake, _) = workflows(FakeCartService::with_lines(&[("A", 2)]));
        let resp = wf.clear_cart().await;
        assert_eq!(resp.get("cleared"), Some(&json!(1)));
        assert!(fake.lines().is_empty());
    }
}
