use std::sync::Arc;
use std::time::Duration;

use cartkeep_core::config::VisibilityConfig;
use cartkeep_core::{Config, Result};
use cartkeep_storage::{price_divs_hidden, set_price_divs_hidden, KeyValueStore};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::engine::VisibilityEngine;
use crate::keys::{HoldGesture, HoldSignal, KeyEvent};
use crate::matcher::PriceMatcher;
use crate::page::{ElementId, Page};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToggleOutcome {
    pub hidden: bool,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityStatus {
    pub hidden: bool,
    pub hold_active: bool,
    pub temporarily_shown: bool,
    pub observer_armed: bool,
    pub remembered: usize,
}

#[derive(Default)]
struct HoldSession {
    held: bool,
    temporarily_shown: bool,
    pending: Option<JoinHandle<()>>,
}

impl HoldSession {
    fn cancel_pending(&mut self) {
        if let Some(timer) = self.pending.take() {
            timer.abort();
        }
    }
}

struct PageState {
    engine: VisibilityEngine,
    hold: HoldSession,
    gesture: HoldGesture,
}

impl PageState {
    fn apply(&mut self, hide: bool) -> usize {
        self.hold.cancel_pending();
        self.hold.temporarily_shown = false;
        if hide {
            self.engine.hide()
        } else {
            self.engine.show()
        }
    }

    /// Leave any hold and reconcile the display with the persisted state.
    fn end_hold(&mut self) -> bool {
        self.hold.held = false;
        self.hold.cancel_pending();
        if !self.hold.temporarily_shown {
            return false;
        }
        self.hold.temporarily_shown = false;
        let count = self.engine.hide();
        debug!(count, "Hold released, prices hidden again");
        true
    }
}

/// Price visibility for one page: the persisted `hidden` flag, the
/// hold-to-reveal session and the page engine behind one lock.
#[derive(Clone)]
pub struct VisibilityController {
    state: Arc<Mutex<PageState>>,
    store: Arc<dyn KeyValueStore>,
    hold_debounce: Duration,
    settle_delay: Duration,
}

impl VisibilityController {
    pub fn new(
        page: Arc<dyn Page>,
        store: Arc<dyn KeyValueStore>,
        config: &VisibilityConfig,
        hold_combo: &str,
    ) -> Result<Self> {
        let matcher = PriceMatcher::from_config(config)?;
        let gesture = HoldGesture::new(hold_combo.parse()?);
        Ok(Self {
            state: Arc::new(Mutex::new(PageState {
                engine: VisibilityEngine::new(page, matcher),
                hold: HoldSession::default(),
                gesture,
            })),
            store,
            hold_debounce: Duration::from_millis(config.hold_debounce_ms),
            settle_delay: Duration::from_millis(config.settle_delay_ms),
        })
    }

    pub fn from_config(
        page: Arc<dyn Page>,
        store: Arc<dyn KeyValueStore>,
        config: &Config,
    ) -> Result<Self> {
        Self::new(page, store, &config.visibility, &config.shortcuts.hold_combo)
    }

    /// Persisted intent, independent of any hold in progress.
    pub fn is_hidden(&self) -> Result<bool> {
        price_divs_hidden(self.store.as_ref())
    }

    pub async fn set_hidden(&self, hide: bool) -> Result<ToggleOutcome> {
        let mut state = self.state.lock().await;
        set_price_divs_hidden(self.store.as_ref(), hide)?;
        let count = state.apply(hide);
        info!(hidden = hide, count, "Price visibility updated");
        Ok(ToggleOutcome {
            hidden: hide,
            count,
        })
    }

    pub async fn toggle(&self) -> Result<ToggleOutcome> {
        let mut state = self.state.lock().await;
        let hide = !self.is_hidden()?;
        set_price_divs_hidden(self.store.as_ref(), hide)?;
        let count = state.apply(hide);
        info!(hidden = hide, count, "Price visibility toggled");
        Ok(ToggleOutcome {
            hidden: hide,
            count,
        })
    }

    /// Start a hold. Returns `false` when prices are not hidden or a hold is
    /// already in progress.
    pub async fn hold_begin(&self) -> Result<bool> {
        let mut state = self.state.lock().await;
        if state.hold.held || !self.is_hidden()? {
            return Ok(false);
        }
        state.hold.held = true;
        state.hold.cancel_pending();

        let shared = Arc::clone(&self.state);
        let store = Arc::clone(&self.store);
        let delay = self.hold_debounce;
        state.hold.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut state = shared.lock().await;
            state.hold.pending = None;
            let still_hidden = match price_divs_hidden(store.as_ref()) {
                Ok(hidden) => hidden,
                Err(e) => {
                    warn!(error = %e, "Could not read price visibility, hold ignored");
                    return;
                }
            };
            if still_hidden && state.hold.held && !state.hold.temporarily_shown {
                let count = state.engine.reveal();
                state.hold.temporarily_shown = true;
                debug!(count, "Hold active, prices shown temporarily");
            }
        }));
        Ok(true)
    }

    /// End a hold. Returns `true` if the display had to be re-hidden.
    pub async fn hold_end(&self) -> bool {
        self.state.lock().await.end_hold()
    }

    pub async fn focus_lost(&self) -> bool {
        let mut state = self.state.lock().await;
        state.gesture.reset();
        state.end_hold()
    }

    /// Feed a raw key event through the hold gesture.
    pub async fn handle_key(&self, event: &KeyEvent) -> Result<Option<HoldSignal>> {
        let signal = self.state.lock().await.gesture.on_event(event);
        match signal {
            Some(HoldSignal::Begin) => {
                if let Err(e) = self.hold_begin().await {
                    self.state.lock().await.gesture.reset();
                    return Err(e);
                }
            }
            Some(HoldSignal::End) => {
                self.hold_end().await;
            }
            None => {}
        }
        Ok(signal)
    }

    /// Subtrees the page just inserted. While a hold shows prices they are
    /// left alone and get hidden on release.
    pub async fn on_inserted(&self, roots: &[ElementId]) -> usize {
        let mut state = self.state.lock().await;
        if state.hold.temporarily_shown {
            return 0;
        }
        state.engine.on_inserted(roots)
    }

    /// Apply the persisted state once the page has had time to render.
    pub async fn page_loaded(&self) -> Result<Option<usize>> {
        tokio::time::sleep(self.settle_delay).await;
        let mut state = self.state.lock().await;
        if !self.is_hidden()? {
            return Ok(None);
        }
        let count = state.apply(true);
        debug!(count, "Applied hidden prices on page load");
        Ok(Some(count))
    }

    /// Page teardown. The persisted flag is untouched.
    pub async fn unload(&self) {
        let mut state = self.state.lock().await;
        state.hold.cancel_pending();
        state.hold = HoldSession::default();
        state.gesture.reset();
        state.engine.reset();
    }

    pub async fn status(&self) -> Result<VisibilityStatus> {
        let state = self.state.lock().await;
        Ok(VisibilityStatus {
            hidden: self.is_hidden()?,
            hold_active: state.hold.held,
            temporarily_shown: state.hold.temporarily_shown,
            observer_armed: state.engine.observer_armed(),
            remembered: state.engine.remembered(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::Modifiers;
    use crate::page::{Document, ElementSpec};
    use cartkeep_storage::{MemoryStore, PRICE_DIVS_HIDDEN_KEY};

    const DEBOUNCE_MS: u64 = 40;

    fn config() -> VisibilityConfig {
        VisibilityConfig {
            hold_debounce_ms: DEBOUNCE_MS,
            settle_delay_ms: 10,
            ..VisibilityConfig::default()
        }
    }

    fn setup() -> (Document, MemoryStore, VisibilityController, ElementId) {
        let doc = Document::new();
        let price = doc.append(None, ElementSpec::new("div").class("price").display("flex"));
        doc.append(None, ElementSpec::new("p").text("Beschrijving"));
        let store = MemoryStore::new();
        let controller = VisibilityController::new(
            Arc::new(doc.clone()),
            Arc::new(store.clone()),
            &config(),
            "Alt+Shift+H",
        )
        .unwrap();
        (doc, store, controller, price)
    }

    async fn past_debounce() {
        tokio::time::sleep(Duration::from_millis(DEBOUNCE_MS * 3)).await;
    }

    #[tokio::test]
    async fn test_toggle_is_its_own_inverse() {
        let (doc, store, controller, price) = setup();

        let first = controller.toggle().await.unwrap();
        assert_eq!(first, ToggleOutcome { hidden: true, count: 1 });
        assert_eq!(doc.display(price).as_deref(), Some("none"));
        assert!(price_divs_hidden(&store).unwrap());

        let second = controller.toggle().await.unwrap();
        assert!(!second.hidden);
        assert_eq!(doc.display(price).as_deref(), Some("flex"));
        assert!(!price_divs_hidden(&store).unwrap());

        let status = controller.status().await.unwrap();
        assert_eq!(status.remembered, 0);
        assert!(!status.observer_armed);
    }

    #[tokio::test]
    async fn test_toggle_without_matches_succeeds() {
        let doc = Document::new();
        doc.append(None, ElementSpec::new("p"));
        let controller =
            VisibilityController::new(Arc::new(doc), Arc::new(MemoryStore::new()), &config(), "Alt+H")
                .unwrap();
        assert_eq!(
            controller.set_hidden(true).await.unwrap(),
            ToggleOutcome { hidden: true, count: 0 }
        );
    }

    #[tokio::test]
    async fn test_quick_hold_never_flashes() {
        let (doc, _store, controller, price) = setup();
        controller.set_hidden(true).await.unwrap();

        assert!(controller.hold_begin().await.unwrap());
        assert!(!controller.hold_end().await);
        past_debounce().await;

        assert_eq!(doc.display(price).as_deref(), Some("none"));
        let status = controller.status().await.unwrap();
        assert!(!status.temporarily_shown);
        assert!(!status.hold_active);
    }

    #[tokio::test]
    async fn test_long_hold_reveals_then_restores_hidden() {
        let (doc, store, controller, price) = setup();
        controller.set_hidden(true).await.unwrap();

        controller.hold_begin().await.unwrap();
        past_debounce().await;
        assert_eq!(doc.display(price).as_deref(), Some("flex"));
        assert!(controller.status().await.unwrap().temporarily_shown);
        assert!(price_divs_hidden(&store).unwrap());

        let late = doc.append(None, ElementSpec::new("h2").text("Totaal € 99"));
        assert_eq!(controller.on_inserted(&[late]).await, 0);
        assert_eq!(doc.display(late).as_deref(), Some(""));

        assert!(controller.hold_end().await);
        assert_eq!(doc.display(price).as_deref(), Some("none"));
        assert_eq!(doc.display(late).as_deref(), Some("none"));
        assert!(price_divs_hidden(&store).unwrap());

        controller.set_hidden(false).await.unwrap();
        assert_eq!(doc.display(late).as_deref(), Some(""));
        assert_eq!(doc.display(price).as_deref(), Some("flex"));
    }

    #[tokio::test]
    async fn test_hold_ignored_when_shown() {
        let (doc, _store, controller, price) = setup();
        assert!(!controller.hold_begin().await.unwrap());
        past_debounce().await;
        assert_eq!(doc.display(price).as_deref(), Some("flex"));
        assert!(!controller.status().await.unwrap().hold_active);
    }

    #[tokio::test]
    async fn test_toggle_during_debounce_wins() {
        let (doc, store, controller, price) = setup();
        controller.set_hidden(true).await.unwrap();

        controller.hold_begin().await.unwrap();
        controller.toggle().await.unwrap();
        past_debounce().await;

        assert!(!price_divs_hidden(&store).unwrap());
        assert_eq!(doc.display(price).as_deref(), Some("flex"));
        assert!(!controller.status().await.unwrap().temporarily_shown);
    }

    #[tokio::test]
    async fn test_focus_loss_ends_hold() {
        let (doc, _store, controller, price) = setup();
        controller.set_hidden(true).await.unwrap();

        let keys = Modifiers {
            alt: true,
            shift: true,
            ..Modifiers::default()
        };
        let signal = controller.handle_key(&KeyEvent::down("H", keys)).await.unwrap();
        assert_eq!(signal, Some(HoldSignal::Begin));
        past_debounce().await;
        assert_eq!(doc.display(price).as_deref(), Some("flex"));

        assert!(controller.focus_lost().await);
        assert_eq!(doc.display(price).as_deref(), Some("none"));

        // The gesture was reset too, so a fresh press starts a new hold.
        let again = controller.handle_key(&KeyEvent::down("H", keys)).await.unwrap();
        assert_eq!(again, Some(HoldSignal::Begin));
        let up = controller.handle_key(&KeyEvent::up("Shift", keys)).await.unwrap();
        assert_eq!(up, Some(HoldSignal::End));
    }

    #[tokio::test]
    async fn test_failed_hold_begin_resets_gesture() {
        let (_doc, store, controller, _price) = setup();
        store
            .set_value(PRICE_DIVS_HIDDEN_KEY, serde_json::json!("garbled"))
            .unwrap();

        let keys = Modifiers {
            alt: true,
            shift: true,
            ..Modifiers::default()
        };
        assert!(controller.handle_key(&KeyEvent::down("H", keys)).await.is_err());
        {
            let state = controller.state.lock().await;
            assert!(!state.gesture.is_held());
            assert!(!state.hold.held);
        }

        // Once the store reads again, the next press starts a hold.
        set_price_divs_hidden(&store, true).unwrap();
        let signal = controller.handle_key(&KeyEvent::down("H", keys)).await.unwrap();
        assert_eq!(signal, Some(HoldSignal::Begin));
    }

    #[tokio::test]
    async fn test_observer_hides_inserted_prices() {
        let (doc, _store, controller, _price) = setup();
        let before = doc.append(None, ElementSpec::new("span").class("product-price"));
        assert_eq!(controller.on_inserted(&[before]).await, 0);

        controller.set_hidden(true).await.unwrap();
        let after = doc.append(None, ElementSpec::new("span").class("product-price"));
        assert_eq!(controller.on_inserted(&[after]).await, 1);
        assert_eq!(doc.display(after).as_deref(), Some("none"));
    }

    #[tokio::test]
    async fn test_page_load_applies_persisted_state() {
        let (doc, store, controller, price) = setup();
        assert_eq!(controller.page_loaded().await.unwrap(), None);
        assert_eq!(doc.display(price).as_deref(), Some("flex"));

        set_price_divs_hidden(&store, true).unwrap();
        assert_eq!(controller.page_loaded().await.unwrap(), Some(1));
        assert_eq!(doc.display(price).as_deref(), Some("none"));
        assert!(controller.status().await.unwrap().observer_armed);
    }

    #[tokio::test]
    async fn test_unload_tears_down_page_state() {
        let (doc, store, controller, price) = setup();
        controller.set_hidden(true).await.unwrap();
        controller.hold_begin().await.unwrap();
        controller.unload().await;
        past_debounce().await;

        let status = controller.status().await.unwrap();
        assert!(status.hidden);
        assert!(!status.hold_active);
        assert!(!status.observer_armed);
        assert_eq!(status.remembered, 0);
        assert_eq!(doc.display(price).as_deref(), Some("none"));
        assert!(price_divs_hidden(&store).unwrap());
    }

    #[tokio::test]
    async fn test_invalid_hold_combo_rejected() {
        let result = VisibilityController::new(
            Arc::new(Document::new()),
            Arc::new(MemoryStore::new()),
            &config(),
            "Alt+Shift",
        );
        assert!(result.is_err());
    }
}
