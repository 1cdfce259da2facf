use std::sync::Arc;

use tracing::debug;

use crate::matcher::PriceMatcher;
use crate::page::{ElementId, Page};
use crate::styles::OriginalStyles;

pub const HIDDEN_DISPLAY: &str = "none";

/// Applies hide/show to the price elements of one page and owns the
/// per-element style memory. Knows nothing about persistence or timing.
pub struct VisibilityEngine {
    page: Arc<dyn Page>,
    matcher: PriceMatcher,
    styles: OriginalStyles,
    observer_armed: bool,
}

impl VisibilityEngine {
    pub fn new(page: Arc<dyn Page>, matcher: PriceMatcher) -> Self {
        Self {
            page,
            matcher,
            styles: OriginalStyles::new(),
            observer_armed: false,
        }
    }

    pub fn page(&self) -> &Arc<dyn Page> {
        &self.page
    }

    pub fn matched(&self) -> Vec<ElementId> {
        self.page
            .elements()
            .into_iter()
            .filter(|e| self.matcher.matches(e))
            .map(|e| e.id)
            .collect()
    }

    fn hide_element(&mut self, id: ElementId) {
        if let Some(current) = self.page.display(id) {
            self.styles.remember(id, current);
            self.page.set_display(id, HIDDEN_DISPLAY);
        }
    }

    /// Hide every matching element and arm the insertion observer.
    pub fn hide(&mut self) -> usize {
        let matched = self.matched();
        for id in &matched {
            self.hide_element(*id);
        }
        self.observer_armed = true;
        debug!(count = matched.len(), "Price elements hidden");
        matched.len()
    }

    /// Restore and forget every remembered style, then disarm the observer.
    pub fn show(&mut self) -> usize {
        let count = self.matched().len();
        for (id, original) in self.styles.take_all() {
            self.page.set_display(id, &original);
        }
        self.observer_armed = false;
        debug!(count, "Price elements shown");
        count
    }

    /// Restore remembered styles but keep them for the re-hide that follows.
    pub fn reveal(&mut self) -> usize {
        let mut restored = 0;
        for (id, original) in self.styles.iter() {
            if self.page.set_display(id, original) {
                restored += 1;
            }
        }
        debug!(restored, "Price elements revealed temporarily");
        restored
    }

    /// Hide matching elements inside freshly inserted subtrees. Does nothing
    /// while the observer is disarmed.
    pub fn on_inserted(&mut self, roots: &[ElementId]) -> usize {
        if !self.observer_armed {
            return 0;
        }
        let mut hidden = 0;
        for root in roots {
            let ids: Vec<ElementId> = self
                .page
                .subtree(*root)
                .into_iter()
                .filter(|e| self.matcher.matches(e))
                .map(|e| e.id)
                .collect();
            for id in ids {
                self.hide_element(id);
                hidden += 1;
            }
        }
        if hidden > 0 {
            debug!(hidden, "Hid inserted price elements");
        }
        hidden
    }

    pub fn observer_armed(&self) -> bool {
        self.observer_armed
    }

    pub fn remembered(&self) -> usize {
        self.styles.len()
    }

    /// Page teardown: disconnect the observer and drop the style memory
    /// without touching the page.
    pub fn reset(&mut self) {
        self.observer_armed = false;
        self.styles.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{Document, ElementSpec};
    use cartkeep_core::config::VisibilityConfig;

    fn engine(doc: &Document) -> VisibilityEngine {
        let matcher = PriceMatcher::from_config(&VisibilityConfig::default()).unwrap();
        VisibilityEngine::new(Arc::new(doc.clone()), matcher)
    }

    #[test]
    fn test_hide_then_show_restores_exact_styles() {
        let doc = Document::new();
        let a = doc.append(None, ElementSpec::new("div").class("price").display("flex"));
        let b = doc.append(None, ElementSpec::new("span").attr("data-price", "1"));
        let other = doc.append(None, ElementSpec::new("p").display("block"));
        let mut engine = engine(&doc);

        assert_eq!(engine.hide(), 2);
        assert_eq!(doc.display(a).as_deref(), Some("none"));
        assert_eq!(doc.display(b).as_deref(), Some("none"));
        assert_eq!(doc.display(other).as_deref(), Some("block"));
        assert!(engine.observer_armed());

        assert_eq!(engine.show(), 2);
        assert_eq!(doc.display(a).as_deref(), Some("flex"));
        assert_eq!(doc.display(b).as_deref(), Some(""));
        assert_eq!(engine.remembered(), 0);
        assert!(!engine.observer_armed());
    }

    #[test]
    fn test_repeated_hide_keeps_original() {
        let doc = Document::new();
        let a = doc.append(None, ElementSpec::new("div").class("price").display("grid"));
        let mut engine = engine(&doc);

        engine.hide();
        engine.hide();
        engine.show();
        assert_eq!(doc.display(a).as_deref(), Some("grid"));
    }

    #[test]
    fn test_reveal_keeps_memory() {
        let doc = Document::new();
        let a = doc.append(None, ElementSpec::new("div").class("price").display("inline"));
        let mut engine = engine(&doc);

        engine.hide();
        assert_eq!(engine.reveal(), 1);
        assert_eq!(doc.display(a).as_deref(), Some("inline"));
        assert_eq!(engine.remembered(), 1);

        engine.hide();
        assert_eq!(doc.display(a).as_deref(), Some("none"));
        engine.show();
        assert_eq!(doc.display(a).as_deref(), Some("inline"));
    }

    #[test]
    fn test_observer_hides_only_when_armed() {
        let doc = Document::new();
        let mut engine = engine(&doc);

        let early = doc.append(None, ElementSpec::new("div").class("price"));
        assert_eq!(engine.on_inserted(&[early]), 0);
        assert_eq!(doc.display(early).as_deref(), Some(""));

        engine.hide();
        let wrapper = doc.append(None, ElementSpec::new("section"));
        let nested = doc.append(Some(wrapper), ElementSpec::new("h2").text("Totaal: € 30"));
        assert_eq!(engine.on_inserted(&[wrapper]), 1);
        assert_eq!(doc.display(nested).as_deref(), Some("none"));
        assert_eq!(doc.display(wrapper).as_deref(), Some(""));
    }

    #[test]
    fn test_removed_elements_are_skipped() {
        let doc = Document::new();
        let a = doc.append(None, ElementSpec::new("div").class("price"));
        let mut engine = engine(&doc);
        engine.hide();
        doc.remove(a);
        assert_eq!(engine.reveal(), 0);
        assert_eq!(engine.show(), 0);
        assert_eq!(engine.remembered(), 0);
    }
}
