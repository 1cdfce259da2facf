//! The slice of a page the visibility engine needs: element identity, a few
//! matchable properties, and the inline `display` value.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(pub u64);

/// Matchable view of one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementInfo {
    pub id: ElementId,
    pub tag: String,
    pub classes: Vec<String>,
    pub attributes: BTreeMap<String, String>,
    /// Text of the element and all of its descendants.
    pub text: String,
}

impl ElementInfo {
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn is_heading(&self) -> bool {
        matches!(self.tag.as_str(), "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
    }
}

/// A live document. Implementations are shared with whatever mutates the
/// page, so every method takes `&self`.
pub trait Page: Send + Sync {
    /// All elements in document order.
    fn elements(&self) -> Vec<ElementInfo>;
    /// `root` followed by its descendants; empty if `root` is gone.
    fn subtree(&self, root: ElementId) -> Vec<ElementInfo>;
    /// Inline display value; `None` once the element has left the page.
    fn display(&self, id: ElementId) -> Option<String>;
    /// Returns `false` if the element has left the page.
    fn set_display(&self, id: ElementId, value: &str) -> bool;
}

/// Builder for elements inserted into a [`Document`].
#[derive(Debug, Clone, Default)]
pub struct ElementSpec {
    tag: String,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    text: String,
    display: String,
}

impl ElementSpec {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Self::default()
        }
    }

    pub fn class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn display(mut self, display: &str) -> Self {
        self.display = display.to_string();
        self
    }
}

#[derive(Debug)]
struct Node {
    spec: ElementSpec,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

#[derive(Debug, Default)]
struct Tree {
    nodes: BTreeMap<ElementId, Node>,
    roots: Vec<ElementId>,
    next_id: u64,
}

impl Tree {
    fn walk(&self, id: ElementId, out: &mut Vec<ElementId>) {
        if let Some(node) = self.nodes.get(&id) {
            out.push(id);
            for child in &node.children {
                self.walk(*child, out);
            }
        }
    }

    fn text_content(&self, id: ElementId) -> String {
        let mut ids = Vec::new();
        self.walk(id, &mut ids);
        ids.iter()
            .filter_map(|i| self.nodes.get(i))
            .map(|n| n.spec.text.as_str())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn info(&self, id: ElementId) -> Option<ElementInfo> {
        let node = self.nodes.get(&id)?;
        Some(ElementInfo {
            id,
            tag: node.spec.tag.clone(),
            classes: node.spec.classes.clone(),
            attributes: node.spec.attributes.clone(),
            text: self.text_content(id),
        })
    }
}

/// In-memory element tree implementing [`Page`]. Clones share the same tree.
#[derive(Debug, Clone, Default)]
pub struct Document {
    tree: Arc<Mutex<Tree>>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    fn tree(&self) -> MutexGuard<'_, Tree> {
        self.tree.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Insert an element as the last child of `parent` (or as a new root).
    pub fn append(&self, parent: Option<ElementId>, spec: ElementSpec) -> ElementId {
        let mut tree = self.tree();
        let id = ElementId(tree.next_id);
        tree.next_id += 1;

        let parent = parent.filter(|p| tree.nodes.contains_key(p));
        match parent {
            Some(p) => {
                if let Some(node) = tree.nodes.get_mut(&p) {
                    node.children.push(id);
                }
            }
            None => tree.roots.push(id),
        }
        tree.nodes.insert(
            id,
            Node {
                spec,
                parent,
                children: Vec::new(),
            },
        );
        id
    }

    /// Detach an element and its subtree.
    pub fn remove(&self, id: ElementId) {
        let mut tree = self.tree();
        let mut doomed = Vec::new();
        tree.walk(id, &mut doomed);
        let parent = tree.nodes.get(&id).and_then(|n| n.parent);
        match parent {
            Some(p) => {
                if let Some(node) = tree.nodes.get_mut(&p) {
                    node.children.retain(|c| *c != id);
                }
            }
            None => tree.roots.retain(|r| *r != id),
        }
        for d in doomed {
            tree.nodes.remove(&d);
        }
    }

    /// Whether the element and all of its ancestors are displayed.
    pub fn is_rendered(&self, id: ElementId) -> bool {
        let tree = self.tree();
        let mut current = Some(id);
        while let Some(cur) = current {
            match tree.nodes.get(&cur) {
                Some(node) if node.spec.display != "none" => current = node.parent,
                _ => return false,
            }
        }
        true
    }

    pub fn len(&self) -> usize {
        self.tree().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Page for Document {
    fn elements(&self) -> Vec<ElementInfo> {
        let tree = self.tree();
        let mut ids = Vec::new();
        for root in &tree.roots {
            tree.walk(*root, &mut ids);
        }
        ids.into_iter().filter_map(|id| tree.info(id)).collect()
    }

    fn subtree(&self, root: ElementId) -> Vec<ElementInfo> {
        let tree = self.tree();
        let mut ids = Vec::new();
        tree.walk(root, &mut ids);
        ids.into_iter().filter_map(|id| tree.info(id)).collect()
    }

    fn display(&self, id: ElementId) -> Option<String> {
        self.tree().nodes.get(&id).map(|n| n.spec.display.clone())
    }

    fn set_display(&self, id: ElementId, value: &str) -> bool {
        match self.tree().nodes.get_mut(&id) {
            Some(node) => {
                node.spec.display = value.to_string();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_order_and_text_content() {
        let doc = Document::new();
        let body = doc.append(None, ElementSpec::new("BODY"));
        let h2 = doc.append(Some(body), ElementSpec::new("h2").text("Totaal"));
        doc.append(Some(h2), ElementSpec::new("span").text("€ 12,50"));
        doc.append(Some(body), ElementSpec::new("p").text("Omschrijving"));

        let tags: Vec<String> = doc.elements().into_iter().map(|e| e.tag).collect();
        assert_eq!(tags, vec!["body", "h2", "span", "p"]);

        let heading = doc.subtree(h2).into_iter().next().unwrap();
        assert!(heading.is_heading());
        assert_eq!(heading.text, "Totaal € 12,50");
    }

    #[test]
    fn test_display_and_rendering() {
        let doc = Document::new();
        let outer = doc.append(None, ElementSpec::new("div"));
        let inner = doc.append(Some(outer), ElementSpec::new("span").display("inline-block"));

        assert_eq!(doc.display(inner).as_deref(), Some("inline-block"));
        assert!(doc.is_rendered(inner));

        assert!(doc.set_display(outer, "none"));
        assert!(!doc.is_rendered(inner));
    }

    #[test]
    fn test_remove_detaches_subtree() {
        let doc = Document::new();
        let outer = doc.append(None, ElementSpec::new("div"));
        let inner = doc.append(Some(outer), ElementSpec::new("span"));
        doc.remove(outer);

        assert!(doc.is_empty());
        assert_eq!(doc.display(inner), None);
        assert!(!doc.set_display(inner, "none"));
        assert!(doc.subtree(outer).is_empty());
    }
}
