use std::str::FromStr;

use cartkeep_core::config::VisibilityConfig;
use cartkeep_core::{Error, Result};
use regex::{Regex, RegexBuilder};

use crate::page::ElementInfo;

/// A compound selector: optional tag, then any mix of `.class`, `#id` and
/// `[attr]`. Combinators are not supported.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<String>,
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn take_ident(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut ident = String::new();
    while let Some(c) = chars.peek().copied() {
        if !is_ident_char(c) {
            break;
        }
        ident.push(c);
        chars.next();
    }
    ident
}

impl FromStr for Selector {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        let invalid = |why: &str| Error::Config(format!("Invalid selector '{}': {}", raw, why));
        let source = raw.trim();
        if source.is_empty() {
            return Err(invalid("empty"));
        }

        let mut selector = Selector::default();
        let mut chars = source.chars().peekable();

        if chars.peek() == Some(&'*') {
            chars.next();
        } else {
            let tag = take_ident(&mut chars);
            if !tag.is_empty() {
                selector.tag = Some(tag.to_ascii_lowercase());
            }
        }

        while let Some(c) = chars.next() {
            match c {
                '.' => {
                    let class = take_ident(&mut chars);
                    if class.is_empty() {
                        return Err(invalid("missing class name after '.'"));
                    }
                    selector.classes.push(class);
                }
                '#' => {
                    let id = take_ident(&mut chars);
                    if id.is_empty() {
                        return Err(invalid("missing id after '#'"));
                    }
                    selector.id = Some(id);
                }
                '[' => {
                    let attr = take_ident(&mut chars);
                    if attr.is_empty() || chars.next() != Some(']') {
                        return Err(invalid("expected '[name]'"));
                    }
                    selector.attributes.push(attr.to_ascii_lowercase());
                }
                other => return Err(invalid(&format!("unsupported character '{}'", other))),
            }
        }

        Ok(selector)
    }
}

impl Selector {
    pub fn matches(&self, element: &ElementInfo) -> bool {
        if let Some(tag) = &self.tag {
            if &element.tag != tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.attributes.get("id") != Some(id) {
                return false;
            }
        }
        self.classes.iter().all(|c| element.has_class(c))
            && self
                .attributes
                .iter()
                .all(|a| element.attributes.contains_key(a))
    }
}

/// Decides which elements carry price information.
#[derive(Debug, Clone)]
pub struct PriceMatcher {
    selectors: Vec<Selector>,
    heading_markers: Option<Regex>,
}

impl PriceMatcher {
    pub fn new(selectors: &[String], heading_markers: &[String]) -> Result<Self> {
        let selectors = selectors
            .iter()
            .map(|s| s.parse())
            .collect::<Result<Vec<Selector>>>()?;

        let markers: Vec<String> = heading_markers
            .iter()
            .map(|m| m.trim())
            .filter(|m| !m.is_empty())
            .map(regex::escape)
            .collect();
        let heading_markers = if markers.is_empty() {
            None
        } else {
            let pattern = markers.join("|");
            let re = RegexBuilder::new(&pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| Error::Config(format!("Invalid heading markers: {}", e)))?;
            Some(re)
        };

        Ok(Self {
            selectors,
            heading_markers,
        })
    }

    pub fn from_config(config: &VisibilityConfig) -> Result<Self> {
        Self::new(&config.selectors, &config.heading_markers)
    }

    pub fn matches(&self, element: &ElementInfo) -> bool {
        if self.selectors.iter().any(|s| s.matches(element)) {
            return true;
        }
        match &self.heading_markers {
            Some(re) => element.is_heading() && re.is_match(&element.text),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{Document, ElementSpec, Page};

    fn info(doc: &Document, spec: ElementSpec) -> ElementInfo {
        let id = doc.append(None, spec);
        doc.subtree(id).remove(0)
    }

    #[test]
    fn test_selector_parsing() {
        let s: Selector = "span.price.big#main[data-price]".parse().unwrap();
        assert_eq!(s.tag.as_deref(), Some("span"));
        assert_eq!(s.classes, vec!["price", "big"]);
        assert_eq!(s.id.as_deref(), Some("main"));
        assert_eq!(s.attributes, vec!["data-price"]);

        assert!("*.price".parse::<Selector>().unwrap().tag.is_none());
        assert!("".parse::<Selector>().is_err());
        assert!("div > .price".parse::<Selector>().is_err());
        assert!("[data-price".parse::<Selector>().is_err());
        assert!(".".parse::<Selector>().is_err());
    }

    #[test]
    fn test_selector_matching() {
        let doc = Document::new();
        let el = info(
            &doc,
            ElementSpec::new("div")
                .class("product-price")
                .class("large")
                .attr("id", "p1")
                .attr("data-price", "9.95"),
        );

        assert!(".product-price".parse::<Selector>().unwrap().matches(&el));
        assert!("div.large#p1".parse::<Selector>().unwrap().matches(&el));
        assert!("[data-price]".parse::<Selector>().unwrap().matches(&el));
        assert!(!"span.product-price".parse::<Selector>().unwrap().matches(&el));
        assert!(!".price".parse::<Selector>().unwrap().matches(&el));
        assert!(!"#p2".parse::<Selector>().unwrap().matches(&el));
    }

    #[test]
    fn test_default_matcher_heading_heuristic() {
        let matcher = PriceMatcher::from_config(&VisibilityConfig::default()).unwrap();
        let doc = Document::new();

        let priced = info(&doc, ElementSpec::new("h3").text("Prijs: € 24,95"));
        let total = info(&doc, ElementSpec::new("h2").text("TOTAAL incl. BTW"));
        let plain = info(&doc, ElementSpec::new("h2").text("Productinformatie"));
        let paragraph = info(&doc, ElementSpec::new("p").text("€ 5,00"));
        let cart_total = info(&doc, ElementSpec::new("div").class("cart-total"));

        assert!(matcher.matches(&priced));
        assert!(matcher.matches(&total));
        assert!(!matcher.matches(&plain));
        assert!(!matcher.matches(&paragraph));
        assert!(matcher.matches(&cart_total));
    }

    #[test]
    fn test_markers_are_literal() {
        let matcher = PriceMatcher::new(&[], &["excl. btw".to_string()]).unwrap();
        let doc = Document::new();
        let literal = info(&doc, ElementSpec::new("h4").text("€ 10 excl. btw"));
        let near_miss = info(&doc, ElementSpec::new("h4").text("exclXbtw"));
        assert!(matcher.matches(&literal));
        assert!(!matcher.matches(&near_miss));
    }

    #[test]
    fn test_invalid_selector_in_config() {
        let config = VisibilityConfig {
            selectors: vec![".ok".into(), "div ~ p".into()],
            ..VisibilityConfig::default()
        };
        assert!(matches!(PriceMatcher::from_config(&config), Err(Error::Config(_))));
    }
}
