use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// One product/quantity pair as the cart API and saved carts spell it:
/// `{"productId": "...", "quantity": n}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: String,
    pub quantity: u32,
}

impl CartLine {
    pub fn new(product_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.product_id.trim().is_empty() {
            return Err(Error::Validation("product id must not be empty".to_string()));
        }
        if self.quantity == 0 {
            return Err(Error::Validation(format!(
                "quantity for product {} must be greater than zero",
                self.product_id
            )));
        }
        Ok(())
    }
}

/// Point-in-time, ordered list of cart lines.
///
/// Lines keep the order the server (or the user) gave them. Lines with equal
/// product ids are never merged; the server stays the authority on that.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartSnapshot(Vec<CartLine>);

impl CartSnapshot {
    pub fn new(lines: Vec<CartLine>) -> Self {
        Self(lines)
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CartLine> {
        self.0.iter()
    }

    pub fn product_ids(&self) -> Vec<String> {
        self.0.iter().map(|l| l.product_id.clone()).collect()
    }

    /// Every line must be valid; an empty snapshot is accepted here and
    /// rejected by the callers for which "nothing" is meaningless.
    pub fn validate(&self) -> Result<()> {
        self.0.iter().try_for_each(CartLine::validate)
    }
}

impl FromIterator<CartLine> for CartSnapshot {
    fn from_iter<I: IntoIterator<Item = CartLine>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a CartSnapshot {
    type Item = &'a CartLine;
    type IntoIter = std::slice::Iter<'a, CartLine>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A line as returned by `GET /cart`. Anything beyond id and quantity (name,
/// price, image...) is kept opaque so it can be echoed back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCartLine {
    pub product_id: String,
    #[serde(default)]
    pub quantity: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of `GET /cart`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartContents {
    #[serde(default)]
    pub products: Vec<RemoteCartLine>,
    #[serde(default)]
    pub count: u32,
}

impl CartContents {
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Lines the server listed without a quantity are left out.
    pub fn to_snapshot(&self) -> CartSnapshot {
        self.products
            .iter()
            .filter(|p| p.quantity > 0)
            .map(|p| CartLine::new(p.product_id.clone(), p.quantity))
            .collect()
    }
}

/// A named cart snapshot owned by persistent storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedCart {
    pub name: String,
    pub products: CartSnapshot,
    pub saved_at: DateTime<Utc>,
}

impl SavedCart {
    pub fn new(name: impl Into<String>, products: CartSnapshot) -> Self {
        Self {
            name: name.into(),
            products,
            saved_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cart_contents_keeps_extra_fields() {
        let raw = json!({
            "products": [
                {"productId": "A", "quantity": 2, "name": "Widget", "price": 9.95},
                {"productId": "B", "quantity": 1}
            ],
            "count": 3
        });
        let contents: CartContents = serde_json::from_value(raw).unwrap();
        assert_eq!(contents.count, 3);
        assert_eq!(contents.products[0].extra.get("name"), Some(&json!("Widget")));

        let snapshot = contents.to_snapshot();
        assert_eq!(
            snapshot.lines(),
            &[CartLine::new("A", 2), CartLine::new("B", 1)]
        );
    }

    #[test]
    fn test_snapshot_skips_lines_without_quantity() {
        let raw = json!({
            "products": [
                {"productId": "A", "name": "Widget"},
                {"productId": "B", "quantity": 1}
            ]
        });
        let contents: CartContents = serde_json::from_value(raw).unwrap();
        assert_eq!(contents.products[0].quantity, 0);
        assert_eq!(contents.to_snapshot().lines(), &[CartLine::new("B", 1)]);
    }

    #[test]
    fn test_cart_contents_missing_fields_default() {
        let contents: CartContents = serde_json::from_value(json!({})).unwrap();
        assert!(contents.is_empty());
        assert_eq!(contents.count, 0);
    }

    #[test]
    fn test_snapshot_validation() {
        let ok: CartSnapshot = vec![CartLine::new("A", 1)].into_iter().collect();
        assert!(ok.validate().is_ok());

        let zero = CartSnapshot::new(vec![CartLine::new("A", 0)]);
        assert!(matches!(zero.validate(), Err(Error::Validation(_))));

        let blank = CartSnapshot::new(vec![CartLine::new("  ", 1)]);
        assert!(matches!(blank.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_saved_cart_wire_shape() {
        let cart = SavedCart::new("weekly", CartSnapshot::new(vec![CartLine::new("A", 2)]));
        let value = serde_json::to_value(&cart).unwrap();
        assert_eq!(value["name"], "weekly");
        assert_eq!(value["products"], json!([{"productId": "A", "quantity": 2}]));
        assert!(value["savedAt"].is_string());
    }
}
