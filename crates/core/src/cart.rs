//! Session-scoped shopping cart.
//!
//! The cart tracks menu items a customer has picked before checkout. It is
//! stored in the visitor's session, so it lives exactly as long as the
//! session does. The admin manual-order composer uses the same container with
//! the unit prices recorded on an existing order.
//!
//! # Invariants
//!
//! - at most one line per [`ItemId`]
//! - every line has `quantity >= 1`
//!
//! ```
//! use aromista_core::{Cart, ItemId, Money, cart::ItemSnapshot};
//!
//! let latte = ItemSnapshot {
//!     item_id: ItemId::new("latte"),
//!     name: "Latte".to_string(),
//!     price: Money::from_rupees(850),
//!     image_url: None,
//! };
//!
//! let mut cart = Cart::default();
//! cart.add_item(&latte);
//! cart.add_item(&latte);
//!
//! assert_eq!(cart.lines().len(), 1);
//! assert_eq!(cart.item_count(), 2);
//! assert_eq!(cart.total_amount(), Money::from_rupees(1_700));
//! ```

use serde::{Deserialize, Serialize};

use crate::types::{ItemId, Money};

/// The data captured from a menu item when it is put in the cart.
///
/// Name, price and image are frozen at that moment; the API reprices the
/// order when it is placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub item_id: ItemId,
    pub name: String,
    pub price: Money,
    pub image_url: Option<String>,
}

/// One line of the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub item_id: ItemId,
    pub name: String,
    pub price: Money,
    pub image_url: Option<String>,
    pub quantity: u32,
}

impl CartLine {
    /// `price × quantity` for this line.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.price * self.quantity
    }
}

/// `{ item, quantity }` as posted to `/orders/create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub item: ItemId,
    pub quantity: u32,
}

/// `{ item, quantity, unitPrice }` as posted by the admin order composer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedOrderLine {
    pub item: ItemId,
    pub quantity: u32,
    pub unit_price: Money,
}

/// Ordered collection of cart lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Add one unit of `item`.
    ///
    /// If the item is already in the cart its quantity goes up by one,
    /// otherwise a new line with quantity 1 is appended. Returns the line's
    /// quantity after the change.
    pub fn add_item(&mut self, item: &ItemSnapshot) -> u32 {
        if let Some(line) = self.line_mut(&item.item_id) {
            line.quantity = line.quantity.saturating_add(1);
            return line.quantity;
        }

        self.lines.push(CartLine {
            item_id: item.item_id.clone(),
            name: item.name.clone(),
            price: item.price,
            image_url: item.image_url.clone(),
            quantity: 1,
        });
        1
    }

    /// Add `delta` to the quantity of the line for `id`.
    ///
    /// A change that would bring the quantity to zero or below leaves the
    /// line as it is; removal is an explicit [`Cart::remove_item`]. Returns the
    /// line's quantity afterwards, or `None` when no line matches.
    pub fn update_quantity(&mut self, id: &ItemId, delta: i32) -> Option<u32> {
        let line = self.line_mut(id)?;
        let next = i64::from(line.quantity) + i64::from(delta);
        if next > 0 {
            line.quantity = u32::try_from(next).unwrap_or(u32::MAX);
        }
        Some(line.quantity)
    }

    /// Remove the line for `id`. Returns whether a line was removed.
    pub fn remove_item(&mut self, id: &ItemId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| &line.item_id != id);
        self.lines.len() != before
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of `price × quantity` over every line.
    #[must_use]
    pub fn total_amount(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Total number of units (the cart badge).
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0_u32, |acc, line| acc.saturating_add(line.quantity))
    }

    /// Lines in the shape `/orders/create` expects.
    #[must_use]
    pub fn order_lines(&self) -> Vec<OrderLine> {
        self.lines
            .iter()
            .map(|line| OrderLine {
                item: line.item_id.clone(),
                quantity: line.quantity,
            })
            .collect()
    }

    /// Lines with unit prices, for orders placed by staff.
    #[must_use]
    pub fn priced_order_lines(&self) -> Vec<PricedOrderLine> {
        self.lines
            .iter()
            .map(|line| PricedOrderLine {
                item: line.item_id.clone(),
                quantity: line.quantity,
                unit_price: line.price,
            })
            .collect()
    }

    fn line_mut(&mut self, id: &ItemId) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|line| &line.item_id == id)
    }
}

/// Builds a cart from existing lines (e.g. an order being edited).
///
/// Lines for the same item are merged and zero-quantity lines are dropped,
/// so the result upholds the cart invariants whatever the input.
impl FromIterator<CartLine> for Cart {
    fn from_iter<I: IntoIterator<Item = CartLine>>(iter: I) -> Self {
        let mut cart = Self::default();
        for line in iter.into_iter().filter(|line| line.quantity > 0) {
            match cart.line_mut(&line.item_id) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(line.quantity);
                }
                None => cart.lines.push(line),
            }
        }
        cart
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn snapshot(id: &str, rupees: i64) -> ItemSnapshot {
        ItemSnapshot {
            item_id: ItemId::new(id),
            name: format!("Item {id}"),
            price: Money::from_rupees(rupees),
            image_url: Some(format!("https://cdn.aromista.lk/{id}.jpg")),
        }
    }

    #[test]
    fn test_adding_same_item_twice_merges_lines() {
        let mut cart = Cart::default();
        assert_eq!(cart.add_item(&snapshot("espresso", 600)), 1);
        assert_eq!(cart.add_item(&snapshot("espresso", 600)), 2);

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 2);
    }

    #[test]
    fn test_lines_keep_insertion_order() {
        let mut cart = Cart::default();
        cart.add_item(&snapshot("b", 100));
        cart.add_item(&snapshot("a", 100));
        cart.add_item(&snapshot("b", 100));

        let ids: Vec<_> = cart.lines().iter().map(|l| l.item_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_total_amount_tracks_every_mutation() {
        let mut cart = Cart::default();
        let latte = snapshot("latte", 850);
        let muffin = ItemSnapshot {
            price: Money::parse("325.50").unwrap(),
            ..snapshot("muffin", 0)
        };

        cart.add_item(&latte);
        cart.add_item(&muffin);
        cart.add_item(&muffin);
        assert_eq!(cart.total_amount(), Money::parse("1501.00").unwrap());

        cart.update_quantity(&ItemId::new("latte"), 2);
        assert_eq!(cart.total_amount(), Money::parse("3201.00").unwrap());

        cart.remove_item(&ItemId::new("muffin"));
        assert_eq!(cart.total_amount(), Money::from_rupees(2_550));

        let expected: Money = cart.lines().iter().map(|l| l.price * l.quantity).sum();
        assert_eq!(cart.total_amount(), expected);
    }

    #[test]
    fn test_update_quantity_never_drops_below_one() {
        let mut cart = Cart::default();
        cart.add_item(&snapshot("mocha", 900));
        cart.add_item(&snapshot("mocha", 900));

        assert_eq!(cart.update_quantity(&ItemId::new("mocha"), -1), Some(1));
        assert_eq!(cart.update_quantity(&ItemId::new("mocha"), -1), Some(1));
        assert_eq!(cart.update_quantity(&ItemId::new("mocha"), -5), Some(1));
        assert_eq!(cart.lines().len(), 1);
    }

    #[test]
    fn test_unknown_ids_are_noops() {
        let mut cart = Cart::default();
        cart.add_item(&snapshot("tea", 400));
        let before = cart.clone();

        assert_eq!(cart.update_quantity(&ItemId::new("missing"), 1), None);
        assert!(!cart.remove_item(&ItemId::new("missing")));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_clear_and_counts() {
        let mut cart = Cart::default();
        cart.add_item(&snapshot("a", 100));
        cart.add_item(&snapshot("b", 100));
        cart.update_quantity(&ItemId::new("b"), 3);
        assert_eq!(cart.item_count(), 5);

        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.item_count(), 0);
        assert_eq!(cart.total_amount(), Money::ZERO);
    }

    #[test]
    fn test_order_lines_serialize_for_api() {
        let mut cart = Cart::default();
        cart.add_item(&snapshot("latte", 850));
        cart.add_item(&snapshot("latte", 850));

        let json = serde_json::to_value(cart.order_lines()).unwrap();
        assert_eq!(json, serde_json::json!([{ "item": "latte", "quantity": 2 }]));

        let priced = serde_json::to_value(cart.priced_order_lines()).unwrap();
        assert_eq!(
            priced,
            serde_json::json!([{ "item": "latte", "quantity": 2, "unitPrice": 850.0 }])
        );
    }

    #[test]
    fn test_from_iter_restores_invariants() {
        let line = |id: &str, quantity| CartLine {
            item_id: ItemId::new(id),
            name: id.to_string(),
            price: Money::from_rupees(100),
            image_url: None,
            quantity,
        };

        let cart: Cart = vec![line("a", 1), line("b", 0), line("a", 2)]
            .into_iter()
            .collect();

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 3);
    }
}
