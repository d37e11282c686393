//! Cart state and its reducers.
//!
//! [`CartState`] is plain data. Every mutation is expressed as a
//! [`CartAction`] and applied by [`reduce`], a pure function from the old
//! state to the new one. The store in [`super::CartStore`] is the only place
//! that owns a state and pairs each reduction with a persist step.

use std::collections::HashSet;

use bloom_market_core::{LineItem, ProductId, order_total};
use rust_decimal::Decimal;

/// Ordered collection of line items, unique by product id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartState {
    items: Vec<LineItem>,
}

impl CartState {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a state from items, keeping the first occurrence of each id.
    ///
    /// Every item is normalized, so quantities are at least 1 and prices lie
    /// in `0..=MAX_PRICE` whatever the caller built.
    #[must_use]
    pub fn from_items(items: impl IntoIterator<Item = LineItem>) -> Self {
        let mut seen = HashSet::new();
        let items = items
            .into_iter()
            .filter(|item| seen.insert(item.id.clone()))
            .map(LineItem::normalized)
            .collect();
        Self { items }
    }

    /// All items in insertion order, including any that are not well formed.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Items that are well formed (non-blank id and name).
    pub fn safe_items(&self) -> impl Iterator<Item = &LineItem> {
        self.items.iter().filter(|item| item.is_well_formed())
    }

    /// Look up an item by id.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&LineItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Sum of `price × quantity` over safe items, saturating at [`Decimal::MAX`].
    #[must_use]
    pub fn total(&self) -> Decimal {
        order_total(self.safe_items())
    }

    /// Sum of quantities over safe items.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.safe_items().map(|item| u64::from(item.quantity)).sum()
    }

    /// Whether the cart has no items at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Merge a rehydrated state into this one.
    ///
    /// Persisted items replace the in-memory items wholesale; the persisted
    /// state has already been through sanitization.
    #[must_use]
    pub fn merge_persisted(self, persisted: Self) -> Self {
        persisted
    }
}

/// A cart mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAction {
    /// Add one unit of the item, appending it if its id is new.
    Add(LineItem),
    /// Remove the item with this id.
    Remove(ProductId),
    /// Adjust the quantity of an item by a signed delta, floored at 1.
    UpdateQuantity { id: ProductId, delta: i64 },
    /// Remove every item.
    Clear,
}

/// Apply an action to a state.
///
/// Never fails: unknown ids make `Remove` and `UpdateQuantity` no-ops.
#[must_use]
pub fn reduce(mut state: CartState, action: CartAction) -> CartState {
    match action {
        CartAction::Add(item) => {
            if let Some(existing) = state.items.iter_mut().find(|i| i.id == item.id) {
                existing.quantity = existing.quantity.saturating_add(1);
            } else {
                state.items.push(item.normalized().with_quantity(1));
            }
        }
        CartAction::Remove(id) => {
            state.items.retain(|item| item.id != id);
        }
        CartAction::UpdateQuantity { id, delta } => {
            if let Some(existing) = state.items.iter_mut().find(|i| i.id == id) {
                existing.quantity = apply_delta(existing.quantity, delta);
            }
        }
        CartAction::Clear => state.items.clear(),
    }
    state
}

/// `quantity + delta`, clamped to `1..=u32::MAX`.
fn apply_delta(quantity: u32, delta: i64) -> u32 {
    let next = i64::from(quantity).saturating_add(delta);
    u32::try_from(next.max(1)).unwrap_or(u32::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bloom_market_core::MAX_PRICE;
    use proptest::prelude::*;

    use super::*;

    fn rose() -> LineItem {
        LineItem::new("rose", "Red Rose", Decimal::from(50_000), "rose.jpg")
    }

    fn tulip() -> LineItem {
        LineItem::new("tulip", "Tulip", Decimal::from(30_000), "tulip.jpg")
    }

    #[test]
    fn test_add_appends_new_item_with_quantity_one() {
        let state = reduce(CartState::new(), CartAction::Add(rose().with_quantity(7)));
        assert_eq!(state.items().len(), 1);
        assert_eq!(state.items()[0].quantity, 1);
    }

    #[test]
    fn test_add_existing_increments() {
        let state = reduce(CartState::new(), CartAction::Add(rose()));
        let state = reduce(state, CartAction::Add(tulip()));
        let state = reduce(state, CartAction::Add(rose()));

        assert_eq!(state.items().len(), 2);
        assert_eq!(state.get(&"rose".into()).unwrap().quantity, 2);
        assert_eq!(state.items()[1].id.as_str(), "tulip");
    }

    #[test]
    fn test_remove_and_missing_remove() {
        let state = CartState::from_items([rose(), tulip()]);
        let state = reduce(state, CartAction::Remove("rose".into()));
        assert_eq!(state.items().len(), 1);

        let unchanged = reduce(state.clone(), CartAction::Remove("orchid".into()));
        assert_eq!(unchanged, state);
    }

    #[test]
    fn test_update_quantity_clamps_at_one() {
        let state = CartState::from_items([rose().with_quantity(3)]);
        let state = reduce(
            state,
            CartAction::UpdateQuantity {
                id: "rose".into(),
                delta: -10,
            },
        );
        assert_eq!(state.get(&"rose".into()).unwrap().quantity, 1);

        let state = reduce(
            state,
            CartAction::UpdateQuantity {
                id: "rose".into(),
                delta: 4,
            },
        );
        assert_eq!(state.get(&"rose".into()).unwrap().quantity, 5);
    }

    #[test]
    fn test_update_quantity_missing_id_is_noop() {
        let state = CartState::from_items([rose()]);
        let next = reduce(
            state.clone(),
            CartAction::UpdateQuantity {
                id: "orchid".into(),
                delta: 2,
            },
        );
        assert_eq!(next, state);
    }

    #[test]
    fn test_apply_delta_saturates() {
        assert_eq!(apply_delta(u32::MAX, i64::MAX), u32::MAX);
        assert_eq!(apply_delta(1, i64::MIN), 1);
    }

    #[test]
    fn test_clear_then_count_is_zero() {
        let state = CartState::from_items([rose(), tulip()]);
        let state = reduce(state, CartAction::Clear);
        assert_eq!(state.item_count(), 0);
        assert!(state.is_empty());
    }

    #[test]
    fn test_totals_skip_malformed_items() {
        let blank = LineItem::new("", "No id", Decimal::from(999), "").with_quantity(5);
        let state = CartState::from_items([rose().with_quantity(2), blank, tulip()]);

        assert_eq!(state.items().len(), 3);
        assert_eq!(state.safe_items().count(), 2);
        assert_eq!(state.total(), Decimal::from(130_000));
        assert_eq!(state.item_count(), 3);
    }

    #[test]
    fn test_from_items_dedupes_keeping_first() {
        let state = CartState::from_items([rose().with_quantity(2), rose().with_quantity(9)]);
        assert_eq!(state.items().len(), 1);
        assert_eq!(state.items()[0].quantity, 2);
    }

    #[test]
    fn test_from_items_normalizes_struct_literals() {
        let broken = LineItem {
            quantity: 0,
            price: Decimal::MAX,
            ..rose()
        };
        let state = CartState::from_items([broken.clone()]);
        assert_eq!(state.items()[0].quantity, 1);
        assert_eq!(state.items()[0].price, MAX_PRICE);

        let state = reduce(CartState::new(), CartAction::Add(broken));
        assert_eq!(state.items()[0].price, MAX_PRICE);
    }

    #[test]
    fn test_total_at_price_limit_does_not_overflow() {
        let state = CartState::from_items([
            LineItem::new("peony", "Peony", MAX_PRICE, "").with_quantity(u32::MAX),
            LineItem::new("orchid", "Orchid", MAX_PRICE, "").with_quantity(u32::MAX),
        ]);
        let expected = MAX_PRICE * Decimal::from(u32::MAX) * Decimal::TWO;
        assert_eq!(state.total(), expected);
        assert_eq!(state.item_count(), 2 * u64::from(u32::MAX));

        let state = reduce(
            state,
            CartAction::UpdateQuantity {
                id: "peony".into(),
                delta: i64::MAX,
            },
        );
        assert_eq!(state.get(&"peony".into()).unwrap().quantity, u32::MAX);
    }

    #[test]
    fn test_merge_persisted_replaces_items() {
        let current = CartState::from_items([rose()]);
        let persisted = CartState::from_items([tulip()]);
        let merged = current.merge_persisted(persisted.clone());
        assert_eq!(merged, persisted);
    }

    proptest! {
        #[test]
        fn prop_repeated_add_counts_calls(calls in 1usize..200) {
            let mut state = CartState::new();
            for _ in 0..calls {
                state = reduce(state, CartAction::Add(rose()));
            }
            prop_assert_eq!(state.items().len(), 1);
            prop_assert_eq!(state.item_count(), calls as u64);
        }

        #[test]
        fn prop_update_never_below_one(start in 1u32..1000, deltas in proptest::collection::vec(any::<i64>(), 1..20)) {
            let mut state = CartState::from_items([rose().with_quantity(start)]);
            for delta in deltas {
                state = reduce(state, CartAction::UpdateQuantity { id: "rose".into(), delta });
                let quantity = state.get(&"rose".into()).map_or(0, |i| i.quantity);
                prop_assert!(quantity >= 1);
            }
        }
    }
}
