//! Cart line items.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{MAX_PRICE, ProductId};

/// One product entry in the cart with its quantity.
///
/// ## Invariants
///
/// - `quantity` is at least 1
/// - `price` is within `0..=MAX_PRICE`
///
/// The fields are public, so a struct literal can break both. [`LineItem::new`],
/// [`LineItem::with_quantity`] and [`LineItem::normalized`] uphold them, and the
/// storefront cart state normalizes every item it takes in. Arithmetic on an
/// item that breaks them saturates instead of panicking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: ProductId,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub image: String,
    pub quantity: u32,
}

impl LineItem {
    /// Create a line item with quantity 1.
    ///
    /// The price is clamped to `0..=MAX_PRICE`.
    #[must_use]
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        price: Decimal,
        image: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price: price.clamp(Decimal::ZERO, MAX_PRICE),
            image: image.into(),
            quantity: 1,
        }
    }

    /// Return the item with the given quantity, floored at 1.
    #[must_use]
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity.max(1);
        self
    }

    /// Re-apply the quantity and price invariants.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.price = self.price.clamp(Decimal::ZERO, MAX_PRICE);
        self.quantity = self.quantity.max(1);
        self
    }

    /// Whether the item has the identifying fields the cart needs.
    ///
    /// An item is well formed when both its id and its name are non-blank.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        !self.id.is_blank() && !self.name.trim().is_empty()
    }

    /// `price × quantity`, saturating at [`Decimal::MAX`].
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price
            .checked_mul(Decimal::from(self.quantity))
            .unwrap_or(Decimal::MAX)
    }
}

/// Sum of line totals, saturating at [`Decimal::MAX`].
#[must_use]
pub fn order_total<'a>(items: impl IntoIterator<Item = &'a LineItem>) -> Decimal {
    items.into_iter().fold(Decimal::ZERO, |acc, item| {
        acc.checked_add(item.line_total()).unwrap_or(Decimal::MAX)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_starts_at_quantity_one() {
        let item = LineItem::new("rose", "Red Rose", Decimal::from(50_000), "rose.jpg");
        assert_eq!(item.quantity, 1);
        assert_eq!(item.line_total(), Decimal::from(50_000));
    }

    #[test]
    fn test_negative_price_is_clamped() {
        let item = LineItem::new("rose", "Red Rose", Decimal::from(-5), "");
        assert_eq!(item.price, Decimal::ZERO);
    }

    #[test]
    fn test_price_above_max_is_clamped() {
        let item = LineItem::new("peony", "Peony", Decimal::MAX, "");
        assert_eq!(item.price, MAX_PRICE);
    }

    #[test]
    fn test_normalized_repairs_struct_literal() {
        let item = LineItem {
            id: ProductId::new("lily"),
            name: "Lily".to_string(),
            price: Decimal::from(-3),
            image: String::new(),
            quantity: 0,
        }
        .normalized();
        assert_eq!(item.quantity, 1);
        assert_eq!(item.price, Decimal::ZERO);
    }

    #[test]
    fn test_line_total_at_limits() {
        let item = LineItem::new("peony", "Peony", MAX_PRICE, "").with_quantity(u32::MAX);
        assert_eq!(item.line_total(), MAX_PRICE * Decimal::from(u32::MAX));

        let huge = LineItem {
            price: Decimal::MAX,
            ..item
        };
        assert_eq!(huge.line_total(), Decimal::MAX);
        assert_eq!(order_total([&huge, &huge]), Decimal::MAX);
    }

    #[test]
    fn test_order_total() {
        let rose = LineItem::new("rose", "Rose", Decimal::from(50_000), "").with_quantity(2);
        let lily = LineItem::new("lily", "Lily", Decimal::from(30_000), "");
        assert_eq!(order_total([&rose, &lily]), Decimal::from(130_000));
        assert_eq!(order_total(Vec::<&LineItem>::new()), Decimal::ZERO);
    }

    #[test]
    fn test_with_quantity_floors_at_one() {
        let item = LineItem::new("lily", "Lily", Decimal::from(10), "").with_quantity(0);
        assert_eq!(item.quantity, 1);
        let item = item.with_quantity(4);
        assert_eq!(item.line_total(), Decimal::from(40));
    }

    #[test]
    fn test_well_formed_requires_id_and_name() {
        assert!(LineItem::new("a", "A", Decimal::ONE, "").is_well_formed());
        assert!(!LineItem::new("", "A", Decimal::ONE, "").is_well_formed());
        assert!(!LineItem::new("a", " ", Decimal::ONE, "").is_well_formed());
    }

    #[test]
    fn test_price_serializes_as_number() {
        let item = LineItem::new("rose", "Red Rose", Decimal::from(50_000), "rose.jpg");
        let value = serde_json::to_value(&item).unwrap_or_default();
        assert_eq!(value["price"], serde_json::json!(50000.0));
        assert_eq!(value["id"], serde_json::json!("rose"));
    }
}
