//! Persisted cart format and the sanitizing deserialization boundary.
//!
//! The cart is stored as a single JSON blob:
//!
//! ```json
//! {"state": {"items": [{"id": "rose", "name": "Red Rose", "price": 50000,
//!                       "image": "rose.jpg", "quantity": 2}]},
//!  "version": 0}
//! ```
//!
//! Reading goes through [`decode_persisted`] and nowhere else. A blob that is
//! not JSON, or has no `state.items` array, is an error the store recovers from
//! by starting empty. Individual entries that are malformed are dropped
//! without being reported.

use std::str::FromStr;

use bloom_market_core::{LineItem, MAX_PRICE, ProductId};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use super::CartState;

/// Version written alongside the persisted state.
pub const STORAGE_VERSION: u32 = 0;

/// Errors that make a persisted blob unusable as a whole.
#[derive(Debug, Error)]
pub enum PersistError {
    /// The blob is not valid JSON.
    #[error("Invalid cart JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The blob parsed but has no `state.items` array.
    #[error("Persisted cart has no state.items array")]
    MissingItems,
}

#[derive(Serialize)]
struct PersistedBlob<'a> {
    state: PersistedState<'a>,
    version: u32,
}

#[derive(Serialize)]
struct PersistedState<'a> {
    items: &'a [LineItem],
}

/// Serialize a cart into its persisted blob.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode_persisted(state: &CartState) -> Result<String, serde_json::Error> {
    serde_json::to_string(&PersistedBlob {
        state: PersistedState {
            items: state.items(),
        },
        version: STORAGE_VERSION,
    })
}

/// Parse a persisted blob into a sanitized cart state.
///
/// # Errors
///
/// Returns [`PersistError`] if the blob is not JSON or lacks `state.items`.
/// Malformed entries inside a valid blob are not errors; they are dropped.
pub fn decode_persisted(raw: &str) -> Result<CartState, PersistError> {
    let blob: Value = serde_json::from_str(raw)?;
    let entries = blob
        .get("state")
        .and_then(|state| state.get("items"))
        .and_then(Value::as_array)
        .ok_or(PersistError::MissingItems)?;

    Ok(CartState::from_items(sanitize_items(entries)))
}

/// Keep the well-formed subset of raw persisted entries.
#[must_use]
pub fn sanitize_items(entries: &[Value]) -> Vec<LineItem> {
    let items: Vec<LineItem> = entries.iter().filter_map(sanitize_entry).collect();
    let dropped = entries.len() - items.len();
    if dropped > 0 {
        debug!(dropped, kept = items.len(), "Dropped malformed cart entries");
    }
    items
}

/// Convert one raw entry into a line item, or `None` if it is malformed.
///
/// An entry is kept when it is an object with non-blank string `id` and
/// `name` and a numeric `price` in `0..=MAX_PRICE`. A missing `image` becomes
/// empty and a missing or sub-1 `quantity` becomes 1.
#[must_use]
pub fn sanitize_entry(entry: &Value) -> Option<LineItem> {
    let object = entry.as_object()?;

    let id = non_blank_str(object, "id")?;
    let name = non_blank_str(object, "name")?;
    let price = object.get("price").and_then(decimal_from_value)?;
    if (price.is_sign_negative() && !price.is_zero()) || price > MAX_PRICE {
        return None;
    }
    let image = object
        .get("image")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let quantity = object
        .get("quantity")
        .and_then(quantity_from_value)
        .unwrap_or(1);

    Some(LineItem::new(ProductId::new(id), name, price, image).with_quantity(quantity))
}

fn non_blank_str<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    object
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(Decimal::from)
            .or_else(|| n.as_f64().and_then(Decimal::from_f64)),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

fn quantity_from_value(value: &Value) -> Option<u32> {
    let n = value.as_f64()?;
    if !n.is_finite() || n < 1.0 {
        return Some(1);
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // clamped to u32 range first
    let quantity = n.trunc().min(f64::from(u32::MAX)) as u32;
    Some(quantity)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_encode_shape() {
        let state = CartState::from_items([LineItem::new(
            "rose",
            "Red Rose",
            Decimal::from(50_000),
            "rose.jpg",
        )
        .with_quantity(2)]);

        let value: Value = serde_json::from_str(&encode_persisted(&state).unwrap()).unwrap();
        assert_eq!(value["version"], json!(0));
        assert_eq!(value["state"]["items"][0]["id"], json!("rose"));
        assert_eq!(value["state"]["items"][0]["quantity"], json!(2));
    }

    #[test]
    fn test_encode_then_decode_preserves_items() {
        let state = CartState::from_items([
            LineItem::new("rose", "Red Rose", Decimal::from(50_000), "rose.jpg").with_quantity(2),
            LineItem::new("lily", "Lily", Decimal::new(125, 1), ""),
        ]);
        let decoded = decode_persisted(&encode_persisted(&state).unwrap()).unwrap();
        assert_eq!(decoded, state);
    }

    #[test]
    fn test_decode_drops_malformed_entries() {
        let raw = json!({
            "state": {
                "items": [
                    null,
                    42,
                    {"name": "No id", "price": 10, "quantity": 1},
                    {"id": "", "name": "Blank id", "price": 10},
                    {"id": "no-name", "price": 10},
                    {"id": "bad-price", "name": "Bad", "price": "abc"},
                    {"id": "negative", "name": "Negative", "price": -1},
                    {"id": "rose", "name": "Red Rose", "price": 50000, "image": "rose.jpg", "quantity": 2},
                    {"id": "tulip", "name": "Tulip", "price": "30000"}
                ]
            },
            "version": 0
        })
        .to_string();

        let state = decode_persisted(&raw).unwrap();
        let ids: Vec<&str> = state.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["rose", "tulip"]);
        assert_eq!(state.total(), Decimal::from(130_000));
    }

    #[test]
    fn test_decode_repairs_quantity_and_image() {
        let raw = json!({"state": {"items": [
            {"id": "a", "name": "A", "price": 1, "quantity": 0},
            {"id": "b", "name": "B", "price": 1, "quantity": -3},
            {"id": "c", "name": "C", "price": 1}
        ]}})
        .to_string();

        let state = decode_persisted(&raw).unwrap();
        assert!(state.items().iter().all(|i| i.quantity == 1));
        assert!(state.items().iter().all(|i| i.image.is_empty()));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_persisted("not json"),
            Err(PersistError::Json(_))
        ));
        assert!(matches!(
            decode_persisted("{\"state\": {}}"),
            Err(PersistError::MissingItems)
        ));
        assert!(matches!(
            decode_persisted("{\"state\": {\"items\": null}}"),
            Err(PersistError::MissingItems)
        ));
        assert!(matches!(decode_persisted("null"), Err(PersistError::MissingItems)));
    }

    #[test]
    fn test_decode_drops_out_of_range_prices() {
        let raw = json!({"state": {"items": [
            {"id": "a", "name": "A", "price": 6e28, "quantity": 2},
            {"id": "b", "name": "B", "price": 1e40},
            {"id": "c", "name": "C", "price": "79228162514264337593543950335"},
            {"id": "d", "name": "D", "price": 1_000_000_000_001_i64}
        ]}})
        .to_string();

        let state = decode_persisted(&raw).unwrap();
        assert!(state.items().is_empty());
        assert_eq!(state.total(), Decimal::ZERO);
    }

    #[test]
    fn test_decode_keeps_extreme_but_valid_entries() {
        let raw = json!({"state": {"items": [
            {"id": "a", "name": "A", "price": 1_000_000_000_000_i64, "quantity": u32::MAX},
            {"id": "b", "name": "B", "price": 1_000_000_000_000_i64, "quantity": 1e300},
            {"id": "c", "name": "C", "price": 1, "quantity": u64::MAX}
        ]}})
        .to_string();

        let state = decode_persisted(&raw).unwrap();
        assert_eq!(state.items().len(), 3);
        assert!(state.items().iter().all(|i| i.quantity == u32::MAX));
        let expected = MAX_PRICE * Decimal::from(u32::MAX) * Decimal::TWO + Decimal::from(u32::MAX);
        assert_eq!(state.total(), expected);
    }

    #[test]
    fn test_decode_dedupes_ids() {
        let raw = json!({"state": {"items": [
            {"id": "a", "name": "First", "price": 1, "quantity": 2},
            {"id": "a", "name": "Second", "price": 5, "quantity": 7}
        ]}})
        .to_string();

        let state = decode_persisted(&raw).unwrap();
        assert_eq!(state.items().len(), 1);
        assert_eq!(state.items()[0].name, "First");
    }

    #[test]
    fn test_sanitize_items_keeps_well_formed_subset() {
        let entries = vec![
            Value::Null,
            json!({"id": "a", "name": "A", "price": 1}),
            json!({"id": null, "name": "B", "price": 1}),
        ];
        let items = sanitize_items(&entries);
        assert_eq!(items.len(), 1);
        assert!(items.iter().all(LineItem::is_well_formed));
    }
}
