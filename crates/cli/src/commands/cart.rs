//! Cart commands.

use std::io::Write;

use bloom_market_core::{
    LineItem, MAX_PRICE, Price, ProductId, SizeError, SizeKey, calculate_price,
};
use bloom_market_storefront::Error;
use bloom_market_storefront::cart::{CartStorage, CartStore};
use bloom_market_storefront::config::BloomConfig;
use rust_decimal::Decimal;
use tracing::info;

use super::{open_cart, parse_price};

/// Print the cart.
///
/// # Errors
///
/// Returns an error if the cart directory cannot be opened or stdout fails.
pub fn show(config: &BloomConfig, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let cart = open_cart(config)?;
    let mut out = std::io::stdout().lock();

    if json {
        let body = serde_json::json!({
            "items": cart.safe_items(),
            "item_count": cart.item_count(),
            "total": cart.total(),
        });
        writeln!(out, "{}", serde_json::to_string_pretty(&body)?)?;
        return Ok(());
    }

    write_summary(&mut out, &cart)?;
    Ok(())
}

/// Add one unit of a product, optionally priced for a bouquet size.
///
/// # Errors
///
/// Returns an error if the price or size is invalid or storage cannot be opened.
pub fn add(
    config: &BloomConfig,
    id: &str,
    name: &str,
    price: &str,
    image: &str,
    size: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    if id.trim().is_empty() || name.trim().is_empty() {
        return Err(Error::BadRequest("product id and name must not be empty".to_string()).into());
    }

    let base = parse_price(price)?;
    let size = size
        .map(str::parse::<SizeKey>)
        .transpose()
        .map_err(|e: SizeError| Error::BadRequest(e.to_string()))?;
    let item =
        sized_item(id, name, base, image, size).map_err(|e| Error::BadRequest(e.to_string()))?;

    let mut cart = open_cart(config)?;
    info!(id = %item.id, price = %item.price, "Adding item to cart");
    cart.add_item(item);

    write_summary(&mut std::io::stdout().lock(), &cart)?;
    Ok(())
}

/// Remove a product.
///
/// # Errors
///
/// Returns an error if storage cannot be opened.
pub fn remove(config: &BloomConfig, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut cart = open_cart(config)?;
    cart.remove_item(&ProductId::new(id));
    write_summary(&mut std::io::stdout().lock(), &cart)?;
    Ok(())
}

/// Change a product's quantity.
///
/// # Errors
///
/// Returns an error if storage cannot be opened.
pub fn update(config: &BloomConfig, id: &str, delta: i64) -> Result<(), Box<dyn std::error::Error>> {
    let mut cart = open_cart(config)?;
    let id = ProductId::new(id);
    if cart.state().get(&id).is_none() {
        tracing::warn!(%id, "Product not in cart, nothing to update");
    }
    cart.update_quantity(&id, delta);
    write_summary(&mut std::io::stdout().lock(), &cart)?;
    Ok(())
}

/// Empty the cart.
///
/// # Errors
///
/// Returns an error if storage cannot be opened.
pub fn clear(config: &BloomConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut cart = open_cart(config)?;
    cart.clear_cart();
    write_summary(&mut std::io::stdout().lock(), &cart)?;
    Ok(())
}

/// Build the line item for a product, sized when `size` is given.
///
/// Each size is its own line: the id gets a `-<size>` suffix and the name a
/// `(<size>)` suffix, and the price is the size price of `base`, which must
/// not exceed `MAX_PRICE`.
fn sized_item(
    id: &str,
    name: &str,
    base: Decimal,
    image: &str,
    size: Option<SizeKey>,
) -> Result<LineItem, SizeError> {
    let Some(size) = size else {
        return Ok(LineItem::new(id, name, base, image));
    };

    let price = calculate_price(base, size)?;
    if price > MAX_PRICE {
        return Err(SizeError::Overflow { base, size });
    }
    Ok(LineItem::new(
        format!("{id}-{}", size.code().to_ascii_lowercase()),
        format!("{name} ({size})"),
        price,
        image,
    ))
}

fn write_summary<S: CartStorage>(out: &mut impl Write, cart: &CartStore<S>) -> std::io::Result<()> {
    let items = cart.safe_items();
    if items.is_empty() {
        return writeln!(out, "Cart is empty");
    }

    for item in &items {
        writeln!(
            out,
            "{:<24} {:<32} {:>4} x {:>14} = {:>14}",
            item.id,
            item.name,
            item.quantity,
            Price::shop(item.price).display(),
            Price::shop(item.line_total()).display(),
        )?;
    }
    writeln!(
        out,
        "{} item(s), total {}",
        cart.item_count(),
        Price::shop(cart.total())
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bloom_market_storefront::cart::MemoryStorage;

    use super::*;

    #[test]
    fn test_sized_item_uses_size_price() {
        let item =
            sized_item("rose", "Rose", Decimal::from(100_000), "", Some(SizeKey::XL)).unwrap();
        assert_eq!(item.id.as_str(), "rose-xl");
        assert_eq!(item.name, "Rose (XL)");
        assert_eq!(item.price, Decimal::from(300_000));
    }

    #[test]
    fn test_unsized_item_keeps_base_price() {
        let item = sized_item("rose", "Rose", Decimal::from(100_000), "r.jpg", None).unwrap();
        assert_eq!(item.id.as_str(), "rose");
        assert_eq!(item.price, Decimal::from(100_000));
        assert_eq!(item.image, "r.jpg");
    }

    #[test]
    fn test_sized_item_overflow_is_error() {
        let result = sized_item("rose", "Rose", Decimal::MAX, "", Some(SizeKey::M));
        assert!(matches!(result, Err(SizeError::Overflow { .. })));

        let result = sized_item("rose", "Rose", MAX_PRICE, "", Some(SizeKey::XL));
        assert!(matches!(result, Err(SizeError::Overflow { .. })));
        assert!(sized_item("rose", "Rose", MAX_PRICE, "", Some(SizeKey::S)).is_ok());
    }

    #[test]
    fn test_write_summary() {
        let mut cart = CartStore::open(MemoryStorage::new(), "cart");
        let mut out = Vec::new();
        write_summary(&mut out, &cart).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Cart is empty\n");

        cart.add_item(LineItem::new("rose", "Rose", Decimal::from(50_000), ""));
        cart.add_item(LineItem::new("rose", "Rose", Decimal::from(50_000), ""));
        let mut out = Vec::new();
        write_summary(&mut out, &cart).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("100.000 ₫"));
        assert!(text.ends_with("2 item(s), total 100.000 ₫\n"));
    }
}
