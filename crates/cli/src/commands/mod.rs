//! CLI command implementations.

pub mod cart;
pub mod checkout;
pub mod price;

use std::str::FromStr;

use bloom_market_core::MAX_PRICE;
use bloom_market_storefront::Error;
use bloom_market_storefront::cart::{CartStore, FileStorage};
use bloom_market_storefront::config::BloomConfig;
use rust_decimal::Decimal;

/// Open the persisted cart named by the configuration.
fn open_cart(config: &BloomConfig) -> Result<CartStore<FileStorage>, Error> {
    let storage = FileStorage::open(&config.cart.dir)?;
    Ok(CartStore::open(storage, config.cart.key.clone()))
}

/// Parse a price argument in `0..=MAX_PRICE`.
fn parse_price(input: &str) -> Result<Decimal, Error> {
    let price = Decimal::from_str(input.trim())
        .map_err(|e| Error::BadRequest(format!("invalid price {input:?}: {e}")))?;
    if price.is_sign_negative() && !price.is_zero() {
        return Err(Error::BadRequest(format!("price must not be negative: {input}")));
    }
    if price > MAX_PRICE {
        return Err(Error::BadRequest(format!(
            "price must not exceed {MAX_PRICE}: {input}"
        )));
    }
    Ok(price)
}
