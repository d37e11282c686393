//! Size price calculator command.

use std::io::Write;

use bloom_market_core::{Price, SizeError, SizeKey, calculate_price};
use bloom_market_storefront::Error;

use super::parse_price;

/// Print the price of `base` in `size`.
///
/// # Errors
///
/// Returns an error if the price or size is invalid.
pub fn run(base: &str, size: &str) -> Result<(), Box<dyn std::error::Error>> {
    let base = parse_price(base)?;
    let size: SizeKey = size
        .parse()
        .map_err(|e: SizeError| Error::BadRequest(e.to_string()))?;

    let price = calculate_price(base, size).map_err(|e| Error::BadRequest(e.to_string()))?;
    let mut out = std::io::stdout().lock();
    writeln!(out, "{size}: {}", Price::shop(price))?;
    Ok(())
}
