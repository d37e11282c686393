//! Bouquet sizes and size-based pricing.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`SizeKey`] or pricing a size.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SizeError {
    /// The size code is not one of `S`, `M`, `L`, `XL`.
    #[error("unknown size code: {0:?} (expected S, M, L or XL)")]
    Unknown(String),

    /// The scaled price does not fit in a decimal.
    #[error("price {base} is too large for size {size}")]
    Overflow { base: Decimal, size: SizeKey },
}

/// Bouquet size offered on the product page.
///
/// Each size scales the product's base price by a fixed multiplier.
///
/// ## Examples
///
/// ```
/// use bloom_market_core::{SizeKey, calculate_price};
/// use rust_decimal::Decimal;
///
/// let base = Decimal::from(100_000);
/// assert_eq!(calculate_price(base, SizeKey::M), Ok(Decimal::from(150_000)));
/// assert!("XXL".parse::<SizeKey>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum SizeKey {
    #[default]
    S,
    M,
    L,
    XL,
}

impl SizeKey {
    /// All sizes, smallest first.
    pub const ALL: [Self; 4] = [Self::S, Self::M, Self::L, Self::XL];

    /// Price multiplier applied to the base price.
    #[must_use]
    pub const fn multiplier(self) -> Decimal {
        match self {
            Self::S => Decimal::ONE,
            Self::M => Decimal::from_parts(15, 0, 0, false, 1),
            Self::L => Decimal::TWO,
            Self::XL => Decimal::from_parts(3, 0, 0, false, 0),
        }
    }

    /// The size code as shown to customers.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::S => "S",
            Self::M => "M",
            Self::L => "L",
            Self::XL => "XL",
        }
    }
}

impl fmt::Display for SizeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for SizeKey {
    type Err = SizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "S" => Ok(Self::S),
            "M" => Ok(Self::M),
            "L" => Ok(Self::L),
            "XL" => Ok(Self::XL),
            _ => Err(SizeError::Unknown(s.to_owned())),
        }
    }
}

/// Price of a product in the given size.
///
/// Multiplies the base price by the size multiplier and rounds to whole
/// currency units, half away from zero.
///
/// # Errors
///
/// Returns [`SizeError::Overflow`] if the product does not fit in a decimal.
pub fn calculate_price(base_price: Decimal, size: SizeKey) -> Result<Decimal, SizeError> {
    base_price
        .checked_mul(size.multiplier())
        .map(|price| price.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .ok_or(SizeError::Overflow {
            base: base_price,
            size,
        })
}
