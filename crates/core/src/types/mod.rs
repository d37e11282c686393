//! Core types for Bloom Market.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod id;
pub mod line_item;
pub mod price;
pub mod size;
pub mod status;

pub use address::ShippingAddress;
pub use id::*;
pub use line_item::{LineItem, order_total};
pub use price::{CurrencyCode, MAX_PRICE, Price};
pub use size::{SizeError, SizeKey, calculate_price};
pub use status::*;
