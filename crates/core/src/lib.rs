//! Bloom Market Core - Shared types library.
//!
//! This crate provides common types used across all Bloom Market components:
//! - `storefront` - Cart store, persisted-state boundary and checkout
//! - `cli` - Command-line front end for the cart and checkout
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no storage
//! access, no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, bouquet sizes, line items, addresses and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
