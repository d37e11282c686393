//! Bloom Market Storefront library.
//!
//! Cart state, persisted-state handling and checkout for the flower festival
//! marketplace, as a library so the CLI and tests can share it.
//!
//! # Modules
//!
//! - [`cart`] - Cart store, reducers, sanitizing persistence and storage backends
//! - [`checkout`] - Order submission through an [`checkout::OrderBackend`]
//! - [`supabase`] - Hosted database RPC client implementing the order backend
//! - [`config`] - Environment-based configuration
//! - [`telemetry`] - Tracing subscriber setup
//! - [`error`] - Unified error type

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod supabase;
pub mod telemetry;

pub use error::{Error, Result};
