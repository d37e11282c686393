//! Unified error type for the storefront library.
//!
//! Each concern has its own error enum next to its code; [`Error`] wraps them
//! for callers that drive several concerns at once, such as the CLI.

use thiserror::Error;

use crate::cart::StorageError;
use crate::checkout::{BackendError, CheckoutError};
use crate::config::ConfigError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Cart storage could not be opened or written.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Checkout failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Order backend client could not be built.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Invalid input from the caller.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl Error {
    /// Whether the error was caused by the caller's input or setup rather
    /// than by a remote or I/O failure.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::BadRequest(_) | Self::Checkout(CheckoutError::EmptyCart)
        )
    }
}

/// Result type alias for [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
