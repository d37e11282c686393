//! Checkout: turning cart line items into an order.
//!
//! The [`CheckoutAdapter`] builds a [`CreateOrderRequest`] from line items and
//! hands it to an [`OrderBackend`], which performs the one remote write. Guest
//! and signed-in customers go through the same call; the only difference is
//! whether `p_user_id` is null.
//!
//! There is no retry and no idempotency key. A caller that retries after a
//! network failure may create the order twice.

use std::fmt;
use std::future::Future;

use bloom_market_core::{
    LineItem, OrderId, OrderStatus, ProductId, ShippingAddress, UserId, order_total,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Errors returned by an [`OrderBackend`].
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// There is nothing to order.
    #[error("Cart is empty")]
    EmptyCart,

    /// The order backend rejected or failed the request.
    #[error("Order creation failed: {0}")]
    Backend(#[from] BackendError),
}

/// Who is placing the order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CheckoutIdentity {
    /// Anonymous checkout.
    #[default]
    Guest,
    /// Signed-in customer.
    User {
        id: UserId,
        /// Session token forwarded to the backend, if any.
        access_token: Option<String>,
    },
}

impl CheckoutIdentity {
    /// Signed-in customer without a session token.
    #[must_use]
    pub fn user(id: impl Into<UserId>) -> Self {
        Self::User {
            id: id.into(),
            access_token: None,
        }
    }

    /// The user id, or `None` for guests.
    #[must_use]
    pub const fn user_id(&self) -> Option<&UserId> {
        match self {
            Self::Guest => None,
            Self::User { id, .. } => Some(id),
        }
    }

    /// The session token, if any.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        match self {
            Self::Guest => None,
            Self::User { access_token, .. } => access_token.as_deref(),
        }
    }
}

impl fmt::Display for CheckoutIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Guest => f.write_str("guest"),
            Self::User { id, .. } => write!(f, "user:{id}"),
        }
    }
}

/// One ordered product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

impl From<&LineItem> for OrderItem {
    fn from(item: &LineItem) -> Self {
        Self {
            product_id: item.id.clone(),
            quantity: item.quantity,
            price: item.price,
        }
    }
}

/// Parameters of the order-creation remote procedure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub p_user_id: Option<UserId>,
    #[serde(with = "rust_decimal::serde::float")]
    pub p_total_amount: Decimal,
    pub p_items: Vec<OrderItem>,
    pub p_shipping_address: ShippingAddress,
}

/// Order as acknowledged by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedOrder {
    pub id: OrderId,
    pub status: OrderStatus,
}

/// Result of a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderReceipt {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub total: Decimal,
    pub item_count: u64,
    pub submitted_at: DateTime<Utc>,
}

/// Remote procedure that creates an order.
pub trait OrderBackend {
    /// Create an order, returning its id.
    ///
    /// `access_token` is the customer's session token when signed in.
    fn create_order(
        &self,
        request: &CreateOrderRequest,
        access_token: Option<&str>,
    ) -> impl Future<Output = Result<CreatedOrder, BackendError>> + Send;
}

/// Converts line items into an order submission.
#[derive(Debug, Clone)]
pub struct CheckoutAdapter<B> {
    backend: B,
}

impl<B: OrderBackend> CheckoutAdapter<B> {
    /// Create an adapter over an order backend.
    #[must_use]
    pub const fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Get a reference to the order backend.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Build the remote procedure parameters for an order.
    #[must_use]
    pub fn build_request(
        items: &[LineItem],
        total: Decimal,
        identity: &CheckoutIdentity,
        address: ShippingAddress,
    ) -> CreateOrderRequest {
        CreateOrderRequest {
            p_user_id: identity.user_id().cloned(),
            p_total_amount: total,
            p_items: items.iter().map(OrderItem::from).collect(),
            p_shipping_address: address,
        }
    }

    /// Submit an order for `items` totalling `total`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] without calling the backend when
    /// `items` is empty, and [`CheckoutError::Backend`] when the backend fails.
    #[instrument(skip_all, fields(identity = %identity, items = items.len(), total = %total))]
    pub async fn submit(
        &self,
        items: &[LineItem],
        total: Decimal,
        identity: &CheckoutIdentity,
        address: ShippingAddress,
    ) -> Result<OrderReceipt, CheckoutError> {
        if items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let computed = order_total(items);
        if computed != total {
            warn!(%computed, %total, "Checkout total differs from line items");
        }

        let missing = address.missing_fields();
        if !missing.is_empty() {
            warn!(?missing, "Shipping address is incomplete");
        }

        let request = Self::build_request(items, total, identity, address);
        let created = self
            .backend
            .create_order(&request, identity.access_token())
            .await?;

        info!(order_id = %created.id, status = %created.status, "Order created");

        Ok(OrderReceipt {
            order_id: created.id,
            status: created.status,
            total,
            item_count: items.iter().map(|i| u64::from(i.quantity)).sum(),
            submitted_at: Utc::now(),
        })
    }
}
