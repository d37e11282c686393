//! Client-side shopping cart.
//!
//! # Architecture
//!
//! - [`CartState`] - plain data, mutated only through the pure [`reduce`]
//! - [`CartStore`] - owns one state plus its storage backend; every mutation
//!   reduces then persists
//! - [`persist`] - the single boundary between stored JSON and [`CartState`]
//! - [`storage`] - key-value backends holding the persisted blob
//!
//! The store is an explicit value passed to whoever needs it. There is no
//! global cart.
//!
//! # Example
//!
//! ```rust
//! use bloom_market_core::LineItem;
//! use bloom_market_storefront::cart::{CartStore, MemoryStorage};
//! use rust_decimal::Decimal;
//!
//! let mut cart = CartStore::open(MemoryStorage::new(), "cart-storage");
//! cart.add_item(LineItem::new("rose", "Red Rose", Decimal::from(50_000), "rose.jpg"));
//! cart.add_item(LineItem::new("rose", "Red Rose", Decimal::from(50_000), "rose.jpg"));
//! assert_eq!(cart.item_count(), 2);
//! assert_eq!(cart.total(), Decimal::from(100_000));
//! ```

pub mod persist;
mod state;
pub mod storage;

pub use persist::{PersistError, decode_persisted, encode_persisted, sanitize_items};
pub use state::{CartAction, CartState, reduce};
pub use storage::{CartStorage, FileStorage, MemoryStorage, StorageError};

use bloom_market_core::{LineItem, ProductId, ShippingAddress};
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use crate::checkout::{CheckoutAdapter, CheckoutError, CheckoutIdentity, OrderBackend, OrderReceipt};

/// Default storage key for the persisted cart.
pub const DEFAULT_STORAGE_KEY: &str = "cart-storage";

/// Cart state container bound to a storage backend.
#[derive(Debug)]
pub struct CartStore<S: CartStorage> {
    state: CartState,
    storage: S,
    key: String,
}

impl<S: CartStorage> CartStore<S> {
    /// Open a store and rehydrate it from `storage`.
    ///
    /// Unreadable or corrupt persisted state is logged and replaced by an
    /// empty cart.
    pub fn open(storage: S, key: impl Into<String>) -> Self {
        let mut store = Self {
            state: CartState::new(),
            storage,
            key: key.into(),
        };
        store.rehydrate();
        store
    }

    /// Reload persisted state and merge it into the in-memory state.
    pub fn rehydrate(&mut self) {
        let persisted = match self.storage.load(&self.key) {
            Ok(Some(raw)) => match decode_persisted(&raw) {
                Ok(state) => state,
                Err(e) => {
                    warn!(key = %self.key, error = %e, "Discarding corrupt persisted cart");
                    CartState::new()
                }
            },
            Ok(None) => CartState::new(),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to read persisted cart");
                CartState::new()
            }
        };
        self.state = std::mem::take(&mut self.state).merge_persisted(persisted);
    }

    /// Apply an action and persist the result.
    pub fn dispatch(&mut self, action: CartAction) {
        self.state = reduce(std::mem::take(&mut self.state), action);
        self.persist();
    }

    /// Add one unit of `item`.
    pub fn add_item(&mut self, item: LineItem) {
        self.dispatch(CartAction::Add(item));
    }

    /// Remove the item with `id`, if present.
    pub fn remove_item(&mut self, id: &ProductId) {
        self.dispatch(CartAction::Remove(id.clone()));
    }

    /// Adjust the quantity of `id` by `delta`, never going below 1.
    pub fn update_quantity(&mut self, id: &ProductId, delta: i64) {
        self.dispatch(CartAction::UpdateQuantity {
            id: id.clone(),
            delta,
        });
    }

    /// Remove every item.
    pub fn clear_cart(&mut self) {
        self.dispatch(CartAction::Clear);
    }

    /// Well-formed items, in insertion order.
    #[must_use]
    pub fn safe_items(&self) -> Vec<LineItem> {
        self.state.safe_items().cloned().collect()
    }

    /// Sum of `price × quantity` over safe items.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.state.total()
    }

    /// Sum of quantities over safe items.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.state.item_count()
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &CartState {
        &self.state
    }

    /// Storage backend.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Storage key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Submit the cart as an order, clearing it on success.
    ///
    /// On failure the cart is left untouched so the customer can retry.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError`] if the cart is empty or the backend rejects
    /// the order.
    #[instrument(skip_all, fields(identity = %identity))]
    pub async fn checkout<B: OrderBackend>(
        &mut self,
        adapter: &CheckoutAdapter<B>,
        identity: &CheckoutIdentity,
        address: ShippingAddress,
    ) -> Result<OrderReceipt, CheckoutError> {
        let items = self.safe_items();
        let receipt = adapter
            .submit(&items, self.total(), identity, address)
            .await?;

        self.clear_cart();
        info!(order_id = %receipt.order_id, "Cart cleared after checkout");
        Ok(receipt)
    }

    fn persist(&mut self) {
        let encoded = match encode_persisted(&self.state) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to encode cart");
                return;
            }
        };
        if let Err(e) = self.storage.save(&self.key, &encoded) {
            warn!(key = %self.key, error = %e, "Failed to persist cart");
        }
    }
}
