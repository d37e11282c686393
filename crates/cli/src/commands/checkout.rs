//! Checkout command.

use std::io::Write;

use bloom_market_core::{Price, ShippingAddress, UserId};
use bloom_market_storefront::Error;
use bloom_market_storefront::checkout::{CheckoutAdapter, CheckoutIdentity};
use bloom_market_storefront::config::BloomConfig;
use bloom_market_storefront::supabase::SupabaseClient;
use tracing::{info, warn};

use super::open_cart;

/// Address fields as given on the command line.
#[derive(Debug, Default)]
pub struct AddressInput {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub note: Option<String>,
}

impl AddressInput {
    fn is_empty(&self) -> bool {
        [
            &self.full_name,
            &self.phone,
            &self.street,
            &self.city,
            &self.district,
            &self.note,
        ]
        .iter()
        .all(|field| field.is_none())
    }

    /// Resolve to a shipping address.
    ///
    /// With no fields given the default address is used. Once any field is
    /// given, name, phone, street and city are all required.
    fn resolve(self) -> Result<ShippingAddress, Error> {
        if self.is_empty() {
            warn!("No shipping address given, using the default address");
            return Ok(ShippingAddress::placeholder());
        }

        let address = ShippingAddress {
            full_name: self.full_name.unwrap_or_default(),
            phone: self.phone.unwrap_or_default(),
            street: self.street.unwrap_or_default(),
            city: self.city.unwrap_or_default(),
            district: self.district,
            note: self.note,
        };

        let missing = address.missing_fields();
        if !missing.is_empty() {
            return Err(Error::BadRequest(format!(
                "shipping address is missing: {}",
                missing.join(", ")
            )));
        }
        Ok(address)
    }
}

/// Submit the persisted cart as an order.
///
/// # Errors
///
/// Returns an error if checkout is not configured, the address is
/// incomplete, the cart is empty, or the order backend fails.
pub async fn run(
    config: &BloomConfig,
    user_id: Option<String>,
    access_token: Option<String>,
    address: AddressInput,
) -> Result<(), Box<dyn std::error::Error>> {
    let supabase = config.require_supabase().map_err(Error::from)?;
    let address = address.resolve()?;
    let identity = match user_id {
        Some(id) => CheckoutIdentity::User {
            id: UserId::new(id),
            access_token,
        },
        None => CheckoutIdentity::Guest,
    };

    let adapter = CheckoutAdapter::new(SupabaseClient::new(supabase).map_err(Error::from)?);
    let mut cart = open_cart(config)?;

    info!(%identity, items = cart.item_count(), "Submitting order");
    let receipt = cart
        .checkout(&adapter, &identity, address)
        .await
        .map_err(Error::from)?;

    let mut out = std::io::stdout().lock();
    writeln!(
        out,
        "Order {} {} - {} item(s), total {}",
        receipt.order_id,
        receipt.status,
        receipt.item_count,
        Price::shop(receipt.total)
    )?;
    Ok(())
}
