//! Shipping address sent with an order.

use serde::{Deserialize, Serialize};

/// Delivery address for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub full_name: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ShippingAddress {
    /// Default address used when checkout runs without address capture.
    ///
    /// This is a stand-in for a real delivery form, not a contract with the
    /// order backend.
    #[must_use]
    pub fn placeholder() -> Self {
        Self {
            full_name: "Guest Customer".to_string(),
            phone: "0900000000".to_string(),
            street: "1 Flower Street".to_string(),
            city: "Da Lat".to_string(),
            district: None,
            note: None,
        }
    }

    /// Names of required fields that are blank.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("full_name", &self.full_name),
            ("phone", &self.phone),
            ("street", &self.street),
            ("city", &self.city),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}
