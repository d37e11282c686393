//! Hosted database client for order creation.
//!
//! Orders are written by a Postgres function exposed through the database
//! service's REST gateway at `POST {url}/rest/v1/rpc/{function}`. Every call
//! carries the project's anon key in the `apikey` header; the `Authorization`
//! bearer is the customer's session token when signed in and the anon key
//! otherwise.

use std::sync::Arc;

use bloom_market_core::{OrderId, OrderStatus};
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, instrument, warn};

use crate::checkout::{BackendError, CreateOrderRequest, CreatedOrder, OrderBackend};
use crate::config::SupabaseConfig;

/// Client for the hosted database's RPC gateway.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<SupabaseClientInner>,
}

struct SupabaseClientInner {
    client: reqwest::Client,
    rest_url: String,
    anon_key: SecretString,
    order_function: String,
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("rest_url", &self.inner.rest_url)
            .field("order_function", &self.inner.order_function)
            .field("anon_key", &"[REDACTED]")
            .finish()
    }
}

impl SupabaseClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns error if the anon key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &SupabaseConfig) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(config.anon_key.expose_secret())
                .map_err(|e| BackendError::Parse(format!("Invalid anon key format: {e}")))?,
        );
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        let rest_url = format!("{}/rest/v1", config.url.as_str().trim_end_matches('/'));

        Ok(Self {
            inner: Arc::new(SupabaseClientInner {
                client,
                rest_url,
                anon_key: config.anon_key.clone(),
                order_function: config.order_function.clone(),
            }),
        })
    }

    /// URL of a remote procedure.
    #[must_use]
    pub fn rpc_url(&self, function: &str) -> String {
        format!("{}/rpc/{function}", self.inner.rest_url)
    }

    /// Call a remote procedure with named JSON parameters.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails, the gateway answers with a
    /// non-success status, or the body is not JSON.
    #[instrument(skip(self, params, access_token))]
    pub async fn rpc<P: Serialize + Sync>(
        &self,
        function: &str,
        params: &P,
        access_token: Option<&str>,
    ) -> Result<Value, BackendError> {
        let bearer = access_token.unwrap_or_else(|| self.inner.anon_key.expose_secret());

        let response = self
            .inner
            .client
            .post(self.rpc_url(function))
            .bearer_auth(bearer)
            .json(params)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "RPC returned non-success status"
            );
            return Err(BackendError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        debug!(bytes = body.len(), "RPC succeeded");
        serde_json::from_str(&body).map_err(|e| BackendError::Parse(e.to_string()))
    }
}

impl OrderBackend for SupabaseClient {
    async fn create_order(
        &self,
        request: &CreateOrderRequest,
        access_token: Option<&str>,
    ) -> Result<CreatedOrder, BackendError> {
        let value = self
            .rpc(&self.inner.order_function, request, access_token)
            .await?;
        parse_created_order(&value)
    }
}

/// Read the created order from an RPC result.
///
/// Accepts a bare id string, an object with `id` (and optional `status`), or
/// a one-row array of such objects. A missing or unrecognised status reads as
/// [`OrderStatus::Pending`].
///
/// # Errors
///
/// Returns [`BackendError::Parse`] if no order id can be found.
pub fn parse_created_order(value: &Value) -> Result<CreatedOrder, BackendError> {
    match value {
        Value::String(id) if !id.is_empty() => Ok(CreatedOrder {
            id: OrderId::new(id.as_str()),
            status: OrderStatus::default(),
        }),
        Value::Object(row) => {
            let id = match row.get("id").or_else(|| row.get("order_id")) {
                Some(Value::String(id)) if !id.is_empty() => id.clone(),
                Some(Value::Number(n)) => n.to_string(),
                _ => return Err(BackendError::Parse("order row has no id".to_string())),
            };
            // A row with an id is a created order, whatever its status says.
            let status = match row.get("status").and_then(Value::as_str) {
                Some(s) => s.parse::<OrderStatus>().unwrap_or_else(|e| {
                    warn!(order_id = %id, error = %e, "Unknown order status, assuming pending");
                    OrderStatus::default()
                }),
                None => OrderStatus::default(),
            };
            Ok(CreatedOrder {
                id: OrderId::new(id),
                status,
            })
        }
        Value::Array(rows) => match rows.first() {
            Some(row) => parse_created_order(row),
            None => Err(BackendError::Parse("RPC returned no rows".to_string())),
        },
        other => Err(BackendError::Parse(format!(
            "unexpected RPC result: {}",
            other.to_string().chars().take(200).collect::<String>()
        ))),
    }
}

/// Extract a readable message from a gateway error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
        .unwrap_or_else(|| body.chars().take(200).collect())
}
