//! Integration tests for Bloom Market.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bloom-market-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `checkout_rpc` - Cart checkout against an in-process mock of the hosted
//!   database's RPC gateway
//! - `cart_persistence` - File-backed cart rehydration and sanitization
//!
//! This crate provides [`MockRpcServer`], an `axum` server on an ephemeral
//! port that records every RPC call and answers with a configurable response.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use bloom_market_storefront::config::{BloomConfig, SupabaseConfig};
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use url::Url;

/// Anon key the mock server's clients are configured with.
///
/// Passes the same placeholder and entropy checks as a real key.
pub const TEST_ANON_KEY: &str = "sb-anon-Jq7Rw2Lx9Vt4Kp8Nz3Hm6Fd";

/// One request received by the mock server.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// Remote procedure name from the URL.
    pub function: String,
    /// Request headers, lower-cased names.
    pub headers: HashMap<String, String>,
    /// Parsed JSON body (`Value::Null` if the body was not JSON).
    pub body: Value,
}

impl RecordedCall {
    /// Header value by lower-case name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

#[derive(Clone)]
struct MockState {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    response: Arc<Mutex<(StatusCode, Value)>>,
}

/// Mock of the hosted database RPC gateway.
///
/// The server task is aborted when the value is dropped.
pub struct MockRpcServer {
    addr: SocketAddr,
    state: MockState,
    handle: JoinHandle<()>,
}

impl MockRpcServer {
    /// Start a server answering every call with a new pending order.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let state = MockState {
            calls: Arc::new(Mutex::new(Vec::new())),
            response: Arc::new(Mutex::new((
                StatusCode::OK,
                json!({"id": uuid::Uuid::new_v4().to_string(), "status": "pending"}),
            ))),
        };

        let app = Router::new()
            .route("/rest/v1/rpc/{function}", post(rpc))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock server");
        let addr = listener.local_addr().expect("Mock server has no address");

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    /// Base URL of the server.
    ///
    /// # Panics
    ///
    /// Panics if the socket address does not form a URL.
    #[must_use]
    pub fn url(&self) -> Url {
        Url::parse(&format!("http://{}", self.addr)).expect("Mock server URL is valid")
    }

    /// Configuration pointing a client at this server.
    ///
    /// Loaded through [`BloomConfig::from_lookup`], so the anon key goes
    /// through the usual validation.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is rejected.
    #[must_use]
    pub fn supabase_config(&self) -> SupabaseConfig {
        let url = self.url().to_string();
        let config = BloomConfig::from_lookup(|key| match key {
            "BLOOM_SUPABASE_URL" => Some(url.clone()),
            "BLOOM_SUPABASE_ANON_KEY" => Some(TEST_ANON_KEY.to_string()),
            "BLOOM_HTTP_TIMEOUT_SECS" => Some("5".to_string()),
            _ => None,
        })
        .expect("Mock server configuration is valid");
        config
            .require_supabase()
            .cloned()
            .expect("Mock server configuration has a backend")
    }

    /// Answer subsequent calls with `status` and `body`.
    ///
    /// # Panics
    ///
    /// Panics if the state lock is poisoned.
    pub fn respond_with(&self, status: u16, body: Value) {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        *self.state.response.lock().expect("response lock poisoned") = (status, body);
    }

    /// Calls received so far.
    ///
    /// # Panics
    ///
    /// Panics if the state lock is poisoned.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.calls.lock().expect("calls lock poisoned").clone()
    }
}

impl Drop for MockRpcServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn rpc(
    State(state): State<MockState>,
    Path(function): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let headers = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    let body = serde_json::from_slice(&body).unwrap_or(Value::Null);

    state
        .calls
        .lock()
        .expect("calls lock poisoned")
        .push(RecordedCall {
            function,
            headers,
            body,
        });

    let (status, body) = state
        .response
        .lock()
        .expect("response lock poisoned")
        .clone();
    (status, Json(body))
}
