//! # Encrypted Proxy Transport
//!
//! Relays one request through a random pooled snode so that only the
//! target can read it.
//!
//! ## Snode targets
//!
//! ```text
//! POST {intermediary}/proxy
//! X-Sender-Public-Key: hex(ephemeral public key)
//! X-Target-Snode-Key:  target ed25519 key
//! body: IV ‖ AES-CBC({method, body, headers})
//! ```
//!
//! The reply is `base64(IV ‖ AES-CBC({status, body}))`.
//!
//! ## Server targets
//!
//! `{intermediary}/file_proxy` with a JSON `{cipherText64}` body; the reply
//! is `{meta: {code}, data}` where `data` is encrypted the same way.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Value};
use tracing::{debug, warn};

use swarm_telemetry::{metric_inc, PROXY_REQUESTS};

use crate::domain::rpc::canonical_headers;
use crate::domain::target::{FILE_PROXY_PATH, PROXY_PATH};
use crate::domain::{EphemeralKeyPair, ServerTarget, SharedKey, SnodeTarget, SwarmError};
use crate::ports::{HttpRequest, HttpResponse, HttpTransport};

use super::directory::SnodeDirectory;

/// Route on the file server that unwraps proxied requests.
const SECURE_RPC_ROUTE: &str = "/loki/v1/secure_rpc";

/// Request to relay.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    /// HTTP verb seen by the target
    pub method: String,
    /// Path relative to the target (server targets only)
    pub endpoint: String,
    /// Headers seen by the target
    pub headers: BTreeMap<String, String>,
    /// Body seen by the target
    pub body: Option<String>,
    /// Timeout for the hop to the intermediary
    pub timeout: Duration,
}

impl ProxyRequest {
    /// A JSON POST.
    pub fn post_json(endpoint: impl Into<String>, body: &Value, timeout: Duration) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self {
            method: "POST".to_string(),
            endpoint: endpoint.into(),
            headers,
            body: Some(body.to_string()),
            timeout,
        }
    }

    /// Add or replace a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Single-hop encrypted relay.
pub struct SnodeProxy {
    transport: Arc<dyn HttpTransport>,
    directory: Arc<SnodeDirectory>,
    snode_keys: EphemeralKeyPair,
    server_keys: EphemeralKeyPair,
}

impl SnodeProxy {
    /// Create a proxy with fresh session key pairs.
    pub fn new(transport: Arc<dyn HttpTransport>, directory: Arc<SnodeDirectory>) -> Self {
        Self {
            transport,
            directory,
            snode_keys: EphemeralKeyPair::generate(),
            server_keys: EphemeralKeyPair::generate(),
        }
    }

    /// Hex public key presented to snode targets.
    pub fn snode_public_key_hex(&self) -> String {
        self.snode_keys.public_key_hex()
    }

    /// Relay a request to a snode. Returns the target's logical response.
    pub async fn send_to_snode(
        &self,
        target: &SnodeTarget,
        request: ProxyRequest,
    ) -> Result<HttpResponse, SwarmError> {
        let keys = target
            .public_key_set
            .as_ref()
            .ok_or(SwarmError::TargetKeyMissing)?;
        let shared = self.snode_keys.shared_key(&keys.encryption_key)?;
        let intermediary = self.directory.random_snode_excluding(Some(target)).await?;
        debug!(snode = %target, via = %intermediary, "Proxying request");

        let descriptor = json!({
            "method": request.method,
            "body": request.body,
            "headers": canonical_headers(&request.headers),
        });
        let outer = HttpRequest::post_bytes(
            intermediary.url(PROXY_PATH),
            shared.encrypt(descriptor.to_string().as_bytes()),
            request.timeout,
        )
        .with_header("X-Sender-Public-Key", self.snode_keys.public_key_hex())
        .with_header("X-Target-Snode-Key", keys.id_key.clone());

        let response = self.relay(&intermediary, outer).await?;
        let result = open_snode_response(&shared, &response.body);
        record_outcome(&result);
        result
    }

    /// Relay a request to a dedicated server through a snode's file proxy.
    pub async fn send_to_server(
        &self,
        server: &ServerTarget,
        request: ProxyRequest,
    ) -> Result<HttpResponse, SwarmError> {
        let shared = self.server_keys.shared_key(&server.encryption_key)?;
        let intermediary = self.directory.random_snode().await?;
        debug!(server = %server.base_url, via = %intermediary, "Proxying server request");

        let descriptor = json!({
            "body": request.body,
            "endpoint": request.endpoint.trim_start_matches('/'),
            "method": request.method,
            "headers": canonical_headers(&request.headers),
        });
        let cipher_text = BASE64.encode(shared.encrypt(descriptor.to_string().as_bytes()));

        let mut ephemeral_key = Vec::with_capacity(33);
        ephemeral_key.push(0x05);
        ephemeral_key.extend_from_slice(&self.server_keys.public_key_bytes());
        let forwarded_headers =
            json!({ "X-Loki-File-Server-Ephemeral-Key": BASE64.encode(ephemeral_key) });

        let outer = HttpRequest::post_json(
            intermediary.url(FILE_PROXY_PATH),
            &json!({ "cipherText64": cipher_text }),
            request.timeout,
        )
        .with_header("X-Loki-File-Server-Target", SECURE_RPC_ROUTE)
        .with_header("X-Loki-File-Server-Verb", "POST")
        .with_header("X-Loki-File-Server-Headers", forwarded_headers.to_string())
        .with_header("Connection", "close");

        let response = self.relay(&intermediary, outer).await?;
        let result = open_server_response(&shared, &response.body);
        record_outcome(&result);
        result
    }

    /// POST to the intermediary, applying its bookkeeping.
    async fn relay(
        &self,
        intermediary: &SnodeTarget,
        request: HttpRequest,
    ) -> Result<HttpResponse, SwarmError> {
        let response = match self.transport.execute(request).await {
            Ok(response) => response,
            Err(err) => {
                if err.is_unreachable() {
                    self.directory.report_failure(intermediary, None);
                }
                metric_inc!(PROXY_REQUESTS, &["failed"]);
                return Err(err.into());
            }
        };
        match response.status {
            404 => {
                warn!(snode = %intermediary, "Snode doesn't support proxying; removing from pool");
                self.directory.remove_from_pool(intermediary);
                metric_inc!(PROXY_REQUESTS, &["failed"]);
                Err(SwarmError::RequestFailed { status: 404 })
            }
            status if !response.is_success() => {
                metric_inc!(PROXY_REQUESTS, &["failed"]);
                Err(SwarmError::RequestFailed { status })
            }
            _ => {
                self.directory.report_success(intermediary);
                Ok(response)
            }
        }
    }
}

fn record_outcome(result: &Result<HttpResponse, SwarmError>) {
    let outcome = if result.is_ok() { "success" } else { "failed" };
    metric_inc!(PROXY_REQUESTS, &[outcome]);
}

/// Decrypt `base64(IV ‖ ciphertext)` into `{status, body}`.
fn open_snode_response(shared: &SharedKey, body: &[u8]) -> Result<HttpResponse, SwarmError> {
    let text = std::str::from_utf8(body)
        .map_err(|_| SwarmError::Transport("proxy response is not text".to_string()))?;
    let sealed = BASE64
        .decode(text.trim())
        .map_err(|_| SwarmError::Transport("proxy response is not base64".to_string()))?;
    let plain = shared.decrypt(&sealed)?;
    let json: Value = serde_json::from_slice(&plain)
        .map_err(|_| SwarmError::Transport("proxy response is not JSON".to_string()))?;

    let status = json
        .get("status")
        .and_then(Value::as_u64)
        .and_then(|s| u16::try_from(s).ok())
        .ok_or_else(|| SwarmError::Transport("proxy response has no status".to_string()))?;
    // Without a body field the whole decrypted payload is the body
    let body = match json.get("body") {
        Some(Value::String(s)) => s.clone().into_bytes(),
        Some(Value::Null) | None => plain,
        Some(other) => other.to_string().into_bytes(),
    };
    Ok(HttpResponse { status, body })
}

/// Unwrap `{meta: {code}, data}` and decrypt `data` for 2xx codes.
fn open_server_response(shared: &SharedKey, body: &[u8]) -> Result<HttpResponse, SwarmError> {
    let (status, data) = unwrap_meta(body)
        .ok_or_else(|| SwarmError::Transport("file proxy response has no meta code".to_string()))?;
    if !(200..300).contains(&status) {
        return Ok(HttpResponse {
            status,
            body: Vec::new(),
        });
    }
    let data = data.ok_or_else(|| SwarmError::Transport("file proxy response has no data".to_string()))?;
    let sealed = BASE64
        .decode(data)
        .map_err(|_| SwarmError::Transport("file proxy data is not base64".to_string()))?;
    let plain = shared.decrypt(&sealed)?;
    // The decrypted body usually carries the server's own status
    let status = unwrap_meta(&plain).map_or(status, |(inner, _)| inner);
    Ok(HttpResponse {
        status,
        body: plain,
    })
}

fn unwrap_meta(body: &[u8]) -> Option<(u16, Option<String>)> {
    let json: Value = serde_json::from_slice(body).ok()?;
    let code = json
        .get("meta")?
        .get("code")?
        .as_u64()
        .and_then(|c| u16::try_from(c).ok())?;
    let data = json.get("data").and_then(Value::as_str).map(str::to_string);
    Some((code, data))
}
