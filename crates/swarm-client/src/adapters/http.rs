use async_trait::async_trait;
use tracing::trace;

use crate::domain::SwarmConfig;
use crate::ports::{HttpRequest, HttpResponse, HttpTransport, NetworkError};

/// `reqwest`-backed transport.
///
/// Snodes serve self-signed certificates, so certificate validation follows
/// `SwarmConfig::accept_invalid_certs`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a client for the given configuration.
    pub fn new(config: &SwarmConfig) -> Result<Self, NetworkError> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .timeout(config.long_poll_timeout.max(config.default_timeout))
            .build()
            .map_err(|e| NetworkError::Failed(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, NetworkError> {
        trace!(url = %request.url, bytes = request.body.len(), "POST");
        let mut builder = self
            .client
            .post(&request.url)
            .timeout(request.timeout)
            .body(request.body);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(map_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(map_error)?.to_vec();
        Ok(HttpResponse { status, body })
    }
}

fn map_error(err: reqwest::Error) -> NetworkError {
    if err.is_timeout() {
        NetworkError::Timeout
    } else if err.is_connect() {
        NetworkError::ConnectionRefused
    } else if err.is_builder() {
        NetworkError::InvalidRequest(err.to_string())
    } else {
        NetworkError::Failed(err.to_string())
    }
}
