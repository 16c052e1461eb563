//! HTTP transport seam
//!
//! `Transport` is the only way the pipeline reaches the network. The
//! production stack is `LimitedTransport<HttpTransport>`: reqwest does the
//! I/O, the limiter enforces the connection ceiling shared by every stage.
//! Logical task limits live in the worker pools above this layer; when they
//! exceed the connection ceiling, excess requests wait here for a permit.

use crate::config::StatsConfig;
use crate::error::{PipelineError, TransportError};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Status and body of a completed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Raw response body
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Create response
    #[inline]
    #[must_use]
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is 2xx
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// GET-only transport
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET request
    ///
    /// # Errors
    /// `TransportError` on timeout, connection failure or unreadable body.
    /// Non-2xx statuses are returned as `Ok`.
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        (**self).get(url).await
    }
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build client with the configured connect and request timeouts
    ///
    /// # Errors
    /// `PipelineError::TransportSetup` if the TLS backend cannot initialise
    pub fn new(config: &StatsConfig) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .pool_max_idle_per_host(config.max_connections)
            .user_agent(concat!("lstats/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PipelineError::TransportSetup(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(map_reqwest_error)?;

        Ok(HttpResponse::new(status, body.to_vec()))
    }
}

fn map_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_decode() || e.is_body() {
        TransportError::Decode(e.to_string())
    } else {
        TransportError::Network(e.to_string())
    }
}

/// Caps simultaneous in-flight requests of the wrapped transport
///
/// A permit is held for the whole request, body included. Waiting longer
/// than `acquire_timeout` for a permit counts as a timeout.
#[derive(Debug)]
pub struct LimitedTransport<T> {
    inner: T,
    permits: Arc<Semaphore>,
    max_connections: usize,
    acquire_timeout: Duration,
}

impl<T: Transport> LimitedTransport<T> {
    /// Wrap `inner` with a ceiling of `max_connections`
    #[must_use]
    pub fn new(inner: T, max_connections: usize, acquire_timeout: Duration) -> Self {
        let max_connections = max_connections.max(1);
        Self {
            inner,
            permits: Arc::new(Semaphore::new(max_connections)),
            max_connections,
            acquire_timeout,
        }
    }

    /// Connection ceiling
    #[inline]
    #[must_use]
    pub fn max_connections(&self) -> usize {
        self.max_connections
    }

    /// Requests currently holding a connection
    #[inline]
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.max_connections - self.permits.available_permits()
    }
}

impl LimitedTransport<HttpTransport> {
    /// Production transport for `config`
    ///
    /// # Errors
    /// `PipelineError::TransportSetup` if the HTTP client cannot be built
    pub fn from_config(config: &StatsConfig) -> Result<Self, PipelineError> {
        Ok(Self::new(
            HttpTransport::new(config)?,
            config.max_connections,
            config.connection_request_timeout(),
        ))
    }
}

#[async_trait]
impl<T: Transport> Transport for LimitedTransport<T> {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let _permit = match tokio::time::timeout(self.acquire_timeout, self.permits.acquire()).await
        {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => return Err(TransportError::Network("connection pool closed".to_string())),
            Err(_) => {
                tracing::debug!(url, "timed out waiting for a free connection");
                return Err(TransportError::Timeout);
            }
        };
        self.inner.get(url).await
    }
}
