//! HTTP Transport
//!
//! The engine only needs a GET that yields a status code and a byte stream.
//! `HttpTransport` provides it over reqwest; tests may plug in their own.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{BoxStream, StreamExt};
use tracing::warn;

use super::error::{Result, UpdateError};

/// Default User-Agent header sent with feed and package requests
pub const DEFAULT_USER_AGENT: &str = concat!("feed-updater/", env!("CARGO_PKG_VERSION"));

/// Response handle: status plus a body that has not been read yet
pub struct TransportResponse {
    pub status: u16,
    pub body: BoxStream<'static, Result<Bytes>>,
}

impl TransportResponse {
    /// Build a response from an in-memory body
    pub fn from_bytes(status: u16, body: impl Into<Bytes>) -> Self {
        let body: Bytes = body.into();
        Self {
            status,
            body: futures_util::stream::once(async move { Ok::<_, UpdateError>(body) }).boxed(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Drain the body into memory
    pub async fn collect(mut self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        while let Some(chunk) = self.body.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf)
    }
}

impl std::fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET. Non-2xx statuses are returned, not turned into errors.
    async fn get(&self, url: &str) -> Result<TransportResponse>;
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::with_user_agent(DEFAULT_USER_AGENT)
    }

    /// Client sending `user_agent`. An agent that is not a valid header
    /// value is logged and replaced by [`DEFAULT_USER_AGENT`].
    pub fn with_user_agent(user_agent: &str) -> Self {
        let client = match reqwest::Client::builder().user_agent(user_agent).build() {
            Ok(client) => client,
            Err(e) => {
                warn!(user_agent, error = %e, "unusable user agent, using the default");
                reqwest::Client::builder()
                    .user_agent(DEFAULT_USER_AGENT)
                    .build()
                    .unwrap_or_default()
            }
        };
        Self { client }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<TransportResponse> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(UpdateError::from))
            .boxed();
        Ok(TransportResponse { status, body })
    }
}
