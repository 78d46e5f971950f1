//! HTTP channel to the daemon.
//!
//! The session adapter only needs "POST these bytes with this session token
//! and tell me the status, the session header and the body". [`Transport`]
//! captures that seam; [`HttpTransport`] implements it on top of `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, HOST};
use tracing::{debug, instrument};
use url::Url;

use super::error::RpcError;

/// Header carrying the session token in both directions.
pub const SESSION_ID_HEADER: &str = "X-Transmission-Session-Id";

/// Upper bound for establishing the TCP connection.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Raw HTTP reply handed back to the session adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    /// HTTP status code.
    pub status: u16,
    /// Value of the session header, if the daemon sent one.
    pub session_id: Option<String>,
    /// Response body.
    pub body: Vec<u8>,
}

/// One-shot HTTP POST to the RPC endpoint.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Posts `body` with the given session token and optional Host override.
    ///
    /// Non-2xx statuses are returned as replies, not errors; only failures to
    /// complete the exchange are errors.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Connect`] or [`RpcError::Timeout`] when the exchange
    /// cannot complete.
    async fn post(
        &self,
        body: &[u8],
        session_id: &str,
        host: Option<&str>,
    ) -> Result<HttpReply, RpcError>;
}

/// [`Transport`] over a pooled `reqwest` client.
///
/// The client is built once and reused for every call; dropping the
/// transport closes its connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    url: Url,
    display_url: String,
}

impl HttpTransport {
    /// Creates a transport posting to `url`.
    ///
    /// Credentials embedded in `url` are sent as HTTP basic auth.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::ClientBuild`] if the HTTP client cannot be built.
    pub fn new(url: Url, timeout: Duration, user_agent: &str) -> Result<Self, RpcError> {
        let client = build_client(timeout, user_agent)
            .map_err(|source| RpcError::ClientBuild { source })?;
        let display_url = redact_url(&url);
        Ok(Self {
            client,
            url,
            display_url,
        })
    }

    /// Endpoint URL with any password masked.
    #[must_use]
    pub fn display_url(&self) -> &str {
        &self.display_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(level = "debug", skip(self, body, session_id), fields(url = %self.display_url, bytes = body.len()))]
    async fn post(
        &self,
        body: &[u8],
        session_id: &str,
        host: Option<&str>,
    ) -> Result<HttpReply, RpcError> {
        let mut request = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(SESSION_ID_HEADER, session_id)
            .body(body.to_vec());
        if let Some(host) = host {
            request = request.header(HOST, host);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RpcError::from_transport(self.display_url.clone(), e))?;

        let status = response.status().as_u16();
        let session_id = response
            .headers()
            .get(SESSION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| RpcError::from_transport(self.display_url.clone(), e))?;

        debug!(status, bytes = body.len(), "received reply");
        Ok(HttpReply {
            status,
            session_id,
            body: body.to_vec(),
        })
    }
}

fn build_client(timeout: Duration, user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT.min(timeout))
        .timeout(timeout)
        .gzip(true)
        .user_agent(user_agent)
        .build()
}

/// Renders `url` with its password replaced by `***`.
#[must_use]
pub fn redact_url(url: &Url) -> String {
    if url.password().is_none() {
        return url.to_string();
    }
    let mut redacted = url.clone();
    if redacted.set_password(Some("***")).is_err() {
        return url.to_string();
    }
    redacted.to_string()
}
