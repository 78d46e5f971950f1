//! Endpoint configuration for [`TransmissionClient`](crate::TransmissionClient).

use std::fmt;
use std::time::Duration;

use url::Url;

use crate::rpc::RpcError;

/// Default RPC endpoint of a local daemon.
pub const DEFAULT_URL: &str = "http://127.0.0.1:9091/transmission/rpc";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Immutable endpoint settings, fixed at client construction.
#[derive(Clone)]
pub struct ClientConfig {
    /// RPC endpoint URL.
    pub url: String,
    /// Username for HTTP basic auth.
    pub username: Option<String>,
    /// Password for HTTP basic auth.
    pub password: Option<String>,
    /// Per-request timeout, covering connect and response.
    pub timeout: Duration,
    /// Host header override, for daemons with a host whitelist.
    pub host: Option<String>,
    /// User-Agent override.
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            username: None,
            password: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            host: None,
            user_agent: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("timeout", &self.timeout)
            .field("host", &self.host)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl ClientConfig {
    /// Resolves the endpoint URL, embedding credentials into its authority.
    ///
    /// Credentials are embedded when either the username or the password is
    /// non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::InvalidUrl`] if the URL cannot be parsed or cannot
    /// carry credentials.
    pub fn endpoint(&self) -> Result<Url, RpcError> {
        let mut url = Url::parse(&self.url).map_err(|_| RpcError::invalid_url(&self.url))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(RpcError::invalid_url(&self.url));
        }

        let username = self.username.as_deref().unwrap_or_default();
        let password = self.password.as_deref().unwrap_or_default();
        if !username.is_empty() || !password.is_empty() {
            url.set_username(username)
                .map_err(|()| RpcError::invalid_url(&self.url))?;
            url.set_password(Some(password).filter(|p| !p.is_empty()))
                .map_err(|()| RpcError::invalid_url(&self.url))?;
        }
        Ok(url)
    }
}
