//! Session token handling and the 409 handshake.
//!
//! The daemon rejects requests carrying a missing or stale session token
//! with HTTP 409 and a fresh token in the `X-Transmission-Session-Id`
//! header. [`SessionAdapter::send`] stores that token and resends the same
//! body once; a second 409 ends the call with [`RpcError::AuthFailed`].

use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, instrument};

use super::codec::{self, JsonCodec};
use super::envelope::{Arguments, RequestEnvelope};
use super::error::RpcError;
use super::transport::Transport;

/// Requests sent per call before giving up on the handshake.
pub const MAX_HANDSHAKE_ATTEMPTS: u32 = 2;

/// Mutable per-client session data: the token and the Host override.
#[derive(Debug, Default)]
pub struct SessionState {
    token: RwLock<String>,
    host: RwLock<Option<String>>,
}

impl SessionState {
    /// Creates an empty session (no token, no Host override).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current session token; empty until the first handshake.
    #[must_use]
    pub fn token(&self) -> String {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Host header override, if any.
    #[must_use]
    pub fn host(&self) -> Option<String> {
        self.host
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Sets or clears the Host header override.
    pub fn set_host(&self, host: Option<String>) {
        *self.host.write().unwrap_or_else(PoisonError::into_inner) = host;
    }

    /// Replaces the token with `fresh` if it still equals `stale`.
    ///
    /// Returns false when another call already replaced `stale`; that
    /// caller's token is kept.
    pub fn refresh(&self, stale: &str, fresh: &str) -> bool {
        let mut token = self.token.write().unwrap_or_else(PoisonError::into_inner);
        if *token != stale {
            return false;
        }
        *token = fresh.to_string();
        true
    }
}

/// Sends envelopes over a [`Transport`] and runs the session handshake.
pub struct SessionAdapter {
    transport: Arc<dyn Transport>,
    codec: Arc<dyn JsonCodec>,
    state: SessionState,
    endpoint: String,
}

impl std::fmt::Debug for SessionAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionAdapter")
            .field("endpoint", &self.endpoint)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl SessionAdapter {
    /// Creates an adapter. `endpoint` is only used in error messages and
    /// must not contain secrets.
    pub fn new(
        transport: Arc<dyn Transport>,
        codec: Arc<dyn JsonCodec>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            codec,
            state: SessionState::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Session state shared by every call through this adapter.
    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Sends `envelope` and returns the validated response arguments.
    ///
    /// # Errors
    ///
    /// - [`RpcError::Connect`] / [`RpcError::Timeout`] from the transport
    /// - [`RpcError::AuthFailed`] if the daemon answers 409 twice, or 409
    ///   without a token
    /// - [`RpcError::Unauthorized`] on 401, [`RpcError::Misdirected`] on 421,
    ///   [`RpcError::HttpStatus`] on any other non-2xx status
    /// - any validation error from [`codec::validate_with`]
    #[instrument(level = "debug", skip(self, envelope), fields(method = %envelope.method, tag = envelope.tag))]
    pub async fn send(&self, envelope: &RequestEnvelope) -> Result<Arguments, RpcError> {
        let body = self.codec.encode(envelope).map_err(RpcError::encode)?;
        let host = self.state.host();
        let mut token = self.state.token();
        let mut attempts = 0;

        loop {
            attempts += 1;
            let reply = self
                .transport
                .post(&body, &token, host.as_deref())
                .await?;

            match reply.status {
                409 => {
                    if attempts >= MAX_HANDSHAKE_ATTEMPTS {
                        debug!(attempts, "session token rejected after refresh");
                        return Err(RpcError::auth_failed(&self.endpoint, attempts));
                    }
                    let Some(fresh) = reply.session_id.filter(|id| !id.is_empty()) else {
                        return Err(RpcError::auth_failed(&self.endpoint, attempts));
                    };
                    if !self.state.refresh(&token, &fresh) {
                        debug!("session token already refreshed by a concurrent call");
                    }
                    debug!("session token refreshed; resending");
                    token = fresh;
                }
                401 => return Err(RpcError::unauthorized(&self.endpoint)),
                421 => return Err(RpcError::misdirected(&self.endpoint)),
                status if !(200..300).contains(&status) => {
                    return Err(RpcError::http_status(&self.endpoint, status));
                }
                _ => {
                    return codec::validate_with(self.codec.as_ref(), &reply.body, envelope.tag);
                }
            }
        }
    }
}
