//! Error types for the RPC engine.
//!
//! Every call ends either with the response arguments or with exactly one
//! [`RpcError`]. Use [`RpcError::kind`] to branch on the broad failure class
//! instead of matching individual variants.

use thiserror::Error;

/// Broad classification of an [`RpcError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The transport could not complete (DNS, refused, reset, timeout).
    Connect,

    /// A well-formed HTTP response carried an invalid or unsuccessful envelope.
    Protocol,

    /// The session handshake or the credentials were rejected.
    Auth,

    /// The request could not be built (bad method, parameter or URL).
    Request,
}

/// Errors that can occur while executing an RPC call.
#[derive(Debug, Error)]
pub enum RpcError {
    /// Connection-level failure (DNS resolution, connection refused, reset).
    #[error("connection error talking to {url}: {cause}")]
    Connect {
        /// Endpoint URL with credentials redacted.
        url: String,
        /// Full cause chain of the transport error.
        cause: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The request did not complete within the configured timeout.
    #[error("timeout talking to {url}: {cause}")]
    Timeout {
        /// Endpoint URL with credentials redacted.
        url: String,
        /// Full cause chain of the transport error.
        cause: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },

    /// The response body is not JSON or has no `result` field.
    #[error("malformed response: {detail}")]
    MalformedResponse {
        /// What was wrong with the body.
        detail: String,
    },

    /// The response tag does not match the request tag.
    #[error("tag mismatch: got {}, expected {expected}", display_tag(.got))]
    TagMismatch {
        /// Tag found in the response, if any.
        got: Option<u64>,
        /// Tag of the originating request.
        expected: u64,
    },

    /// The daemon answered with a result other than `success`.
    #[error("request failed: {result}")]
    RequestFailed {
        /// Result text returned by the daemon.
        result: String,
    },

    /// The daemon answered with an unexpected HTTP status.
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        /// Endpoint URL with credentials redacted.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The daemon refused the request as misdirected (HTTP 421).
    #[error("misdirected request to {url} (HTTP 421); check the Host header")]
    Misdirected {
        /// Endpoint URL with credentials redacted.
        url: String,
    },

    /// The session handshake did not converge.
    #[error("[AUTH] session handshake with {url} did not converge after {attempts} attempts")]
    AuthFailed {
        /// Endpoint URL with credentials redacted.
        url: String,
        /// Number of requests sent before giving up.
        attempts: u32,
    },

    /// The daemon rejected the configured credentials (HTTP 401).
    #[error("[AUTH] {url} rejected the credentials (HTTP 401)")]
    Unauthorized {
        /// Endpoint URL with credentials redacted.
        url: String,
    },

    /// The request is invalid before anything is sent.
    #[error("invalid request: {reason}")]
    InvalidRequest {
        /// Why the request was rejected.
        reason: String,
    },

    /// The endpoint URL is malformed.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The request envelope could not be serialized.
    #[error("failed to encode request: {source}")]
    Encode {
        /// The underlying serialization error.
        #[source]
        source: serde_json::Error,
    },
}

fn display_tag(tag: &Option<u64>) -> String {
    tag.map_or_else(|| "none".to_string(), |tag| tag.to_string())
}

impl RpcError {
    /// Creates a connection error, capturing the full cause chain of `source`.
    pub fn connect(url: impl Into<String>, source: reqwest::Error) -> Self {
        let cause = error_chain(&source);
        Self::Connect {
            url: url.into(),
            cause,
            source,
        }
    }

    /// Creates a timeout error, capturing the full cause chain of `source`.
    pub fn timeout(url: impl Into<String>, source: reqwest::Error) -> Self {
        let cause = error_chain(&source);
        Self::Timeout {
            url: url.into(),
            cause,
            source,
        }
    }

    /// Classifies a transport error as a timeout or a connection error.
    pub fn from_transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::timeout(url, source)
        } else {
            Self::connect(url, source)
        }
    }

    /// Creates a malformed-response error.
    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::MalformedResponse {
            detail: detail.into(),
        }
    }

    /// Creates a tag mismatch error.
    pub fn tag_mismatch(got: Option<u64>, expected: u64) -> Self {
        Self::TagMismatch { got, expected }
    }

    /// Creates a request-failed error from the daemon's result text.
    pub fn request_failed(result: impl Into<String>) -> Self {
        Self::RequestFailed {
            result: result.into(),
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a misdirected-request error.
    pub fn misdirected(url: impl Into<String>) -> Self {
        Self::Misdirected { url: url.into() }
    }

    /// Creates a handshake failure error.
    pub fn auth_failed(url: impl Into<String>, attempts: u32) -> Self {
        Self::AuthFailed {
            url: url.into(),
            attempts,
        }
    }

    /// Creates an unauthorized error.
    pub fn unauthorized(url: impl Into<String>) -> Self {
        Self::Unauthorized { url: url.into() }
    }

    /// Creates an invalid-request error.
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates an encode error.
    #[must_use]
    pub fn encode(source: serde_json::Error) -> Self {
        Self::Encode { source }
    }

    /// Returns the broad failure class of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Connect { .. } | Self::Timeout { .. } | Self::ClientBuild { .. } => {
                ErrorKind::Connect
            }
            Self::MalformedResponse { .. }
            | Self::TagMismatch { .. }
            | Self::RequestFailed { .. }
            | Self::HttpStatus { .. }
            | Self::Misdirected { .. } => ErrorKind::Protocol,
            Self::AuthFailed { .. } | Self::Unauthorized { .. } => ErrorKind::Auth,
            Self::InvalidRequest { .. } | Self::InvalidUrl { .. } | Self::Encode { .. } => {
                ErrorKind::Request
            }
        }
    }

    /// Returns true when the transport gave up waiting for the daemon.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

// reqwest's Display stops at "error sending request"; the useful part
// ("Connection refused", DNS failure text) lives further down the chain.
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut parts = vec![error.to_string()];
    let mut current = error.source();
    while let Some(inner) = current {
        let text = inner.to_string();
        if parts.last() != Some(&text) {
            parts.push(text);
        }
        current = inner.source();
    }
    parts.join(": ")
}
