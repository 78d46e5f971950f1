//! Request/response engine for the Transmission RPC protocol.
//!
//! A call goes through three steps:
//!
//! 1. [`codec::build`] wraps the method name and arguments into a
//!    [`RequestEnvelope`] with a fresh tag from a [`TagSource`]
//! 2. [`SessionAdapter::send`] posts it with the current session token,
//!    refreshing the token and resending once if the daemon answers 409
//! 3. [`codec::validate_with`] checks the response tag and result and
//!    returns the payload
//!
//! ```text
//! BUILT -> SENT -> [AUTH_RETRY -> SENT] -> VALIDATED | FAILED
//! ```

pub mod codec;
pub mod envelope;
mod error;
pub mod session;
pub mod tag;
pub mod transport;

pub use codec::{JsonCodec, SerdeJsonCodec, build, validate, validate_with};
pub use envelope::{Arguments, RequestEnvelope, ResponseEnvelope, is_unset, prune_unset};
pub use error::{ErrorKind, RpcError};
pub use session::{MAX_HANDSHAKE_ATTEMPTS, SessionAdapter, SessionState};
pub use tag::{DEFAULT_MAX_TAG, TagGenerator, TagSource};
pub use transport::{HttpReply, HttpTransport, SESSION_ID_HEADER, Transport, redact_url};
