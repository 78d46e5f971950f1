//! Envelope construction and response correlation.
//!
//! [`build`] turns a method name and its arguments into a tagged
//! [`RequestEnvelope`]; [`validate`] checks a response body against the tag of
//! the request it is supposed to answer and extracts the result payload.

use serde_json::Value;
use tracing::trace;

use super::envelope::{Arguments, RequestEnvelope, SUCCESS, prune_unset};
use super::error::RpcError;
use super::tag::TagSource;

/// Pluggable JSON encoding for envelopes.
///
/// Swap this out to use a different JSON implementation; the default is
/// [`SerdeJsonCodec`].
pub trait JsonCodec: Send + Sync {
    /// Serializes an outbound envelope into a request body.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if the envelope cannot be encoded.
    fn encode(&self, envelope: &RequestEnvelope) -> Result<Vec<u8>, serde_json::Error>;

    /// Parses a response body into a JSON value.
    ///
    /// # Errors
    ///
    /// Returns the parser error if the body is not valid JSON.
    fn decode(&self, body: &[u8]) -> Result<Value, serde_json::Error>;
}

/// [`JsonCodec`] backed by `serde_json`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerdeJsonCodec;

impl JsonCodec for SerdeJsonCodec {
    fn encode(&self, envelope: &RequestEnvelope) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(envelope)
    }

    fn decode(&self, body: &[u8]) -> Result<Value, serde_json::Error> {
        serde_json::from_slice(body)
    }
}

/// Builds a request envelope with a fresh tag.
///
/// Unset arguments (see [`is_unset`](super::envelope::is_unset)) are dropped
/// before the tag is drawn.
///
/// # Errors
///
/// Returns [`RpcError::InvalidRequest`] if `method` is empty.
pub fn build(
    method: &str,
    arguments: Arguments,
    tags: &dyn TagSource,
) -> Result<RequestEnvelope, RpcError> {
    if method.trim().is_empty() {
        return Err(RpcError::invalid_request("method name must not be empty"));
    }
    let arguments = prune_unset(arguments);
    let tag = tags.next_tag();
    trace!(method, tag, keys = arguments.len(), "built request envelope");
    Ok(RequestEnvelope {
        method: method.to_string(),
        arguments,
        tag,
    })
}

/// Validates a response body with the default JSON codec.
///
/// # Errors
///
/// See [`validate_with`].
pub fn validate(body: &[u8], expected_tag: u64) -> Result<Arguments, RpcError> {
    validate_with(&SerdeJsonCodec, body, expected_tag)
}

/// Validates a response body and returns its argument mapping.
///
/// # Errors
///
/// - [`RpcError::MalformedResponse`] if the body is not a JSON object with a
///   `result` field
/// - [`RpcError::RequestFailed`] if `result` is not `success`, whether or
///   not the body carries a tag
/// - [`RpcError::TagMismatch`] if a successful response has a missing tag or
///   one that differs from `expected_tag`
pub fn validate_with(
    codec: &dyn JsonCodec,
    body: &[u8],
    expected_tag: u64,
) -> Result<Arguments, RpcError> {
    let value = codec
        .decode(body)
        .map_err(|e| RpcError::malformed(format!("invalid JSON: {e}")))?;
    let Value::Object(mut envelope) = value else {
        return Err(RpcError::malformed("response is not a JSON object"));
    };
    let Some(result) = envelope.remove("result") else {
        return Err(RpcError::malformed("missing result field"));
    };

    // Daemon-side failures often come back untagged.
    match result {
        Value::String(text) if text == SUCCESS => {}
        Value::String(text) => return Err(RpcError::request_failed(text)),
        other => return Err(RpcError::request_failed(other.to_string())),
    }

    let got = envelope.get("tag").and_then(Value::as_u64);
    if got != Some(expected_tag) {
        return Err(RpcError::tag_mismatch(got, expected_tag));
    }

    match envelope.remove("arguments") {
        Some(Value::Object(arguments)) => Ok(arguments),
        None | Some(Value::Null) => Ok(Arguments::new()),
        Some(other) => Err(RpcError::malformed(format!(
            "arguments is not an object: {other}"
        ))),
    }
}
