//! Wire envelopes exchanged with the daemon.
//!
//! ```json
//! {"method": "torrent-start", "arguments": {"ids": [1, 2]}, "tag": 2}
//! {"result": "success", "arguments": {}, "tag": 2}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Argument mapping carried by requests and responses.
pub type Arguments = Map<String, Value>;

/// Result text the daemon uses for a successful call.
pub const SUCCESS: &str = "success";

/// Outbound RPC envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// RPC method name, e.g. `torrent-get`.
    pub method: String,
    /// Method arguments with unset values already removed.
    pub arguments: Arguments,
    /// Correlation tag echoed by the daemon.
    pub tag: u64,
}

/// Inbound RPC envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// `success`, or the daemon's error text.
    pub result: String,
    /// Result payload, absent for calls that return nothing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Arguments>,
    /// Tag of the request this answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<u64>,
}

impl ResponseEnvelope {
    /// Returns true when the daemon reported success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result == SUCCESS
    }
}

/// Returns true when `value` counts as "not set" on the wire.
///
/// The protocol treats a missing key as "use the default", so null, `false`,
/// zero, and empty strings, arrays and objects are all left out of requests.
#[must_use]
pub fn is_unset(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n == 0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// Removes every unset value from `arguments`.
#[must_use]
pub fn prune_unset(mut arguments: Arguments) -> Arguments {
    arguments.retain(|_, value| !is_unset(value));
    arguments
}
