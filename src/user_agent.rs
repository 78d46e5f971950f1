//! User-Agent string sent with every RPC request.

/// Default User-Agent (identifies the tool and its version).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("trctl/{version} (transmission-rpc-client)")
}
