//! Transmission RPC client library.
//!
//! Talks to a Transmission BitTorrent daemon over its JSON-over-HTTP RPC
//! interface: builds tagged request envelopes, handles the session-token
//! handshake, validates responses and exposes one typed call per RPC method.
//!
//! # Architecture
//!
//! - [`rpc`] - envelope codec, tag generation, transport and session adapter
//! - [`methods`] - declarative method and parameter table, torrent selectors
//! - [`config`] - endpoint settings
//! - [`client`] - [`TransmissionClient`] facade

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod methods;
pub mod rpc;
pub(crate) mod user_agent;

#[cfg(test)]
pub mod test_support;

// Re-export commonly used types
pub use client::{ClientBuilder, TorrentSource, TransmissionClient};
pub use config::{ClientConfig, DEFAULT_TIMEOUT_SECS, DEFAULT_URL};
pub use methods::{Ids, MethodSpec, TorrentRef};
pub use rpc::{Arguments, ErrorKind, RpcError, TagGenerator, TagSource};
