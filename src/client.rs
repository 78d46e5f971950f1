//! High-level Transmission client.
//!
//! [`TransmissionClient`] ties together the endpoint configuration, a tag
//! source, a JSON codec and the session adapter, and exposes one async
//! method per RPC operation.
//!
//! # Example
//!
//! ```no_run
//! use trctl_core::{Ids, TransmissionClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = TransmissionClient::builder()
//!     .url("http://nas.local:9091/transmission/rpc")
//!     .username("admin")
//!     .password("secret")
//!     .build()?;
//!
//! client.torrent_start(Some(Ids::from(vec![1_i64, 2]))).await?;
//! let stats = client.session_stats().await?;
//! println!("{stats:?}");
//! client.close();
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, instrument};

use crate::config::ClientConfig;
use crate::methods::{self, Ids, MethodSpec};
use crate::rpc::{
    Arguments, HttpTransport, JsonCodec, RpcError, SerdeJsonCodec, SessionAdapter, TagGenerator,
    TagSource, Transport, build, redact_url,
};
use crate::user_agent;

/// Where a new torrent comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TorrentSource {
    /// Path or URL of a `.torrent` file, or a magnet link.
    Filename(String),
    /// Base64-encoded `.torrent` content.
    Metainfo(String),
}

/// Builder for [`TransmissionClient`].
#[derive(Default)]
pub struct ClientBuilder {
    config: ClientConfig,
    tags: Option<Arc<dyn TagSource>>,
    codec: Option<Arc<dyn JsonCodec>>,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
    /// Starts from an existing configuration.
    #[must_use]
    pub fn from_config(config: ClientConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Sets the RPC endpoint URL.
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.config.url = url.into();
        self
    }

    /// Sets the basic-auth username.
    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.config.username = Some(username.into());
        self
    }

    /// Sets the basic-auth password.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = Some(password.into());
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Sets the Host header override.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = Some(host.into());
        self
    }

    /// Sets the User-Agent header.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    /// Uses a custom tag source instead of a fresh [`TagGenerator`].
    #[must_use]
    pub fn tag_source(mut self, tags: Arc<dyn TagSource>) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Uses a custom JSON codec instead of [`SerdeJsonCodec`].
    #[must_use]
    pub fn codec(mut self, codec: Arc<dyn JsonCodec>) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Uses a custom transport instead of the reqwest-backed one.
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::InvalidUrl`] for a bad endpoint and
    /// [`RpcError::ClientBuild`] if the HTTP client cannot be created.
    pub fn build(self) -> Result<TransmissionClient, RpcError> {
        let endpoint = self.config.endpoint()?;
        let display_url = redact_url(&endpoint);

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => {
                let user_agent = self
                    .config
                    .user_agent
                    .clone()
                    .unwrap_or_else(user_agent::default_user_agent);
                Arc::new(HttpTransport::new(
                    endpoint,
                    self.config.timeout,
                    &user_agent,
                )?)
            }
        };
        let codec: Arc<dyn JsonCodec> = self.codec.unwrap_or_else(|| Arc::new(SerdeJsonCodec));
        let tags: Arc<dyn TagSource> = self
            .tags
            .unwrap_or_else(|| Arc::new(TagGenerator::new()));

        let adapter = SessionAdapter::new(transport, codec, display_url.clone());
        adapter.state().set_host(self.config.host.clone());

        debug!(url = %display_url, timeout = ?self.config.timeout, "client ready");
        Ok(TransmissionClient {
            url: display_url,
            tags,
            adapter,
        })
    }
}

/// Client for one Transmission daemon.
///
/// The client is `Send + Sync`; share it behind an `Arc` to issue calls
/// concurrently. All calls share one HTTP connection pool and one session
/// token.
pub struct TransmissionClient {
    url: String,
    tags: Arc<dyn TagSource>,
    adapter: SessionAdapter,
}

impl std::fmt::Debug for TransmissionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransmissionClient")
            .field("url", &self.url)
            .field("adapter", &self.adapter)
            .finish_non_exhaustive()
    }
}

impl TransmissionClient {
    /// Creates a client from a configuration with default tag source,
    /// codec and transport.
    ///
    /// # Errors
    ///
    /// See [`ClientBuilder::build`].
    pub fn new(config: ClientConfig) -> Result<Self, RpcError> {
        ClientBuilder::from_config(config).build()
    }

    /// Starts building a client.
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Endpoint URL with any password masked.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Current session token; empty before the first handshake.
    #[must_use]
    pub fn session_id(&self) -> String {
        self.adapter.state().token()
    }

    /// Host header override, if any.
    #[must_use]
    pub fn host(&self) -> Option<String> {
        self.adapter.state().host()
    }

    /// Sets or clears the Host header override for subsequent calls.
    pub fn set_host(&self, host: Option<String>) {
        self.adapter.state().set_host(host);
    }

    /// Releases the HTTP channel.
    ///
    /// Dropping the client has the same effect; this makes the end of its
    /// scope explicit.
    pub fn close(self) {
        debug!(url = %self.url, "closing client");
    }

    /// Sends a raw RPC call and returns the response arguments.
    ///
    /// Unset values in `arguments` are dropped before sending.
    ///
    /// # Errors
    ///
    /// Returns any [`RpcError`] raised while building, sending or validating
    /// the call.
    #[instrument(skip(self, arguments), fields(url = %self.url))]
    pub async fn rpc(&self, method: &str, arguments: Arguments) -> Result<Arguments, RpcError> {
        let envelope = build(method, arguments, self.tags.as_ref())?;
        self.adapter.send(&envelope).await
    }

    /// Calls a method from the [`methods`] table by name, mapping parameter
    /// names to wire keys.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::InvalidRequest`] for an unknown method or
    /// parameter, plus anything [`rpc`](Self::rpc) can return.
    pub async fn call<I, K, V>(&self, method: &str, params: I) -> Result<Arguments, RpcError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let Some(spec) = methods::lookup(method) else {
            return Err(RpcError::invalid_request(format!(
                "unknown method `{method}`"
            )));
        };
        self.invoke(spec, params).await
    }

    async fn invoke<I, K, V>(&self, spec: &MethodSpec, params: I) -> Result<Arguments, RpcError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let arguments = spec.arguments(params)?;
        self.rpc(spec.name, arguments).await
    }

    async fn with_ids(&self, spec: &MethodSpec, ids: Option<Ids>) -> Result<Arguments, RpcError> {
        self.invoke(spec, [("ids", ids_value(ids))]).await
    }

    /// Starts torrents (all torrents when `ids` is `None`).
    ///
    /// # Errors
    ///
    /// See [`rpc`](Self::rpc).
    pub async fn torrent_start(&self, ids: Option<Ids>) -> Result<Arguments, RpcError> {
        self.with_ids(&methods::TORRENT_START, ids).await
    }

    /// Starts torrents, bypassing the download queue.
    ///
    /// # Errors
    ///
    /// See [`rpc`](Self::rpc).
    pub async fn torrent_start_now(&self, ids: Option<Ids>) -> Result<Arguments, RpcError> {
        self.with_ids(&methods::TORRENT_START_NOW, ids).await
    }

    /// Stops torrents.
    ///
    /// # Errors
    ///
    /// See [`rpc`](Self::rpc).
    pub async fn torrent_stop(&self, ids: Option<Ids>) -> Result<Arguments, RpcError> {
        self.with_ids(&methods::TORRENT_STOP, ids).await
    }

    /// Queues torrents for local data verification.
    ///
    /// # Errors
    ///
    /// See [`rpc`](Self::rpc).
    pub async fn torrent_verify(&self, ids: Option<Ids>) -> Result<Arguments, RpcError> {
        self.with_ids(&methods::TORRENT_VERIFY, ids).await
    }

    /// Asks trackers for more peers.
    ///
    /// # Errors
    ///
    /// See [`rpc`](Self::rpc).
    pub async fn torrent_reannounce(&self, ids: Option<Ids>) -> Result<Arguments, RpcError> {
        self.with_ids(&methods::TORRENT_REANNOUNCE, ids).await
    }

    /// Changes torrent properties; `changes` uses [`methods::TORRENT_SET`]
    /// parameter names.
    ///
    /// # Errors
    ///
    /// See [`call`](Self::call).
    pub async fn torrent_set<I, K, V>(
        &self,
        ids: Option<Ids>,
        changes: I,
    ) -> Result<Arguments, RpcError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut arguments = methods::TORRENT_SET.arguments(changes)?;
        arguments.insert("ids".to_string(), ids_value(ids));
        self.rpc(methods::TORRENT_SET.name, arguments).await
    }

    /// Fetches torrent fields. The result holds a `torrents` array.
    ///
    /// `format` is `objects` (the default when `None`) or `table`.
    ///
    /// # Errors
    ///
    /// See [`rpc`](Self::rpc).
    pub async fn torrent_get(
        &self,
        fields: &[&str],
        format: Option<&str>,
        ids: Option<Ids>,
    ) -> Result<Arguments, RpcError> {
        self.invoke(
            &methods::TORRENT_GET,
            [
                ("fields", Value::from(fields.to_vec())),
                ("format", format.map_or(Value::Null, Value::from)),
                ("ids", ids_value(ids)),
            ],
        )
        .await
    }

    /// Adds a torrent; `options` uses [`methods::TORRENT_ADD`] parameter
    /// names. The result holds `torrent-added` or `torrent-duplicate`.
    ///
    /// # Errors
    ///
    /// See [`call`](Self::call).
    pub async fn torrent_add<I, K, V>(
        &self,
        source: TorrentSource,
        options: I,
    ) -> Result<Arguments, RpcError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut arguments = methods::TORRENT_ADD.arguments(options)?;
        let (key, value) = match source {
            TorrentSource::Filename(filename) => ("filename", filename),
            TorrentSource::Metainfo(metainfo) => ("metainfo", metainfo),
        };
        arguments.insert(key.to_string(), Value::from(value));
        self.rpc(methods::TORRENT_ADD.name, arguments).await
    }

    /// Removes torrents, optionally deleting their data.
    ///
    /// # Errors
    ///
    /// See [`rpc`](Self::rpc).
    pub async fn torrent_remove(
        &self,
        ids: Option<Ids>,
        delete_local_data: bool,
    ) -> Result<Arguments, RpcError> {
        self.invoke(
            &methods::TORRENT_REMOVE,
            [
                ("ids", ids_value(ids)),
                ("delete_local_data", Value::from(delete_local_data)),
            ],
        )
        .await
    }

    /// Moves torrent data to `location`, or just points the torrent there
    /// when `move_data` is false.
    ///
    /// # Errors
    ///
    /// See [`rpc`](Self::rpc).
    pub async fn torrent_set_location(
        &self,
        ids: Option<Ids>,
        location: &str,
        move_data: bool,
    ) -> Result<Arguments, RpcError> {
        self.invoke(
            &methods::TORRENT_SET_LOCATION,
            [
                ("ids", ids_value(ids)),
                ("location", Value::from(location)),
                ("move", Value::from(move_data)),
            ],
        )
        .await
    }

    /// Renames a file or folder inside one torrent.
    ///
    /// # Errors
    ///
    /// See [`rpc`](Self::rpc).
    pub async fn torrent_rename_path(
        &self,
        ids: Option<Ids>,
        path: &str,
        name: &str,
    ) -> Result<Arguments, RpcError> {
        self.invoke(
            &methods::TORRENT_RENAME_PATH,
            [
                ("ids", ids_value(ids)),
                ("path", Value::from(path)),
                ("name", Value::from(name)),
            ],
        )
        .await
    }

    /// Changes session settings; `changes` uses [`methods::SESSION_SET`]
    /// parameter names.
    ///
    /// # Errors
    ///
    /// See [`call`](Self::call).
    pub async fn session_set<I, K, V>(&self, changes: I) -> Result<Arguments, RpcError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.invoke(&methods::SESSION_SET, changes).await
    }

    /// Reads session settings (all of them when `fields` is empty).
    ///
    /// # Errors
    ///
    /// See [`rpc`](Self::rpc).
    pub async fn session_get(&self, fields: &[&str]) -> Result<Arguments, RpcError> {
        self.invoke(
            &methods::SESSION_GET,
            [("fields", Value::from(fields.to_vec()))],
        )
        .await
    }

    /// Reads session statistics.
    ///
    /// # Errors
    ///
    /// See [`rpc`](Self::rpc).
    pub async fn session_stats(&self) -> Result<Arguments, RpcError> {
        self.rpc(methods::SESSION_STATS.name, Arguments::new()).await
    }

    /// Reloads the blocklist; the result holds `blocklist-size`.
    ///
    /// # Errors
    ///
    /// See [`rpc`](Self::rpc).
    pub async fn blocklist_update(&self) -> Result<Arguments, RpcError> {
        self.rpc(methods::BLOCKLIST_UPDATE.name, Arguments::new())
            .await
    }

    /// Checks whether the peer port is reachable; the result holds
    /// `port-is-open`.
    ///
    /// # Errors
    ///
    /// See [`rpc`](Self::rpc).
    pub async fn port_test(&self) -> Result<Arguments, RpcError> {
        self.rpc(methods::PORT_TEST.name, Arguments::new()).await
    }

    /// Shuts the daemon down.
    ///
    /// # Errors
    ///
    /// See [`rpc`](Self::rpc).
    pub async fn session_close(&self) -> Result<Arguments, RpcError> {
        self.rpc(methods::SESSION_CLOSE.name, Arguments::new()).await
    }

    /// Moves torrents to the top of the queue.
    ///
    /// # Errors
    ///
    /// See [`rpc`](Self::rpc).
    pub async fn queue_move_top(&self, ids: Option<Ids>) -> Result<Arguments, RpcError> {
        self.with_ids(&methods::QUEUE_MOVE_TOP, ids).await
    }

    /// Moves torrents one position up the queue.
    ///
    /// # Errors
    ///
    /// See [`rpc`](Self::rpc).
    pub async fn queue_move_up(&self, ids: Option<Ids>) -> Result<Arguments, RpcError> {
        self.with_ids(&methods::QUEUE_MOVE_UP, ids).await
    }

    /// Moves torrents one position down the queue.
    ///
    /// # Errors
    ///
    /// See [`rpc`](Self::rpc).
    pub async fn queue_move_down(&self, ids: Option<Ids>) -> Result<Arguments, RpcError> {
        self.with_ids(&methods::QUEUE_MOVE_DOWN, ids).await
    }

    /// Moves torrents to the bottom of the queue.
    ///
    /// # Errors
    ///
    /// See [`rpc`](Self::rpc).
    pub async fn queue_move_bottom(&self, ids: Option<Ids>) -> Result<Arguments, RpcError> {
        self.with_ids(&methods::QUEUE_MOVE_BOTTOM, ids).await
    }

    /// Reports free space in `path`; the result holds `path` and `size-bytes`.
    ///
    /// # Errors
    ///
    /// See [`rpc`](Self::rpc).
    pub async fn free_space(&self, path: &str) -> Result<Arguments, RpcError> {
        self.invoke(&methods::FREE_SPACE, [("path", Value::from(path))])
            .await
    }
}

fn ids_value(ids: Option<Ids>) -> Value {
    ids.map_or(Value::Null, Value::from)
}
