//! Declarative table of RPC methods and their argument keys.
//!
//! The wire protocol mixes hyphenated (`download-dir`) and camelCase
//! (`bandwidthPriority`) argument keys. Each [`MethodSpec`] maps the
//! snake_case parameter names used in Rust to the exact wire keys, so
//! callers never spell wire keys by hand.

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::rpc::{Arguments, RpcError};

/// One parameter of an RPC method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    /// snake_case parameter name.
    pub name: &'static str,
    /// Key used on the wire.
    pub wire: &'static str,
}

const fn param(name: &'static str, wire: &'static str) -> Param {
    Param { name, wire }
}

/// An RPC method and the parameters it accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodSpec {
    /// Method name sent on the wire.
    pub name: &'static str,
    /// Accepted parameters.
    pub params: &'static [Param],
}

impl MethodSpec {
    /// Resolves a parameter given by snake_case name or wire key.
    #[must_use]
    pub fn wire_key(&self, name: &str) -> Option<&'static str> {
        self.params
            .iter()
            .find(|p| p.name == name || p.wire == name)
            .map(|p| p.wire)
    }

    /// Maps `(parameter, value)` pairs onto a wire argument object.
    ///
    /// Unset values are kept here; the codec drops them when the envelope
    /// is built.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::InvalidRequest`] for a parameter this method does
    /// not accept.
    pub fn arguments<I, K, V>(&self, params: I) -> Result<Arguments, RpcError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut arguments = Arguments::new();
        for (name, value) in params {
            let name = name.as_ref();
            let Some(wire) = self.wire_key(name) else {
                return Err(RpcError::invalid_request(format!(
                    "unknown parameter `{name}` for method `{}`",
                    self.name
                )));
            };
            arguments.insert(wire.to_string(), value.into());
        }
        Ok(arguments)
    }
}

const IDS: &[Param] = &[param("ids", "ids")];
const NONE: &[Param] = &[];

/// Starts torrents.
pub const TORRENT_START: MethodSpec = MethodSpec {
    name: "torrent-start",
    params: IDS,
};
/// Starts torrents, bypassing the queue.
pub const TORRENT_START_NOW: MethodSpec = MethodSpec {
    name: "torrent-start-now",
    params: IDS,
};
/// Stops torrents.
pub const TORRENT_STOP: MethodSpec = MethodSpec {
    name: "torrent-stop",
    params: IDS,
};
/// Verifies local torrent data.
pub const TORRENT_VERIFY: MethodSpec = MethodSpec {
    name: "torrent-verify",
    params: IDS,
};
/// Asks trackers for more peers.
pub const TORRENT_REANNOUNCE: MethodSpec = MethodSpec {
    name: "torrent-reannounce",
    params: IDS,
};

/// Changes per-torrent properties.
pub const TORRENT_SET: MethodSpec = MethodSpec {
    name: "torrent-set",
    params: &[
        param("bandwidth_priority", "bandwidthPriority"),
        param("download_limit", "downloadLimit"),
        param("download_limited", "downloadLimited"),
        param("files_wanted", "files-wanted"),
        param("files_unwanted", "files-unwanted"),
        param("honors_session_limits", "honorsSessionLimits"),
        param("ids", "ids"),
        param("labels", "labels"),
        param("location", "location"),
        param("peer_limit", "peer-limit"),
        param("priority_high", "priority-high"),
        param("priority_low", "priority-low"),
        param("priority_normal", "priority-normal"),
        param("queue_position", "queuePosition"),
        param("seed_idle_limit", "seedIdleLimit"),
        param("seed_idle_mode", "seedIdleMode"),
        param("seed_ratio_limit", "seedRatioLimit"),
        param("seed_ratio_mode", "seedRatioMode"),
        param("tracker_add", "trackerAdd"),
        param("tracker_remove", "trackerRemove"),
        param("tracker_replace", "trackerReplace"),
        param("upload_limit", "uploadLimit"),
        param("upload_limited", "uploadLimited"),
    ],
};

/// Reads torrent fields.
pub const TORRENT_GET: MethodSpec = MethodSpec {
    name: "torrent-get",
    params: &[
        param("fields", "fields"),
        param("format", "format"),
        param("ids", "ids"),
    ],
};

/// Adds a torrent from a file, URL, magnet link or metainfo.
pub const TORRENT_ADD: MethodSpec = MethodSpec {
    name: "torrent-add",
    params: &[
        param("cookies", "cookies"),
        param("download_dir", "download-dir"),
        param("filename", "filename"),
        param("metainfo", "metainfo"),
        param("paused", "paused"),
        param("peer_limit", "peer-limit"),
        param("bandwidth_priority", "bandwidthPriority"),
        param("files_wanted", "files-wanted"),
        param("files_unwanted", "files-unwanted"),
        param("priority_high", "priority-high"),
        param("priority_low", "priority-low"),
        param("priority_normal", "priority-normal"),
    ],
};

/// Removes torrents, optionally with their data.
pub const TORRENT_REMOVE: MethodSpec = MethodSpec {
    name: "torrent-remove",
    params: &[
        param("ids", "ids"),
        param("delete_local_data", "delete-local-data"),
    ],
};

/// Moves torrent data or points torrents at a new location.
pub const TORRENT_SET_LOCATION: MethodSpec = MethodSpec {
    name: "torrent-set-location",
    params: &[
        param("ids", "ids"),
        param("location", "location"),
        param("move", "move"),
    ],
};

/// Renames a file or folder inside a torrent.
pub const TORRENT_RENAME_PATH: MethodSpec = MethodSpec {
    name: "torrent-rename-path",
    params: &[
        param("ids", "ids"),
        param("name", "name"),
        param("path", "path"),
    ],
};

/// Changes session settings.
pub const SESSION_SET: MethodSpec = MethodSpec {
    name: "session-set",
    params: &[
        param("alt_speed_down", "alt-speed-down"),
        param("alt_speed_enabled", "alt-speed-enabled"),
        param("alt_speed_time_begin", "alt-speed-time-begin"),
        param("alt_speed_time_enabled", "alt-speed-time-enabled"),
        param("alt_speed_time_end", "alt-speed-time-end"),
        param("alt_speed_time_day", "alt-speed-time-day"),
        param("alt_speed_up", "alt-speed-up"),
        param("blocklist_url", "blocklist-url"),
        param("blocklist_enabled", "blocklist-enabled"),
        param("cache_size_mb", "cache-size-mb"),
        param("download_dir", "download-dir"),
        param("download_queue_size", "download-queue-size"),
        param("download_queue_enabled", "download-queue-enabled"),
        param("dht_enabled", "dht-enabled"),
        param("encryption", "encryption"),
        param("idle_seeding_limit", "idle-seeding-limit"),
        param("idle_seeding_limit_enabled", "idle-seeding-limit-enabled"),
        param("incomplete_dir", "incomplete-dir"),
        param("incomplete_dir_enabled", "incomplete-dir-enabled"),
        param("lpd_enabled", "lpd-enabled"),
        param("peer_limit_global", "peer-limit-global"),
        param("peer_limit_per_torrent", "peer-limit-per-torrent"),
        param("pex_enabled", "pex-enabled"),
        param("peer_port", "peer-port"),
        param("peer_port_random_on_start", "peer-port-random-on-start"),
        param("port_forwarding_enabled", "port-forwarding-enabled"),
        param("queue_stalled_enabled", "queue-stalled-enabled"),
        param("queue_stalled_minutes", "queue-stalled-minutes"),
        param("rename_partial_files", "rename-partial-files"),
        param("script_torrent_done_filename", "script-torrent-done-filename"),
        param("script_torrent_done_enabled", "script-torrent-done-enabled"),
        param("seed_ratio_limit", "seedRatioLimit"),
        param("seed_ratio_limited", "seedRatioLimited"),
        param("seed_queue_size", "seed-queue-size"),
        param("seed_queue_enabled", "seed-queue-enabled"),
        param("speed_limit_down", "speed-limit-down"),
        param("speed_limit_down_enabled", "speed-limit-down-enabled"),
        param("speed_limit_up", "speed-limit-up"),
        param("speed_limit_up_enabled", "speed-limit-up-enabled"),
        param("start_added_torrents", "start-added-torrents"),
        param("trash_original_torrent_files", "trash-original-torrent-files"),
        param("units", "units"),
        param("utp_enabled", "utp-enabled"),
    ],
};

/// Reads session settings.
pub const SESSION_GET: MethodSpec = MethodSpec {
    name: "session-get",
    params: &[param("fields", "fields")],
};
/// Reads session statistics.
pub const SESSION_STATS: MethodSpec = MethodSpec {
    name: "session-stats",
    params: NONE,
};
/// Reloads the peer blocklist.
pub const BLOCKLIST_UPDATE: MethodSpec = MethodSpec {
    name: "blocklist-update",
    params: NONE,
};
/// Checks whether the peer port is reachable.
pub const PORT_TEST: MethodSpec = MethodSpec {
    name: "port-test",
    params: NONE,
};
/// Shuts the daemon down.
pub const SESSION_CLOSE: MethodSpec = MethodSpec {
    name: "session-close",
    params: NONE,
};

/// Moves torrents to the top of the queue.
pub const QUEUE_MOVE_TOP: MethodSpec = MethodSpec {
    name: "queue-move-top",
    params: IDS,
};
/// Moves torrents one step up the queue.
pub const QUEUE_MOVE_UP: MethodSpec = MethodSpec {
    name: "queue-move-up",
    params: IDS,
};
/// Moves torrents one step down the queue.
pub const QUEUE_MOVE_DOWN: MethodSpec = MethodSpec {
    name: "queue-move-down",
    params: IDS,
};
/// Moves torrents to the bottom of the queue.
pub const QUEUE_MOVE_BOTTOM: MethodSpec = MethodSpec {
    name: "queue-move-bottom",
    params: IDS,
};

/// Reports free space in a directory on the daemon host.
pub const FREE_SPACE: MethodSpec = MethodSpec {
    name: "free-space",
    params: &[param("path", "path")],
};

/// Every method known to the client.
pub const METHODS: &[MethodSpec] = &[
    TORRENT_START,
    TORRENT_START_NOW,
    TORRENT_STOP,
    TORRENT_VERIFY,
    TORRENT_REANNOUNCE,
    TORRENT_SET,
    TORRENT_GET,
    TORRENT_ADD,
    TORRENT_REMOVE,
    TORRENT_SET_LOCATION,
    TORRENT_RENAME_PATH,
    SESSION_SET,
    SESSION_GET,
    SESSION_STATS,
    BLOCKLIST_UPDATE,
    PORT_TEST,
    SESSION_CLOSE,
    QUEUE_MOVE_TOP,
    QUEUE_MOVE_UP,
    QUEUE_MOVE_DOWN,
    QUEUE_MOVE_BOTTOM,
    FREE_SPACE,
];

/// Finds a method by wire name (`torrent-get`) or snake_case (`torrent_get`).
#[must_use]
pub fn lookup(name: &str) -> Option<&'static MethodSpec> {
    let wire = name.replace('_', "-");
    METHODS.iter().find(|m| m.name == wire)
}

/// One entry of a torrent list: a numeric id or an info-hash string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TorrentRef {
    /// Daemon-assigned torrent id.
    Id(i64),
    /// SHA1 info-hash string.
    Hash(String),
}

impl From<i64> for TorrentRef {
    fn from(id: i64) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for TorrentRef {
    fn from(hash: &str) -> Self {
        Self::Hash(hash.to_string())
    }
}

/// Torrent selector accepted by most torrent and queue methods.
///
/// Omitting `ids` altogether selects every torrent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ids {
    /// A single torrent id.
    Single(i64),
    /// A list of ids and/or hashes.
    List(Vec<TorrentRef>),
    /// Torrents active in the recent past.
    RecentlyActive,
}

impl Ids {
    /// Wire representation of the selector.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Single(id) => Value::from(*id),
            Self::List(refs) => Value::Array(
                refs.iter()
                    .map(|r| match r {
                        TorrentRef::Id(id) => Value::from(*id),
                        TorrentRef::Hash(hash) => Value::from(hash.as_str()),
                    })
                    .collect(),
            ),
            Self::RecentlyActive => Value::from("recently-active"),
        }
    }
}

impl Serialize for Ids {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl From<Ids> for Value {
    fn from(ids: Ids) -> Self {
        ids.to_value()
    }
}

impl From<i64> for Ids {
    fn from(id: i64) -> Self {
        Self::Single(id)
    }
}

impl<T: Into<TorrentRef>> From<Vec<T>> for Ids {
    fn from(refs: Vec<T>) -> Self {
        Self::List(refs.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use serde_json::json;

    use super::*;

    #[test]
    fn test_method_names_are_unique() {
        let names: HashSet<&str> = METHODS.iter().map(|m| m.name).collect();
        assert_eq!(names.len(), METHODS.len());
    }

    #[test]
    fn test_param_names_and_wire_keys_unique_per_method() {
        for method in METHODS {
            let names: HashSet<&str> = method.params.iter().map(|p| p.name).collect();
            let wires: HashSet<&str> = method.params.iter().map(|p| p.wire).collect();
            assert_eq!(names.len(), method.params.len(), "{}", method.name);
            assert_eq!(wires.len(), method.params.len(), "{}", method.name);
        }
    }

    #[test]
    fn test_wire_keys_keep_protocol_spelling() {
        assert_eq!(TORRENT_SET.wire_key("files_wanted"), Some("files-wanted"));
        assert_eq!(TORRENT_SET.wire_key("peer_limit"), Some("peer-limit"));
        assert_eq!(
            TORRENT_SET.wire_key("bandwidth_priority"),
            Some("bandwidthPriority")
        );
        assert_eq!(TORRENT_ADD.wire_key("download_dir"), Some("download-dir"));
        assert_eq!(
            TORRENT_REMOVE.wire_key("delete_local_data"),
            Some("delete-local-data")
        );
        assert_eq!(SESSION_SET.wire_key("seed_ratio_limit"), Some("seedRatioLimit"));
        assert_eq!(
            SESSION_SET.wire_key("peer_port_random_on_start"),
            Some("peer-port-random-on-start")
        );
        assert_eq!(SESSION_SET.params.len(), 43);
        assert_eq!(TORRENT_SET.params.len(), 23);
    }

    #[test]
    fn test_wire_key_accepts_wire_spelling() {
        assert_eq!(TORRENT_ADD.wire_key("download-dir"), Some("download-dir"));
    }

    #[test]
    fn test_arguments_maps_to_wire_keys() {
        let arguments = TORRENT_SET
            .arguments([
                ("ids", json!([1])),
                ("files_unwanted", json!([0, 2])),
                ("upload_limit", json!(50)),
            ])
            .unwrap();
        assert_eq!(
            Value::Object(arguments),
            json!({"ids": [1], "files-unwanted": [0, 2], "uploadLimit": 50})
        );
    }

    #[test]
    fn test_arguments_rejects_unknown_parameter() {
        let err = FREE_SPACE.arguments([("size", json!(1))]).unwrap_err();
        assert!(err.to_string().contains("unknown parameter `size`"));
    }

    #[test]
    fn test_lookup_accepts_both_spellings() {
        assert_eq!(lookup("torrent-get").map(|m| m.name), Some("torrent-get"));
        assert_eq!(lookup("queue_move_top").map(|m| m.name), Some("queue-move-top"));
        assert!(lookup("torrent-explode").is_none());
    }

    #[test]
    fn test_ids_wire_forms() {
        assert_eq!(Ids::from(7).to_value(), json!(7));
        assert_eq!(Ids::from(vec![1_i64, 2]).to_value(), json!([1, 2]));
        assert_eq!(
            Ids::List(vec![TorrentRef::Id(1), TorrentRef::from("c0ffee")]).to_value(),
            json!([1, "c0ffee"])
        );
        assert_eq!(Ids::RecentlyActive.to_value(), json!("recently-active"));
        assert_eq!(
            serde_json::to_value(Ids::RecentlyActive).unwrap(),
            json!("recently-active")
        );
    }
}
