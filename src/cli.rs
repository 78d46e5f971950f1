//! CLI argument definitions using clap derive macros.

use clap::{Parser, Subcommand};
use serde_json::Value;

use trctl_core::{Ids, TorrentRef};

/// Default columns for `trctl list`.
const DEFAULT_LIST_FIELDS: [&str; 4] = ["id", "name", "status", "percentDone"];

/// Control a Transmission daemon over its RPC interface.
///
/// Results are printed to stdout as pretty JSON.
#[derive(Parser, Debug)]
#[command(name = "trctl")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// RPC endpoint URL (default: http://127.0.0.1:9091/transmission/rpc)
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Username for HTTP basic auth
    #[arg(short = 'u', long, global = true)]
    pub username: Option<String>,

    /// Password for HTTP basic auth
    #[arg(short = 'p', long, global = true)]
    pub password: Option<String>,

    /// Request timeout in seconds (1-3600)
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub timeout: Option<u64>,

    /// Host header override
    #[arg(long, global = true)]
    pub host: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// RPC commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start torrents (all when no ids are given)
    Start {
        /// Torrent ids or info-hashes
        #[arg(value_parser = parse_torrent_ref)]
        ids: Vec<TorrentRef>,
        /// Bypass the download queue
        #[arg(long)]
        now: bool,
    },
    /// Stop torrents (all when no ids are given)
    Stop {
        #[arg(value_parser = parse_torrent_ref)]
        ids: Vec<TorrentRef>,
    },
    /// Verify local data of torrents
    Verify {
        #[arg(value_parser = parse_torrent_ref)]
        ids: Vec<TorrentRef>,
    },
    /// Ask trackers for more peers
    Reannounce {
        #[arg(value_parser = parse_torrent_ref)]
        ids: Vec<TorrentRef>,
    },
    /// List torrents
    List {
        /// Comma-separated torrent fields
        #[arg(short, long, value_delimiter = ',', default_values = DEFAULT_LIST_FIELDS)]
        fields: Vec<String>,
        #[arg(value_parser = parse_torrent_ref)]
        ids: Vec<TorrentRef>,
    },
    /// Remove torrents
    Remove {
        #[arg(required = true, value_parser = parse_torrent_ref)]
        ids: Vec<TorrentRef>,
        /// Also delete downloaded data
        #[arg(long)]
        delete_local_data: bool,
    },
    /// Show session statistics
    Stats,
    /// Show session settings
    Session {
        /// Comma-separated setting names (all when omitted)
        #[arg(short, long, value_delimiter = ',')]
        fields: Vec<String>,
    },
    /// Show free space in a directory on the daemon host
    FreeSpace { path: String },
    /// Check whether the peer port is reachable
    PortTest,
    /// Call any RPC method with key=value parameters
    Call {
        /// Method name, e.g. `torrent-set` or `torrent_set`
        method: String,
        /// Parameters; values are parsed as JSON, falling back to a string
        #[arg(value_parser = parse_param)]
        params: Vec<(String, Value)>,
    },
}

/// Turns positional torrent refs into a selector; empty means every torrent.
#[must_use]
pub fn selector(ids: &[TorrentRef]) -> Option<Ids> {
    match ids {
        [] => None,
        [TorrentRef::Id(id)] => Some(Ids::Single(*id)),
        [TorrentRef::Hash(hash)] if hash == "recently-active" => Some(Ids::RecentlyActive),
        refs => Some(Ids::from(refs.to_vec())),
    }
}

fn parse_torrent_ref(raw: &str) -> Result<TorrentRef, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("torrent id must not be empty".to_string());
    }
    Ok(raw
        .parse::<i64>()
        .map_or_else(|_| TorrentRef::from(raw), TorrentRef::Id))
}

fn parse_param(raw: &str) -> Result<(String, Value), String> {
    let Some((key, value)) = raw.split_once('=') else {
        return Err(format!("expected key=value, got `{raw}`"));
    };
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in `{raw}`"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::from(value));
    Ok((key.to_string(), value))
}
