//! CLI entry point for trctl.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use tracing::debug;
use trctl_core::{Arguments, ClientConfig, DEFAULT_TIMEOUT_SECS, DEFAULT_URL, TransmissionClient};

mod app_config;
mod cli;

use app_config::{FileConfig, load_default_file_config};
use cli::{Args, Command, selector};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    let loaded = load_default_file_config()?;
    let file_config = loaded.config.unwrap_or_default();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > config file > info
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => file_config.verbosity.map_or("info", |v| v.filter()),
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(config_path = ?loaded.path, "configuration resolved");

    let config = client_config(&args, file_config);
    debug!(?config, "client configuration");
    let client = TransmissionClient::new(config).context("failed to create RPC client")?;

    let result = run_command(&client, args.command).await;
    client.close();
    let arguments = result?;

    println!(
        "{}",
        serde_json::to_string_pretty(&Value::Object(arguments))?
    );
    Ok(())
}

/// Merges CLI flags over file values over built-in defaults.
fn client_config(args: &Args, file: FileConfig) -> ClientConfig {
    ClientConfig {
        url: args
            .url
            .clone()
            .or(file.url)
            .unwrap_or_else(|| DEFAULT_URL.to_string()),
        username: args.username.clone().or(file.username),
        password: args.password.clone().or(file.password),
        timeout: Duration::from_secs(
            args.timeout
                .or(file.timeout_secs)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        ),
        host: args.host.clone().or(file.host),
        user_agent: None,
    }
}

async fn run_command(client: &TransmissionClient, command: Command) -> Result<Arguments> {
    let arguments = match command {
        Command::Start { ids, now: true } => client.torrent_start_now(selector(&ids)).await,
        Command::Start { ids, now: false } => client.torrent_start(selector(&ids)).await,
        Command::Stop { ids } => client.torrent_stop(selector(&ids)).await,
        Command::Verify { ids } => client.torrent_verify(selector(&ids)).await,
        Command::Reannounce { ids } => client.torrent_reannounce(selector(&ids)).await,
        Command::List { fields, ids } => {
            let fields: Vec<&str> = fields.iter().map(String::as_str).collect();
            client.torrent_get(&fields, None, selector(&ids)).await
        }
        Command::Remove {
            ids,
            delete_local_data,
        } => client.torrent_remove(selector(&ids), delete_local_data).await,
        Command::Stats => client.session_stats().await,
        Command::Session { fields } => {
            let fields: Vec<&str> = fields.iter().map(String::as_str).collect();
            client.session_get(&fields).await
        }
        Command::FreeSpace { path } => client.free_space(&path).await,
        Command::PortTest => client.port_test().await,
        Command::Call { method, params } => client.call(&method, params).await,
    };
    arguments.with_context(|| format!("RPC call to {} failed", client.url()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_cli_overrides_file() {
        let args = Args::try_parse_from([
            "trctl",
            "--url",
            "http://cli:9091/transmission/rpc",
            "--timeout",
            "7",
            "stats",
        ])
        .unwrap();
        let file = FileConfig {
            url: Some("http://file:9091/transmission/rpc".to_string()),
            username: Some("file-user".to_string()),
            timeout_secs: Some(60),
            ..FileConfig::default()
        };
        let config = client_config(&args, file);
        assert_eq!(config.url, "http://cli:9091/transmission/rpc");
        assert_eq!(config.username.as_deref(), Some("file-user"));
        assert_eq!(config.timeout, Duration::from_secs(7));
    }

    #[test]
    fn test_client_config_defaults() {
        let args = Args::try_parse_from(["trctl", "stats"]).unwrap();
        let config = client_config(&args, FileConfig::default());
        assert_eq!(config.url, DEFAULT_URL);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert!(config.password.is_none());
    }
}
