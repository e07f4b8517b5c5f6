//! Configuration module for echo-table.
//!
//! Supports both command-line arguments and TOML configuration file.
//! CLI arguments take precedence over config file values.

use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use thiserror::Error;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "echo-table")]
#[command(author = "echo-table authors")]
#[command(version = "0.1.0")]
#[command(about = "Single-connection echo server/client and Markdown table converter", long_about = None)]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error) [default: info]
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Accept one connection and reply to everything it sends
    Serve {
        /// Address to bind to (e.g., 127.0.0.1)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Connect to a server and send messages, one per reply
    Client {
        /// Server host
        #[arg(long)]
        host: Option<String>,

        /// Server port
        #[arg(short, long)]
        port: Option<u16>,

        /// Messages to send (read from stdin, one per line, when omitted)
        messages: Vec<String>,
    },

    /// Convert a tab-delimited file into a Markdown table
    Table {
        /// Tab-delimited input file
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Markdown output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub table: TableSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Server address shared by `serve` and `client`
#[derive(Debug, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Table converter paths
#[derive(Debug, Deserialize)]
pub struct TableSection {
    #[serde(default = "default_input")]
    pub input: PathBuf,
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

impl Default for TableSection {
    fn default() -> Self {
        Self {
            input: default_input(),
            output: default_output(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    12345
}

fn default_input() -> PathBuf {
    PathBuf::from("input.txt")
}

fn default_output() -> PathBuf {
    PathBuf::from("output.md")
}

fn default_log_level() -> String {
    "info".to_string()
}

/// A host/port pair for the listener or the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Get the `host:port` string.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Resolve to the first socket address the host maps to.
    pub fn resolve(&self) -> std::io::Result<SocketAddr> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("no addresses found for '{}'", self.address()),
                )
            })
    }
}

/// Settings for the `client` command
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: Endpoint,
    /// Empty means "read lines from stdin".
    pub messages: Vec<String>,
}

/// Settings for the `table` command
#[derive(Debug, Clone)]
pub struct TableConfig {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// What the process was asked to do
#[derive(Debug, Clone)]
pub enum Mode {
    Serve(Endpoint),
    Client(ClientConfig),
    Table(TableConfig),
}

/// Final resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub mode: Mode,
    pub log_level: String,
}

impl Config {
    /// Load configuration from CLI args and optional TOML file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_args(CliArgs::parse())
    }

    /// Merge parsed CLI args with the TOML config (CLI takes precedence).
    pub fn from_args(cli: CliArgs) -> Result<Self, ConfigError> {
        let toml_config = if let Some(ref config_path) = cli.config {
            let contents = std::fs::read_to_string(config_path)
                .map_err(|e| ConfigError::FileRead(config_path.clone(), e))?;
            toml::from_str(&contents)
                .map_err(|e| ConfigError::TomlParse(config_path.clone(), e))?
        } else {
            TomlConfig::default()
        };

        let server = toml_config.server;
        let endpoint = |host: Option<String>, port: Option<u16>| {
            Endpoint::new(
                host.unwrap_or_else(|| server.host.clone()),
                port.unwrap_or(server.port),
            )
        };

        let mode = match cli.command {
            CliCommand::Serve { host, port } => Mode::Serve(endpoint(host, port)),
            CliCommand::Client {
                host,
                port,
                messages,
            } => Mode::Client(ClientConfig {
                endpoint: endpoint(host, port),
                messages,
            }),
            CliCommand::Table { input, output } => Mode::Table(TableConfig {
                input: input.unwrap_or(toml_config.table.input),
                output: output.unwrap_or(toml_config.table.output),
            }),
        };

        Ok(Config {
            mode,
            log_level: cli.log_level.unwrap_or(toml_config.logging.level),
        })
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {}", .0.display(), .1)]
    FileRead(PathBuf, #[source] std::io::Error),
    #[error("Failed to parse config file '{}': {}", .0.display(), .1)]
    TomlParse(PathBuf, #[source] toml::de::Error),
}
