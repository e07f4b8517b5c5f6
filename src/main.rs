//! echo-table: single-connection echo server/client and Markdown table
//! converter.
//!
//! Subcommands:
//! - `serve`: accept one client and answer each message it sends
//! - `client`: send messages to a running server
//! - `table`: convert a tab-delimited file into a Markdown table

use echo_table::config::{ClientConfig, Config, Endpoint, Mode, TableConfig};
use echo_table::{client, server, table};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match config.mode {
        Mode::Serve(endpoint) => run_server(&endpoint),
        Mode::Client(client_config) => run_client(&client_config),
        Mode::Table(table_config) => run_table(&table_config),
    }
}

/// Serve exactly one client, then exit
fn run_server(endpoint: &Endpoint) -> Result<(), Box<dyn std::error::Error>> {
    info!(host = %endpoint.host, port = endpoint.port, "Starting echo server");
    server::run(endpoint)?;
    Ok(())
}

fn run_client(config: &ClientConfig) -> Result<(), Box<dyn std::error::Error>> {
    let replies = client::run(config)?;
    info!(replies, "Client finished");
    Ok(())
}

fn run_table(config: &TableConfig) -> Result<(), Box<dyn std::error::Error>> {
    table::convert_file(&config.input, &config.output)?;
    Ok(())
}
