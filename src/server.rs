//! TCP server for the single-connection echo service.
//!
//! Binds, accepts exactly one client, then serves it until the client
//! closes its side. Everything is blocking and runs on the calling thread.

mod connection;
mod listener;
mod session;

pub use connection::{ConnState, Connection};
pub use listener::Listener;
pub use session::{handle_connection, SessionSummary};

use crate::config::Endpoint;
use std::net::SocketAddr;
use thiserror::Error;

/// Server errors
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to resolve '{address}': {source}")]
    Resolve {
        address: String,
        source: std::io::Error,
    },
    #[error("Failed to bind '{address}': {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },
    #[error("Failed to accept connection: {0}")]
    Accept(#[source] std::io::Error),
    #[error("I/O error with {peer}: {source}")]
    Session {
        peer: SocketAddr,
        source: std::io::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Bind to `endpoint`, serve one client, and return once it disconnects.
pub fn run(endpoint: &Endpoint) -> Result<SessionSummary, ServerError> {
    let listener = Listener::bind(endpoint)?;
    let conn = listener.accept_one()?;
    handle_connection(conn)
}
