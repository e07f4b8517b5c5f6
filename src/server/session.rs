//! Echo session handler.
//!
//! Reads chunks of up to `CHUNK_SIZE` bytes, logs each one and answers
//! with the fixed reply until the peer closes its side.

use super::connection::Connection;
use super::ServerError;
use crate::protocol::{Message, CHUNK_SIZE, REPLY};
use std::io::{self, Read, Write};
use std::net::SocketAddr;
use tracing::{info, trace, warn};

/// Outcome of a session that ended with the peer closing its side.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub peer: SocketAddr,
    /// Messages received (and replied to).
    pub messages: usize,
    pub bytes_received: usize,
    pub duration: chrono::Duration,
}

/// Serve one connection until end-of-stream.
///
/// The connection is consumed and dropped on return, which releases the
/// socket whether the session ended cleanly or with an error.
pub fn handle_connection<S: Read + Write>(
    mut conn: Connection<S>,
) -> Result<SessionSummary, ServerError> {
    let mut chunk = [0u8; CHUNK_SIZE];
    let mut messages = 0;
    let mut bytes_received = 0;

    loop {
        let n = match conn.stream.read(&mut chunk) {
            Ok(0) => {
                trace!(peer = %conn.peer, "Connection closed by client");
                break;
            }
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                conn.close();
                return Err(ServerError::Session { peer: conn.peer, source: e });
            }
        };

        let message = Message::copy_from(&chunk[..n]);
        log_message(conn.peer, &message);

        if let Err(e) = reply(&mut conn.stream) {
            conn.close();
            return Err(ServerError::Session { peer: conn.peer, source: e });
        }
        conn.replied();

        messages += 1;
        bytes_received += message.len();
        conn.wait_for_data();
    }

    conn.close();
    let summary = SessionSummary {
        peer: conn.peer,
        messages,
        bytes_received,
        duration: conn.age(),
    };

    info!(
        peer = %summary.peer,
        messages = summary.messages,
        bytes = summary.bytes_received,
        duration_ms = summary.duration.num_milliseconds(),
        "Session ended"
    );

    Ok(summary)
}

fn reply<W: Write>(stream: &mut W) -> io::Result<()> {
    stream.write_all(REPLY)?;
    stream.flush()
}

fn log_message(peer: SocketAddr, message: &Message) {
    match message.text() {
        Ok(text) => info!(peer = %peer, bytes = message.len(), "Client says: {}", text),
        Err(e) => warn!(
            peer = %peer,
            bytes = message.len(),
            valid_up_to = e.valid_up_to(),
            "Client sent non-UTF-8 payload: {}",
            message.lossy_text()
        ),
    }
}
