//! Connection state machine for the accepted client.
//!
//! The connection owns its stream for its whole lifetime and tracks
//! where the session loop currently is.

use chrono::{DateTime, Utc};
use std::net::{SocketAddr, TcpStream};

/// Current state of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    /// Blocked on a read.
    WaitingForData,
    /// Reply written for the last message.
    Replied,
    /// Peer closed its side or an I/O error occurred. Terminal.
    Closed,
}

/// A single accepted client connection.
#[derive(Debug)]
pub struct Connection<S = TcpStream> {
    /// Underlying byte stream.
    pub stream: S,
    /// Remote address of the peer.
    pub peer: SocketAddr,
    /// When the listener handed out this connection.
    pub accepted_at: DateTime<Utc>,
    state: ConnState,
}

impl<S> Connection<S> {
    /// Create a new connection waiting for its first message.
    pub fn new(stream: S, peer: SocketAddr) -> Self {
        Self {
            stream,
            peer,
            accepted_at: Utc::now(),
            state: ConnState::WaitingForData,
        }
    }

    /// Current state, for tests
    #[cfg(test)]
    pub fn state(&self) -> ConnState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == ConnState::Closed
    }

    /// Transition back to waiting for data.
    pub fn wait_for_data(&mut self) {
        debug_assert!(!self.is_closed());
        self.state = ConnState::WaitingForData;
    }

    /// Record that the reply for the last message went out.
    pub fn replied(&mut self) {
        debug_assert_eq!(self.state, ConnState::WaitingForData);
        self.state = ConnState::Replied;
    }

    /// Mark the connection closed.
    pub fn close(&mut self) {
        self.state = ConnState::Closed;
    }

    /// Time elapsed since the connection was accepted.
    pub fn age(&self) -> chrono::Duration {
        Utc::now().signed_duration_since(self.accepted_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    #[test]
    fn test_connection_state_transitions() {
        let mut conn = Connection::new((), peer());

        assert_eq!(conn.state(), ConnState::WaitingForData);

        conn.replied();
        assert_eq!(conn.state(), ConnState::Replied);

        conn.wait_for_data();
        assert_eq!(conn.state(), ConnState::WaitingForData);

        conn.close();
        assert!(conn.is_closed());
    }

    #[test]
    fn test_connection_age() {
        let conn = Connection::new((), peer());
        assert_eq!(conn.peer, peer());
        assert!(conn.age() >= chrono::Duration::zero());
    }
}
