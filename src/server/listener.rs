//! Single-accept TCP listener.

use super::connection::Connection;
use super::ServerError;
use crate::config::Endpoint;
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{SocketAddr, TcpListener};
use tracing::{debug, info};

const LISTEN_BACKLOG: i32 = 128;

/// A bound listening socket that hands out exactly one connection.
#[derive(Debug)]
pub struct Listener {
    inner: TcpListener,
    local_addr: SocketAddr,
}

impl Listener {
    /// Bind a blocking listening socket to `endpoint`.
    pub fn bind(endpoint: &Endpoint) -> Result<Self, ServerError> {
        let addr = endpoint.resolve().map_err(|source| ServerError::Resolve {
            address: endpoint.address(),
            source,
        })?;

        let inner = create_listener(addr).map_err(|source| ServerError::Bind {
            address: endpoint.address(),
            source,
        })?;
        let local_addr = inner.local_addr()?;

        info!(address = %local_addr, port = local_addr.port(), "Server listening");

        Ok(Self { inner, local_addr })
    }

    /// Address the socket is actually bound to (resolves port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Block until one client connects.
    ///
    /// Consumes the listener: the listening socket is closed once the
    /// connection is handed out, so later connection attempts are refused.
    pub fn accept_one(self) -> Result<Connection, ServerError> {
        let (stream, peer) = loop {
            match self.inner.accept() {
                Ok(accepted) => break accepted,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ServerError::Accept(e)),
            }
        };

        info!(peer = %peer, "Connected by {}", peer);
        debug!(address = %self.local_addr, "Listener closed after single accept");

        Ok(Connection::new(stream, peer))
    }
}

fn create_listener(addr: SocketAddr) -> io::Result<TcpListener> {
    let socket = Socket::new(
        match addr {
            SocketAddr::V4(_) => Domain::IPV4,
            SocketAddr::V6(_) => Domain::IPV6,
        },
        Type::STREAM,
        Some(Protocol::TCP),
    )?;

    // No SO_REUSEPORT: a second listener on the same port must fail to bind.
    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.listen(LISTEN_BACKLOG)?;

    Ok(socket.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpStream;
    use std::thread;

    fn any_port() -> Endpoint {
        Endpoint::new("127.0.0.1", 0)
    }

    #[test]
    fn test_bind_ephemeral_port() {
        let listener = Listener::bind(&any_port()).unwrap();
        assert!(listener.local_addr().ip().is_loopback());
        assert_ne!(listener.local_addr().port(), 0);
    }

    #[test]
    fn test_port_in_use() {
        let first = Listener::bind(&any_port()).unwrap();
        let taken = Endpoint::new("127.0.0.1", first.local_addr().port());

        match Listener::bind(&taken) {
            Err(ServerError::Bind { address, source }) => {
                assert_eq!(address, taken.address());
                assert_eq!(source.kind(), io::ErrorKind::AddrInUse);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_unresolvable_host() {
        let endpoint = Endpoint::new("not a host name", 12345);
        assert!(matches!(
            Listener::bind(&endpoint),
            Err(ServerError::Resolve { .. })
        ));
    }

    #[test]
    fn test_accepts_exactly_one() {
        let listener = Listener::bind(&any_port()).unwrap();
        let addr = listener.local_addr();

        let client = thread::spawn(move || TcpStream::connect(addr).unwrap());
        let conn = listener.accept_one().unwrap();
        let stream = client.join().unwrap();

        assert_eq!(conn.peer, stream.local_addr().unwrap());

        // Listening socket is gone now
        assert!(TcpStream::connect(addr).is_err());
    }
}
