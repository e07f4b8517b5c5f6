//! Client for the echo service.
//!
//! Sends one payload at a time and waits for the fixed reply before
//! sending the next, so payloads never coalesce on the wire.

use crate::config::{ClientConfig, Endpoint};
use crate::protocol::{is_reply, CHUNK_SIZE, REPLY};
use bytes::Bytes;
use std::io::{self, BufRead, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Failed to resolve '{address}': {source}")]
    Resolve { address: String, source: io::Error },
    #[error("Failed to connect to '{address}': {source}")]
    Connect { address: String, source: io::Error },
    #[error("empty payload: the server only replies to non-empty sends")]
    EmptyPayload,
    #[error("payload too large: {0} > {max} bytes", max = CHUNK_SIZE)]
    PayloadTooLarge(usize),
    #[error("unexpected reply: {0:?}")]
    UnexpectedReply(Bytes),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// An open connection to the server.
pub struct Client<S = TcpStream> {
    stream: S,
    peer: SocketAddr,
}

impl Client {
    /// Connect to the server at `endpoint`.
    pub fn connect(endpoint: &Endpoint) -> Result<Self, ClientError> {
        let addr = endpoint.resolve().map_err(|source| ClientError::Resolve {
            address: endpoint.address(),
            source,
        })?;
        let stream = TcpStream::connect(addr).map_err(|source| ClientError::Connect {
            address: endpoint.address(),
            source,
        })?;

        info!(peer = %addr, "Connected to server");
        Ok(Self { stream, peer: addr })
    }

    /// Close the write half so the server sees end-of-stream.
    pub fn close(self) -> Result<(), ClientError> {
        match self.stream.shutdown(Shutdown::Write) {
            Ok(()) => {}
            // Server already went away
            Err(e) if e.kind() == io::ErrorKind::NotConnected => {}
            Err(e) => return Err(e.into()),
        }
        debug!(peer = %self.peer, "Connection closed");
        Ok(())
    }
}

impl<S: Read + Write> Client<S> {
    pub fn from_stream(stream: S, peer: SocketAddr) -> Self {
        Self { stream, peer }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Send one payload and wait for the server's reply.
    ///
    /// Payloads must be non-empty and fit in one server read.
    pub fn send(&mut self, payload: &[u8]) -> Result<Bytes, ClientError> {
        if payload.is_empty() {
            return Err(ClientError::EmptyPayload);
        }
        if payload.len() > CHUNK_SIZE {
            return Err(ClientError::PayloadTooLarge(payload.len()));
        }

        self.stream.write_all(payload)?;
        self.stream.flush()?;

        let mut reply = vec![0u8; REPLY.len()];
        self.stream.read_exact(&mut reply)?;
        let reply = Bytes::from(reply);

        if !is_reply(&reply) {
            return Err(ClientError::UnexpectedReply(reply));
        }
        Ok(reply)
    }
}

/// Connect, send every configured message (or stdin lines), then close.
///
/// Returns the number of replies received.
pub fn run(config: &ClientConfig) -> Result<usize, ClientError> {
    let mut client = Client::connect(&config.endpoint)?;

    let replies = if config.messages.is_empty() {
        let stdin = io::stdin();
        send_all(&mut client, stdin.lock().lines())?
    } else {
        send_all(&mut client, config.messages.iter().cloned().map(Ok))?
    };

    client.close()?;
    Ok(replies)
}

fn send_all<S, I>(client: &mut Client<S>, messages: I) -> Result<usize, ClientError>
where
    S: Read + Write,
    I: IntoIterator<Item = io::Result<String>>,
{
    let mut replies = 0;
    for message in messages {
        let message = message?;
        if message.is_empty() {
            warn!("Skipping empty message");
            continue;
        }

        let reply = client.send(message.as_bytes())?;
        info!(peer = %client.peer(), "Server says: {}", String::from_utf8_lossy(&reply));
        replies += 1;
    }
    Ok(replies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::{handle_connection, Listener};
    use std::io::Cursor;
    use std::thread;

    /// Stream whose reads come from `input` and whose writes are captured.
    struct Loopback {
        input: Cursor<Vec<u8>>,
        written: Vec<u8>,
    }

    impl Read for Loopback {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for Loopback {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn client_with_input(input: &[u8]) -> Client<Loopback> {
        let stream = Loopback {
            input: Cursor::new(input.to_vec()),
            written: Vec::new(),
        };
        Client::from_stream(stream, "127.0.0.1:12345".parse().unwrap())
    }

    #[test]
    fn test_rejects_empty_and_oversized_payloads() {
        let mut client = client_with_input(b"");

        assert!(matches!(client.send(b""), Err(ClientError::EmptyPayload)));
        assert!(matches!(
            client.send(&[b'x'; CHUNK_SIZE + 1]),
            Err(ClientError::PayloadTooLarge(1025))
        ));
        assert!(client.stream.written.is_empty());
    }

    #[test]
    fn test_unexpected_reply() {
        let mut client = client_with_input(b"Goodbye from server");
        match client.send(b"ping") {
            Err(ClientError::UnexpectedReply(reply)) => {
                assert_eq!(&reply[..], b"Goodbye from serve");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_server_hangs_up_mid_reply() {
        let mut client = client_with_input(b"Hello");
        match client.send(b"ping") {
            Err(ClientError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_send_all_skips_empty_lines() {
        let mut client = client_with_input(&REPLY.repeat(2));
        let lines = vec![Ok("a".to_string()), Ok(String::new()), Ok("b".to_string())];

        assert_eq!(send_all(&mut client, lines).unwrap(), 2);
        assert_eq!(client.stream.written, b"ab");
    }

    #[test]
    fn test_against_server() {
        let listener = Listener::bind(&Endpoint::new("127.0.0.1", 0)).unwrap();
        let endpoint = Endpoint::new("127.0.0.1", listener.local_addr().port());

        let server = thread::spawn(move || handle_connection(listener.accept_one().unwrap()));

        let config = ClientConfig {
            endpoint,
            messages: vec!["ping".to_string(), "how are you?".to_string()],
        };
        assert_eq!(run(&config).unwrap(), 2);

        let summary = server.join().unwrap().unwrap();
        assert_eq!(summary.messages, 2);
        assert_eq!(summary.bytes_received, 4 + 12);
    }

    #[test]
    fn test_connect_refused() {
        // Grab a free port, then release it
        let port = Listener::bind(&Endpoint::new("127.0.0.1", 0))
            .unwrap()
            .local_addr()
            .port();

        assert!(matches!(
            Client::connect(&Endpoint::new("127.0.0.1", port)),
            Err(ClientError::Connect { .. })
        ));
    }
}
