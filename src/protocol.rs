//! Wire protocol shared by the server and the client.
//!
//! There is no framing: whatever one read call returns (up to
//! `CHUNK_SIZE` bytes) is one message, and every message is answered with
//! the same literal reply.
//!
//! ```text
//! Client: ping
//! Server: Hello from server!
//! ```

use bytes::Bytes;
use std::borrow::Cow;
use std::str::Utf8Error;

/// Maximum number of bytes taken off the socket per read.
pub const CHUNK_SIZE: usize = 1024;

/// Fixed reply sent for every received message.
pub const REPLY: &[u8] = b"Hello from server!";

/// One chunk of bytes as delivered by a single read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    data: Bytes,
}

impl Message {
    /// Copy a received chunk out of the read buffer.
    pub fn copy_from(chunk: &[u8]) -> Self {
        debug_assert!(chunk.len() <= CHUNK_SIZE);
        Self {
            data: Bytes::copy_from_slice(chunk),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Decode the payload as UTF-8 text.
    ///
    /// Chunk boundaries are arbitrary, so a multi-byte character split
    /// across two reads makes both halves fail here.
    pub fn text(&self) -> Result<&str, Utf8Error> {
        std::str::from_utf8(&self.data)
    }

    /// Text rendering with invalid sequences replaced by U+FFFD.
    pub fn lossy_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }
}

/// Check whether `reply` is the server's fixed reply.
pub fn is_reply(reply: &[u8]) -> bool {
    reply == REPLY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_message() {
        let msg = Message::copy_from(b"ping");
        assert_eq!(msg.len(), 4);
        assert_eq!(msg.text().unwrap(), "ping");
        assert_eq!(msg.lossy_text(), "ping");
    }

    #[test]
    fn test_invalid_utf8() {
        let msg = Message::copy_from(&[b'o', b'k', 0xff, b'!']);
        let err = msg.text().unwrap_err();
        assert_eq!(err.valid_up_to(), 2);
        assert_eq!(msg.lossy_text(), "ok\u{fffd}!");
    }

    #[test]
    fn test_split_multibyte_char() {
        // "é" is 0xc3 0xa9; only the first byte arrived in this chunk
        let msg = Message::copy_from(&[b'c', b'a', b'f', 0xc3]);
        assert!(msg.text().is_err());
    }

    #[test]
    fn test_reply() {
        assert_eq!(REPLY.len(), 18);
        assert!(is_reply(b"Hello from server!"));
        assert!(!is_reply(b"Hello from server"));
    }
}
