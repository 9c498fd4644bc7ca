//! Owned, detached message frame.
//!
//! A [`MessageReader`](crate::MessageReader) borrows the buffer it reads.
//! When a nested message has to outlive that buffer (queued, sent to
//! another thread, stored), detach it into a `Frame`, which holds its
//! payload as `bytes::Bytes`.
//!
//! # Example
//!
//! ```
//! use tagwire::protocol::Frame;
//! use bytes::Bytes;
//!
//! let frame = Frame::new(4, Bytes::from_static(b"hi"));
//! let bytes = frame.encode().unwrap();
//! assert_eq!(bytes, [2, 0, 4, b'h', b'i']);
//!
//! let mut reader = frame.reader();
//! assert_eq!(reader.tag(), Some(4));
//! assert_eq!(reader.read_bytes(2).unwrap(), b"hi");
//! ```

use bytes::Bytes;

use super::wire_format::{Header, HEADER_SIZE, MAX_PAYLOAD_SIZE};
use crate::error::{Result, WireError};
use crate::reader::MessageReader;

/// A tagged message with an owned payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Message tag.
    pub tag: u8,
    /// Payload bytes (zero-copy via `bytes::Bytes`).
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame from tag and payload.
    pub fn new(tag: u8, payload: Bytes) -> Self {
        Self { tag, payload }
    }

    /// Create a frame from tag and raw bytes (copies data).
    pub fn from_parts(tag: u8, payload: &[u8]) -> Self {
        Self {
            tag,
            payload: Bytes::copy_from_slice(payload),
        }
    }

    /// Get a reference to the payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Get the payload length.
    #[inline]
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    /// Header for this frame.
    ///
    /// Fails if the payload does not fit the 16-bit length field.
    pub fn header(&self) -> Result<Header> {
        let length = self.payload.len();
        if length > MAX_PAYLOAD_SIZE {
            return Err(WireError::MessageTooLarge { length });
        }
        Ok(Header::new(self.tag, length as u16))
    }

    /// Encode header and payload into a contiguous buffer.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let header = self.header()?;
        let mut buf = Vec::with_capacity(HEADER_SIZE + self.payload.len());
        buf.extend_from_slice(&header.encode());
        buf.extend_from_slice(&self.payload);
        Ok(buf)
    }

    /// A tagged reader scoped to this frame's payload.
    pub fn reader(&self) -> MessageReader<'_> {
        MessageReader::tagged(self.tag, &self.payload)
    }
}
