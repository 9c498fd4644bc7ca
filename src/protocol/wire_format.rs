//! Wire format encoding and decoding.
//!
//! Implements the 3-byte message header:
//! ```text
//! ┌──────────────┬───────┬─────────────────────────┐
//! │ Length       │ Tag   │ Payload                 │
//! │ 2 bytes      │ 1 byte│ `Length` bytes          │
//! │ uint16 LE    │       │ values and nested frames│
//! └──────────────┴───────┴─────────────────────────┘
//! ```
//!
//! `Length` counts payload bytes only, never the header itself.
//! All multi-byte integers are Little Endian regardless of host.

/// Header size in bytes (fixed, exactly 3).
pub const HEADER_SIZE: usize = 3;

/// Size of the length field at the start of the header.
pub const LENGTH_FIELD_SIZE: usize = 2;

/// Maximum payload size of a single message (16-bit length field).
pub const MAX_PAYLOAD_SIZE: usize = u16::MAX as usize;

/// Decoded message header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Payload length in bytes, excluding this header.
    pub payload_length: u16,
    /// Opaque tag; meaning is up to the application.
    pub tag: u8,
}

impl Header {
    /// Create a new header.
    pub fn new(tag: u8, payload_length: u16) -> Self {
        Self {
            payload_length,
            tag,
        }
    }

    /// Encode header to bytes (Little Endian).
    ///
    /// # Example
    ///
    /// ```
    /// use tagwire::protocol::Header;
    ///
    /// let bytes = Header::new(7, 0x0102).encode();
    /// assert_eq!(bytes, [0x02, 0x01, 7]);
    /// ```
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        self.encode_into(&mut buf);
        buf
    }

    /// Encode header into an existing buffer.
    ///
    /// # Panics
    ///
    /// Panics if buffer is smaller than `HEADER_SIZE` (3 bytes).
    pub fn encode_into(&self, buf: &mut [u8]) {
        buf[0..LENGTH_FIELD_SIZE].copy_from_slice(&self.payload_length.to_le_bytes());
        buf[LENGTH_FIELD_SIZE] = self.tag;
    }

    /// Decode header from bytes (Little Endian).
    ///
    /// Returns `None` if buffer is too short.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < HEADER_SIZE {
            return None;
        }
        Some(Self {
            payload_length: u16::from_le_bytes([buf[0], buf[1]]),
            tag: buf[LENGTH_FIELD_SIZE],
        })
    }

    /// Total size of the framed message (header + payload).
    #[inline]
    pub fn frame_size(&self) -> usize {
        HEADER_SIZE + self.payload_length as usize
    }
}

/// Patch a previously reserved length field in place.
///
/// `offset` is where the header starts; the tag byte is left untouched.
#[inline]
pub fn patch_length(buf: &mut [u8], offset: usize, payload_length: u16) {
    buf[offset..offset + LENGTH_FIELD_SIZE].copy_from_slice(&payload_length.to_le_bytes());
}
