//! Message writer with nested, back-patched frames.
//!
//! The writer appends values to a growable `BytesMut`. Opening a message
//! reserves a 3-byte header whose length field is zero; closing it computes
//! the payload length and patches it in place. Open messages are tracked as
//! a stack of header offsets, so messages nest freely but must close in
//! LIFO order.
//!
//! # Layout
//!
//! ```text
//! start_message(1)        [00 00 01]
//! write_i32(5)            [00 00 01][05 00 00 00]
//! start_message(2)        [00 00 01][05 00 00 00][00 00 02]
//! write_str("HO")         [00 00 01][05 00 00 00][00 00 02][02 48 4F]
//! end_message()           [00 00 01][05 00 00 00][03 00 02][02 48 4F]
//! end_message()           [0A 00 01][05 00 00 00][03 00 02][02 48 4F]
//! ```
//!
//! # Example
//!
//! ```
//! use tagwire::{MessageReader, MessageWriter};
//!
//! let mut writer = MessageWriter::new(128);
//! writer.start_message(1).unwrap();
//! writer.write_i32(i32::MAX);
//! writer.write_i32(i32::MIN);
//! writer.end_message().unwrap();
//! assert_eq!(writer.len(), 11);
//!
//! let bytes = writer.finish().unwrap();
//! let mut reader = MessageReader::get(&bytes, 0).unwrap();
//! assert_eq!(reader.read_i32().unwrap(), i32::MAX);
//! assert_eq!(reader.read_i32().unwrap(), i32::MIN);
//! ```

use bytes::{BufMut, Bytes, BytesMut};
use serde::Serialize;

use crate::codec::MsgPackCodec;
use crate::config::WriterConfig;
use crate::error::{Result, WireError};
use crate::protocol::{
    packed::{put_packed_u64, zigzag_encode32, zigzag_encode64},
    patch_length, Encode, Frame, Header, HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
use crate::reader::MessageReader;

/// Serializes values and nested messages into a contiguous buffer.
///
/// Not synchronized; share finished bytes, not the writer.
#[derive(Debug)]
pub struct MessageWriter {
    /// Everything written so far.
    buffer: BytesMut,
    /// Header offsets of messages that are open, innermost last.
    open: Vec<usize>,
    /// Limit on `open.len()`.
    max_nesting_depth: usize,
}

impl MessageWriter {
    /// Create a writer with the given initial capacity and default limits.
    pub fn new(capacity: usize) -> Self {
        Self::with_config(WriterConfig::default().initial_capacity(capacity))
    }

    /// Create a writer from a full configuration.
    pub fn with_config(config: WriterConfig) -> Self {
        Self {
            buffer: BytesMut::with_capacity(config.initial_capacity),
            open: Vec::new(),
            max_nesting_depth: config.max_nesting_depth,
        }
    }

    // ------------------------------------------------------------------
    // Messages
    // ------------------------------------------------------------------

    /// Open a new message with `tag`, nested inside any message already open.
    ///
    /// # Errors
    ///
    /// [`WireError::NestingTooDeep`] if the configured depth is reached.
    pub fn start_message(&mut self, tag: u8) -> Result<()> {
        if self.open.len() >= self.max_nesting_depth {
            return Err(WireError::NestingTooDeep {
                limit: self.max_nesting_depth,
            });
        }

        let offset = self.buffer.len();
        self.buffer.put_slice(&Header::new(tag, 0).encode());
        self.open.push(offset);

        tracing::trace!(tag, offset, depth = self.open.len(), "message started");
        Ok(())
    }

    /// Close the innermost open message and patch its length.
    ///
    /// On [`WireError::MessageTooLarge`] the message stays open and the buffer
    /// is untouched, so the caller can still [`cancel_message`](Self::cancel_message).
    ///
    /// # Errors
    ///
    /// - [`WireError::NoOpenMessage`] if nothing is open.
    /// - [`WireError::MessageTooLarge`] if the payload exceeds 65535 bytes.
    pub fn end_message(&mut self) -> Result<()> {
        let offset = *self.open.last().ok_or(WireError::NoOpenMessage)?;
        let length = self.buffer.len() - offset - HEADER_SIZE;

        if length > MAX_PAYLOAD_SIZE {
            tracing::debug!(offset, length, "refusing to close oversized message");
            return Err(WireError::MessageTooLarge { length });
        }

        self.open.pop();
        patch_length(&mut self.buffer, offset, length as u16);

        tracing::trace!(offset, length, depth = self.open.len(), "message ended");
        Ok(())
    }

    /// Discard the innermost open message, including everything written
    /// into it since it was started.
    pub fn cancel_message(&mut self) -> Result<()> {
        let offset = self.open.pop().ok_or(WireError::NoOpenMessage)?;
        self.buffer.truncate(offset);

        tracing::trace!(offset, depth = self.open.len(), "message cancelled");
        Ok(())
    }

    /// Number of messages currently open.
    #[inline]
    pub fn open_messages(&self) -> usize {
        self.open.len()
    }

    /// Whether the innermost open message (or the whole buffer, if none is
    /// open) already holds at least `expected` payload bytes.
    pub fn has_bytes(&self, expected: usize) -> bool {
        let start = self.open.last().map_or(0, |offset| offset + HEADER_SIZE);
        self.buffer.len() - start >= expected
    }

    // ------------------------------------------------------------------
    // Fixed width values (all Little Endian)
    // ------------------------------------------------------------------

    /// Write any [`Encode`] value.
    #[inline]
    pub fn write<T: Encode>(&mut self, value: T) -> Result<()> {
        value.encode(self)
    }

    /// Write a boolean as one byte, 0 or 1.
    #[inline]
    pub fn write_bool(&mut self, value: bool) {
        self.buffer.put_u8(u8::from(value));
    }

    #[inline]
    pub fn write_u8(&mut self, value: u8) {
        self.buffer.put_u8(value);
    }

    #[inline]
    pub fn write_i8(&mut self, value: i8) {
        self.buffer.put_i8(value);
    }

    #[inline]
    pub fn write_u16(&mut self, value: u16) {
        self.buffer.put_u16_le(value);
    }

    #[inline]
    pub fn write_i16(&mut self, value: i16) {
        self.buffer.put_i16_le(value);
    }

    #[inline]
    pub fn write_u32(&mut self, value: u32) {
        self.buffer.put_u32_le(value);
    }

    #[inline]
    pub fn write_i32(&mut self, value: i32) {
        self.buffer.put_i32_le(value);
    }

    #[inline]
    pub fn write_u64(&mut self, value: u64) {
        self.buffer.put_u64_le(value);
    }

    #[inline]
    pub fn write_i64(&mut self, value: i64) {
        self.buffer.put_i64_le(value);
    }

    /// Write an IEEE-754 single as its Little Endian bit pattern.
    #[inline]
    pub fn write_f32(&mut self, value: f32) {
        self.buffer.put_f32_le(value);
    }

    // ------------------------------------------------------------------
    // Variable width values
    // ------------------------------------------------------------------

    pub fn write_packed_u32(&mut self, value: u32) {
        put_packed_u64(&mut self.buffer, u64::from(value));
    }

    /// Zigzag-map then pack.
    pub fn write_packed_i32(&mut self, value: i32) {
        self.write_packed_u32(zigzag_encode32(value));
    }

    pub fn write_packed_u64(&mut self, value: u64) {
        put_packed_u64(&mut self.buffer, value);
    }

    pub fn write_packed_i64(&mut self, value: i64) {
        self.write_packed_u64(zigzag_encode64(value));
    }

    /// Write raw bytes with no length prefix.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.put_slice(bytes);
    }

    /// Write a packed length followed by the raw bytes.
    ///
    /// # Errors
    ///
    /// [`WireError::FieldTooLarge`] if `bytes` is longer than the packed u32
    /// prefix can describe. Nothing is written in that case.
    pub fn write_bytes_and_size(&mut self, bytes: &[u8]) -> Result<()> {
        let length = size_prefix(bytes.len())?;
        put_packed_u64(&mut self.buffer, u64::from(length));
        self.buffer.put_slice(bytes);
        Ok(())
    }

    /// Write a UTF-8 string, size-prefixed like a byte array.
    pub fn write_str(&mut self, value: &str) -> Result<()> {
        self.write_bytes_and_size(value.as_bytes())
    }

    /// Serialize `value` as MsgPack and store it as a byte array.
    pub fn write_msgpack<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let encoded = MsgPackCodec::encode(value)?;
        self.write_bytes_and_size(&encoded)
    }

    // ------------------------------------------------------------------
    // Copying existing messages
    // ------------------------------------------------------------------

    /// Append an owned frame, header included.
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        let header = frame.header()?;
        self.buffer.put_slice(&header.encode());
        self.buffer.put_slice(frame.payload());
        Ok(())
    }

    /// Copy the message a reader is scoped to.
    ///
    /// A tagged reader is re-framed with its tag; an untagged one has its
    /// payload appended as raw bytes. The reader's position is ignored.
    ///
    /// A tagged payload over 65535 bytes fails with
    /// [`WireError::MessageTooLarge`] before anything is written.
    pub fn write_message(&mut self, reader: &MessageReader<'_>) -> Result<()> {
        match reader.tag() {
            Some(tag) => {
                let length = reader.len();
                if length > MAX_PAYLOAD_SIZE {
                    return Err(WireError::MessageTooLarge { length });
                }
                self.start_message(tag)?;
                self.buffer.put_slice(reader.payload());
                self.end_message()
            }
            None => {
                self.buffer.put_slice(reader.payload());
                Ok(())
            }
        }
    }

    // ------------------------------------------------------------------
    // Buffer access
    // ------------------------------------------------------------------

    /// Total bytes written.
    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Current write position. Always equal to [`len`](Self::len).
    #[inline]
    pub fn position(&self) -> usize {
        self.buffer.len()
    }

    /// Bytes written so far.
    ///
    /// Length fields of still-open messages read as zero.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Reset to empty, keeping the allocation.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.open.clear();
    }

    /// Hand off the finished buffer.
    ///
    /// # Errors
    ///
    /// [`WireError::UnclosedMessages`] if any message is still open; the
    /// bytes would carry unpatched length fields.
    pub fn finish(self) -> Result<Bytes> {
        if !self.open.is_empty() {
            return Err(WireError::UnclosedMessages(self.open.len()));
        }
        Ok(self.buffer.freeze())
    }
}

/// Length of a size-prefixed field as its u32 prefix value.
fn size_prefix(length: usize) -> Result<u32> {
    u32::try_from(length).map_err(|_| WireError::FieldTooLarge { length })
}

impl Default for MessageWriter {
    fn default() -> Self {
        Self::with_config(WriterConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_message_length() {
        let mut writer = MessageWriter::new(128);
        writer.start_message(1).unwrap();
        writer.write_bool(true);
        writer.write_bool(false);
        writer.end_message().unwrap();

        assert_eq!(writer.len(), 5);
        assert_eq!(writer.position(), writer.len());
        assert_eq!(writer.as_bytes(), &[2, 0, 1, 1, 0]);
    }

    #[test]
    fn test_float_message_length() {
        let mut writer = MessageWriter::new(16);
        writer.start_message(1).unwrap();
        writer.write_f32(12.34);
        writer.end_message().unwrap();

        assert_eq!(writer.len(), 7);
        assert_eq!(&writer.as_bytes()[3..], &12.34f32.to_le_bytes());
    }

    #[test]
    fn test_nested_lengths_patched() {
        let mut writer = MessageWriter::new(64);
        writer.start_message(1).unwrap();
        writer.write_i32(5);
        writer.start_message(2).unwrap();
        writer.write_str("HO").unwrap();
        writer.end_message().unwrap();
        writer.end_message().unwrap();

        assert_eq!(
            writer.as_bytes(),
            &[10, 0, 1, 5, 0, 0, 0, 3, 0, 2, 2, b'H', b'O']
        );
    }

    #[test]
    fn test_end_without_start() {
        let mut writer = MessageWriter::new(8);
        let err = writer.end_message().unwrap_err();
        assert!(matches!(err, WireError::NoOpenMessage));
        assert!(err.is_misuse());
    }

    #[test]
    fn test_grows_past_initial_capacity() {
        let mut writer = MessageWriter::new(1);
        writer.start_message(3).unwrap();
        for i in 0..1000u32 {
            writer.write_u32(i);
        }
        writer.end_message().unwrap();
        assert_eq!(writer.len(), 3 + 4000);
        assert_eq!(&writer.as_bytes()[..3], &[0xA0, 0x0F, 3]);
    }

    #[test]
    fn test_oversized_message_rejected_and_left_open() {
        let mut writer = MessageWriter::new(16);
        writer.start_message(1).unwrap();
        writer.write_bytes(&vec![0u8; MAX_PAYLOAD_SIZE + 1]);

        let err = writer.end_message().unwrap_err();
        assert!(matches!(err, WireError::MessageTooLarge { length } if length == 65_536));
        assert_eq!(writer.open_messages(), 1);
        assert_eq!(&writer.as_bytes()[..2], &[0, 0]);

        writer.cancel_message().unwrap();
        assert!(writer.is_empty());
    }

    #[test]
    fn test_max_payload_accepted() {
        let mut writer = MessageWriter::new(16);
        writer.start_message(1).unwrap();
        writer.write_bytes(&vec![0u8; MAX_PAYLOAD_SIZE]);
        writer.end_message().unwrap();
        assert_eq!(&writer.as_bytes()[..3], &[0xFF, 0xFF, 1]);
    }

    #[test]
    fn test_cancel_message_truncates() {
        let mut writer = MessageWriter::new(32);
        writer.start_message(1).unwrap();
        writer.write_u8(7);
        writer.start_message(2).unwrap();
        writer.write_str("discard me").unwrap();
        writer.cancel_message().unwrap();
        writer.end_message().unwrap();

        assert_eq!(writer.as_bytes(), &[1, 0, 1, 7]);
        assert!(writer.cancel_message().is_err());
    }

    #[test]
    fn test_has_bytes() {
        let mut writer = MessageWriter::new(32);
        writer.write_u16(0);
        assert!(writer.has_bytes(2));
        assert!(!writer.has_bytes(3));

        writer.start_message(1).unwrap();
        assert!(writer.has_bytes(0));
        assert!(!writer.has_bytes(1));
        writer.write_u8(1);
        assert!(writer.has_bytes(1));
    }

    #[test]
    fn test_nesting_limit() {
        let config = WriterConfig::default().max_nesting_depth(2);
        let mut writer = MessageWriter::with_config(config);
        writer.start_message(1).unwrap();
        writer.start_message(2).unwrap();

        let err = writer.start_message(3).unwrap_err();
        assert!(matches!(err, WireError::NestingTooDeep { limit: 2 }));
        assert_eq!(writer.open_messages(), 2);
    }

    #[test]
    fn test_finish_with_open_message_fails() {
        let mut writer = MessageWriter::new(8);
        writer.start_message(1).unwrap();
        let err = writer.finish().unwrap_err();
        assert!(matches!(err, WireError::UnclosedMessages(1)));
    }

    #[test]
    fn test_clear_resets() {
        let mut writer = MessageWriter::new(8);
        writer.start_message(1).unwrap();
        writer.write_u64(1);
        writer.clear();

        assert!(writer.is_empty());
        assert_eq!(writer.open_messages(), 0);
        assert!(writer.finish().unwrap().is_empty());
    }

    #[test]
    fn test_packed_writes() {
        let mut writer = MessageWriter::new(16);
        writer.write_packed_u32(300);
        writer.write_packed_i32(-1);
        writer.write_packed_i64(1);
        assert_eq!(writer.as_bytes(), &[0xAC, 0x02, 0x01, 0x02]);
    }

    #[test]
    fn test_empty_string_is_single_byte() {
        let mut writer = MessageWriter::new(4);
        writer.write_str("").unwrap();
        assert_eq!(writer.as_bytes(), &[0]);
    }

    #[test]
    fn test_write_message_copies_tagged_reader() {
        let source = [2, 0, 9, 0xAA, 0xBB];
        let mut reader = MessageReader::get(&source, 0).unwrap();
        reader.read_u8().unwrap();

        let mut writer = MessageWriter::new(8);
        writer.write_message(&reader).unwrap();
        assert_eq!(writer.as_bytes(), &source);

        let raw = MessageReader::new(&source[3..]);
        let mut writer = MessageWriter::new(8);
        writer.write_message(&raw).unwrap();
        assert_eq!(writer.as_bytes(), &[0xAA, 0xBB]);
    }

    #[test]
    fn test_write_message_too_large_leaves_writer_untouched() {
        let big = Frame::from_parts(7, &vec![0u8; MAX_PAYLOAD_SIZE + 1]);

        let mut writer = MessageWriter::new(16);
        writer.start_message(1).unwrap();
        writer.write_u8(0xAB);

        let err = writer.write_message(&big.reader()).unwrap_err();
        assert!(matches!(err, WireError::MessageTooLarge { length } if length == 65_536));
        assert_eq!(writer.open_messages(), 1);
        assert_eq!(writer.len(), HEADER_SIZE + 1);

        writer.end_message().unwrap();
        assert_eq!(writer.finish().unwrap().as_ref(), &[1, 0, 1, 0xAB]);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_size_prefix_limit() {
        assert_eq!(size_prefix(u32::MAX as usize).unwrap(), u32::MAX);

        let err = size_prefix(u32::MAX as usize + 1).unwrap_err();
        assert!(matches!(err, WireError::FieldTooLarge { length } if length == 1 << 32));
    }

    #[test]
    fn test_write_frame() {
        let mut writer = MessageWriter::new(8);
        writer.write_frame(&Frame::from_parts(5, b"xyz")).unwrap();
        assert_eq!(writer.as_bytes(), &[3, 0, 5, b'x', b'y', b'z']);
    }
}
