//! Zero-copy message reader.
//!
//! A `MessageReader` is a cursor over a borrowed byte slice that is exactly
//! one message payload (or a raw span with no header). Every read is bounds
//! checked against that slice, never against the buffer it was cut from, so
//! a reader for a nested message cannot run into its siblings even though
//! the bytes physically continue.
//!
//! ```text
//! parent view    [05 00 00 00][03 00 02][02 48 4F][03 00 02][02 4E 4F]
//!                 read_i32()   read_message() ──▶ child view [02 48 4F]
//!                              position jumps past header + payload
//! ```
//!
//! # States
//!
//! A reader starts at position 0, advances with each read, and is exhausted
//! when `position == len`. Exhaustion is not an error; reading past it is.
//! [`set_position`](MessageReader::set_position) rewinds or skips within
//! `[0, len]`.

use serde::de::DeserializeOwned;

use crate::codec::MsgPackCodec;
use crate::error::{Result, WireError};
use crate::protocol::{
    decode_packed,
    packed::{zigzag_decode32, zigzag_decode64},
    Decode, Frame, Header, HEADER_SIZE,
};

/// Cursor over one message payload.
///
/// Cloning duplicates the cursor; both clones see the same bytes.
#[derive(Debug, Clone)]
pub struct MessageReader<'a> {
    /// The payload this reader is scoped to; `len()` is its length.
    buffer: &'a [u8],
    /// Tag from the header that preceded `buffer`, if there was one.
    tag: Option<u8>,
    /// Read cursor relative to `buffer`.
    position: usize,
}

impl<'a> MessageReader<'a> {
    /// Untagged reader over the whole of `buffer`.
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            tag: None,
            position: 0,
        }
    }

    pub(crate) fn tagged(tag: u8, payload: &'a [u8]) -> Self {
        Self {
            buffer: payload,
            tag: Some(tag),
            position: 0,
        }
    }

    /// Reader for the message whose header starts at `offset`.
    ///
    /// The returned reader's tag and length come from the header, and its
    /// position starts at the first payload byte.
    ///
    /// # Errors
    ///
    /// Malformed-input errors if the header or declared payload do not fit
    /// in `buffer`.
    pub fn get(buffer: &'a [u8], offset: usize) -> Result<Self> {
        let rest = buffer.get(offset..).ok_or(WireError::SpanOutOfBounds {
            offset,
            length: 0,
            available: buffer.len(),
        })?;
        MessageReader::new(rest).read_message()
    }

    /// Untagged reader over `length` bytes of `buffer` starting at `offset`.
    pub fn from_span(buffer: &'a [u8], offset: usize, length: usize) -> Result<Self> {
        let span = offset
            .checked_add(length)
            .and_then(|end| buffer.get(offset..end))
            .ok_or(WireError::SpanOutOfBounds {
                offset,
                length,
                available: buffer.len(),
            })?;
        Ok(Self::new(span))
    }

    /// Tagged reader over an owned frame's payload.
    pub fn from_frame(frame: &'a Frame) -> Self {
        frame.reader()
    }

    // ------------------------------------------------------------------
    // View state
    // ------------------------------------------------------------------

    /// Tag of the message, or `None` for a raw span.
    #[inline]
    pub fn tag(&self) -> Option<u8> {
        self.tag
    }

    /// Payload length of the view.
    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Move the cursor within the view.
    ///
    /// # Errors
    ///
    /// [`WireError::PositionOutOfRange`] if `position > len()`.
    pub fn set_position(&mut self, position: usize) -> Result<()> {
        if position > self.buffer.len() {
            return Err(WireError::PositionOutOfRange {
                position,
                length: self.buffer.len(),
            });
        }
        self.position = position;
        Ok(())
    }

    /// Bytes left between the cursor and the end of the view.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.position
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.position == self.buffer.len()
    }

    /// The whole payload, independent of the cursor.
    #[inline]
    pub fn payload(&self) -> &'a [u8] {
        self.buffer
    }

    // ------------------------------------------------------------------
    // Raw access
    // ------------------------------------------------------------------

    /// Take the next `count` bytes, or fail without moving.
    #[inline]
    fn take(&mut self, count: usize) -> Result<&'a [u8]> {
        let remaining = self.remaining();
        if count > remaining {
            return Err(WireError::Truncated {
                needed: count,
                remaining,
            });
        }
        let start = self.position;
        self.position += count;
        Ok(&self.buffer[start..self.position])
    }

    #[inline]
    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.take(N)?;
        let mut array = [0u8; N];
        array.copy_from_slice(bytes);
        Ok(array)
    }

    /// Read exactly `count` raw bytes.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        self.take(count)
    }

    /// Read a packed length, then that many bytes.
    ///
    /// On failure the cursor is left where it was.
    pub fn read_bytes_and_size(&mut self) -> Result<&'a [u8]> {
        let start = self.position;
        let result = self
            .read_packed_u32()
            .and_then(|length| self.take(length as usize));
        if result.is_err() {
            self.position = start;
        }
        result
    }

    // ------------------------------------------------------------------
    // Fixed width values (all Little Endian)
    // ------------------------------------------------------------------

    /// Read any [`Decode`] value.
    #[inline]
    pub fn read<T: Decode<'a>>(&mut self) -> Result<T> {
        T::decode(self)
    }

    /// Any nonzero byte reads as `true`.
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take_array::<1>()?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.take_array().map(u16::from_le_bytes)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        self.take_array().map(i16::from_le_bytes)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.take_array().map(u32::from_le_bytes)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.take_array().map(i32::from_le_bytes)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.take_array().map(u64::from_le_bytes)
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.take_array().map(i64::from_le_bytes)
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.take_array().map(f32::from_le_bytes)
    }

    // ------------------------------------------------------------------
    // Variable width values
    // ------------------------------------------------------------------

    fn read_packed(&mut self, bits: u32) -> Result<u64> {
        let (value, used) = decode_packed(&self.buffer[self.position..], bits)?;
        self.position += used;
        Ok(value)
    }

    /// Read a packed unsigned integer of at most 5 bytes.
    pub fn read_packed_u32(&mut self) -> Result<u32> {
        Ok(self.read_packed(32)? as u32)
    }

    /// Read a packed zigzag-mapped signed integer.
    pub fn read_packed_i32(&mut self) -> Result<i32> {
        self.read_packed_u32().map(zigzag_decode32)
    }

    /// Read a packed unsigned integer of at most 10 bytes.
    pub fn read_packed_u64(&mut self) -> Result<u64> {
        self.read_packed(64)
    }

    pub fn read_packed_i64(&mut self) -> Result<i64> {
        self.read_packed_u64().map(zigzag_decode64)
    }

    /// Read a size-prefixed UTF-8 string without copying.
    ///
    /// Invalid UTF-8 fails with [`WireError::InvalidUtf8`] and leaves the
    /// cursor after the string, so the caller may skip the field and go on.
    pub fn read_str(&mut self) -> Result<&'a str> {
        let bytes = self.read_bytes_and_size()?;
        Ok(std::str::from_utf8(bytes)?)
    }

    /// Owned variant of [`read_str`](Self::read_str).
    pub fn read_string(&mut self) -> Result<String> {
        self.read_str().map(str::to_owned)
    }

    /// Read a byte array and deserialize it as MsgPack.
    pub fn read_msgpack<T: DeserializeOwned>(&mut self) -> Result<T> {
        let bytes = self.read_bytes_and_size()?;
        MsgPackCodec::decode(bytes)
    }

    // ------------------------------------------------------------------
    // Nested messages
    // ------------------------------------------------------------------

    /// Enter the nested message at the cursor.
    ///
    /// The returned reader is scoped to exactly that message's payload; this
    /// reader's position moves past the whole message (header + payload), so
    /// repeated calls walk siblings left to right.
    ///
    /// # Errors
    ///
    /// - [`WireError::Truncated`] if fewer than 3 bytes remain.
    /// - [`WireError::MessageOverrun`] if the declared payload runs past the view.
    ///
    /// The cursor does not move on failure.
    pub fn read_message(&mut self) -> Result<MessageReader<'a>> {
        let rest = &self.buffer[self.position..];
        let header = Header::decode(rest).ok_or(WireError::Truncated {
            needed: HEADER_SIZE,
            remaining: rest.len(),
        })?;

        let declared = header.payload_length as usize;
        let available = rest.len() - HEADER_SIZE;
        if declared > available {
            tracing::debug!(
                tag = header.tag,
                declared,
                available,
                position = self.position,
                "nested message overruns its parent"
            );
            return Err(WireError::MessageOverrun {
                declared,
                remaining: available,
            });
        }

        let payload = &rest[HEADER_SIZE..header.frame_size()];
        self.position += header.frame_size();
        Ok(MessageReader::tagged(header.tag, payload))
    }

    /// Enter the nested message at the cursor and detach it into an owned
    /// [`Frame`] (copies the payload).
    pub fn read_message_as_frame(&mut self) -> Result<Frame> {
        let message = self.read_message()?;
        Ok(Frame::from_parts(
            message.tag.unwrap_or_default(),
            message.buffer,
        ))
    }

    /// Iterate the nested messages from the cursor to the end of the view.
    ///
    /// Yields one error at most, then stops.
    ///
    /// ```
    /// use tagwire::{MessageReader, MessageWriter};
    ///
    /// let mut writer = MessageWriter::new(32);
    /// for tag in 1..=3 {
    ///     writer.start_message(tag).unwrap();
    ///     writer.end_message().unwrap();
    /// }
    /// let bytes = writer.finish().unwrap();
    ///
    /// let mut root = MessageReader::new(&bytes);
    /// let tags: Vec<_> = root.messages().map(|m| m.unwrap().tag()).collect();
    /// assert_eq!(tags, [Some(1), Some(2), Some(3)]);
    /// ```
    pub fn messages(&mut self) -> Messages<'_, 'a> {
        Messages {
            parent: self,
            failed: false,
        }
    }
}

/// Iterator over sibling nested messages, see [`MessageReader::messages`].
#[derive(Debug)]
pub struct Messages<'r, 'a> {
    parent: &'r mut MessageReader<'a>,
    failed: bool,
}

impl<'r, 'a> Iterator for Messages<'r, 'a> {
    type Item = Result<MessageReader<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.parent.is_exhausted() {
            return None;
        }
        let result = self.parent.read_message();
        self.failed = result.is_err();
        Some(result)
    }
}

impl std::iter::FusedIterator for Messages<'_, '_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_reads_header() {
        let buf = [4, 0, 7, 1, 2, 3, 4, 0xEE];
        let reader = MessageReader::get(&buf, 0).unwrap();
        assert_eq!(reader.tag(), Some(7));
        assert_eq!(reader.len(), 4);
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.payload(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_get_at_offset() {
        let buf = [0xAA, 0xBB, 1, 0, 3, 9];
        let mut reader = MessageReader::get(&buf, 2).unwrap();
        assert_eq!(reader.tag(), Some(3));
        assert_eq!(reader.read_u8().unwrap(), 9);
        assert!(reader.is_exhausted());
    }

    #[test]
    fn test_get_rejects_bad_offsets() {
        let buf = [1, 0, 3, 9];
        assert!(matches!(
            MessageReader::get(&buf, 10).unwrap_err(),
            WireError::SpanOutOfBounds { .. }
        ));
        assert!(matches!(
            MessageReader::get(&buf, 2).unwrap_err(),
            WireError::Truncated { needed: 3, remaining: 2 }
        ));
    }

    #[test]
    fn test_from_span_is_untagged() {
        let buf = [1, 2, 3, 4, 5];
        let reader = MessageReader::from_span(&buf, 1, 3).unwrap();
        assert_eq!(reader.tag(), None);
        assert_eq!(reader.payload(), &[2, 3, 4]);

        assert!(MessageReader::from_span(&buf, 3, 3).unwrap_err().is_malformed());
        assert!(MessageReader::from_span(&buf, usize::MAX, 2).is_err());
    }

    #[test]
    fn test_fixed_reads_are_little_endian() {
        let buf = [0x01, 0x02, 0x03, 0x04, 0xFF, 0xFF];
        let mut reader = MessageReader::new(&buf);
        assert_eq!(reader.read_u32().unwrap(), 0x0403_0201);
        assert_eq!(reader.read_i16().unwrap(), -1);
    }

    #[test]
    fn test_nonzero_bool_is_true() {
        let mut reader = MessageReader::new(&[0, 1, 0x7F]);
        assert!(!reader.read_bool().unwrap());
        assert!(reader.read_bool().unwrap());
        assert!(reader.read_bool().unwrap());
    }

    #[test]
    fn test_truncated_read_does_not_move() {
        let mut reader = MessageReader::new(&[1, 2, 3]);
        let err = reader.read_u32().unwrap_err();
        assert!(matches!(err, WireError::Truncated { needed: 4, remaining: 3 }));
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.read_u16().unwrap(), 0x0201);
    }

    #[test]
    fn test_exhausted_then_read_fails() {
        let mut reader = MessageReader::new(&[5]);
        reader.read_u8().unwrap();
        assert!(reader.is_exhausted());
        assert_eq!(reader.remaining(), 0);
        assert!(reader.read_u8().unwrap_err().is_malformed());
    }

    #[test]
    fn test_seek() {
        let mut reader = MessageReader::new(&[1, 2]);
        reader.set_position(2).unwrap();
        assert!(reader.is_exhausted());
        reader.set_position(0).unwrap();
        assert_eq!(reader.read_u8().unwrap(), 1);

        let err = reader.set_position(3).unwrap_err();
        assert!(err.is_misuse());
        assert_eq!(reader.position(), 1);
    }

    #[test]
    fn test_child_cannot_read_past_its_frame() {
        // Child declares 1 payload byte; parent keeps going.
        let buf = [1, 0, 2, 0xAA, 0xBB, 0xCC];
        let mut parent = MessageReader::new(&buf);
        let mut child = parent.read_message().unwrap();
        assert_eq!(child.len(), 1);
        assert!(child.read_u16().is_err());
        assert_eq!(child.read_u8().unwrap(), 0xAA);
        assert_eq!(parent.position(), 4);
    }

    #[test]
    fn test_read_message_overrun() {
        let buf = [10, 0, 1, 0xAA];
        let mut reader = MessageReader::new(&buf);
        let err = reader.read_message().unwrap_err();
        assert!(matches!(
            err,
            WireError::MessageOverrun { declared: 10, remaining: 1 }
        ));
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_read_message_needs_full_header() {
        let mut reader = MessageReader::new(&[0, 0]);
        assert!(matches!(
            reader.read_message().unwrap_err(),
            WireError::Truncated { needed: 3, remaining: 2 }
        ));
    }

    #[test]
    fn test_empty_nested_message() {
        let mut reader = MessageReader::new(&[0, 0, 4]);
        let child = reader.read_message().unwrap();
        assert_eq!(child.tag(), Some(4));
        assert!(child.is_empty());
        assert!(child.is_exhausted());
        assert!(reader.is_exhausted());
    }

    #[test]
    fn test_bytes_and_size_truncated_restores_position() {
        // Declares 5 bytes, only 2 follow.
        let mut reader = MessageReader::new(&[5, b'a', b'b']);
        assert!(reader.read_bytes_and_size().unwrap_err().is_malformed());
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_invalid_utf8_is_decode_error() {
        let mut reader = MessageReader::new(&[2, 0xC3, 0x28, 9]);
        let err = reader.read_str().unwrap_err();
        assert!(err.is_decode());
        assert_eq!(reader.position(), 3);
        assert_eq!(reader.read_u8().unwrap(), 9);
    }

    type ReadFn = for<'r, 'b> fn(&'r mut MessageReader<'b>) -> Result<()>;

    /// Every read one byte short of its full encoding.
    #[test]
    fn test_every_read_rejects_one_byte_short() {
        let cases: [(&str, usize, ReadFn); 14] = [
            ("bool", 1, |r| r.read_bool().map(drop)),
            ("u8", 1, |r| r.read_u8().map(drop)),
            ("i8", 1, |r| r.read_i8().map(drop)),
            ("u16", 2, |r| r.read_u16().map(drop)),
            ("i16", 2, |r| r.read_i16().map(drop)),
            ("u32", 4, |r| r.read_u32().map(drop)),
            ("i32", 4, |r| r.read_i32().map(drop)),
            ("u64", 8, |r| r.read_u64().map(drop)),
            ("i64", 8, |r| r.read_i64().map(drop)),
            ("f32", 4, |r| r.read_f32().map(drop)),
            ("packed u32", 5, |r| r.read_packed_u32().map(drop)),
            ("packed i32", 5, |r| r.read_packed_i32().map(drop)),
            ("packed u64", 10, |r| r.read_packed_u64().map(drop)),
            ("packed i64", 10, |r| r.read_packed_i64().map(drop)),
        ];

        for (name, width, read) in cases {
            // Continuation bits set so packed reads run off the end.
            let short = vec![0x80u8; width - 1];
            let mut reader = MessageReader::new(&short);
            let err = read(&mut reader).unwrap_err();
            assert!(err.is_malformed(), "{name}: {err}");
            assert_eq!(reader.position(), 0, "{name}");
        }

        // Size-prefixed fields: prefix says 3, two bytes follow.
        let short = [3u8, b'a', b'b'];
        let mut reader = MessageReader::new(&short);
        assert!(reader.read_str().unwrap_err().is_malformed());
        assert!(reader.read_bytes(4).unwrap_err().is_malformed());
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_truncated_packed() {
        let mut reader = MessageReader::new(&[0x80, 0x80]);
        assert!(reader.read_packed_u32().unwrap_err().is_malformed());
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_packed_signed() {
        let mut reader = MessageReader::new(&[0x01, 0x02, 0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
        assert_eq!(reader.read_packed_i32().unwrap(), -1);
        assert_eq!(reader.read_packed_i32().unwrap(), 1);
        assert_eq!(reader.read_packed_i32().unwrap(), i32::MIN);
    }

    #[test]
    fn test_messages_iterator_stops_after_error() {
        let buf = [0, 0, 1, 9, 0, 2];
        let mut reader = MessageReader::new(&buf);
        let mut messages = reader.messages();
        assert_eq!(messages.next().unwrap().unwrap().tag(), Some(1));
        assert!(messages.next().unwrap().is_err());
        assert!(messages.next().is_none());
    }

    #[test]
    fn test_read_message_as_frame() {
        let buf = [2, 0, 8, b'o', b'k'];
        let mut reader = MessageReader::new(&buf);
        let frame = reader.read_message_as_frame().unwrap();
        assert_eq!(frame, Frame::from_parts(8, b"ok"));
        assert!(reader.is_exhausted());
    }

    #[test]
    fn test_from_frame() {
        let frame = Frame::from_parts(6, &[1, 0]);
        let mut reader = MessageReader::from_frame(&frame);
        assert_eq!(reader.tag(), Some(6));
        assert_eq!(reader.read_u16().unwrap(), 1);
    }

    #[test]
    fn test_clone_is_independent_cursor() {
        let buf = [1, 2, 3];
        let mut reader = MessageReader::new(&buf);
        reader.read_u8().unwrap();
        let mut copy = reader.clone();
        assert_eq!(copy.read_u8().unwrap(), 2);
        assert_eq!(reader.position(), 1);
    }
}
