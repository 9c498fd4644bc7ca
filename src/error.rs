//! Error types for tagwire.

use thiserror::Error;

use crate::protocol::MAX_PAYLOAD_SIZE;

/// Main error type for all codec operations.
///
/// Variants fall into four classes, see [`WireError::is_malformed`],
/// [`WireError::is_misuse`] and [`WireError::is_decode`]. Overflow on
/// close ([`WireError::MessageTooLarge`]) belongs to none of them.
#[derive(Debug, Error)]
pub enum WireError {
    /// A fixed or variable width read needs more bytes than the view holds.
    #[error("Truncated input: need {needed} bytes, only {remaining} remain")]
    Truncated { needed: usize, remaining: usize },

    /// A nested message header declares more payload than the view holds.
    #[error("Message overrun: header declares {declared} payload bytes, only {remaining} remain")]
    MessageOverrun { declared: usize, remaining: usize },

    /// A packed integer did not terminate within the width of its target type.
    #[error("Packed integer exceeds {bits} bits")]
    PackedOverflow { bits: u32 },

    /// A raw span does not fit inside the buffer it was cut from.
    #[error("Span {offset}+{length} exceeds buffer of {available} bytes")]
    SpanOutOfBounds {
        offset: usize,
        length: usize,
        available: usize,
    },

    /// A message payload would not fit in the 16-bit length field.
    #[error("Message payload of {length} bytes exceeds maximum {}", MAX_PAYLOAD_SIZE)]
    MessageTooLarge { length: usize },

    /// A size-prefixed field is longer than its u32 length prefix allows.
    #[error("Field of {length} bytes exceeds the u32 size prefix")]
    FieldTooLarge { length: usize },

    /// `end_message` or `cancel_message` called with no open message.
    #[error("No open message")]
    NoOpenMessage,

    /// The buffer was finished while messages were still open.
    #[error("{0} message(s) still open")]
    UnclosedMessages(usize),

    /// A reader seek landed outside `[0, length]`.
    #[error("Position {position} out of range 0..={length}")]
    PositionOutOfRange { position: usize, length: usize },

    /// `start_message` would exceed the configured nesting depth.
    #[error("Nesting depth limit of {limit} reached")]
    NestingTooDeep { limit: usize },

    /// A string field held bytes that are not UTF-8.
    #[error("Invalid UTF-8 in string field: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// MsgPack serialization error.
    #[error("MsgPack encode error: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),

    /// MsgPack deserialization error.
    #[error("MsgPack decode error: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),
}

impl WireError {
    /// Input-driven failure: the bytes themselves are bad or short.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            WireError::Truncated { .. }
                | WireError::MessageOverrun { .. }
                | WireError::PackedOverflow { .. }
                | WireError::SpanOutOfBounds { .. }
        )
    }

    /// Caller bug: the API was used out of order or out of range.
    pub fn is_misuse(&self) -> bool {
        matches!(
            self,
            WireError::NoOpenMessage
                | WireError::UnclosedMessages(_)
                | WireError::PositionOutOfRange { .. }
                | WireError::NestingTooDeep { .. }
        )
    }

    /// Bytes were framed correctly but their content failed to decode.
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            WireError::InvalidUtf8(_) | WireError::MsgPackEncode(_) | WireError::MsgPackDecode(_)
        )
    }
}

/// Result type alias using WireError.
pub type Result<T> = std::result::Result<T, WireError>;
