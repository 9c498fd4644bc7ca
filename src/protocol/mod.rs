//! Protocol module - wire format, packed integers, and frame types.
//!
//! This module defines the byte layout shared by the writer and reader:
//! - 3-byte message header encoding/decoding
//! - Packed (base-128) and zigzag integer helpers
//! - Owned `Frame` for messages detached from their buffer
//! - `Encode`/`Decode` traits for the generic read/write family

mod frame;
pub mod packed;
mod value;
mod wire_format;

pub use frame::Frame;
pub use packed::{decode_packed, MAX_PACKED_U32_LEN, MAX_PACKED_U64_LEN};
pub use value::{Decode, Encode};
pub use wire_format::{patch_length, Header, HEADER_SIZE, LENGTH_FIELD_SIZE, MAX_PAYLOAD_SIZE};
