//! # tagwire
//!
//! Compact binary message codec with tagged, length-framed, nestable
//! messages.
//!
//! A [`MessageWriter`] appends typed values to a growable buffer and keeps a
//! stack of open messages whose lengths are patched in when they close. A
//! [`MessageReader`] is a cursor over borrowed bytes that decodes the same
//! values in order and descends into nested messages without copying.
//!
//! ## Wire format
//!
//! - **Message**: `[u16 LE payload length][u8 tag][payload]`; the length
//!   excludes the 3-byte header and is capped at 65535.
//! - **Fixed width**: bool (1 byte), 8/16/32/64-bit integers and `f32`,
//!   all Little Endian.
//! - **Packed**: base-128 varint, low group first; signed values are
//!   zigzag-mapped first.
//! - **Bytes / strings**: packed length, then the raw bytes.
//!
//! Tags are opaque to this crate. Moving the bytes between peers is the
//! caller's job.
//!
//! ## Example
//!
//! ```
//! use tagwire::{MessageReader, MessageWriter};
//!
//! let mut writer = MessageWriter::new(128);
//! writer.start_message(1).unwrap();
//! writer.write_i32(65534);
//! for word in ["HO", "NO"] {
//!     writer.start_message(2).unwrap();
//!     writer.write_str(word).unwrap();
//!     writer.end_message().unwrap();
//! }
//! writer.end_message().unwrap();
//! let bytes = writer.finish().unwrap();
//!
//! let mut reader = MessageReader::get(&bytes, 0).unwrap();
//! assert_eq!(reader.tag(), Some(1));
//! assert_eq!(reader.read_i32().unwrap(), 65534);
//!
//! let mut sub = reader.read_message().unwrap();
//! assert_eq!((sub.tag(), sub.len()), (Some(2), 3));
//! assert_eq!(sub.read_str().unwrap(), "HO");
//!
//! let mut sub = reader.read_message().unwrap();
//! assert_eq!(sub.read_str().unwrap(), "NO");
//! assert!(reader.is_exhausted());
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod protocol;

mod reader;
mod writer;

pub use config::WriterConfig;
pub use error::{Result, WireError};
pub use protocol::{Decode, Encode, Frame};
pub use reader::{MessageReader, Messages};
pub use writer::MessageWriter;
