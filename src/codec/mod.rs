//! Codec module - structured field encoding.
//!
//! The primitive encodings live on [`MessageWriter`](crate::MessageWriter)
//! and [`MessageReader`](crate::MessageReader). This module adds codecs for
//! values that are serialized as a whole and stored in a message as one
//! size-prefixed byte array:
//!
//! - [`MsgPackCodec`] - MessagePack using `rmp-serde` (`to_vec_named`, struct-as-map)
//!
//! # Example
//!
//! ```
//! use tagwire::{MessageReader, MessageWriter};
//!
//! let mut writer = MessageWriter::new(64);
//! writer.start_message(3).unwrap();
//! writer.write_msgpack(&("player", 7u32)).unwrap();
//! writer.end_message().unwrap();
//!
//! let bytes = writer.finish().unwrap();
//! let mut reader = MessageReader::get(&bytes, 0).unwrap();
//! let (name, id): (String, u32) = reader.read_msgpack().unwrap();
//! assert_eq!((name.as_str(), id), ("player", 7));
//! ```

mod msgpack;

pub use msgpack::MsgPackCodec;
