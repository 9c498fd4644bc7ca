//! MsgPack codec using `rmp-serde`.
//!
//! Always `to_vec_named`, never `to_vec`: structs are written as maps with
//! field names, so a field written by one build still decodes after fields
//! are reordered or added with `#[serde(default)]`.
//!
//! # Example
//!
//! ```
//! use tagwire::codec::MsgPackCodec;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Spawn {
//!     owner: i32,
//!     children: Vec<u32>,
//! }
//!
//! let msg = Spawn { owner: -1, children: vec![3, 4] };
//! let encoded = MsgPackCodec::encode(&msg).unwrap();
//! let decoded: Spawn = MsgPackCodec::decode(&encoded).unwrap();
//! assert_eq!(decoded, msg);
//! ```

use crate::error::Result;

/// MessagePack codec for structured fields.
///
/// Used by [`MessageWriter::write_msgpack`](crate::MessageWriter::write_msgpack)
/// and [`MessageReader::read_msgpack`](crate::MessageReader::read_msgpack).
pub struct MsgPackCodec;

impl MsgPackCodec {
    /// Encode a value to MsgPack bytes.
    ///
    /// Structs are written as maps.
    ///
    /// # Errors
    ///
    /// Returns error if the value cannot be serialized.
    #[inline]
    pub fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec_named(value)?)
    }

    /// Decode MsgPack bytes to a value.
    ///
    /// # Errors
    ///
    /// Returns error if the bytes cannot be deserialized to type T.
    #[inline]
    pub fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}
