//! Generic value encoding.
//!
//! [`Encode`] and [`Decode`] back the `write(value)` / `read::<T>()` pair on
//! [`MessageWriter`] and [`MessageReader`]. Every implementation delegates to
//! the typed method of the same kind, so the generic and typed forms always
//! produce identical bytes.
//!
//! Byte slices and strings use the size-prefixed encoding. Packed integers
//! have no generic form; call `write_packed_*` / `read_packed_*` directly.

use crate::error::Result;
use crate::reader::MessageReader;
use crate::writer::MessageWriter;

/// A value that can be appended to a [`MessageWriter`].
pub trait Encode {
    /// Append the wire encoding of `self`.
    fn encode(&self, writer: &mut MessageWriter) -> Result<()>;
}

/// A value that can be read from a [`MessageReader`].
///
/// The lifetime lets borrowed types (`&'a str`, `&'a [u8]`) point straight
/// into the reader's buffer.
pub trait Decode<'a>: Sized {
    /// Read one value, advancing the reader.
    fn decode(reader: &mut MessageReader<'a>) -> Result<Self>;
}

impl<T: Encode + ?Sized> Encode for &T {
    #[inline]
    fn encode(&self, writer: &mut MessageWriter) -> Result<()> {
        (**self).encode(writer)
    }
}

macro_rules! fixed_width {
    ($($ty:ty => $write:ident, $read:ident;)*) => {
        $(
            impl Encode for $ty {
                #[inline]
                fn encode(&self, writer: &mut MessageWriter) -> Result<()> {
                    writer.$write(*self);
                    Ok(())
                }
            }

            impl<'a> Decode<'a> for $ty {
                #[inline]
                fn decode(reader: &mut MessageReader<'a>) -> Result<Self> {
                    reader.$read()
                }
            }
        )*
    };
}

fixed_width! {
    bool => write_bool, read_bool;
    u8 => write_u8, read_u8;
    i8 => write_i8, read_i8;
    u16 => write_u16, read_u16;
    i16 => write_i16, read_i16;
    u32 => write_u32, read_u32;
    i32 => write_i32, read_i32;
    u64 => write_u64, read_u64;
    i64 => write_i64, read_i64;
    f32 => write_f32, read_f32;
}

impl Encode for str {
    fn encode(&self, writer: &mut MessageWriter) -> Result<()> {
        writer.write_str(self)
    }
}

impl Encode for String {
    fn encode(&self, writer: &mut MessageWriter) -> Result<()> {
        writer.write_str(self)
    }
}

impl Encode for [u8] {
    fn encode(&self, writer: &mut MessageWriter) -> Result<()> {
        writer.write_bytes_and_size(self)
    }
}

impl Encode for Vec<u8> {
    fn encode(&self, writer: &mut MessageWriter) -> Result<()> {
        writer.write_bytes_and_size(self)
    }
}

impl<'a> Decode<'a> for &'a str {
    fn decode(reader: &mut MessageReader<'a>) -> Result<Self> {
        reader.read_str()
    }
}

impl<'a> Decode<'a> for String {
    fn decode(reader: &mut MessageReader<'a>) -> Result<Self> {
        reader.read_string()
    }
}

impl<'a> Decode<'a> for &'a [u8] {
    fn decode(reader: &mut MessageReader<'a>) -> Result<Self> {
        reader.read_bytes_and_size()
    }
}

impl<'a> Decode<'a> for Vec<u8> {
    fn decode(reader: &mut MessageReader<'a>) -> Result<Self> {
        reader.read_bytes_and_size().map(<[u8]>::to_vec)
    }
}
