//! Packed (variable-length) integer encoding.
//!
//! Base-128 groups, least significant first. Each byte carries 7 value bits;
//! the high bit is set when more bytes follow:
//!
//! ```text
//! 300 = 0b1_0010_1100  ->  [1010_1100] [0000_0010]
//!                           ^cont       ^last
//! ```
//!
//! Signed values go through the zigzag mapping first so that small negative
//! numbers stay short: `0 -> 0, -1 -> 1, 1 -> 2, -2 -> 3, ...`.

use bytes::BufMut;

use crate::error::{Result, WireError};

/// Longest valid packed encoding of a 32-bit value.
pub const MAX_PACKED_U32_LEN: usize = 5;

/// Longest valid packed encoding of a 64-bit value.
pub const MAX_PACKED_U64_LEN: usize = 10;

const CONTINUATION: u8 = 0x80;
const VALUE_MASK: u8 = 0x7F;

/// Append the packed encoding of `value` to `buf`.
pub fn put_packed_u64<B: BufMut>(buf: &mut B, mut value: u64) {
    while value >= u64::from(CONTINUATION) {
        buf.put_u8((value as u8 & VALUE_MASK) | CONTINUATION);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}

/// Number of bytes `value` occupies when packed.
#[inline]
pub fn packed_len_u64(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    bits.div_ceil(7)
}

/// Number of bytes a 32-bit `value` occupies when packed.
#[inline]
pub fn packed_len_u32(value: u32) -> usize {
    packed_len_u64(u64::from(value))
}

/// Decode a packed integer of at most `bits` significant bits from the
/// front of `buf`.
///
/// Returns the value and the number of bytes consumed. Fails with
/// [`WireError::Truncated`] if `buf` ends before the final group, and with
/// [`WireError::PackedOverflow`] if the encoding runs past `bits`.
///
/// # Example
///
/// ```
/// use tagwire::protocol::decode_packed;
///
/// let (value, used) = decode_packed(&[0xAC, 0x02, 0xFF], 32).unwrap();
/// assert_eq!((value, used), (300, 2));
/// ```
pub fn decode_packed(buf: &[u8], bits: u32) -> Result<(u64, usize)> {
    debug_assert!(bits > 0 && bits <= 64);
    let max_groups = bits.div_ceil(7) as usize;
    let mut value = 0u64;

    for index in 0..max_groups {
        let byte = *buf.get(index).ok_or(WireError::Truncated {
            needed: index + 1,
            remaining: buf.len(),
        })?;
        let shift = 7 * index as u32;
        let group = u64::from(byte & VALUE_MASK);

        if index + 1 == max_groups {
            // Last allowed group: no continuation, no bits past the target width.
            if byte & CONTINUATION != 0 || group >> (bits - shift) != 0 {
                return Err(WireError::PackedOverflow { bits });
            }
        }

        value |= group << shift;
        if byte & CONTINUATION == 0 {
            return Ok((value, index + 1));
        }
    }

    Err(WireError::PackedOverflow { bits })
}

/// Map a signed 32-bit value onto the unsigned range.
#[inline]
pub fn zigzag_encode32(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

/// Inverse of [`zigzag_encode32`].
#[inline]
pub fn zigzag_decode32(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

/// Map a signed 64-bit value onto the unsigned range.
#[inline]
pub fn zigzag_encode64(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Inverse of [`zigzag_encode64`].
#[inline]
pub fn zigzag_decode64(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}
