//! Length-prefix encoding for packed bucket entries.
//!
//! Every entry in a packed bucket starts with the byte length of its key,
//! stored in one or two bytes:
//! - 0-127: 1 byte, `len << 1` (low bit clear)
//! - 128-32767: 2 bytes, little-endian `(len << 1) | 1` (low bit set)
//!
//! The low bit of the first byte therefore tells the decoder how wide the
//! prefix is. One bit of the 16-bit form is spent on that flag, which caps
//! keys at `2^15 - 1` bytes.

/// Longest key the 2-byte prefix can describe.
pub const MAX_KEY_LEN: usize = (1 << 15) - 1;

/// Longest encoded prefix, in bytes.
pub const MAX_PREFIX_WIDTH: usize = 2;

const SHORT_LIMIT: usize = 128;
const WIDE_FLAG: u8 = 0x01;

/// Number of bytes the prefix for a key of `len` bytes occupies.
#[inline]
pub fn prefix_width(len: usize) -> usize {
    if len < SHORT_LIMIT {
        1
    } else {
        2
    }
}

/// Encode `len` into the start of `buf`.
///
/// Returns the number of bytes written. `buf` must hold at least
/// [`prefix_width`] bytes and `len` must not exceed [`MAX_KEY_LEN`].
#[inline]
pub fn encode_len_prefix(len: usize, buf: &mut [u8]) -> usize {
    debug_assert!(len <= MAX_KEY_LEN, "key length {len} not encodable");
    if len < SHORT_LIMIT {
        buf[0] = (len as u8) << 1;
        1
    } else {
        let word = ((len as u16) << 1) | u16::from(WIDE_FLAG);
        buf[..2].copy_from_slice(&word.to_le_bytes());
        2
    }
}

/// Decode a prefix from the start of `buf`.
///
/// Returns (key_len, bytes_consumed).
#[inline]
pub fn decode_len_prefix(buf: &[u8]) -> (usize, usize) {
    if buf[0] & WIDE_FLAG == 0 {
        (usize::from(buf[0] >> 1), 1)
    } else {
        let word = u16::from_le_bytes([buf[0], buf[1]]);
        (usize::from(word >> 1), 2)
    }
}
