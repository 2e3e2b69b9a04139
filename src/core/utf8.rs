//! UTF-8 encoding of single code points.
//!
//! Cells store raw `u32` code points so that an invalid value can reach the
//! renderer; encoding happens here, one code point at a time.

use std::fmt;
use thiserror::Error;

/// Largest valid Unicode scalar value.
pub const MAX_CODEPOINT: u32 = 0x10FFFF;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Failed to encode character to UTF-8: 0x{0:X}")]
pub struct EncodeError(pub u32);

/// Encoded bytes of one code point (1 to 4 bytes).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Utf8Bytes {
    buf: [u8; 4],
    len: u8,
}

impl Utf8Bytes {
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len as usize]
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Debug for Utf8Bytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Utf8Bytes({:02X?})", self.as_bytes())
    }
}

/// Number of bytes needed to encode `c`, or `None` if `c` is not encodable.
pub fn encoded_len(c: u32) -> Option<usize> {
    match c {
        0..=0x7F => Some(1),
        0x80..=0x7FF => Some(2),
        0xD800..=0xDFFF => None, // surrogates
        0x800..=0xFFFF => Some(3),
        0x10000..=MAX_CODEPOINT => Some(4),
        _ => None,
    }
}

/// Encode a code point to UTF-8.
pub fn encode(c: u32) -> Result<Utf8Bytes, EncodeError> {
    let len = encoded_len(c).ok_or(EncodeError(c))?;
    let mut buf = [0u8; 4];

    match len {
        1 => {
            buf[0] = c as u8;
        }
        2 => {
            buf[0] = 0xC0 | ((c >> 6) & 0x1F) as u8;
            buf[1] = 0x80 | (c & 0x3F) as u8;
        }
        3 => {
            buf[0] = 0xE0 | ((c >> 12) & 0x0F) as u8;
            buf[1] = 0x80 | ((c >> 6) & 0x3F) as u8;
            buf[2] = 0x80 | (c & 0x3F) as u8;
        }
        _ => {
            buf[0] = 0xF0 | ((c >> 18) & 0x07) as u8;
            buf[1] = 0x80 | ((c >> 12) & 0x3F) as u8;
            buf[2] = 0x80 | ((c >> 6) & 0x3F) as u8;
            buf[3] = 0x80 | (c & 0x3F) as u8;
        }
    }

    Ok(Utf8Bytes { buf, len: len as u8 })
}
