//! The protocol's variable-length integer.
//!
//! Each byte carries seven data bits, least significant group first, and sets
//! the high bit when another byte follows. A `u32` needs at most five bytes.

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::Error;

const SEGMENT_BITS: u8 = 0x7F;
const CONTINUE_BIT: u8 = 0x80;

/// The longest encoding of a `u32`.
pub const MAX_LEN: usize = 5;

/// Appends the encoding of `value` to `buf`, returning the number of bytes written.
#[allow(clippy::cast_possible_truncation)]
pub fn encode(mut value: u32, buf: &mut Vec<u8>) -> usize {
    let mut written = 1;
    while value >= u32::from(CONTINUE_BIT) {
        buf.push((value as u8 & SEGMENT_BITS) | CONTINUE_BIT);
        value >>= 7;
        written += 1;
    }
    buf.push(value as u8);
    written
}

/// Returns the encoding of `value` as a new buffer.
#[must_use]
pub fn encoded(value: u32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(MAX_LEN);
    encode(value, &mut buf);
    buf
}

/// Number of bytes [`encode`] emits for `value`.
#[must_use]
pub const fn encoded_len(value: u32) -> usize {
    match value {
        0..=0x7F => 1,
        0x80..=0x3FFF => 2,
        0x4000..=0x1F_FFFF => 3,
        0x20_0000..=0xFFF_FFFF => 4,
        _ => 5,
    }
}

/// Incremental decoder shared by the slice and stream readers, so both agree
/// byte for byte.
#[derive(Debug, Default)]
struct Accumulator {
    value: u32,
    read: usize,
}

impl Accumulator {
    /// Feeds one byte. Returns the value once the final byte has been seen.
    fn push(&mut self, byte: u8) -> Result<Option<u32>, Error> {
        // the fifth byte only has room for bits 28..32 and may not continue
        if self.read == MAX_LEN - 1 && byte & 0xF0 != 0 {
            return Err(Error::InvalidVarInt);
        }
        self.value |= u32::from(byte & SEGMENT_BITS) << (7 * self.read);
        self.read += 1;
        if byte & CONTINUE_BIT == 0 {
            Ok(Some(self.value))
        } else {
            Ok(None)
        }
    }
}

/// Decodes a VarInt from the front of `buf`, returning `(value, bytes_consumed)`.
///
/// # Errors
/// [`Error::Truncated`] if `buf` ends mid-VarInt, [`Error::InvalidVarInt`] if
/// the encoding runs past five bytes or overflows 32 bits.
pub fn decode(buf: &[u8]) -> Result<(u32, usize), Error> {
    let mut acc = Accumulator::default();
    for &byte in buf {
        if let Some(value) = acc.push(byte)? {
            return Ok((value, acc.read));
        }
    }
    Err(Error::Truncated)
}

/// Decodes a VarInt from the front of `buf` and advances `buf` past it.
///
/// # Errors
/// See [`decode`].
pub fn take(buf: &mut &[u8]) -> Result<u32, Error> {
    let (value, consumed) = decode(buf)?;
    *buf = &buf[consumed..];
    Ok(value)
}

/// Reads a VarInt from `reader` one byte at a time, returning `(value, bytes_consumed)`.
///
/// # Errors
/// [`Error::Truncated`] if the stream closes mid-VarInt, [`Error::InvalidVarInt`]
/// for oversized encodings, [`Error::IoError`] for any other read failure.
pub async fn read<R: AsyncRead + Unpin>(reader: &mut R) -> Result<(u32, usize), Error> {
    let mut acc = Accumulator::default();
    loop {
        let byte = reader.read_u8().await.map_err(Error::from_read)?;
        if let Some(value) = acc.push(byte)? {
            return Ok((value, acc.read));
        }
    }
}
