use super::error::{ProtoError, Result};

/// Upper bound on encoded VarInt size; five groups cover the 32-bit range.
pub const MAX_VARINT_LEN: usize = 5;

const SEGMENT_BITS: u8 = 0x7f;
const CONTINUE_BIT: u8 = 0x80;

#[inline]
pub fn read_varint(input: &mut &[u8]) -> Result<i32> {
    let Some((value, len)) = read_varint_partial(input) else {
        return Err(ProtoError::TruncatedInput);
    };
    *input = &input[len..];
    Ok(value)
}

/// Decodes a VarInt from the front of `input`, returning the value and the
/// number of bytes consumed, or `None` if the input ends before a terminator.
///
/// Decoding stops after [`MAX_VARINT_LEN`] bytes even when the last one still
/// carries the continuation bit; the bits accumulated so far are returned.
#[inline]
pub fn read_varint_partial(input: &[u8]) -> Option<(i32, usize)> {
    let mut value: u32 = 0;
    for (i, &byte) in input.iter().take(MAX_VARINT_LEN).enumerate() {
        value |= ((byte & SEGMENT_BITS) as u32) << (i * 7);
        if (byte & CONTINUE_BIT) == 0 || i + 1 == MAX_VARINT_LEN {
            return Some((value as i32, i + 1));
        }
    }
    None
}

#[inline]
pub fn write_varint(out: &mut Vec<u8>, value: i32) -> Result<()> {
    if value < 0 {
        return Err(ProtoError::InvalidArgument(value));
    }
    let mut val = value as u32;
    loop {
        if (val & !(SEGMENT_BITS as u32)) == 0 {
            out.push(val as u8);
            return Ok(());
        }
        out.push((val as u8 & SEGMENT_BITS) | CONTINUE_BIT);
        val >>= 7;
    }
}

/// Canonical encoding of `value`.
pub fn encode_varint(value: i32) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(MAX_VARINT_LEN);
    write_varint(&mut out, value)?;
    Ok(out)
}

#[inline]
pub fn varint_len(value: i32) -> usize {
    let mut val = value as u32;
    let mut count = 1;
    while (val & !(SEGMENT_BITS as u32)) != 0 {
        count += 1;
        val >>= 7;
    }
    count
}
