use std::borrow::Cow;

use super::{
    error::{ProtoError, Result},
    types::MAX_PACKET_SIZE,
    varint::{read_varint, write_varint},
};

#[inline]
pub(crate) fn take<'a>(input: &mut &'a [u8], len: usize) -> Result<&'a [u8]> {
    if input.len() < len {
        return Err(ProtoError::ShortRead {
            expected: len,
            actual: input.len(),
        });
    }

    let (head, tail) = input.split_at(len);
    *input = tail;
    Ok(head)
}

#[inline]
pub(crate) fn take_rest<'a>(input: &mut &'a [u8]) -> &'a [u8] {
    std::mem::take(input)
}

#[inline]
pub(crate) fn read_u16_be(input: &mut &[u8]) -> Result<u16> {
    let bytes = take(input, 2)?;
    Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
}

#[inline]
pub(crate) fn write_u16_be(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

pub(crate) fn read_string_bounded<'a>(input: &mut &'a [u8], max_chars: usize) -> Result<&'a str> {
    let byte_len = read_varint(input)?;
    if byte_len < 0 {
        return Err(ProtoError::NegativeLength(byte_len));
    }

    let byte_len = byte_len as usize;
    let max_bytes = max_chars.saturating_mul(4);
    if byte_len > max_bytes {
        return Err(ProtoError::LengthTooLarge {
            max: max_bytes,
            actual: byte_len,
        });
    }

    let bytes = take(input, byte_len)?;
    let s = std::str::from_utf8(bytes).map_err(|_| ProtoError::InvalidUtf8)?;

    let char_count = s.encode_utf16().count();
    if char_count > max_chars {
        return Err(ProtoError::StringTooLong {
            max: max_chars,
            actual: char_count,
        });
    }

    Ok(s)
}

/// Length-prefixed string limited only by the packet size. Invalid UTF-8 is
/// replaced instead of rejected.
pub(crate) fn read_string_lossy<'a>(input: &mut &'a [u8]) -> Result<Cow<'a, str>> {
    let byte_len = read_varint(input)?;
    if byte_len < 0 {
        return Err(ProtoError::NegativeLength(byte_len));
    }

    let byte_len = byte_len as usize;
    if byte_len > MAX_PACKET_SIZE {
        return Err(ProtoError::LengthTooLarge {
            max: MAX_PACKET_SIZE,
            actual: byte_len,
        });
    }

    Ok(String::from_utf8_lossy(take(input, byte_len)?))
}

/// Length-prefixed string with no character cap; JSON payloads carrying a
/// favicon routinely exceed the vanilla limit.
pub(crate) fn write_string(out: &mut Vec<u8>, value: &str) -> Result<()> {
    let len = value.len();
    if len > i32::MAX as usize {
        return Err(ProtoError::LengthTooLarge {
            max: i32::MAX as usize,
            actual: len,
        });
    }

    write_varint(out, len as i32)?;
    out.extend_from_slice(value.as_bytes());
    Ok(())
}
