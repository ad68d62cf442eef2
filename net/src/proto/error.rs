use std::fmt;

/// Protocol decode/encode error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtoError {
    /// Input ended before a VarInt terminator byte was seen.
    TruncatedInput,
    /// Stream closed before a whole frame body arrived.
    ShortRead { expected: usize, actual: usize },
    /// Caller tried to encode a negative VarInt.
    InvalidArgument(i32),
    NegativeLength(i32),
    PacketTooLarge { len: usize },
    LengthTooLarge { max: usize, actual: usize },
    InvalidUtf8,
    StringTooLong { max: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, ProtoError>;

pub(crate) fn debug_log_error(context: &str, error: &ProtoError) {
    #[cfg(debug_assertions)]
    {
        log::debug!("{}: {}", context, error);
    }
    let _ = context;
    let _ = error;
}

impl fmt::Display for ProtoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TruncatedInput => write!(f, "truncated varint"),
            Self::ShortRead { expected, actual } => {
                write!(f, "short read: expected {expected} bytes, got {actual}")
            }
            Self::InvalidArgument(value) => write!(f, "cannot encode negative varint {value}"),
            Self::NegativeLength(len) => write!(f, "negative length {len}"),
            Self::PacketTooLarge { len } => write!(f, "packet too large ({len} bytes)"),
            Self::LengthTooLarge { max, actual } => {
                write!(f, "length {actual} exceeds maximum {max}")
            }
            Self::InvalidUtf8 => write!(f, "string is not valid utf-8"),
            Self::StringTooLong { max, actual } => {
                write!(f, "string of {actual} chars exceeds maximum {max}")
            }
        }
    }
}

impl std::error::Error for ProtoError {}
