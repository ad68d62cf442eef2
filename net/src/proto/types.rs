use super::{
    error::{ProtoError, Result, debug_log_error},
    varint::{read_varint, read_varint_partial, varint_len, write_varint},
};

/// Maximum packet length in bytes (protocol limit).
pub const MAX_PACKET_SIZE: usize = 2_097_152;

/// Clientbound or serverbound packet body encoding.
pub trait PacketEncode {
    const ID: i32;

    fn encode_body(&self, out: &mut Vec<u8>) -> Result<()>;
}

/// Clientbound or serverbound packet body decoding.
pub trait PacketDecode<'a>: Sized {
    const ID: i32;

    fn decode_body(input: &mut &'a [u8]) -> Result<Self>;
}

/// Decoded packet frame with the raw body (without ID).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketFrame {
    pub id: i32,
    pub body: Vec<u8>,
}

impl PacketFrame {
    /// Frames without a body carry nothing to act on.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// One unit pulled off the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Packet(PacketFrame),
    /// A frame whose length prefix is zero; the peer is done talking.
    EndOfSession,
}

/// Packet decoder for length-prefixed frames.
pub struct PacketDecoder {
    buf: Vec<u8>,
    pos: usize,
}

/// Packet encoder for length-prefixed frames.
pub struct PacketEncoder {
    buf: Vec<u8>,
    scratch: Vec<u8>,
}

impl Default for PacketDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketDecoder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            pos: 0,
        }
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            pos: 0,
        }
    }

    pub fn queue_slice(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Bytes queued but not yet consumed by a complete frame.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn try_next_packet(&mut self) -> Result<Option<Inbound>> {
        let data = &self.buf[self.pos..];
        let Some((packet_len, len_len)) = read_varint_partial(data) else {
            return Ok(None);
        };

        if packet_len < 0 {
            let err = ProtoError::NegativeLength(packet_len);
            debug_log_error("negative packet length", &err);
            return Err(err);
        }

        if packet_len == 0 {
            self.pos += len_len;
            self.compact_if_needed();
            return Ok(Some(Inbound::EndOfSession));
        }

        let packet_len = packet_len as usize;
        if packet_len > MAX_PACKET_SIZE {
            let err = ProtoError::PacketTooLarge { len: packet_len };
            debug_log_error("packet too large", &err);
            return Err(err);
        }

        let total_len = len_len + packet_len;
        if data.len() < total_len {
            return Ok(None);
        }

        let mut body = &data[len_len..total_len];
        let id = match read_varint(&mut body) {
            Ok(value) => value,
            Err(err) => {
                debug_log_error("packet id varint decode failed", &err);
                return Err(err);
            }
        };
        let body_vec = body.to_vec();

        self.pos += total_len;
        self.compact_if_needed();

        Ok(Some(Inbound::Packet(PacketFrame { id, body: body_vec })))
    }

    /// Called once the underlying stream hit EOF. Leftover bytes mean the
    /// peer hung up in the middle of a frame.
    pub fn finish(&self) -> Result<()> {
        let data = &self.buf[self.pos..];
        if data.is_empty() {
            return Ok(());
        }

        match read_varint_partial(data) {
            None => Err(ProtoError::TruncatedInput),
            Some((packet_len, len_len)) => Err(ProtoError::ShortRead {
                expected: packet_len.max(0) as usize,
                actual: data.len() - len_len,
            }),
        }
    }

    fn compact_if_needed(&mut self) {
        if self.pos == 0 {
            return;
        }

        if self.pos >= self.buf.len() / 2 {
            self.buf.drain(..self.pos);
            self.pos = 0;
        }
    }
}

impl Default for PacketEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketEncoder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            scratch: Vec::new(),
        }
    }

    pub fn write_packet<P: PacketEncode>(&mut self, pkt: &P) -> Result<()> {
        self.scratch.clear();
        pkt.encode_body(&mut self.scratch)?;
        encode_raw_packet(&mut self.buf, P::ID, &self.scratch)
    }

    pub fn write_raw(&mut self, id: i32, body: &[u8]) -> Result<()> {
        encode_raw_packet(&mut self.buf, id, body)
    }

    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }
}

pub fn encode_packet<P: PacketEncode>(out: &mut Vec<u8>, pkt: &P) -> Result<()> {
    let mut body = Vec::new();
    pkt.encode_body(&mut body)?;
    encode_raw_packet(out, P::ID, &body)
}

/// Appends `len(id) + len(body)`, `id` and `body` to `out` as one frame.
pub fn encode_raw_packet(out: &mut Vec<u8>, id: i32, body: &[u8]) -> Result<()> {
    if id < 0 {
        return Err(ProtoError::InvalidArgument(id));
    }

    let packet_len = varint_len(id) + body.len();
    if packet_len > MAX_PACKET_SIZE {
        return Err(ProtoError::PacketTooLarge { len: packet_len });
    }

    out.reserve(varint_len(packet_len as i32) + packet_len);
    write_varint(out, packet_len as i32)?;
    write_varint(out, id)?;
    out.extend_from_slice(body);
    Ok(())
}
