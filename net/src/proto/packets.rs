use std::borrow::Cow;

use super::{
    error::{Result, debug_log_error},
    io::{
        read_string_bounded, read_string_lossy, read_u16_be, take_rest, write_string, write_u16_be,
    },
    state::{HandshakeNextState, PacketState},
    types::{MAX_PACKET_SIZE, PacketDecode, PacketEncode, PacketFrame},
    varint::{read_varint, write_varint},
};

/// Handshake (C2S) packet. Proxies forwarding player data stuff it into the
/// address, so it is only bounded by the frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeC2s<'a> {
    pub protocol_version: i32,
    pub server_address: Cow<'a, str>,
    pub server_port: u16,
    pub next_state: HandshakeNextState,
}

/// Status request (C2S) packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRequestC2s;

/// Status ping (C2S) packet. The payload is opaque and echoed back untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusPingC2s<'a> {
    pub payload: &'a [u8],
}

/// Status response (S2C) packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusResponseS2c<'a> {
    pub json: &'a str,
}

/// Status pong (S2C) packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusPongS2c<'a> {
    pub payload: &'a [u8],
}

/// Login disconnect (S2C) packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginDisconnectS2c<'a> {
    pub reason: &'a str,
}

/// Login start (C2S) packet. Anything after the username (profile id,
/// signature data) differs per version and is ignored. Names are not
/// validated; every login gets kicked anyway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginStartC2s<'a> {
    pub username: Cow<'a, str>,
}

/// Any serverbound packet understood in a given state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerboundPacket<'a> {
    Handshake(HandshakeC2s<'a>),
    StatusRequest(StatusRequestC2s),
    StatusPing(StatusPingC2s<'a>),
    LoginStart(LoginStartC2s<'a>),
}

impl PacketFrame {
    pub fn decode_serverbound<'a>(
        &'a self,
        state: PacketState,
    ) -> Result<Option<ServerboundPacket<'a>>> {
        ServerboundPacket::decode(state, self)
    }
}

impl<'a> ServerboundPacket<'a> {
    /// Decodes `frame` against `state`. IDs the state does not know are not
    /// an error; they come back as `None`.
    pub fn decode(state: PacketState, frame: &'a PacketFrame) -> Result<Option<Self>> {
        let mut input = frame.body.as_slice();
        let packet = match (state, frame.id) {
            (PacketState::Handshaking, HandshakeC2s::ID) => {
                HandshakeC2s::decode_body(&mut input).map(ServerboundPacket::Handshake)
            }
            (PacketState::Status, StatusRequestC2s::ID) => {
                StatusRequestC2s::decode_body(&mut input).map(ServerboundPacket::StatusRequest)
            }
            (PacketState::Status, StatusPingC2s::ID) => {
                StatusPingC2s::decode_body(&mut input).map(ServerboundPacket::StatusPing)
            }
            (PacketState::Login, LoginStartC2s::ID) => {
                LoginStartC2s::decode_body(&mut input).map(ServerboundPacket::LoginStart)
            }
            _ => return Ok(None),
        };

        match packet {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                debug_log_error("packet body decode failed", &err);
                Err(err)
            }
        }
    }
}

impl<'a> HandshakeC2s<'a> {
    pub const ID: i32 = 0x00;

    pub fn decode_body(input: &mut &'a [u8]) -> Result<Self> {
        let protocol_version = read_varint(input)?;
        let server_address = read_string_lossy(input)?;
        let server_port = read_u16_be(input)?;
        let next_state = HandshakeNextState::from_raw(read_varint(input)?);

        Ok(Self {
            protocol_version,
            server_address,
            server_port,
            next_state,
        })
    }
}

impl<'a> PacketDecode<'a> for HandshakeC2s<'a> {
    const ID: i32 = HandshakeC2s::ID;

    fn decode_body(input: &mut &'a [u8]) -> Result<Self> {
        HandshakeC2s::decode_body(input)
    }
}

impl<'a> PacketEncode for HandshakeC2s<'a> {
    const ID: i32 = HandshakeC2s::ID;

    fn encode_body(&self, out: &mut Vec<u8>) -> Result<()> {
        write_varint(out, self.protocol_version)?;
        write_string(out, &self.server_address)?;
        write_u16_be(out, self.server_port);
        write_varint(out, self.next_state.as_raw())
    }
}

impl StatusRequestC2s {
    pub const ID: i32 = 0x00;

    pub fn decode_body(input: &mut &[u8]) -> Result<Self> {
        take_rest(input);
        Ok(Self)
    }
}

impl<'a> PacketDecode<'a> for StatusRequestC2s {
    const ID: i32 = StatusRequestC2s::ID;

    fn decode_body(input: &mut &'a [u8]) -> Result<Self> {
        StatusRequestC2s::decode_body(input)
    }
}

impl PacketEncode for StatusRequestC2s {
    const ID: i32 = StatusRequestC2s::ID;

    fn encode_body(&self, _out: &mut Vec<u8>) -> Result<()> {
        Ok(())
    }
}

impl<'a> StatusPingC2s<'a> {
    pub const ID: i32 = 0x01;

    pub fn decode_body(input: &mut &'a [u8]) -> Result<Self> {
        Ok(Self {
            payload: take_rest(input),
        })
    }
}

impl<'a> PacketDecode<'a> for StatusPingC2s<'a> {
    const ID: i32 = StatusPingC2s::ID;

    fn decode_body(input: &mut &'a [u8]) -> Result<Self> {
        StatusPingC2s::decode_body(input)
    }
}

impl<'a> PacketEncode for StatusPingC2s<'a> {
    const ID: i32 = StatusPingC2s::ID;

    fn encode_body(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(self.payload);
        Ok(())
    }
}

impl<'a> StatusResponseS2c<'a> {
    pub const ID: i32 = 0x00;

    pub fn decode_body(input: &mut &'a [u8]) -> Result<Self> {
        Ok(Self {
            json: read_string_bounded(input, MAX_PACKET_SIZE)?,
        })
    }
}

impl<'a> PacketDecode<'a> for StatusResponseS2c<'a> {
    const ID: i32 = StatusResponseS2c::ID;

    fn decode_body(input: &mut &'a [u8]) -> Result<Self> {
        StatusResponseS2c::decode_body(input)
    }
}

impl<'a> PacketEncode for StatusResponseS2c<'a> {
    const ID: i32 = StatusResponseS2c::ID;

    fn encode_body(&self, out: &mut Vec<u8>) -> Result<()> {
        write_string(out, self.json)
    }
}

impl<'a> StatusPongS2c<'a> {
    pub const ID: i32 = 0x01;

    pub fn decode_body(input: &mut &'a [u8]) -> Result<Self> {
        Ok(Self {
            payload: take_rest(input),
        })
    }
}

impl<'a> PacketDecode<'a> for StatusPongS2c<'a> {
    const ID: i32 = StatusPongS2c::ID;

    fn decode_body(input: &mut &'a [u8]) -> Result<Self> {
        StatusPongS2c::decode_body(input)
    }
}

impl<'a> PacketEncode for StatusPongS2c<'a> {
    const ID: i32 = StatusPongS2c::ID;

    fn encode_body(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(self.payload);
        Ok(())
    }
}

impl<'a> LoginDisconnectS2c<'a> {
    pub const ID: i32 = 0x00;

    pub fn decode_body(input: &mut &'a [u8]) -> Result<Self> {
        Ok(Self {
            reason: read_string_bounded(input, MAX_PACKET_SIZE)?,
        })
    }
}

impl<'a> PacketDecode<'a> for LoginDisconnectS2c<'a> {
    const ID: i32 = LoginDisconnectS2c::ID;

    fn decode_body(input: &mut &'a [u8]) -> Result<Self> {
        LoginDisconnectS2c::decode_body(input)
    }
}

impl<'a> PacketEncode for LoginDisconnectS2c<'a> {
    const ID: i32 = LoginDisconnectS2c::ID;

    fn encode_body(&self, out: &mut Vec<u8>) -> Result<()> {
        write_string(out, self.reason)
    }
}

impl<'a> LoginStartC2s<'a> {
    pub const ID: i32 = 0x00;

    pub fn decode_body(input: &mut &'a [u8]) -> Result<Self> {
        let username = read_string_lossy(input)?;
        take_rest(input);
        Ok(Self { username })
    }
}

impl<'a> PacketDecode<'a> for LoginStartC2s<'a> {
    const ID: i32 = LoginStartC2s::ID;

    fn decode_body(input: &mut &'a [u8]) -> Result<Self> {
        LoginStartC2s::decode_body(input)
    }
}

impl<'a> PacketEncode for LoginStartC2s<'a> {
    const ID: i32 = LoginStartC2s::ID;

    fn encode_body(&self, out: &mut Vec<u8>) -> Result<()> {
        write_string(out, &self.username)
    }
}
