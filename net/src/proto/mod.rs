//! Minimal Minecraft protocol framing for handshake, status, and login start.

mod error;
mod io;
mod packets;
mod state;
mod types;
mod varint;


pub use error::{ProtoError, Result};
pub use packets::{
    HandshakeC2s, LoginDisconnectS2c, LoginStartC2s, ServerboundPacket, StatusPingC2s,
    StatusPongS2c, StatusRequestC2s, StatusResponseS2c,
};
pub use state::{HandshakeNextState, PacketState};
pub use types::{
    Inbound, MAX_PACKET_SIZE, PacketDecode, PacketDecoder, PacketEncode, PacketEncoder, PacketFrame,
    encode_packet, encode_raw_packet,
};
pub use varint::{
    MAX_VARINT_LEN, encode_varint, read_varint, read_varint_partial, varint_len, write_varint,
};
