//! Minimal Minecraft protocol types for handshake, status, and login start.
pub mod proto;

pub use proto::{
    HandshakeC2s, HandshakeNextState, Inbound, LoginDisconnectS2c, LoginStartC2s, MAX_PACKET_SIZE,
    MAX_VARINT_LEN, PacketDecode, PacketDecoder, PacketEncode, PacketEncoder, PacketFrame,
    PacketState, ProtoError, ServerboundPacket, StatusPingC2s, StatusPongS2c, StatusRequestC2s,
    StatusResponseS2c, encode_packet, encode_raw_packet, encode_varint, read_varint,
    read_varint_partial, varint_len, write_varint,
};
