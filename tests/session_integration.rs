//! Drives the listener over real TCP sockets.

use std::{net::SocketAddr, path::PathBuf};

use kickstand::{Kickstand, config::GateConfig, utils::leak};
use net::{
    HandshakeC2s, HandshakeNextState, Inbound, LoginStartC2s, PacketDecoder, PacketFrame,
    StatusPingC2s, encode_packet,
};
use serde_json::Value;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};

async fn spawn_server() -> SocketAddr {
    let config = GateConfig {
        bind: "127.0.0.1:0".to_string(),
        icon: PathBuf::from("/nonexistent/kickstand-test-icon.png"),
        ..GateConfig::default()
    };
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let kickstand = leak(Kickstand::new(config));
    tokio::spawn(kickstand.serve(listener));
    addr
}

fn handshake(next_state: HandshakeNextState, out: &mut Vec<u8>) {
    encode_packet(
        out,
        &HandshakeC2s {
            protocol_version: 767,
            server_address: "localhost".into(),
            server_port: 25565,
            next_state,
        },
    )
    .unwrap();
}

/// Sends `input` followed by a zero-length frame and collects every reply.
async fn converse(addr: SocketAddr, mut input: Vec<u8>) -> Vec<PacketFrame> {
    input.push(0x00);

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(&input).await.unwrap();

    let mut out = Vec::new();
    stream.read_to_end(&mut out).await.unwrap();

    let mut dec = PacketDecoder::new();
    dec.queue_slice(&out);
    let mut frames = Vec::new();
    while let Some(Inbound::Packet(frame)) = dec.try_next_packet().unwrap() {
        frames.push(frame);
    }
    frames
}

fn json_body(frame: &PacketFrame) -> Value {
    let mut body = frame.body.as_slice();
    let len = net::read_varint(&mut body).unwrap() as usize;
    serde_json::from_slice(&body[..len]).unwrap()
}

#[tokio::test]
async fn server_list_ping() {
    let addr = spawn_server().await;

    let mut input = Vec::new();
    handshake(HandshakeNextState::Status, &mut input);
    encode_packet(
        &mut input,
        &StatusPingC2s {
            payload: &[0, 0, 1, 144, 12, 34, 56, 78],
        },
    )
    .unwrap();

    let frames = converse(addr, input).await;
    assert_eq!(frames.len(), 2);

    let status = json_body(&frames[0]);
    assert_eq!(frames[0].id, 0x00);
    assert_eq!(status["version"]["protocol"], 767);
    assert!(status.get("favicon").is_none());

    assert_eq!(frames[1].id, 0x01);
    assert_eq!(frames[1].body, [0, 0, 1, 144, 12, 34, 56, 78]);
}

#[tokio::test]
async fn login_is_refused() {
    let addr = spawn_server().await;

    let mut input = Vec::new();
    handshake(HandshakeNextState::Login, &mut input);
    encode_packet(&mut input, &LoginStartC2s { username: "jeb_".into() }).unwrap();

    let frames = converse(addr, input).await;
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].id, 0x00);

    let reason = json_body(&frames[0]);
    assert_eq!(reason[0]["text"], "Hi! jeb_\n");
    assert_eq!(reason[2]["text"], "Address: localhost:25565\n");
    assert_eq!(reason[3]["text"], "You can't login to this server.");
}

#[tokio::test]
async fn broken_session_leaves_listener_running() {
    let addr = spawn_server().await;

    let mut garbage = TcpStream::connect(addr).await.unwrap();
    garbage.write_all(&[0xff; 5]).await.unwrap();
    let mut sink = Vec::new();
    garbage.read_to_end(&mut sink).await.unwrap();
    assert!(sink.is_empty());

    let mut input = Vec::new();
    handshake(HandshakeNextState::Status, &mut input);
    assert_eq!(converse(addr, input).await.len(), 1);
}

#[tokio::test]
async fn sessions_are_independent() {
    let addr = spawn_server().await;

    let clients: Vec<_> = (0..8)
        .map(|i| {
            tokio::spawn(async move {
                let mut input = Vec::new();
                if i % 2 == 0 {
                    handshake(HandshakeNextState::Status, &mut input);
                } else {
                    handshake(HandshakeNextState::Login, &mut input);
                    encode_packet(&mut input, &LoginStartC2s { username: "alex".into() }).unwrap();
                }
                converse(addr, input).await.len()
            })
        })
        .collect();

    for client in clients {
        assert_eq!(client.await.unwrap(), 1);
    }
}
