use std::{fmt, net::SocketAddr, time::Duration};

use net::{
    HandshakeNextState, LoginDisconnectS2c, PacketFrame, PacketState, ProtoError, ServerboundPacket,
    StatusPongS2c, StatusResponseS2c,
};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    time::timeout,
};

use crate::{
    connection::{EncodedConnection, Received},
    error::SessionError,
    logging::GateLogger,
    metrics::GateMetrics,
    status::{Kick, Responder},
};

/// Sequence number handed out by the listener, shown as `No0001`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "No{:04}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Handshake,
    Status { protocol_version: i32 },
    /// Waiting for login start. `access_address` is the `host:port` the
    /// client declared and is echoed back in the kick.
    LoginExpected { access_address: String },
}

impl Phase {
    pub fn packet_state(&self) -> PacketState {
        match self {
            Phase::Handshake => PacketState::Handshaking,
            Phase::Status { .. } => PacketState::Status,
            Phase::LoginExpected { .. } => PacketState::Login,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Handshake => "handshake",
            Phase::Status { .. } => "status",
            Phase::LoginExpected { .. } => "login",
        }
    }
}

/// What the driver has to put on the wire after a frame was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    SendStatus { protocol_version: i32 },
    Pong(Vec<u8>),
    Kick {
        username: String,
        access_address: String,
    },
}

/// Pure phase bookkeeping, no I/O.
#[derive(Debug)]
pub struct SessionMachine {
    id: SessionId,
    phase: Phase,
}

impl SessionMachine {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            phase: Phase::Handshake,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn advance(&mut self, frame: &PacketFrame) -> Result<Action, ProtoError> {
        let Some(packet) = ServerboundPacket::decode(self.phase.packet_state(), frame)? else {
            GateLogger::ignored_packet(self.id, self.phase.as_str(), frame.id, frame.body.len());
            return Ok(Action::None);
        };

        let action = match packet {
            ServerboundPacket::Handshake(hs) => {
                GateLogger::handshake(
                    self.id,
                    hs.protocol_version,
                    &hs.server_address,
                    hs.server_port,
                    &hs.next_state,
                    &frame.body,
                );
                match hs.next_state {
                    HandshakeNextState::Login => {
                        self.phase = Phase::LoginExpected {
                            access_address: format!("{}:{}", hs.server_address, hs.server_port),
                        };
                        Action::None
                    }
                    HandshakeNextState::Status => {
                        self.phase = Phase::Status {
                            protocol_version: hs.protocol_version,
                        };
                        Action::SendStatus {
                            protocol_version: hs.protocol_version,
                        }
                    }
                }
            }
            ServerboundPacket::StatusRequest(_) => match self.phase {
                Phase::Status { protocol_version } => Action::SendStatus { protocol_version },
                _ => Action::None,
            },
            ServerboundPacket::StatusPing(ping) => {
                GateLogger::ping(self.id, ping.payload);
                Action::Pong(ping.payload.to_vec())
            }
            ServerboundPacket::LoginStart(login) => match &self.phase {
                Phase::LoginExpected { access_address } => {
                    GateLogger::login(self.id, &login.username, access_address, &frame.body);
                    Action::Kick {
                        username: login.username.into_owned(),
                        access_address: access_address.clone(),
                    }
                }
                _ => Action::None,
            },
        };

        Ok(action)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Zero-length frame.
    EndOfSession,
    /// Stream closed between frames.
    PeerClosed,
}

impl CloseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloseReason::EndOfSession => "end of session",
            CloseReason::PeerClosed => "peer closed",
        }
    }
}

/// Drives one accepted connection until it ends.
pub struct Session<'r, S> {
    id: SessionId,
    peer: SocketAddr,
    machine: SessionMachine,
    conn: EncodedConnection<S>,
    responder: &'r dyn Responder,
    metrics: &'r GateMetrics,
    idle_timeout: Option<Duration>,
}

impl<'r, S> Session<'r, S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(
        id: SessionId,
        peer: SocketAddr,
        stream: S,
        responder: &'r dyn Responder,
        metrics: &'r GateMetrics,
    ) -> Self {
        Self {
            id,
            peer,
            machine: SessionMachine::new(id),
            conn: EncodedConnection::new(stream),
            responder,
            metrics,
            idle_timeout: None,
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Option<Duration>) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    async fn recv(&mut self) -> Result<Received, SessionError> {
        match self.idle_timeout {
            Some(limit) => timeout(limit, self.conn.recv()).await?,
            None => self.conn.recv().await,
        }
    }

    pub async fn run(mut self) -> Result<CloseReason, SessionError> {
        loop {
            let frame = match self.recv().await? {
                Received::Frame(frame) => frame,
                Received::EndOfSession => return Ok(CloseReason::EndOfSession),
                Received::Closed => return Ok(CloseReason::PeerClosed),
            };

            // ID-only frames carry nothing to act on
            if frame.is_empty() {
                continue;
            }

            let was_handshake = self.machine.phase() == &Phase::Handshake;
            let action = self.machine.advance(&frame)?;
            if was_handshake && self.machine.phase() != &Phase::Handshake {
                self.metrics.record_handshake(self.machine.phase().as_str());
            }

            self.perform(action).await?;
        }
    }

    async fn perform(&mut self, action: Action) -> Result<(), SessionError> {
        match action {
            Action::None => {}
            Action::SendStatus { protocol_version } => {
                let json = self.responder.status(protocol_version).await?;
                self.conn.send(&StatusResponseS2c { json: &json }).await?;
                GateLogger::status_sent(self.id, protocol_version);
                self.metrics.record_status();
            }
            Action::Pong(payload) => {
                self.conn.send(&StatusPongS2c { payload: &payload }).await?;
                self.metrics.record_ping();
            }
            Action::Kick {
                username,
                access_address,
            } => {
                let reason = self
                    .responder
                    .kick(&Kick {
                        username: &username,
                        peer: self.peer,
                        access_address: &access_address,
                    })
                    .await?;
                self.conn.send(&LoginDisconnectS2c { reason: &reason }).await?;
                self.metrics.record_kick();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use net::{
        HandshakeC2s, LoginStartC2s, PacketDecoder, StatusPingC2s, encode_packet, encode_raw_packet,
    };
    use serde_json::Value;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, duplex};

    use super::*;
    use crate::{config::StatusConfig, status::PlaceholderResponder, telemetry::get_meter};

    fn handshake(next_state: HandshakeNextState) -> Vec<u8> {
        let mut out = Vec::new();
        encode_packet(
            &mut out,
            &HandshakeC2s {
                protocol_version: 765,
                server_address: "mc.example.net".into(),
                server_port: 25565,
                next_state,
            },
        )
        .unwrap();
        out
    }

    /// Feeds `input` to a fresh session, then returns how it ended and every
    /// frame it wrote.
    async fn exchange(input: Vec<u8>) -> (Result<CloseReason, SessionError>, Vec<PacketFrame>) {
        let (mut client, server) = duplex(64 * 1024);
        let responder = PlaceholderResponder::new(StatusConfig::default(), None);
        let metrics = GateMetrics::new(&get_meter());
        let peer: SocketAddr = "127.0.0.1:50000".parse().unwrap();

        client.write_all(&input).await.unwrap();
        client.shutdown().await.unwrap();

        let result = Session::new(SessionId(1), peer, server, &responder, &metrics)
            .run()
            .await;

        let mut out = Vec::new();
        client.read_to_end(&mut out).await.unwrap();

        let mut dec = PacketDecoder::new();
        dec.queue_slice(&out);
        let mut frames = Vec::new();
        while let Some(net::Inbound::Packet(frame)) = dec.try_next_packet().unwrap() {
            frames.push(frame);
        }
        (result, frames)
    }

    fn reply_json(frame: &PacketFrame) -> Value {
        let mut body = frame.body.as_slice();
        let len = net::read_varint(&mut body).unwrap() as usize;
        assert_eq!(body.len(), len);
        serde_json::from_slice(body).unwrap()
    }

    #[test]
    fn session_id_is_zero_padded() {
        assert_eq!(SessionId(7).to_string(), "No0007");
        assert_eq!(SessionId(12345).to_string(), "No12345");
    }

    #[test]
    fn machine_walks_status_phase() {
        let mut machine = SessionMachine::new(SessionId(1));
        let frame = PacketFrame {
            id: 0x00,
            body: handshake(HandshakeNextState::Status)[2..].to_vec(),
        };

        assert_eq!(
            machine.advance(&frame).unwrap(),
            Action::SendStatus {
                protocol_version: 765
            }
        );
        assert_eq!(
            machine.phase(),
            &Phase::Status {
                protocol_version: 765
            }
        );

        let ping = PacketFrame {
            id: StatusPingC2s::ID,
            body: vec![9; 8],
        };
        assert_eq!(machine.advance(&ping).unwrap(), Action::Pong(vec![9; 8]));
    }

    #[test]
    fn machine_stays_in_login_after_kick() {
        let mut machine = SessionMachine::new(SessionId(1));
        let frame = PacketFrame {
            id: 0x00,
            body: handshake(HandshakeNextState::Login)[2..].to_vec(),
        };
        assert_eq!(machine.advance(&frame).unwrap(), Action::None);

        let mut login = Vec::new();
        encode_packet(&mut login, &LoginStartC2s { username: "Steve".into() }).unwrap();
        let login = PacketFrame {
            id: 0x00,
            body: login[2..].to_vec(),
        };
        assert_eq!(
            machine.advance(&login).unwrap(),
            Action::Kick {
                username: "Steve".into(),
                access_address: "mc.example.net:25565".into(),
            }
        );
        assert!(matches!(machine.phase(), Phase::LoginExpected { .. }));
    }

    #[tokio::test]
    async fn status_handshake_replies_immediately() {
        let mut input = handshake(HandshakeNextState::Status);
        input.push(0x00);

        let (result, frames) = exchange(input).await;
        assert_eq!(result.unwrap(), CloseReason::EndOfSession);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].id, 0x00);
        assert_eq!(reply_json(&frames[0])["version"]["protocol"], 765);
    }

    #[tokio::test]
    async fn unknown_next_state_is_treated_as_status() {
        let mut input = Vec::new();
        encode_raw_packet(&mut input, 0x00, &[0x2f, 0x01, b'a', 0x63, 0xdd, 0x07]).unwrap();

        let (result, frames) = exchange(input).await;
        assert_eq!(result.unwrap(), CloseReason::PeerClosed);
        assert_eq!(frames.len(), 1);
        assert_eq!(reply_json(&frames[0])["version"]["protocol"], 47);
    }

    #[tokio::test]
    async fn login_is_kicked_with_username() {
        let mut input = handshake(HandshakeNextState::Login);
        encode_packet(&mut input, &LoginStartC2s { username: "Notch".into() }).unwrap();
        input.push(0x00);

        let (result, frames) = exchange(input).await;
        assert_eq!(result.unwrap(), CloseReason::EndOfSession);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].id, 0x00);

        let reason = reply_json(&frames[0]);
        assert_eq!(reason[0]["text"], "Hi! Notch\n");
        assert_eq!(reason[1]["text"], "Access IP: 127.0.0.1:50000\n");
        assert_eq!(reason[2]["text"], "Address: mc.example.net:25565\n");
    }

    #[tokio::test]
    async fn unusual_usernames_are_still_kicked() {
        let long = "ABCDEFGHIJKLMNOPQ";
        let mut input = handshake(HandshakeNextState::Login);
        encode_packet(&mut input, &LoginStartC2s { username: long.into() }).unwrap();
        input.push(0x00);

        let (result, frames) = exchange(input).await;
        assert_eq!(result.unwrap(), CloseReason::EndOfSession);
        assert_eq!(frames.len(), 1);
        assert_eq!(reply_json(&frames[0])[0]["text"], format!("Hi! {long}\n"));

        let mut input = handshake(HandshakeNextState::Login);
        encode_raw_packet(&mut input, LoginStartC2s::ID, &[0x02, 0xff, 0xfe]).unwrap();
        input.push(0x00);

        let (result, frames) = exchange(input).await;
        assert_eq!(result.unwrap(), CloseReason::EndOfSession);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].id, LoginDisconnectS2c::ID);
        assert_eq!(reply_json(&frames[0])[0]["text"], "Hi! \u{fffd}\u{fffd}\n");
    }

    #[tokio::test]
    async fn ping_is_echoed() {
        let mut input = handshake(HandshakeNextState::Status);
        encode_packet(
            &mut input,
            &StatusPingC2s {
                payload: &[1, 2, 3, 4, 5, 6, 7, 8],
            },
        )
        .unwrap();

        let (_, frames) = exchange(input).await;
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].id, 0x01);
        assert_eq!(frames[1].body, [1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[tokio::test]
    async fn status_request_without_body_is_skipped() {
        let mut input = handshake(HandshakeNextState::Status);
        // bare status request: length 1, id 0
        input.extend_from_slice(&[0x01, 0x00, 0x00]);

        let (result, frames) = exchange(input).await;
        assert_eq!(result.unwrap(), CloseReason::EndOfSession);
        assert_eq!(frames.len(), 1);
    }

    #[tokio::test]
    async fn status_request_with_body_gets_another_reply() {
        let mut input = handshake(HandshakeNextState::Status);
        encode_raw_packet(&mut input, 0x00, &[0x00]).unwrap();

        let (_, frames) = exchange(input).await;
        assert_eq!(frames.len(), 2);
        assert_eq!(reply_json(&frames[1])["version"]["protocol"], 765);
    }

    #[tokio::test]
    async fn zero_length_frame_ends_before_anything_else() {
        let mut input = vec![0x00];
        input.extend(handshake(HandshakeNextState::Status));

        let (result, frames) = exchange(input).await;
        assert_eq!(result.unwrap(), CloseReason::EndOfSession);
        assert!(frames.is_empty());
    }

    #[tokio::test]
    async fn unknown_ids_are_ignored() {
        let mut input = Vec::new();
        encode_raw_packet(&mut input, 0x7a, &[1, 2, 3]).unwrap();
        input.extend(handshake(HandshakeNextState::Status));
        encode_raw_packet(&mut input, 0x05, &[4]).unwrap();
        input.push(0x00);

        let (result, frames) = exchange(input).await;
        assert_eq!(result.unwrap(), CloseReason::EndOfSession);
        assert_eq!(frames.len(), 1);
    }

    #[tokio::test]
    async fn malformed_length_is_a_decode_error() {
        let (result, frames) = exchange(vec![0xff; 5]).await;
        assert!(matches!(result, Err(SessionError::Decode(_))));
        assert!(frames.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn idle_session_times_out() {
        let (_client, server) = duplex(64);
        let responder = PlaceholderResponder::new(StatusConfig::default(), None);
        let metrics = GateMetrics::new(&get_meter());

        let result = Session::new(
            SessionId(2),
            "127.0.0.1:1".parse().unwrap(),
            server,
            &responder,
            &metrics,
        )
        .with_idle_timeout(Some(Duration::from_secs(30)))
        .run()
        .await;

        assert!(matches!(result, Err(SessionError::Idle(_))));
    }
}
