use std::{fmt::Display, net::SocketAddr, path::Path};

use log::{debug, error, info, warn};

use crate::session::SessionId;

pub struct GateLogger;

impl GateLogger {
    pub fn preparing_socket(address: &SocketAddr) {
        info!("Preparing socket {}", address);
    }

    pub fn listener_booted() {
        let rule = "=".repeat(20);
        info!("{rule} Listener booted {rule}");
    }

    pub fn tcp_nodelay_failed(err: &std::io::Error) {
        error!("Failed to set TCP_NODELAY: {err}");
    }

    pub fn unknown_config(key: &str, value: &toml::Value) {
        warn!("Unknown configuration '{key}' with value {value:?}");
    }

    pub fn new_connection(id: SessionId, address: &SocketAddr) {
        info!("{id}: State:\"New connection\" IP:{address}");
    }

    pub fn handshake(
        id: SessionId,
        protocol: i32,
        address: &str,
        port: u16,
        next_state: &dyn Display,
        raw: &[u8],
    ) {
        info!("{id}: State:\"Handshake\" Protocol:{protocol} Address:\"{address}:{port}\" Next:{next_state}");
        debug!("{id}: Handshake Raw:{raw:?}");
    }

    pub fn status_sent(id: SessionId, protocol: i32) {
        debug!("{id}: State:\"Status\" Protocol:{protocol}");
    }

    pub fn ping(id: SessionId, payload: &[u8]) {
        info!("{id}: State:\"Ping\" Payload:{payload:?}");
    }

    pub fn login(id: SessionId, username: &str, access_address: &str, raw: &[u8]) {
        info!("{id}: State:\"Login\" MCID:\"{username}\" AccessDomain:\"{access_address}\"");
        debug!("{id}: Login Raw:{raw:?}");
    }

    pub fn ignored_packet(id: SessionId, phase: &str, packet_id: i32, len: usize) {
        debug!("{id}: Ignored packet 0x{packet_id:02x} ({len} bytes) in {phase}");
    }

    pub fn session_closed(id: SessionId, reason: &str) {
        info!("{id}: State:\"Close session\" Reason:{reason}");
    }

    pub fn session_error(id: SessionId, address: &SocketAddr, err: &dyn Display) {
        if dotenvy::var("DO_NOT_LOG_CONNECTION_ERROR").is_ok() {
            return;
        }
        warn!("{id}: session error@{address}: {err}");
    }

    pub fn icon_unreadable(path: &Path, err: &std::io::Error) {
        warn!("Failed to read icon {}: {err}", path.display());
    }

    pub fn accept_failed(err: &dyn Display) {
        error!("Listener failed to accept: {err}");
    }
}
