use std::fmt;

/// Protocol state used to select packet IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketState {
    Handshaking,
    Status,
    Login,
}

/// Next state value in the handshake packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeNextState {
    Status,
    Login,
}

impl HandshakeNextState {
    /// `2` asks for login; every other value is treated as a status query.
    #[must_use]
    pub const fn from_raw(value: i32) -> Self {
        match value {
            2 => Self::Login,
            _ => Self::Status,
        }
    }

    #[must_use]
    pub const fn as_raw(self) -> i32 {
        match self {
            Self::Status => 1,
            Self::Login => 2,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Login => "login",
        }
    }
}

impl fmt::Display for HandshakeNextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
