use net::ProtoError;

/// Why a session ended abnormally. None of these ever reach beyond the
/// session that produced them.
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("Malformed packet - {0} (se:pd)")]
    Decode(#[from] ProtoError),
    #[error("Networking error - {0} (se:ne)")]
    Transport(#[from] tokio::io::Error),
    #[error("Idle timeout (se:it)")]
    Idle(#[from] tokio::time::error::Elapsed),
    #[error("Payload error - {0} (se:pl)")]
    Payload(#[from] anyhow::Error),
}

impl SessionError {
    /// Short label used for metrics attributes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode",
            Self::Transport(_) => "transport",
            Self::Idle(_) => "idle",
            Self::Payload(_) => "payload",
        }
    }
}
