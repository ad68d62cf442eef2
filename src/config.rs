use std::{
    collections::HashMap,
    fs::{self, File},
    io::{ErrorKind, prelude::*},
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::logging::GateLogger;

/// Top-level configuration for the application, loaded from a TOML file.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GateConfig {
    /// Socket address to bind to, e.g. "0.0.0.0:25565".
    #[serde(default = "default_bind")]
    pub bind: String,

    /// PNG served as the server list favicon when present.
    #[serde(default = "default_icon")]
    pub icon: PathBuf,

    /// Seconds a session may sit without sending a byte. `0` disables the limit.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout: u64,

    /// Set TCP_NODELAY on accepted sockets.
    #[serde(default = "default_nodelay")]
    pub nodelay: bool,

    /// Placeholder values reported in the server list.
    #[serde(default)]
    pub status: StatusConfig,

    #[serde(flatten)]
    pub other_fields: HashMap<String, toml::Value>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct StatusConfig {
    pub version_name: String,
    pub max_players: i32,
    pub online_players: i32,
    pub sample: Vec<SamplePlayer>,
    pub enforces_secure_chat: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SamplePlayer {
    pub name: String,
    pub id: String,
}

fn default_bind() -> String {
    "0.0.0.0:25565".to_string()
}

fn default_icon() -> PathBuf {
    PathBuf::from("./icon.png")
}

fn default_idle_timeout() -> u64 {
    30
}

fn default_nodelay() -> bool {
    true
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            version_name: "How to looking here?".to_string(),
            max_players: 0,
            online_players: -21263,
            sample: vec![SamplePlayer {
                name: "aatomu".to_string(),
                id: "c52fafa6-e223-4bdd-b884-b39f641a4cf4".to_string(),
            }],
            enforces_secure_chat: false,
        }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            icon: default_icon(),
            idle_timeout: default_idle_timeout(),
            nodelay: default_nodelay(),
            status: StatusConfig::default(),
            other_fields: HashMap::new(),
        }
    }
}

impl GateConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self, GateConfigLoadError> {
        let raw = fs::read_to_string(path).map_err(GateConfigLoadError::Io)?;
        let config: Self = toml::from_str(&raw).map_err(GateConfigLoadError::Parse)?;

        for (key, value) in &config.other_fields {
            GateLogger::unknown_config(key, value);
        }

        Ok(config)
    }

    /// Loads `path`, writing defaults back when the file is missing so the
    /// operator has something to edit. Any other read failure is returned
    /// and the file is left alone.
    pub fn load_or_init(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => {
                // Save config to fill missing fields
                let _ = config.save(path);
                Ok(config)
            }
            Err(GateConfigLoadError::Io(err)) if err.kind() == ErrorKind::NotFound => {
                let default_config = Self::default();
                let _ = default_config.save(path);
                Ok(default_config)
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let config_str = toml::to_string(&self)?;
        let mut file = File::create(path)?;
        file.write_all(config_str.as_bytes())?;
        Ok(())
    }

    /// Replaces the port of `bind`, keeping the host.
    pub fn set_port(&mut self, port: u16) -> anyhow::Result<()> {
        let mut address = self.bind_addr()?;
        address.set_port(port);
        self.bind = address.to_string();
        Ok(())
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        self.bind
            .parse()
            .map_err(|err| anyhow::anyhow!("invalid bind address '{}': {err}", self.bind))
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout > 0).then(|| Duration::from_secs(self.idle_timeout))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GateConfigLoadError {
    #[error("Could not open config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
