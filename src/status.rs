//! JSON bodies for the two replies this server ever produces: the server
//! list status and the login kick.

use std::{
    io::ErrorKind,
    net::SocketAddr,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, Local, TimeZone};
use serde::Serialize;

use crate::{
    config::{SamplePlayer, StatusConfig},
    logging::GateLogger,
};

/// Details of a rejected login, handed to [`Responder::kick`].
#[derive(Debug, Clone, Copy)]
pub struct Kick<'a> {
    pub username: &'a str,
    pub peer: SocketAddr,
    /// `host:port` the client declared in its handshake.
    pub access_address: &'a str,
}

/// Produces the JSON payloads embedded in status and disconnect packets.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn status(&self, protocol_version: i32) -> anyhow::Result<String>;

    async fn kick(&self, kick: &Kick<'_>) -> anyhow::Result<String>;
}

/// Chat component subset used in descriptions and kick reasons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextComponent {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
}

impl TextComponent {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
            bold: None,
        }
    }

    pub fn color(mut self, color: &'static str) -> Self {
        self.color = Some(color);
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = Some(true);
        self
    }
}

#[derive(Debug, Serialize)]
struct StatusDocument<'a> {
    version: StatusVersion<'a>,
    players: StatusPlayers<'a>,
    description: Vec<TextComponent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    favicon: Option<String>,
    #[serde(rename = "enforcesSecureChat")]
    enforces_secure_chat: bool,
}

#[derive(Debug, Serialize)]
struct StatusVersion<'a> {
    name: &'a str,
    protocol: i32,
}

#[derive(Debug, Serialize)]
struct StatusPlayers<'a> {
    max: i32,
    online: i32,
    sample: &'a [SamplePlayer],
}

/// Serves the configured placeholder status and a friendly refusal.
pub struct PlaceholderResponder {
    status: StatusConfig,
    icon: Option<PathBuf>,
}

impl PlaceholderResponder {
    pub fn new(status: StatusConfig, icon: Option<PathBuf>) -> Self {
        Self { status, icon }
    }

    fn description(now: &DateTime<Local>) -> Vec<TextComponent> {
        vec![
            TextComponent::plain("SERVER").color("gold").bold(),
            TextComponent::plain(" "),
            TextComponent::plain("IS").color("red").bold(),
            TextComponent::plain(" "),
            TextComponent::plain("SERVER\n").color("blue").bold(),
            TextComponent::plain(format!("Time: {}", format_timestamp(now))),
        ]
    }

    pub fn status_json(
        &self,
        protocol_version: i32,
        now: &DateTime<Local>,
        favicon: Option<String>,
    ) -> anyhow::Result<String> {
        let document = StatusDocument {
            version: StatusVersion {
                name: &self.status.version_name,
                protocol: protocol_version,
            },
            players: StatusPlayers {
                max: self.status.max_players,
                online: self.status.online_players,
                sample: &self.status.sample,
            },
            description: Self::description(now),
            favicon,
            enforces_secure_chat: self.status.enforces_secure_chat,
        };
        Ok(serde_json::to_string(&document)?)
    }
}

#[async_trait]
impl Responder for PlaceholderResponder {
    async fn status(&self, protocol_version: i32) -> anyhow::Result<String> {
        // Re-read every time so the icon can be swapped without a restart.
        let favicon = match &self.icon {
            Some(path) => load_favicon(path).await,
            None => None,
        };
        self.status_json(protocol_version, &Local::now(), favicon)
    }

    async fn kick(&self, kick: &Kick<'_>) -> anyhow::Result<String> {
        kick_json(kick)
    }
}

pub fn kick_json(kick: &Kick<'_>) -> anyhow::Result<String> {
    let reason = [
        TextComponent::plain(format!("Hi! {}\n", kick.username)).color("gold"),
        TextComponent::plain(format!("Access IP: {}\n", kick.peer)).color("gray"),
        TextComponent::plain(format!("Address: {}\n", kick.access_address)).color("gray"),
        TextComponent::plain("You can't login to this server.").color("green"),
    ];
    Ok(serde_json::to_string(&reason)?)
}

/// `2006-01-02T15:04:05.00 UTC-07:00`, hundredths truncated.
pub fn format_timestamp<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{}.{:02} UTC{}",
        now.format("%Y-%m-%dT%H:%M:%S"),
        now.timestamp_subsec_millis() / 10,
        now.format("%:z"),
    )
}

/// Reads a PNG and wraps it as a data URI. A missing file is the normal
/// "no icon" case; other failures are logged and also yield `None`.
pub async fn load_favicon(path: &Path) -> Option<String> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Some(format!("data:image/png;base64,{}", STANDARD.encode(bytes))),
        Err(err) if err.kind() == ErrorKind::NotFound => None,
        Err(err) => {
            GateLogger::icon_unreadable(path, &err);
            None
        }
    }
}
