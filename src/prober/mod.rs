use std::future::Future;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::resolver::HostPort;

pub mod motd;
pub mod slp;

/// What an online server reported about itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerStatus {
    pub version: String,
    pub protocol: i64,
    pub players_online: i64,
    pub max_players: i64,
    pub ping_ms: u64,
    /// Raw `description` field: a plain string or a chat component.
    pub motd: Value,
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("unreachable: {0}")]
    Unreachable(#[from] std::io::Error),
    #[error("timed out")]
    Timeout,
    #[error("{0}")]
    Protocol(String),
}

impl ProbeError {
    /// Offline means nothing answered; protocol errors mean something did, badly.
    pub fn is_offline(&self) -> bool {
        matches!(self, ProbeError::Unreachable(_) | ProbeError::Timeout)
    }

    pub fn reason(&self) -> &'static str {
        match self {
            ProbeError::Unreachable(_) => "unreachable",
            ProbeError::Timeout => "timeout",
            ProbeError::Protocol(_) => "protocol",
        }
    }
}

pub trait StatusProbe {
    fn probe(&self, target: &HostPort) -> impl Future<Output = Result<ServerStatus, ProbeError>> + Send;
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    version: VersionInfo,
    #[serde(default)]
    players: PlayersInfo,
    #[serde(default)]
    description: Value,
}

#[derive(Debug, Deserialize)]
struct VersionInfo {
    name: String,
    protocol: i64,
}

#[derive(Debug, Default, Deserialize)]
struct PlayersInfo {
    #[serde(default)]
    max: i64,
    #[serde(default)]
    online: i64,
}

impl ServerStatus {
    pub(crate) fn from_json(json: &str, ping_ms: u64) -> Result<Self, ProbeError> {
        let resp: StatusResponse = serde_json::from_str(json)
            .map_err(|e| ProbeError::Protocol(format!("bad status json: {}", e)))?;
        Ok(Self {
            version: resp.version.name,
            protocol: resp.version.protocol,
            players_online: resp.players.online,
            max_players: resp.players.max,
            ping_ms,
            motd: resp.description,
        })
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;

    /// Returns a canned status, or reports every target offline.
    pub struct MockProbe(pub Option<ServerStatus>);

    impl MockProbe {
        pub fn online() -> Self {
            Self(Some(ServerStatus {
                version: "Paper 1.21.1".into(),
                protocol: 767,
                players_online: 3,
                max_players: 20,
                ping_ms: 12,
                motd: Value::String("A Minecraft Server".into()),
            }))
        }
    }

    impl StatusProbe for MockProbe {
        async fn probe(&self, _target: &HostPort) -> Result<ServerStatus, ProbeError> {
            self.0.clone().ok_or(ProbeError::Timeout)
        }
    }
}
