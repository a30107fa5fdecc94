use serde::Serialize;
use serde_json::Value;

use crate::catalog::Catalog;
use crate::prober::{ProbeError, ServerStatus, motd};
use crate::resolver::HostPort;

pub const OFFLINE_MESSAGE: &str = "Server is offline or unreachable";

/// Result of one query as the JSON front ends emit it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub host: String,
    pub port: u16,
    pub online: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub players_online: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_players: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ping: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motd: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motd_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusReport {
    pub fn online(target: &HostPort, status: &ServerStatus) -> Self {
        Self {
            host: target.host.clone(),
            port: target.port,
            online: true,
            version: Some(status.version.clone()),
            protocol: Some(status.protocol),
            players_online: Some(status.players_online),
            max_players: Some(status.max_players),
            ping: Some(status.ping_ms),
            motd: Some(status.motd.clone()),
            motd_text: Some(motd::plain_text(&status.motd)),
            error: None,
        }
    }

    pub fn failed(target: &HostPort, err: &ProbeError) -> Self {
        let error = if err.is_offline() {
            OFFLINE_MESSAGE.to_string()
        } else {
            format!("Connection failed: {}", err)
        };
        Self {
            host: target.host.clone(),
            port: target.port,
            online: false,
            version: None,
            protocol: None,
            players_online: None,
            max_players: None,
            ping: None,
            motd: None,
            motd_text: None,
            error: Some(error),
        }
    }
}

/// Human-readable report for the terminal.
pub fn render_text(catalog: &Catalog, target: &HostPort, result: &Result<ServerStatus, ProbeError>) -> String {
    match result {
        Ok(status) => format!(
            "{}{}\n{}{}\n{}{}\n{}{}/{}\n{}{}ms\n{}{}\n",
            catalog.get("result.address"),
            target,
            catalog.get("result.version"),
            status.version,
            catalog.get("result.protocol"),
            status.protocol,
            catalog.get("result.players"),
            status.players_online,
            status.max_players,
            catalog.get("result.ping"),
            status.ping_ms,
            catalog.get("result.motd"),
            motd::to_ansi(&status.motd),
        ),
        Err(e) if e.is_offline() => format!(
            "{}{}{}\n",
            catalog.get("log.server"),
            target,
            catalog.get("log.offline")
        ),
        Err(e) => format!(
            "{}{}{}{}\n",
            catalog.get("log.server"),
            target,
            catalog.get("log.failed"),
            e
        ),
    }
}
