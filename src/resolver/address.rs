use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Port used when the address names none and no SRV record answers.
pub const DEFAULT_PORT: u16 = 25565;

/// A concrete connection target. `host` never carries IPv6 brackets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostPort {
    pub host: String,
    pub port: u16,
}

impl HostPort {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for HostPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Why a raw address could not be parsed. All variants are caller input errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("server address is empty")]
    Empty,
    #[error("IPv6 address is missing its closing bracket")]
    MalformedIpv6,
    #[error("invalid port: {0:?}")]
    InvalidPort(String),
    #[error("port {0} is outside 1-65535")]
    PortOutOfRange(String),
}

/// Outcome of parsing: either the user named a port, or only a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedAddress {
    Explicit(HostPort),
    Bare(String),
}

pub fn parse(raw: &str) -> Result<ParsedAddress, AddressError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AddressError::Empty);
    }

    if let Some(rest) = raw.strip_prefix('[') {
        let end = rest.find(']').ok_or(AddressError::MalformedIpv6)?;
        let host = &rest[..end];
        if host.is_empty() {
            return Err(AddressError::MalformedIpv6);
        }
        return match rest[end + 1..].strip_prefix(':') {
            Some(port) => Ok(ParsedAddress::Explicit(HostPort::new(host, parse_port(port)?))),
            None => Ok(ParsedAddress::Bare(host.to_string())),
        };
    }

    if let Some(colon) = raw.rfind(':') {
        // A dot after the colon means the colon cannot be a port separator.
        let after_last_dot = raw.rfind('.').is_none_or(|dot| colon > dot);
        if colon > 0 && after_last_dot {
            let (host, port) = (&raw[..colon], &raw[colon + 1..]);
            if is_digits(port) {
                return Ok(ParsedAddress::Explicit(HostPort::new(host, parse_port(port)?)));
            }
            if !host.contains(':') {
                return Err(AddressError::InvalidPort(port.to_string()));
            }
        }
    }

    Ok(ParsedAddress::Bare(raw.to_string()))
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn parse_port(s: &str) -> Result<u16, AddressError> {
    if !is_digits(s) {
        return Err(AddressError::InvalidPort(s.to_string()));
    }
    match s.parse::<u16>() {
        Ok(port) if port >= 1 => Ok(port),
        _ => Err(AddressError::PortOutOfRange(s.to_string())),
    }
}
