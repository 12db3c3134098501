//! Peer addressing
//!
//! Discovery entries and configuration both describe peers as `host:port`
//! strings. [`PeerAddr`] keeps the host unresolved (hostnames are allowed;
//! resolution is the transport's job) and validates the port eagerly.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error parsing a `host:port` peer string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeerAddrError {
    #[error("missing ':port' suffix in '{0}'")]
    MissingPort(String),
    #[error("empty host in '{0}'")]
    EmptyHost(String),
    #[error("invalid port '{port}' in '{addr}'")]
    InvalidPort { addr: String, port: String },
}

/// Host and port of an upstream or downstream peer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerAddr {
    host: String,
    port: u16,
}

impl PeerAddr {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl FromStr for PeerAddr {
    type Err = PeerAddrError;

    /// Parse `host:port`, accepting `[v6-literal]:port` for IPv6 hosts.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = if let Some(rest) = s.strip_prefix('[') {
            let (host, rest) = rest
                .split_once(']')
                .ok_or_else(|| PeerAddrError::MissingPort(s.to_string()))?;
            let port = rest
                .strip_prefix(':')
                .ok_or_else(|| PeerAddrError::MissingPort(s.to_string()))?;
            (host, port)
        } else {
            s.rsplit_once(':')
                .ok_or_else(|| PeerAddrError::MissingPort(s.to_string()))?
        };

        if host.is_empty() {
            return Err(PeerAddrError::EmptyHost(s.to_string()));
        }
        let port = port.parse::<u16>().map_err(|_| PeerAddrError::InvalidPort {
            addr: s.to_string(),
            port: port.to_string(),
        })?;

        Ok(PeerAddr::new(host, port))
    }
}

impl fmt::Display for PeerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}
