//! Connector configuration
//!
//! Layered the way operators expect: built-in defaults, then an optional
//! TOML file, then CLI flags on top. Example file:
//!
//! ```toml
//! mappings = "mappings"
//!
//! [listen]
//! address = "0.0.0.0"
//! port = 8080
//!
//! [upstream]
//! address = "127.0.0.1"
//! port = 5000
//!
//! [bus]
//! topic = "honeypot/dionaea/"
//! connector_id = "dionaea-connector"
//!
//! [sender]
//! settle_ms = 100
//! status_poll_ms = 25
//!
//! [discovery]
//! assignments_file = "/var/run/hivebridge/assignments.toml"
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;
use thiserror::Error;

use message_sink::SenderConfig;
use types::{ConnectorId, PeerAddr};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid listen address '{0}'")]
    ListenAddr(String),
}

/// HTTP intake binding.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ListenConfig {
    pub address: String,
    pub port: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ListenConfig {
    /// The socket address to bind. The listen address must be an IP
    /// literal, not a hostname.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.address, self.port)
            .parse()
            .map_err(|_| ConfigError::ListenAddr(format!("{}:{}", self.address, self.port)))
    }
}

/// Well-known upstream peer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub address: String,
    pub port: u16,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

impl UpstreamConfig {
    pub fn peer_addr(&self) -> PeerAddr {
        PeerAddr::new(self.address.clone(), self.port)
    }
}

/// Bus publishing parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Topic outgoing messages are published on.
    pub topic: String,
    /// This connector's identity: discovery key and attribution field.
    pub connector_id: String,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            topic: "honeypot/dionaea/".to_string(),
            connector_id: "dionaea-connector".to_string(),
        }
    }
}

/// Sender timing knobs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SenderTuning {
    /// Settling delay after a fresh downstream peering, in milliseconds.
    pub settle_ms: u64,
    /// Bound on the upstream status poll, in milliseconds.
    pub status_poll_ms: u64,
}

impl Default for SenderTuning {
    fn default() -> Self {
        Self {
            settle_ms: 100,
            status_poll_ms: 25,
        }
    }
}

/// Discovery-store wiring.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// TOML assignments file maintained by the balancing infrastructure.
    /// Absent means nothing is ever assigned and all traffic goes
    /// upstream.
    pub assignments_file: Option<PathBuf>,
}

/// Complete service configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConnectorConfig {
    pub listen: ListenConfig,
    pub upstream: UpstreamConfig,
    pub mappings: PathBuf,
    pub bus: BusConfig,
    pub sender: SenderTuning,
    pub discovery: DiscoveryConfig,
}

impl ConnectorConfig {
    /// Load from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply CLI flag overrides on top of file/default values.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(address) = &cli.listen_addr {
            self.listen.address = address.clone();
        }
        if let Some(port) = cli.listen_port {
            self.listen.port = port;
        }
        if let Some(address) = &cli.upstream_addr {
            self.upstream.address = address.clone();
        }
        if let Some(port) = cli.upstream_port {
            self.upstream.port = port;
        }
        if let Some(mappings) = &cli.mappings {
            self.mappings = mappings.clone();
        }
        if let Some(topic) = &cli.topic {
            self.bus.topic = topic.clone();
        }
        if let Some(connector_id) = &cli.connector_id {
            self.bus.connector_id = connector_id.clone();
        }
        if let Some(assignments) = &cli.assignments {
            self.discovery.assignments_file = Some(assignments.clone());
        }
    }

    /// Sender parameters derived from this configuration.
    pub fn sender_config(&self) -> SenderConfig {
        let mut sender = SenderConfig::new(
            self.upstream.peer_addr(),
            self.bus.topic.clone(),
            ConnectorId::new(self.bus.connector_id.clone()),
        );
        sender.settle_delay = Duration::from_millis(self.sender.settle_ms);
        sender.status_poll_timeout = Duration::from_millis(self.sender.status_poll_ms);
        sender
    }
}

/// Command line of the connector binary.
///
/// Every flag overrides its config-file counterpart.
#[derive(Debug, Parser)]
#[command(
    name = "hivebridge-connector",
    about = "Accepts honeypot sensor events over HTTP, maps them to typed bus \
             messages and forwards them to the assigned cluster peer."
)]
pub struct Cli {
    /// Configuration file to use.
    #[arg(value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Address to listen on.
    #[arg(long, value_name = "ADDRESS")]
    pub listen_addr: Option<String>,

    /// Port to listen on.
    #[arg(long, value_name = "PORT")]
    pub listen_port: Option<u16>,

    /// Upstream peer address.
    #[arg(long, value_name = "ADDRESS")]
    pub upstream_addr: Option<String>,

    /// Upstream peer port.
    #[arg(long, value_name = "PORT")]
    pub upstream_port: Option<u16>,

    /// Directory to look for mapping definitions.
    #[arg(long, value_name = "DIR")]
    pub mappings: Option<PathBuf>,

    /// Topic for sent messages.
    #[arg(long, value_name = "TOPIC")]
    pub topic: Option<String>,

    /// Connector identity used for discovery and attribution.
    #[arg(long, value_name = "NAME")]
    pub connector_id: Option<String>,

    /// Discovery assignments file.
    #[arg(long, value_name = "FILE")]
    pub assignments: Option<PathBuf>,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            listen: ListenConfig::default(),
            upstream: UpstreamConfig::default(),
            mappings: PathBuf::from("mappings"),
            bus: BusConfig::default(),
            sender: SenderTuning::default(),
            discovery: DiscoveryConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = ConnectorConfig::default();
        assert_eq!(config.listen.address, "0.0.0.0");
        assert_eq!(config.listen.port, 8080);
        assert_eq!(config.upstream.address, "127.0.0.1");
        assert_eq!(config.upstream.port, 5000);
        assert_eq!(config.mappings, PathBuf::from("mappings"));
        assert_eq!(config.bus.topic, "honeypot/dionaea/");
        assert_eq!(config.bus.connector_id, "dionaea-connector");
        assert_eq!(config.sender.settle_ms, 100);
        assert_eq!(config.discovery.assignments_file, None);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "[listen]\nport = 9090\n\n[bus]\ntopic = \"honeypot/custom/\"\n"
        )
        .unwrap();

        let config = ConnectorConfig::from_file(file.path()).unwrap();
        assert_eq!(config.listen.port, 9090);
        assert_eq!(config.listen.address, "0.0.0.0");
        assert_eq!(config.bus.topic, "honeypot/custom/");
        assert_eq!(config.bus.connector_id, "dionaea-connector");
        assert_eq!(config.upstream.port, 5000);
    }

    #[test]
    fn test_cli_overrides_file_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[listen]\nport = 9090\n").unwrap();

        let mut config = ConnectorConfig::from_file(file.path()).unwrap();
        let cli = Cli::parse_from([
            "hivebridge-connector",
            "--listen-port",
            "7070",
            "--connector-id",
            "sensor-7",
        ]);
        config.apply_cli(&cli);

        assert_eq!(config.listen.port, 7070);
        assert_eq!(config.bus.connector_id, "sensor-7");
        // Untouched values survive.
        assert_eq!(config.bus.topic, "honeypot/dionaea/");
    }

    #[test]
    fn test_file_errors_are_reported() {
        assert!(matches!(
            ConnectorConfig::from_file("/nonexistent/connector.toml"),
            Err(ConfigError::Read { .. })
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "listen = 5\n").unwrap();
        assert!(matches!(
            ConnectorConfig::from_file(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_sender_config_derivation() {
        let mut config = ConnectorConfig::default();
        config.sender.settle_ms = 250;

        let sender = config.sender_config();
        assert_eq!(sender.upstream, PeerAddr::new("127.0.0.1", 5000));
        assert_eq!(sender.topic, "honeypot/dionaea/");
        assert_eq!(sender.connector_id.as_str(), "dionaea-connector");
        assert_eq!(sender.settle_delay, Duration::from_millis(250));
    }

    #[test]
    fn test_listen_socket_addr() {
        let config = ListenConfig::default();
        assert_eq!(config.socket_addr().unwrap().port(), 8080);

        let bad = ListenConfig {
            address: "not an ip".into(),
            port: 8080,
        };
        assert!(matches!(bad.socket_addr(), Err(ConfigError::ListenAddr(_))));
    }
}
