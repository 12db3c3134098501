//! # Hivebridge Connector Service
//!
//! The deployable bridge between honeypot sensors and the monitoring
//! cluster's message bus. Sensors POST JSON events to the HTTP intake; each
//! event is mapped to a typed wire message (or dropped when no mapping
//! matches) and forwarded to the currently assigned downstream peer, with
//! the well-known upstream peer as fallback.
//!
//! The interesting logic lives in the library crates (`codec` for mapping,
//! `message-sink` for routing); this crate contributes the I/O shell:
//! configuration, mapping-pack loading, the HTTP endpoint, and wiring.

pub mod config;
pub mod intake;
pub mod pipeline;

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use codec::MappingEngine;
use message_sink::AdaptiveSender;
use network::{DiscoveryStore, FileDiscovery, InMemoryDiscovery, PeerTransport, TcpPeerTransport};

use crate::config::ConnectorConfig;
use crate::pipeline::EventPipeline;

/// Bring the whole service up and serve until the process is stopped.
///
/// Errors up to the point the intake starts listening are allowed to
/// terminate the program; after that, every failure is handled inside the
/// pipeline.
pub async fn run(config: ConnectorConfig) -> anyhow::Result<()> {
    let definitions = codec::load_dir(&config.mappings)
        .with_context(|| format!("reading mappings from {}", config.mappings.display()))?;
    let engine = MappingEngine::new(definitions);
    info!(definitions = engine.definition_count(), "mapping engine ready");

    let transport: Arc<dyn PeerTransport> = Arc::new(TcpPeerTransport::default());
    let discovery: Arc<dyn DiscoveryStore> = match &config.discovery.assignments_file {
        Some(path) => {
            info!(file = %path.display(), "using file-backed discovery store");
            Arc::new(FileDiscovery::new(path))
        }
        None => {
            info!("no discovery store configured, all traffic routes upstream");
            Arc::new(InMemoryDiscovery::new())
        }
    };

    let sender = AdaptiveSender::connect(config.sender_config(), transport, discovery)
        .await
        .context("peering with upstream")?;

    let pipeline = Arc::new(EventPipeline::new(engine, sender));
    let listen = config.listen.socket_addr().context("listen address")?;
    intake::serve(listen, pipeline).await.context("http intake")
}
