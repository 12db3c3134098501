//! Adaptive sender

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use network::{DiscoveryStore, PeerHandle, PeerTransport, PeeringState};
use types::{ConnectorId, PeerAddr, TypedValue, WireMessage};

use crate::error::SinkError;

/// Sender construction parameters.
#[derive(Debug, Clone)]
pub struct SenderConfig {
    /// Well-known upstream peer, connected once at construction.
    pub upstream: PeerAddr,
    /// Bus topic every message is published on.
    pub topic: String,
    /// This connector's identity: the discovery lookup key and the
    /// attribution field appended to every message.
    pub connector_id: ConnectorId,
    /// Wait after establishing a fresh downstream peering before the first
    /// send on it. Peering acknowledgement is asynchronous; sending into an
    /// unacknowledged connection can be silently dropped.
    pub settle_delay: Duration,
    /// Bound on the opportunistic upstream status poll.
    pub status_poll_timeout: Duration,
}

impl SenderConfig {
    pub fn new(upstream: PeerAddr, topic: impl Into<String>, connector_id: ConnectorId) -> Self {
        Self {
            upstream,
            topic: topic.into(),
            connector_id,
            settle_delay: Duration::from_millis(100),
            status_poll_timeout: Duration::from_millis(25),
        }
    }
}

/// Discovery-driven message router with upstream fallback.
///
/// Not internally synchronized: `send` takes `&mut self` and the design
/// assumes one send in flight at a time. Callers with concurrent producers
/// put the sender behind a mutex.
pub struct AdaptiveSender {
    config: SenderConfig,
    transport: Arc<dyn PeerTransport>,
    discovery: Arc<dyn DiscoveryStore>,
    upstream: PeerHandle,
    upstream_state: PeeringState,
    downstream: Option<PeerHandle>,
    last_target: Option<String>,
}

impl AdaptiveSender {
    /// Peer with the upstream address and return a ready sender.
    ///
    /// The downstream peering is intentionally left absent; the first
    /// `send` discovers it.
    pub async fn connect(
        config: SenderConfig,
        transport: Arc<dyn PeerTransport>,
        discovery: Arc<dyn DiscoveryStore>,
    ) -> Result<Self, SinkError> {
        let upstream = transport.connect(&config.upstream).await?;
        info!(upstream = %config.upstream, connector = %config.connector_id, "sender peered with upstream");

        Ok(Self {
            config,
            transport,
            discovery,
            upstream,
            upstream_state: PeeringState::Connecting,
            downstream: None,
            last_target: None,
        })
    }

    /// Currently recorded downstream assignment, if any.
    pub fn current_target(&self) -> Option<&str> {
        self.last_target.as_deref()
    }

    /// Route one message.
    ///
    /// Best-effort: every failure along the way is logged and the message
    /// dropped; this never aborts the caller.
    pub async fn send(&mut self, mut message: WireMessage) {
        // Trailing attribution field, so the receiving side can tell which
        // connector the message came from.
        message.push(TypedValue::Text(self.config.connector_id.to_string()));

        let target = match self.discovery.lookup(self.config.connector_id.as_str()) {
            Ok(target) => target,
            Err(e) => {
                error!(
                    connector = %self.config.connector_id,
                    error = %e,
                    "discovery lookup failed, treating as unassigned"
                );
                None
            }
        };

        if target != self.last_target {
            self.repeer(target).await;
        }

        if let Some(handle) = self.downstream.clone() {
            debug!(peer = %handle.peer(), "sending on downstream peering");
            if let Err(e) = self
                .transport
                .send(&handle, &self.config.topic, &message)
                .await
            {
                error!(peer = %handle.peer(), error = %e, "downstream send failed, dropping message");
            }
        } else {
            self.poll_upstream_status().await;
            if self.upstream_state.can_send() {
                warn!(upstream = %self.config.upstream, "no downstream peer assigned, falling back to upstream");
                if let Err(e) = self
                    .transport
                    .send(&self.upstream, &self.config.topic, &message)
                    .await
                {
                    error!(upstream = %self.config.upstream, error = %e, "upstream send failed, dropping message");
                }
            } else {
                error!(
                    upstream = %self.config.upstream,
                    state = ?self.upstream_state,
                    "upstream peering not established, dropping message"
                );
            }
        }
    }

    /// Tear down the current downstream peering and, when a new target is
    /// assigned, establish the replacement.
    ///
    /// On an unreachable or malformed target the recorded assignment is
    /// cleared rather than updated, so the next send retries the peering
    /// even if discovery keeps returning the same value.
    async fn repeer(&mut self, target: Option<String>) {
        if let Some(stale) = self.downstream.take() {
            info!(peer = %stale.peer(), "tearing down stale downstream peering");
            if let Err(e) = self.transport.disconnect(&stale).await {
                warn!(peer = %stale.peer(), error = %e, "error unpeering stale downstream");
            }
        }

        let Some(raw) = target else {
            info!("no downstream peer assigned anymore");
            self.last_target = None;
            return;
        };

        let addr = match raw.parse::<PeerAddr>() {
            Ok(addr) => addr,
            Err(e) => {
                error!(target = %raw, error = %e, "malformed discovery entry, treating as unassigned");
                self.last_target = None;
                return;
            }
        };

        info!(peer = %addr, "repeering with newly assigned downstream peer");
        match self.transport.connect(&addr).await {
            Ok(handle) => {
                tokio::time::sleep(self.config.settle_delay).await;
                self.downstream = Some(handle);
                self.last_target = Some(raw);
            }
            Err(e) => {
                error!(peer = %addr, error = %e, "downstream peering failed, will retry on next send");
                self.last_target = None;
            }
        }
    }

    /// Opportunistic, bounded poll of the upstream status queue. Drains
    /// everything queued but applies only the newest event; intermediate
    /// states are already history.
    async fn poll_upstream_status(&mut self) {
        let events = self
            .transport
            .poll_status(&self.upstream, self.config.status_poll_timeout)
            .await;

        if let Some(latest) = events.last() {
            let next = self.upstream_state.apply(*latest);
            if next != self.upstream_state {
                info!(from = ?self.upstream_state, to = ?next, "upstream peering state changed");
                self.upstream_state = next;
            }
        }
    }
}
