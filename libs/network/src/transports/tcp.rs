//! TCP peer transport
//!
//! Carries wire messages to bus peers as length-prefixed JSON frames: a
//! u32 big-endian payload length followed by `{"topic": ..., "message":
//! [...]}`. A background reader task per connection watches the socket and
//! feeds the handle's status queue, so peer loss surfaces through
//! `poll_status` instead of on the send path.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use types::{PeerAddr, WireMessage};

use crate::error::{Result, TransportError};
use crate::peering::StatusEvent;
use crate::transport::{PeerHandle, PeerTransport};

/// TCP transport tuning.
#[derive(Debug, Clone)]
pub struct TcpTransportConfig {
    /// Bound on connection establishment.
    pub connect_timeout: Duration,
}

impl Default for TcpTransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Serialize)]
struct WireFrame<'a> {
    topic: &'a str,
    message: &'a WireMessage,
}

struct Connection {
    writer: Arc<Mutex<OwnedWriteHalf>>,
    status_rx: Arc<Mutex<mpsc::UnboundedReceiver<StatusEvent>>>,
    reader_task: JoinHandle<()>,
}

/// Production [`PeerTransport`] over TCP.
pub struct TcpPeerTransport {
    config: TcpTransportConfig,
    next_id: AtomicU64,
    connections: RwLock<HashMap<u64, Connection>>,
}

impl TcpPeerTransport {
    pub fn new(config: TcpTransportConfig) -> Self {
        Self {
            config,
            next_id: AtomicU64::new(1),
            connections: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for TcpPeerTransport {
    fn default() -> Self {
        Self::new(TcpTransportConfig::default())
    }
}

#[async_trait]
impl PeerTransport for TcpPeerTransport {
    async fn connect(&self, peer: &PeerAddr) -> Result<PeerHandle> {
        let (status_tx, status_rx) = mpsc::unbounded_channel();
        // Status is fire-and-forget: a closed queue means nobody polls.
        let _ = status_tx.send(StatusEvent::Connecting);

        let stream = tokio::time::timeout(
            self.config.connect_timeout,
            TcpStream::connect((peer.host(), peer.port())),
        )
        .await
        .map_err(|_| TransportError::ConnectTimeout {
            peer: peer.to_string(),
            timeout_ms: self.config.connect_timeout.as_millis() as u64,
        })?
        .map_err(|e| TransportError::connection(peer, e.to_string()))?;

        let _ = status_tx.send(StatusEvent::Established);

        let (mut read_half, write_half) = stream.into_split();
        let peer_label = peer.to_string();
        let reader_task = tokio::spawn(async move {
            // Peers never send us payload; the read loop exists to detect
            // the peer going away.
            let mut buf = [0u8; 1024];
            loop {
                match read_half.read(&mut buf).await {
                    Ok(0) => {
                        debug!(peer = %peer_label, "peer closed connection");
                        break;
                    }
                    Ok(_) => continue,
                    Err(e) => {
                        debug!(peer = %peer_label, error = %e, "peer connection error");
                        break;
                    }
                }
            }
            let _ = status_tx.send(StatusEvent::PeerGone);
        });

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.connections.write().await.insert(
            id,
            Connection {
                writer: Arc::new(Mutex::new(write_half)),
                status_rx: Arc::new(Mutex::new(status_rx)),
                reader_task,
            },
        );

        info!(peer = %peer, id, "peered over tcp");
        Ok(PeerHandle::new(id, peer.clone()))
    }

    async fn disconnect(&self, handle: &PeerHandle) -> Result<()> {
        let Some(connection) = self.connections.write().await.remove(&handle.id()) else {
            debug!(handle = %handle, "disconnect on unknown handle, ignoring");
            return Ok(());
        };

        connection.reader_task.abort();
        let mut writer = connection.writer.lock().await;
        if let Err(e) = writer.shutdown().await {
            debug!(handle = %handle, error = %e, "error shutting down peer connection");
        }
        info!(handle = %handle, "unpeered");
        Ok(())
    }

    async fn send(&self, handle: &PeerHandle, topic: &str, message: &WireMessage) -> Result<()> {
        let writer = {
            let connections = self.connections.read().await;
            let connection =
                connections
                    .get(&handle.id())
                    .ok_or_else(|| TransportError::UnknownHandle {
                        peer: handle.to_string(),
                    })?;
            Arc::clone(&connection.writer)
        };

        let payload = serde_json::to_vec(&WireFrame { topic, message })?;

        let mut writer = writer.lock().await;
        let frame_len = (payload.len() as u32).to_be_bytes();
        writer
            .write_all(&frame_len)
            .await
            .map_err(|e| TransportError::send(handle, e.to_string()))?;
        writer
            .write_all(&payload)
            .await
            .map_err(|e| TransportError::send(handle, e.to_string()))?;
        writer
            .flush()
            .await
            .map_err(|e| TransportError::send(handle, e.to_string()))?;

        debug!(handle = %handle, topic, bytes = payload.len(), "sent wire frame");
        Ok(())
    }

    async fn poll_status(&self, handle: &PeerHandle, max_wait: Duration) -> Vec<StatusEvent> {
        let status_rx = {
            let connections = self.connections.read().await;
            match connections.get(&handle.id()) {
                Some(connection) => Arc::clone(&connection.status_rx),
                None => {
                    warn!(handle = %handle, "status poll on unknown handle");
                    return Vec::new();
                }
            }
        };

        let mut rx = status_rx.lock().await;
        let mut events = Vec::new();

        // Bounded wait for the first event, then drain whatever is queued.
        if let Ok(Some(event)) = tokio::time::timeout(max_wait, rx.recv()).await {
            events.push(event);
            while let Ok(event) = rx.try_recv() {
                events.push(event);
            }
        }
        events
    }
}
