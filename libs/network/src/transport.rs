//! Peer transport abstraction
//!
//! The sender talks to peers exclusively through [`PeerTransport`], so the
//! whole routing logic can be exercised against in-memory doubles. The
//! production implementation lives in [`crate::transports::tcp`].

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use types::{PeerAddr, WireMessage};

use crate::error::Result;
use crate::peering::StatusEvent;

/// Opaque reference to one live peer connection.
///
/// Handles are cheap to clone; the transport owns the actual connection
/// state behind the id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeerHandle {
    id: u64,
    peer: PeerAddr,
}

impl PeerHandle {
    pub fn new(id: u64, peer: PeerAddr) -> Self {
        Self { id, peer }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// The peer this handle was connected to.
    pub fn peer(&self) -> &PeerAddr {
        &self.peer
    }
}

impl fmt::Display for PeerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.peer, self.id)
    }
}

/// Connection machinery for upstream and downstream peers.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Open a connection to `peer`.
    ///
    /// Returning `Ok` means the attempt was started and is being
    /// acknowledged asynchronously; the handle's status queue reports
    /// `Established` once the peer acked.
    async fn connect(&self, peer: &PeerAddr) -> Result<PeerHandle>;

    /// Tear down a connection. Idempotent: disconnecting an already-dead
    /// handle is not an error.
    async fn disconnect(&self, handle: &PeerHandle) -> Result<()>;

    /// Send one wire message on the given topic.
    async fn send(&self, handle: &PeerHandle, topic: &str, message: &WireMessage) -> Result<()>;

    /// Drain queued status events for the handle.
    ///
    /// Waits at most `max_wait` for the first event, then collects whatever
    /// else is already queued without further blocking. An unknown handle
    /// yields no events.
    async fn poll_status(&self, handle: &PeerHandle, max_wait: Duration) -> Vec<StatusEvent>;
}
