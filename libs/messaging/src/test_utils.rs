//! Test doubles for sender tests
//!
//! A recording transport that journals every operation and a discovery
//! store that replays a scripted response sequence. Both are deterministic
//! and in-memory so routing behavior can be asserted operation by
//! operation.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use network::{
    DiscoveryError, DiscoveryStore, PeerHandle, PeerTransport, Result, StatusEvent, TransportError,
};
use types::{PeerAddr, WireMessage};

/// One journaled transport operation.
#[derive(Debug, Clone)]
pub enum TransportOp {
    Connect(PeerAddr),
    Disconnect(PeerAddr),
    Send {
        peer: PeerAddr,
        topic: String,
        message: WireMessage,
    },
    StatusPoll(PeerAddr),
}

/// In-memory [`PeerTransport`] that records everything it is asked to do.
///
/// Connects succeed unless the peer was marked refused; sends succeed
/// unless the peer was marked failing. Status events are queued per peer
/// address and drained by `poll_status`.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    ops: Mutex<Vec<TransportOp>>,
    next_id: AtomicU64,
    refused: Mutex<HashSet<PeerAddr>>,
    failing_sends: Mutex<HashSet<PeerAddr>>,
    status_queues: Mutex<HashMap<PeerAddr, VecDeque<StatusEvent>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make future connect attempts to `peer` fail.
    pub fn refuse_connects_to(&self, peer: &PeerAddr) {
        self.refused.lock().unwrap().insert(peer.clone());
    }

    /// Make future connect attempts to `peer` succeed again.
    pub fn allow_connects_to(&self, peer: &PeerAddr) {
        self.refused.lock().unwrap().remove(peer);
    }

    /// Make future sends to `peer` fail.
    pub fn fail_sends_to(&self, peer: &PeerAddr) {
        self.failing_sends.lock().unwrap().insert(peer.clone());
    }

    /// Queue a status event for the given peer's handles.
    pub fn push_status(&self, peer: &PeerAddr, event: StatusEvent) {
        self.status_queues
            .lock()
            .unwrap()
            .entry(peer.clone())
            .or_default()
            .push_back(event);
    }

    /// Everything the transport was asked to do, in order.
    pub fn ops(&self) -> Vec<TransportOp> {
        self.ops.lock().unwrap().clone()
    }

    /// Successfully sent messages with their destination, in order.
    pub fn sent_messages(&self) -> Vec<(PeerAddr, WireMessage)> {
        self.ops
            .lock()
            .unwrap()
            .iter()
            .filter_map(|op| match op {
                TransportOp::Send { peer, message, .. } => Some((peer.clone(), message.clone())),
                _ => None,
            })
            .collect()
    }

    fn record(&self, op: TransportOp) {
        self.ops.lock().unwrap().push(op);
    }
}

#[async_trait]
impl PeerTransport for RecordingTransport {
    async fn connect(&self, peer: &PeerAddr) -> Result<PeerHandle> {
        if self.refused.lock().unwrap().contains(peer) {
            return Err(TransportError::connection(peer, "connection refused"));
        }
        self.record(TransportOp::Connect(peer.clone()));
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        Ok(PeerHandle::new(id, peer.clone()))
    }

    async fn disconnect(&self, handle: &PeerHandle) -> Result<()> {
        self.record(TransportOp::Disconnect(handle.peer().clone()));
        Ok(())
    }

    async fn send(&self, handle: &PeerHandle, topic: &str, message: &WireMessage) -> Result<()> {
        if self.failing_sends.lock().unwrap().contains(handle.peer()) {
            return Err(TransportError::send(handle, "send failure injected"));
        }
        self.record(TransportOp::Send {
            peer: handle.peer().clone(),
            topic: topic.to_string(),
            message: message.clone(),
        });
        Ok(())
    }

    async fn poll_status(&self, handle: &PeerHandle, _max_wait: Duration) -> Vec<StatusEvent> {
        self.record(TransportOp::StatusPoll(handle.peer().clone()));
        match self.status_queues.lock().unwrap().get_mut(handle.peer()) {
            Some(queue) => queue.drain(..).collect(),
            None => Vec::new(),
        }
    }
}

/// [`DiscoveryStore`] replaying a fixed response sequence.
///
/// Each lookup pops the next scripted response; once the script is
/// exhausted every further lookup reports no assignment.
pub struct ScriptedDiscovery {
    script: Mutex<VecDeque<std::result::Result<Option<String>, DiscoveryError>>>,
}

impl ScriptedDiscovery {
    pub fn with_responses(
        responses: Vec<std::result::Result<Option<String>, DiscoveryError>>,
    ) -> Self {
        Self {
            script: Mutex::new(responses.into()),
        }
    }
}

impl DiscoveryStore for ScriptedDiscovery {
    fn lookup(&self, _key: &str) -> std::result::Result<Option<String>, DiscoveryError> {
        match self.script.lock().unwrap().pop_front() {
            Some(response) => response,
            None => Ok(None),
        }
    }
}
