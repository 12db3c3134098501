//! Peering state machine
//!
//! Each peer connection moves through
//! `Disconnected -> Connecting -> Established`, with `Lost` reachable from
//! `Established` when the transport reports the peer gone. Transitions are
//! driven by [`StatusEvent`]s delivered asynchronously by the transport and
//! by explicit reconnect calls. Only `Established` permits sending.

use serde::Serialize;

/// Out-of-band status delivered by a transport's status queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEvent {
    /// A connection attempt is underway.
    Connecting,
    /// The peer acknowledged the connection.
    Established,
    /// The peer went away.
    PeerGone,
}

/// Lifecycle state of one peer connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PeeringState {
    Disconnected,
    Connecting,
    Established,
    Lost,
}

impl PeeringState {
    /// Apply one status event, returning the next state.
    ///
    /// Events that make no sense for the current state leave it unchanged;
    /// the transport may replay or reorder status around reconnects and a
    /// stale event must not corrupt the machine.
    pub fn apply(self, event: StatusEvent) -> PeeringState {
        match (self, event) {
            (_, StatusEvent::Connecting) => PeeringState::Connecting,
            (PeeringState::Connecting, StatusEvent::Established) => PeeringState::Established,
            (PeeringState::Established, StatusEvent::PeerGone) => PeeringState::Lost,
            (state, _) => state,
        }
    }

    /// Whether the connection may carry traffic.
    pub fn can_send(self) -> bool {
        self == PeeringState::Established
    }
}
