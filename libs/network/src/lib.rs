//! # Hivebridge Network Layer
//!
//! Everything between the sender and the wire:
//!
//! - [`PeerTransport`]: the object-safe seam over the peer connection
//!   machinery. Production uses the TCP implementation; tests inject
//!   recording doubles.
//! - [`PeeringState`] / [`StatusEvent`]: the per-connection state machine
//!   driven by asynchronous transport status events.
//! - [`DiscoveryStore`]: the read-only capability the sender uses to learn
//!   which downstream peer currently owns its traffic. The store itself is
//!   written by external infrastructure; this crate only ever reads it.
//!
//! The transport delivers status out-of-band: a connection is usable for
//! sending only once its status queue has produced `Established`, and a
//! peer that goes away surfaces as `PeerGone` on a later poll.

pub mod discovery;
pub mod error;
pub mod peering;
pub mod transport;
pub mod transports;

pub use discovery::{DiscoveryError, DiscoveryStore, FileDiscovery, InMemoryDiscovery};
pub use error::{Result, TransportError};
pub use peering::{PeeringState, StatusEvent};
pub use transport::{PeerHandle, PeerTransport};
pub use transports::tcp::{TcpPeerTransport, TcpTransportConfig};
