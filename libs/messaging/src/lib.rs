//! # Hivebridge Adaptive Sender
//!
//! Routes outgoing wire messages to whichever downstream peer the discovery
//! store currently assigns to this connector, falling back to the fixed
//! upstream peer when nothing is assigned or reachable.
//!
//! The sender owns two peerings:
//!
//! - **Upstream**: connected once at construction to a well-known address;
//!   its health is tracked through the transport's status queue and gates
//!   the fallback path.
//! - **Downstream**: retargeted on the fly. Before every send the discovery
//!   store is consulted; when the assignment changed, the old peering is
//!   torn down and a new one established (with a short settling delay,
//!   since peering acknowledgement is asynchronous and an instant send may
//!   be silently dropped).
//!
//! Delivery is best-effort by design: there is no retry queue, and no
//! failure below the process boundary ever propagates out of
//! [`AdaptiveSender::send`].

pub mod error;
pub mod sender;
pub mod test_utils;

pub use error::SinkError;
pub use sender::{AdaptiveSender, SenderConfig};
