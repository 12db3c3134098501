//! # Hivebridge Core Types
//!
//! Shared type definitions for the sensor-to-cluster bridge:
//!
//! - **Typed wire values**: the closed set of strongly-typed scalars that
//!   may appear in an outgoing message ([`TypedValue`]).
//! - **Wire messages**: the ordered value sequence produced by the mapping
//!   layer and consumed by the sender ([`WireMessage`]).
//! - **Peer addressing**: `host:port` parsing for upstream and dynamically
//!   assigned downstream peers ([`PeerAddr`]).
//! - **Identity**: the connector identity stamped onto every outgoing
//!   message ([`ConnectorId`]).
//!
//! This crate deliberately has no I/O and no async dependencies so that the
//! mapping and transport layers stay independently testable.

pub mod identity;
pub mod message;
pub mod peer;
pub mod value;

pub use identity::ConnectorId;
pub use message::WireMessage;
pub use peer::{PeerAddr, PeerAddrError};
pub use value::TypedValue;
