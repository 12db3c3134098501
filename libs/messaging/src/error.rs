//! Sender error types

use network::TransportError;
use thiserror::Error;

/// Errors a sender can surface to its creator.
///
/// Only construction is fallible: a bridge that cannot reach its upstream
/// peer at startup has nothing to fall back to and should not come up.
/// Everything after construction is recovered internally and logged.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("upstream peering failed: {0}")]
    UpstreamPeering(#[from] TransportError),
}
