//! Event pipeline
//!
//! Glue between intake, mapping engine and sender: one decoded event in,
//! at most one wire message out. The engine and the sender never call each
//! other; this is the only place they meet.

use serde_json::Value as JsonValue;
use tokio::sync::Mutex;
use tracing::debug;

use codec::MappingEngine;
use message_sink::AdaptiveSender;

/// Transform-then-send pipeline, one event at a time.
///
/// The sender mutates its peering state per send, so it sits behind a
/// mutex; intake requests serialize on it.
pub struct EventPipeline {
    engine: MappingEngine,
    sender: Mutex<AdaptiveSender>,
}

impl EventPipeline {
    pub fn new(engine: MappingEngine, sender: AdaptiveSender) -> Self {
        Self {
            engine,
            sender: Mutex::new(sender),
        }
    }

    /// Map one event and forward the result, if any.
    ///
    /// Unmapped events are dropped quietly; that is the expected outcome
    /// for event shapes no mapping covers.
    pub async fn handle_event(&self, event: JsonValue) {
        let Some(message) = self.engine.transform(&event) else {
            debug!("event did not map to any message");
            return;
        };
        self.sender.lock().await.send(message).await;
    }
}
