//! Outgoing wire messages
//!
//! A wire message is an ordered sequence of typed values. The first element
//! is always the name of the mapping definition that produced it, so the
//! consuming side can dispatch on it. Messages are assembled atomically by
//! the mapping layer; a partially-built message is never handed to a sender.

use serde::Serialize;

use crate::value::TypedValue;

/// Ordered sequence of typed values, definition name first.
///
/// Serializes transparently as a JSON array.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct WireMessage {
    values: Vec<TypedValue>,
}

impl WireMessage {
    /// Start a message for the given mapping-definition name.
    pub fn new(event_name: impl Into<String>) -> Self {
        Self {
            values: vec![TypedValue::Text(event_name.into())],
        }
    }

    /// Append a value at the end of the message.
    pub fn push(&mut self, value: TypedValue) {
        self.values.push(value);
    }

    /// Name of the mapping definition this message was produced from.
    pub fn event_name(&self) -> &str {
        // The constructor guarantees a leading Text element.
        match &self.values[0] {
            TypedValue::Text(name) => name,
            _ => unreachable!("first wire message element is always the event name"),
        }
    }

    /// All values in wire order, event name included.
    pub fn values(&self) -> &[TypedValue] {
        &self.values
    }

    /// Number of values, event name included.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
