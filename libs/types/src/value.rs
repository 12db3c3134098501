//! Typed wire values
//!
//! The closed set of scalar types an outgoing message may carry. Values are
//! immutable once constructed; all validation happens in the codec layer
//! before a `TypedValue` exists.

use std::fmt;
use std::net::IpAddr;

use serde::Serialize;

/// One element of an outgoing wire message.
///
/// Serializes untagged, so a message renders as a plain JSON array:
/// addresses as string literals, ports and counts as numbers, timestamps as
/// fractional epoch seconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TypedValue {
    /// IPv4 or IPv6 address.
    Address(IpAddr),
    /// Port number or other value bounded to [0, 65535].
    Port(u16),
    /// Unsigned count of arbitrary magnitude.
    Count(u64),
    /// Seconds since the Unix epoch, with fractional part.
    Timestamp(f64),
    /// Free-form text with whitespace runs already collapsed.
    Text(String),
}

impl TypedValue {
    /// Short name of the variant, used in logs.
    pub fn kind_name(&self) -> &'static str {
        match self {
            TypedValue::Address(_) => "address",
            TypedValue::Port(_) => "port",
            TypedValue::Count(_) => "count",
            TypedValue::Timestamp(_) => "timestamp",
            TypedValue::Text(_) => "text",
        }
    }

    /// Borrow the inner text if this is a `Text` value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            TypedValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::Address(addr) => write!(f, "{}", addr),
            TypedValue::Port(port) => write!(f, "{}", port),
            TypedValue::Count(count) => write!(f, "{}", count),
            TypedValue::Timestamp(ts) => write!(f, "{}", ts),
            TypedValue::Text(text) => write!(f, "{}", text),
        }
    }
}

impl From<&str> for TypedValue {
    fn from(text: &str) -> Self {
        TypedValue::Text(text.to_string())
    }
}

impl From<String> for TypedValue {
    fn from(text: String) -> Self {
        TypedValue::Text(text)
    }
}
