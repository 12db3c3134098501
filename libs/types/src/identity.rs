//! Connector identity
//!
//! Each bridge instance carries one identity. It is the key looked up in the
//! discovery store and the trailing attribution field appended to every
//! outgoing message.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of one connector instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectorId(String);

impl ConnectorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConnectorId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ConnectorId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_inner() {
        let id = ConnectorId::new("dionaea-connector");
        assert_eq!(id.to_string(), "dionaea-connector");
        assert_eq!(id.as_str(), "dionaea-connector");
    }
}
