//! Discovery store
//!
//! External infrastructure balances connectors across downstream peers by
//! writing `connector identity -> peer address` assignments into a shared,
//! eventually-consistent store. The bridge only ever reads it: absence of
//! an entry is the normal "route upstream" state, and any read failure is
//! treated the same way by the caller.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use serde::Deserialize;
use thiserror::Error;

/// Errors reading the discovery store. Callers must treat every variant
/// identically to "no entry".
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("discovery store unavailable: {0}")]
    Unavailable(String),

    #[error("malformed discovery data: {0}")]
    Malformed(String),
}

/// Read-only lookup capability mapping a connector identity to the address
/// of the downstream peer currently assigned to it.
pub trait DiscoveryStore: Send + Sync {
    /// Current assignment for `key`, or `None` when traffic should go
    /// upstream.
    fn lookup(&self, key: &str) -> Result<Option<String>, DiscoveryError>;
}

/// Shared-map store handle.
///
/// The embedding process (or a test) holds a clone and writes assignments;
/// the sender holds another clone and reads them. Mirrors an external
/// replicated store in-process.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDiscovery {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: impl Into<String>, target: impl Into<String>) {
        self.entries
            .write()
            .unwrap()
            .insert(key.into(), target.into());
    }

    pub fn remove(&self, key: &str) {
        self.entries.write().unwrap().remove(key);
    }

    pub fn clear(&self) {
        self.entries.write().unwrap().clear();
    }
}

impl DiscoveryStore for InMemoryDiscovery {
    fn lookup(&self, key: &str) -> Result<Option<String>, DiscoveryError> {
        Ok(self.entries.read().unwrap().get(key).cloned())
    }
}

#[derive(Debug, Deserialize)]
struct AssignmentFile {
    #[serde(default)]
    assignments: HashMap<String, String>,
}

/// File-backed store: a TOML `[assignments]` table on a shared volume,
/// rewritten by the balancing infrastructure.
///
/// The file is re-read on every lookup; staleness between rewrite and read
/// is the eventual consistency the caller already tolerates.
#[derive(Debug, Clone)]
pub struct FileDiscovery {
    path: PathBuf,
}

impl FileDiscovery {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DiscoveryStore for FileDiscovery {
    fn lookup(&self, key: &str) -> Result<Option<String>, DiscoveryError> {
        let text = std::fs::read_to_string(&self.path)
            .map_err(|e| DiscoveryError::Unavailable(format!("{}: {}", self.path.display(), e)))?;
        let file: AssignmentFile = toml::from_str(&text)
            .map_err(|e| DiscoveryError::Malformed(format!("{}: {}", self.path.display(), e)))?;
        Ok(file.assignments.get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_in_memory_lookup_and_clear() {
        let store = InMemoryDiscovery::new();
        assert_eq!(store.lookup("dionaea-connector").unwrap(), None);

        store.insert("dionaea-connector", "10.0.0.7:9999");
        assert_eq!(
            store.lookup("dionaea-connector").unwrap(),
            Some("10.0.0.7:9999".to_string())
        );

        store.clear();
        assert_eq!(store.lookup("dionaea-connector").unwrap(), None);
    }

    #[test]
    fn test_writer_clone_is_visible_to_reader_clone() {
        let writer = InMemoryDiscovery::new();
        let reader = writer.clone();

        writer.insert("c1", "peer-a:9999");
        assert_eq!(reader.lookup("c1").unwrap(), Some("peer-a:9999".to_string()));
    }

    #[test]
    fn test_file_store_reads_assignments() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[assignments]").unwrap();
        writeln!(file, "\"dionaea-connector\" = \"10.0.0.7:9999\"").unwrap();

        let store = FileDiscovery::new(file.path());
        assert_eq!(
            store.lookup("dionaea-connector").unwrap(),
            Some("10.0.0.7:9999".to_string())
        );
        assert_eq!(store.lookup("other").unwrap(), None);
    }

    #[test]
    fn test_file_store_missing_table_is_empty() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let store = FileDiscovery::new(file.path());
        assert_eq!(store.lookup("anything").unwrap(), None);
    }

    #[test]
    fn test_file_store_errors_surface_as_discovery_errors() {
        let store = FileDiscovery::new("/nonexistent/assignments.toml");
        assert!(matches!(
            store.lookup("x"),
            Err(DiscoveryError::Unavailable(_))
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml [[[").unwrap();
        let store = FileDiscovery::new(file.path());
        assert!(matches!(store.lookup("x"), Err(DiscoveryError::Malformed(_))));
    }
}
