//! Mapping definitions
//!
//! A mapping definition describes how one family of sensor events becomes
//! one wire-message shape. Definitions are operator-authored YAML:
//!
//! ```yaml
//! name: dionaea_connection
//! mapping:
//!     data:
//!         connection:
//!             local_ip: address
//!             local_port: port_count
//!     timestamp: time_point
//! message:
//!     - timestamp
//!     - local_ip
//!     - local_port
//! ```
//!
//! `mapping` mirrors the nesting the engine expects to find in events;
//! leaves are type tags from the value codec. `message` lists the required
//! fields in wire order. Definitions are immutable after loading.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

/// One node of a mapping schema: either a nested object or a typed leaf.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SchemaNode {
    /// Leaf holding a value-codec type tag.
    Leaf(String),
    /// Interior node mirroring one level of event nesting.
    Branch(BTreeMap<String, SchemaNode>),
}

/// A named schema plus required-field ordering.
#[derive(Debug, Clone, Deserialize)]
pub struct MappingDefinition {
    /// Stamped as the first element of every message this definition
    /// produces.
    pub name: String,
    /// Schema tree guiding event traversal.
    #[serde(rename = "mapping")]
    pub schema: BTreeMap<String, SchemaNode>,
    /// Required fields, in wire order. All must resolve or the definition
    /// does not match.
    #[serde(rename = "message")]
    pub field_order: Vec<String>,
}

impl MappingDefinition {
    /// Parse a single definition from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }
}

/// Recursively load every mapping definition under `dir`.
///
/// Filesystem errors on the directory itself propagate (a missing mapping
/// directory is a deployment error worth failing startup for). Files that
/// fail to parse or lack required keys are logged and skipped, never fatal:
/// one bad pack file must not take down the bridge.
pub fn load_dir(dir: impl AsRef<Path>) -> std::io::Result<Vec<MappingDefinition>> {
    let mut definitions = Vec::new();
    load_dir_inner(dir.as_ref(), &mut definitions)?;
    info!(
        count = definitions.len(),
        dir = %dir.as_ref().display(),
        "loaded mapping definitions"
    );
    Ok(definitions)
}

fn load_dir_inner(dir: &Path, out: &mut Vec<MappingDefinition>) -> std::io::Result<()> {
    let mut entries: Vec<_> = std::fs::read_dir(dir)?.collect::<Result<_, _>>()?;
    // Deterministic load order so priority ties resolve the same way on
    // every start.
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            load_dir_inner(&path, out)?;
            continue;
        }

        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "failed to read mapping file, ignoring");
                continue;
            }
        };
        match MappingDefinition::from_yaml(&text) {
            Ok(definition) => {
                info!(file = %path.display(), name = %definition.name, "loaded mapping");
                out.push(definition);
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "failed to parse mapping file, ignoring");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CONNECTION_MAPPING: &str = r#"
name: dionaea_connection
mapping:
    data:
        connection:
            id: string
            local_ip: address
            local_port: port_count
    timestamp: time_point
message:
    - timestamp
    - id
    - local_ip
    - local_port
"#;

    #[test]
    fn test_parse_nested_schema() {
        let def = MappingDefinition::from_yaml(CONNECTION_MAPPING).unwrap();
        assert_eq!(def.name, "dionaea_connection");
        assert_eq!(def.field_order.len(), 4);

        let data = match &def.schema["data"] {
            SchemaNode::Branch(map) => map,
            other => panic!("expected branch, got {:?}", other),
        };
        let connection = match &data["connection"] {
            SchemaNode::Branch(map) => map,
            other => panic!("expected branch, got {:?}", other),
        };
        assert!(matches!(&connection["local_ip"], SchemaNode::Leaf(tag) if tag == "address"));
        assert!(matches!(&def.schema["timestamp"], SchemaNode::Leaf(tag) if tag == "time_point"));
    }

    #[test]
    fn test_parse_rejects_missing_keys() {
        // No `message` list.
        let bad = "name: x\nmapping:\n    timestamp: time_point\n";
        assert!(MappingDefinition::from_yaml(bad).is_err());

        // No `name`.
        let bad = "mapping:\n    timestamp: time_point\nmessage:\n    - timestamp\n";
        assert!(MappingDefinition::from_yaml(bad).is_err());
    }

    #[test]
    fn test_load_dir_skips_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("dionaea");
        std::fs::create_dir(&sub).unwrap();

        std::fs::write(sub.join("connection.yaml"), CONNECTION_MAPPING).unwrap();
        std::fs::write(sub.join("broken.yaml"), "mapping: {}\n").unwrap();
        let mut garbage = std::fs::File::create(sub.join("garbage.yaml")).unwrap();
        garbage.write_all(b": : :\n\t-").unwrap();

        let definitions = load_dir(dir.path()).unwrap();
        assert_eq!(definitions.len(), 1);
        assert_eq!(definitions[0].name, "dionaea_connection");
    }

    #[test]
    fn test_load_dir_missing_root_is_fatal() {
        assert!(load_dir("/nonexistent/mappings-dir").is_err());
    }
}
