//! Mapping engine
//!
//! Selects, per event, the first mapping definition whose required fields
//! all resolve, and assembles the corresponding wire message. Selection
//! priority is static: definitions are ordered once at construction by
//! descending required-field count (load order breaks ties), so a relaxed
//! fallback schema can coexist with a strict one for the same event family
//! without ever shadowing it.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};

use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use types::{TypedValue, WireMessage};

use crate::convert::{convert, FieldKind};
use crate::mapping::{MappingDefinition, SchemaNode};

/// A resolved leaf value, remembered with the nesting depth it was declared
/// at so that collisions across depths pick the deepest declaration.
struct ResolvedField {
    depth: usize,
    value: TypedValue,
}

/// Schema-driven event transformer.
pub struct MappingEngine {
    /// Definitions in match-priority order, fixed at construction.
    definitions: Vec<MappingDefinition>,
}

impl MappingEngine {
    /// Build an engine over the given definitions.
    ///
    /// The priority sort happens here exactly once; `transform` never
    /// re-sorts. The sort is stable, so definitions with equally demanding
    /// schemas keep their load order.
    pub fn new(mut definitions: Vec<MappingDefinition>) -> Self {
        definitions.sort_by(|a, b| b.field_order.len().cmp(&a.field_order.len()));
        Self { definitions }
    }

    /// Number of loaded definitions.
    pub fn definition_count(&self) -> usize {
        self.definitions.len()
    }

    /// Convert `event` into a wire message, or `None` when no definition
    /// matches.
    ///
    /// No match is the normal outcome for unrecognized event shapes and is
    /// logged at debug severity only. The returned message is complete:
    /// either every field a definition requires resolved, or that
    /// definition contributed nothing.
    pub fn transform(&self, event: &JsonValue) -> Option<WireMessage> {
        for definition in &self.definitions {
            if let Some(message) = try_definition(definition, event) {
                debug!(mapping = %definition.name, "event mapped");
                return Some(message);
            }
        }
        debug!("no mapping matched event, discarding");
        None
    }
}

/// Attempt a single definition; `None` means "try the next one".
fn try_definition(definition: &MappingDefinition, event: &JsonValue) -> Option<WireMessage> {
    let mut resolved: HashMap<String, ResolvedField> = HashMap::new();
    collect_branch(&definition.schema, event, 0, &mut resolved);

    let mut message = WireMessage::new(&definition.name);
    for field in &definition.field_order {
        match resolved.get(field.as_str()) {
            Some(entry) => message.push(entry.value.clone()),
            None => {
                debug!(
                    mapping = %definition.name,
                    field = %field,
                    "required field unresolved, skipping definition"
                );
                return None;
            }
        }
    }
    Some(message)
}

/// Walk one schema level in lock step with the event.
///
/// Keys present in the event but absent from the schema are ignored; keys
/// present in the schema but absent from the event simply never resolve.
fn collect_branch(
    fields: &BTreeMap<String, SchemaNode>,
    value: &JsonValue,
    depth: usize,
    resolved: &mut HashMap<String, ResolvedField>,
) {
    let Some(object) = value.as_object() else {
        // Schema expects nesting the event does not have; nothing below
        // this point can resolve.
        return;
    };

    for (key, node) in fields {
        let Some(child) = object.get(key) else {
            continue;
        };
        match node {
            SchemaNode::Branch(inner) => collect_branch(inner, child, depth + 1, resolved),
            SchemaNode::Leaf(tag) => resolve_leaf(key, tag, child, depth, resolved),
        }
    }
}

fn resolve_leaf(
    field: &str,
    tag: &str,
    raw: &JsonValue,
    depth: usize,
    resolved: &mut HashMap<String, ResolvedField>,
) {
    let Some(kind) = FieldKind::from_tag(tag) else {
        warn!(field = %field, tag = %tag, "no conversion handler for type tag");
        return;
    };

    match convert(kind, field, raw) {
        Ok(value) => record(field, depth, value, resolved),
        Err(e) => debug!(field = %field, error = %e, "conversion failed"),
    }
}

/// Record a resolved field. The same logical name declared at several
/// nesting depths is a mapping-authoring mistake; the deepest declaration
/// wins and the collision is surfaced in the logs without aborting the
/// traversal.
fn record(
    field: &str,
    depth: usize,
    value: TypedValue,
    resolved: &mut HashMap<String, ResolvedField>,
) {
    match resolved.entry(field.to_string()) {
        Entry::Vacant(slot) => {
            slot.insert(ResolvedField { depth, value });
        }
        Entry::Occupied(mut slot) => {
            warn!(
                field = %field,
                kept_depth = slot.get().depth.max(depth),
                "field declared at multiple nesting depths, keeping the deepest"
            );
            if depth >= slot.get().depth {
                slot.insert(ResolvedField { depth, value });
            }
        }
    }
}
