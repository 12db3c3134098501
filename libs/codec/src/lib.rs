//! # Hivebridge Mapping Codec
//!
//! Converts heterogeneous, nested sensor events into strictly-ordered typed
//! wire messages, driven by declarative mapping definitions.
//!
//! ## Pipeline
//!
//! 1. Operators author mapping definitions (YAML): a `name`, a `mapping`
//!    schema tree whose leaves are type tags, and a `message` list naming
//!    the required fields in wire order.
//! 2. [`MappingEngine`] holds all loaded definitions, sorted once at
//!    construction so the most demanding schema is always tried first.
//! 3. Per event, the engine traverses schema and event in lock step,
//!    converts every reachable leaf through the value codec, and assembles
//!    the first definition whose required fields all resolved.
//!
//! An event nothing matches is a normal outcome, not an error: the engine
//! returns `None` and the caller drops the event.
//!
//! ## Failure containment
//!
//! All conversion failures are local to a single definition attempt. A
//! malformed definition (for example one whose `message` list names a field
//! its schema never declares) loads fine and simply never matches.

pub mod convert;
pub mod engine;
pub mod error;
pub mod mapping;

pub use convert::{convert, FieldKind};
pub use engine::MappingEngine;
pub use error::ConvertError;
pub use mapping::{load_dir, MappingDefinition, SchemaNode};
