//! Codec error types

use thiserror::Error;

/// A single leaf value failed to convert.
///
/// Conversion failures never escalate: they abort at most the current
/// mapping-definition attempt and are reported through logs.
#[derive(Debug, Clone, Error)]
pub enum ConvertError {
    /// Input had the wrong underlying JSON type for the target.
    #[error("field '{field}': expected {expected}, got {found}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Numeric input outside the permitted range.
    #[error("field '{field}': value {value} out of range [0, 65535]")]
    PortOutOfRange { field: String, value: u64 },

    /// Input was not a parseable IPv4/IPv6 literal.
    #[error("field '{field}': invalid address literal '{value}'")]
    InvalidAddress { field: String, value: String },

    /// Input did not match the fixed timestamp format.
    #[error("field '{field}': invalid timestamp '{value}': {reason}")]
    InvalidTimestamp {
        field: String,
        value: String,
        reason: String,
    },

    /// Array input contained a non-string element.
    #[error("field '{field}': array element {index} is not a string")]
    NonStringElement { field: String, index: usize },
}

impl ConvertError {
    /// Name of the field the failure was reported for.
    pub fn field(&self) -> &str {
        match self {
            ConvertError::TypeMismatch { field, .. }
            | ConvertError::PortOutOfRange { field, .. }
            | ConvertError::InvalidAddress { field, .. }
            | ConvertError::InvalidTimestamp { field, .. }
            | ConvertError::NonStringElement { field, .. } => field,
        }
    }

    pub(crate) fn type_mismatch(
        field: &str,
        expected: &'static str,
        raw: &serde_json::Value,
    ) -> Self {
        ConvertError::TypeMismatch {
            field: field.to_string(),
            expected,
            found: json_type_name(raw),
        }
    }
}

/// Human-readable name of a JSON value's type, for diagnostics.
pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(n) => {
            if n.is_u64() {
                "unsigned integer"
            } else if n.is_i64() {
                "signed integer"
            } else {
                "float"
            }
        }
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
