//! Value codec
//!
//! Total conversion functions from raw JSON scalars to [`TypedValue`]s.
//! Every function either returns a typed value or a [`ConvertError`]; none
//! panics or aborts the caller, whatever the input.

use std::borrow::Cow;
use std::net::IpAddr;

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as JsonValue;

use types::TypedValue;

use crate::error::ConvertError;

/// Fixed timestamp format sensors emit: UTC, no timezone suffix.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Separator used when flattening a string array into one text field.
const ARRAY_SEPARATOR: &str = ";";

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// The closed set of leaf type tags a mapping schema may declare.
///
/// Tags outside this set are representable in a schema file but have no
/// [`FieldKind`]; the engine logs them as unimplemented and the leaf never
/// resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// `address` - IPv4/IPv6 literal.
    Address,
    /// `port_count` - integer bounded to [0, 65535].
    PortCount,
    /// `count` - unsigned integer of any magnitude.
    Count,
    /// `string` - any scalar, coerced to text.
    Text,
    /// `time_point` - fixed-format UTC timestamp.
    TimePoint,
    /// `array` - array of strings, flattened to one text field.
    TextArray,
}

impl FieldKind {
    /// Resolve a schema type tag. `None` marks an unimplemented tag.
    pub fn from_tag(tag: &str) -> Option<FieldKind> {
        match tag {
            "address" => Some(FieldKind::Address),
            "port_count" => Some(FieldKind::PortCount),
            "count" => Some(FieldKind::Count),
            "string" => Some(FieldKind::Text),
            "time_point" => Some(FieldKind::TimePoint),
            "array" => Some(FieldKind::TextArray),
            _ => None,
        }
    }

    /// The schema tag this kind was parsed from.
    pub fn tag(&self) -> &'static str {
        match self {
            FieldKind::Address => "address",
            FieldKind::PortCount => "port_count",
            FieldKind::Count => "count",
            FieldKind::Text => "string",
            FieldKind::TimePoint => "time_point",
            FieldKind::TextArray => "array",
        }
    }
}

/// Convert one raw leaf value to the given kind.
///
/// `field` is the logical field name, used only for diagnostics.
pub fn convert(kind: FieldKind, field: &str, raw: &JsonValue) -> Result<TypedValue, ConvertError> {
    match kind {
        FieldKind::Address => convert_address(field, raw),
        FieldKind::PortCount => convert_port_count(field, raw),
        FieldKind::Count => convert_count(field, raw),
        FieldKind::Text => convert_text(field, raw),
        FieldKind::TimePoint => convert_time_point(field, raw),
        FieldKind::TextArray => convert_text_array(field, raw),
    }
}

fn convert_address(field: &str, raw: &JsonValue) -> Result<TypedValue, ConvertError> {
    let literal = raw
        .as_str()
        .ok_or_else(|| ConvertError::type_mismatch(field, "address string", raw))?;

    literal
        .parse::<IpAddr>()
        .map(TypedValue::Address)
        .map_err(|_| ConvertError::InvalidAddress {
            field: field.to_string(),
            value: literal.to_string(),
        })
}

fn convert_port_count(field: &str, raw: &JsonValue) -> Result<TypedValue, ConvertError> {
    // Strings and floats must fail here, not coerce: a sensor that starts
    // sending "4101" instead of 4101 is a schema change we want surfaced.
    let value = raw
        .as_u64()
        .ok_or_else(|| ConvertError::type_mismatch(field, "unsigned integer", raw))?;

    if value > u16::MAX as u64 {
        return Err(ConvertError::PortOutOfRange {
            field: field.to_string(),
            value,
        });
    }
    Ok(TypedValue::Port(value as u16))
}

fn convert_count(field: &str, raw: &JsonValue) -> Result<TypedValue, ConvertError> {
    raw.as_u64()
        .map(TypedValue::Count)
        .ok_or_else(|| ConvertError::type_mismatch(field, "unsigned integer", raw))
}

fn convert_text(field: &str, raw: &JsonValue) -> Result<TypedValue, ConvertError> {
    let text: Cow<'_, str> = match raw {
        JsonValue::String(s) => Cow::Borrowed(s.as_str()),
        JsonValue::Number(n) => Cow::Owned(n.to_string()),
        JsonValue::Bool(b) => Cow::Owned(b.to_string()),
        _ => return Err(ConvertError::type_mismatch(field, "scalar", raw)),
    };
    Ok(TypedValue::Text(collapse_whitespace(&text).into_owned()))
}

fn convert_time_point(field: &str, raw: &JsonValue) -> Result<TypedValue, ConvertError> {
    let literal = raw
        .as_str()
        .ok_or_else(|| ConvertError::type_mismatch(field, "timestamp string", raw))?;

    let parsed = NaiveDateTime::parse_from_str(literal, TIMESTAMP_FORMAT).map_err(|e| {
        ConvertError::InvalidTimestamp {
            field: field.to_string(),
            value: literal.to_string(),
            reason: e.to_string(),
        }
    })?;

    // Micro precision matches the source format; dividing the integer
    // micros keeps the fractional part bit-identical to a literal parse.
    let epoch_micros = parsed.and_utc().timestamp_micros();
    Ok(TypedValue::Timestamp(epoch_micros as f64 / 1e6))
}

fn convert_text_array(field: &str, raw: &JsonValue) -> Result<TypedValue, ConvertError> {
    let elements = raw
        .as_array()
        .ok_or_else(|| ConvertError::type_mismatch(field, "array of strings", raw))?;

    let mut parts = Vec::with_capacity(elements.len());
    for (index, element) in elements.iter().enumerate() {
        let part = element
            .as_str()
            .ok_or_else(|| ConvertError::NonStringElement {
                field: field.to_string(),
                index,
            })?;
        parts.push(part);
    }

    let joined = parts.join(ARRAY_SEPARATOR);
    Ok(TypedValue::Text(collapse_whitespace(&joined).into_owned()))
}

/// Collapse every run of whitespace (newlines and control spacing included)
/// to a single space so embedded line breaks cannot break downstream
/// framing.
fn collapse_whitespace(text: &str) -> Cow<'_, str> {
    WHITESPACE_RUN.replace_all(text, " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_address_accepts_ipv4_and_ipv6() {
        let v = convert(FieldKind::Address, "remote_ip", &json!("127.0.0.1")).unwrap();
        assert_eq!(v, TypedValue::Address("127.0.0.1".parse().unwrap()));

        let v = convert(
            FieldKind::Address,
            "remote_ip",
            &json!("2001:0:509c:564e:34ae:3a9a:3f57:fd91"),
        )
        .unwrap();
        assert!(matches!(v, TypedValue::Address(IpAddr::V6(_))));
    }

    #[test]
    fn test_address_rejects_malformed_literals() {
        // Too many octets, missing octets, trailing garbage, wrong type.
        for bad in ["12.12.12.12.12", "12...12", "127.0.0.1 ", "999.0.0.1", ""] {
            let err = convert(FieldKind::Address, "remote_ip", &json!(bad)).unwrap_err();
            assert!(matches!(err, ConvertError::InvalidAddress { .. }), "{bad}");
        }
        let err = convert(FieldKind::Address, "remote_ip", &json!(42)).unwrap_err();
        assert!(matches!(err, ConvertError::TypeMismatch { .. }));
    }

    #[test]
    fn test_port_count_bounds() {
        assert_eq!(
            convert(FieldKind::PortCount, "local_port", &json!(0)).unwrap(),
            TypedValue::Port(0)
        );
        assert_eq!(
            convert(FieldKind::PortCount, "local_port", &json!(65535)).unwrap(),
            TypedValue::Port(65535)
        );

        let err = convert(FieldKind::PortCount, "local_port", &json!(65536)).unwrap_err();
        assert!(matches!(err, ConvertError::PortOutOfRange { value: 65536, .. }));

        let err = convert(FieldKind::PortCount, "local_port", &json!(-1)).unwrap_err();
        assert!(matches!(err, ConvertError::TypeMismatch { .. }));
    }

    #[test]
    fn test_port_count_rejects_non_numeric_input() {
        // A stringified port is a wire-format drift, not something to coerce.
        let err = convert(FieldKind::PortCount, "local_port", &json!("4101")).unwrap_err();
        assert!(matches!(err, ConvertError::TypeMismatch { .. }));

        let err = convert(FieldKind::PortCount, "local_port", &json!(80.5)).unwrap_err();
        assert!(matches!(err, ConvertError::TypeMismatch { .. }));
    }

    #[test]
    fn test_count_accepts_large_magnitudes() {
        assert_eq!(
            convert(FieldKind::Count, "id", &json!(3019197952u64)).unwrap(),
            TypedValue::Count(3019197952)
        );
        assert_eq!(
            convert(FieldKind::Count, "id", &json!(140273915464400u64)).unwrap(),
            TypedValue::Count(140273915464400)
        );
    }

    #[test]
    fn test_count_rejects_floats_and_strings() {
        let err = convert(FieldKind::Count, "id", &json!(300.21)).unwrap_err();
        assert!(matches!(
            err,
            ConvertError::TypeMismatch { found: "float", .. }
        ));

        let err = convert(FieldKind::Count, "id", &json!("300")).unwrap_err();
        assert!(matches!(err, ConvertError::TypeMismatch { .. }));

        let err = convert(FieldKind::Count, "id", &json!(-3)).unwrap_err();
        assert!(matches!(err, ConvertError::TypeMismatch { .. }));
    }

    #[test]
    fn test_text_coerces_scalars() {
        assert_eq!(
            convert(FieldKind::Text, "transport", &json!("tcp")).unwrap(),
            TypedValue::Text("tcp".into())
        );
        assert_eq!(
            convert(FieldKind::Text, "command", &json!(3)).unwrap(),
            TypedValue::Text("3".into())
        );
        assert_eq!(
            convert(FieldKind::Text, "flag", &json!(true)).unwrap(),
            TypedValue::Text("true".into())
        );
    }

    #[test]
    fn test_text_collapses_whitespace_runs() {
        let v = convert(
            FieldKind::Text,
            "payload",
            &json!("GET / HTTP/1.1\r\nHost:\t\tlocal"),
        )
        .unwrap();
        assert_eq!(v, TypedValue::Text("GET / HTTP/1.1 Host: local".into()));
    }

    #[test]
    fn test_text_rejects_non_scalars() {
        let err = convert(FieldKind::Text, "data", &json!({"a": 1})).unwrap_err();
        assert!(matches!(err, ConvertError::TypeMismatch { .. }));

        let err = convert(FieldKind::Text, "data", &json!(["a"])).unwrap_err();
        assert!(matches!(err, ConvertError::TypeMismatch { .. }));
    }

    #[test]
    fn test_time_point_epoch_value() {
        let v = convert(
            FieldKind::TimePoint,
            "timestamp",
            &json!("2016-11-26T22:18:56.281464"),
        )
        .unwrap();
        assert_eq!(v, TypedValue::Timestamp(1480198736.281464));
    }

    #[test]
    fn test_time_point_rejects_other_formats() {
        for bad in [
            "2016-11-26 22:18:56.281464",
            "2016-11-26T22:18:56.281464Z",
            "26.11.2016",
            "",
        ] {
            let err = convert(FieldKind::TimePoint, "timestamp", &json!(bad)).unwrap_err();
            assert!(matches!(err, ConvertError::InvalidTimestamp { .. }), "{bad}");
        }
    }

    #[test]
    fn test_array_joins_and_collapses() {
        let v = convert(
            FieldKind::TextArray,
            "args",
            &json!(["show databases```;;--\"", "use\tmain"]),
        )
        .unwrap();
        assert_eq!(
            v,
            TypedValue::Text("show databases```;;--\";use main".into())
        );
    }

    #[test]
    fn test_array_rejects_mixed_and_non_arrays() {
        let err = convert(FieldKind::TextArray, "args", &json!(125)).unwrap_err();
        assert!(matches!(err, ConvertError::TypeMismatch { .. }));

        let err = convert(FieldKind::TextArray, "args", &json!(["ok", 5])).unwrap_err();
        assert!(matches!(err, ConvertError::NonStringElement { index: 1, .. }));
    }

    #[test]
    fn test_tag_round_trip() {
        for tag in ["address", "port_count", "count", "string", "time_point", "array"] {
            assert_eq!(FieldKind::from_tag(tag).unwrap().tag(), tag);
        }
        assert!(FieldKind::from_tag("list").is_none());
        assert!(FieldKind::from_tag("").is_none());
    }
}
