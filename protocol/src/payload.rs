//! # Payload Encoding
//!
//! Application payloads are open mappings of field names to scalar values,
//! serialized as CBOR. The transaction header commits to the SHA-512 of the
//! exact encoded bytes, so encoding must be deterministic: the same fields in
//! the same order always produce the same bytes.
//!
//! ## Encoding rules
//!
//! - Top level is a definite-length map. Keys are text strings, emitted in
//!   insertion order (the order a downstream handler was written against).
//! - Integers, lengths and floats use their shortest CBOR form.
//! - Only scalar values are accepted: text, integer, bytes, bool, finite
//!   float. Anything else is an [`EncodingError`] before a single byte is
//!   signed or sent.
//!
//! Decoding is tolerant of fields it does not know about; consumers are
//! expected to ignore extra keys.

use std::fmt;

use ciborium::value::{Integer, Value};
use thiserror::Error;

/// Errors raised while encoding or decoding a payload.
#[derive(Debug, Error, PartialEq)]
pub enum EncodingError {
    #[error("payload field names must not be empty")]
    EmptyKey,

    #[error("duplicate payload field: {key}")]
    DuplicateKey { key: String },

    #[error("payload field {field} is not a finite number")]
    NonFiniteFloat { field: String },

    #[error("payload field {field} has unsupported value type: {kind}")]
    UnsupportedValue { field: String, kind: &'static str },

    #[error("payload field {field} is outside the signed 64-bit integer range")]
    IntegerOutOfRange { field: String },

    #[error("payload must be a mapping, got {kind}")]
    NotAMapping { kind: &'static str },

    #[error("payload keys must be text strings")]
    NonTextKey,

    #[error("cbor: {0}")]
    Cbor(String),
}

// ---------------------------------------------------------------------------
// PayloadValue
// ---------------------------------------------------------------------------

/// A single scalar field value.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadValue {
    Text(String),
    Integer(i64),
    Bytes(Vec<u8>),
    Bool(bool),
    Float(f64),
}

impl PayloadValue {
    fn to_cbor(&self, field: &str) -> Result<Value, EncodingError> {
        Ok(match self {
            PayloadValue::Text(s) => Value::Text(s.clone()),
            PayloadValue::Integer(i) => Value::Integer(Integer::from(*i)),
            PayloadValue::Bytes(b) => Value::Bytes(b.clone()),
            PayloadValue::Bool(b) => Value::Bool(*b),
            PayloadValue::Float(f) => {
                if !f.is_finite() {
                    return Err(EncodingError::NonFiniteFloat {
                        field: field.to_string(),
                    });
                }
                Value::Float(*f)
            }
        })
    }

    fn from_cbor(field: &str, value: Value) -> Result<Self, EncodingError> {
        match value {
            Value::Text(s) => Ok(PayloadValue::Text(s)),
            Value::Integer(i) => i64::try_from(i)
                .map(PayloadValue::Integer)
                .map_err(|_| EncodingError::IntegerOutOfRange {
                    field: field.to_string(),
                }),
            Value::Bytes(b) => Ok(PayloadValue::Bytes(b)),
            Value::Bool(b) => Ok(PayloadValue::Bool(b)),
            Value::Float(f) => Ok(PayloadValue::Float(f)),
            other => Err(EncodingError::UnsupportedValue {
                field: field.to_string(),
                kind: cbor_kind(&other),
            }),
        }
    }

    /// Converts a JSON value (from a config file) into a payload value.
    ///
    /// Strings, booleans and numbers map directly. `null`, arrays, objects,
    /// and integers above `i64::MAX` have no payload representation.
    pub fn from_json(field: &str, value: &serde_json::Value) -> Result<Self, EncodingError> {
        use serde_json::Value as Json;

        let unsupported = |kind| EncodingError::UnsupportedValue {
            field: field.to_string(),
            kind,
        };

        match value {
            Json::String(s) => Ok(PayloadValue::Text(s.clone())),
            Json::Bool(b) => Ok(PayloadValue::Bool(*b)),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(PayloadValue::Integer(i))
                } else if n.is_u64() {
                    Err(EncodingError::IntegerOutOfRange {
                        field: field.to_string(),
                    })
                } else {
                    n.as_f64()
                        .map(PayloadValue::Float)
                        .ok_or_else(|| unsupported("number"))
                }
            }
            Json::Null => Err(unsupported("null")),
            Json::Array(_) => Err(unsupported("array")),
            Json::Object(_) => Err(unsupported("object")),
        }
    }

    /// Returns the text value, if this is a text field.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PayloadValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer value, if this is an integer field.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PayloadValue::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for PayloadValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadValue::Text(s) => write!(f, "{s:?}"),
            PayloadValue::Integer(i) => write!(f, "{i}"),
            PayloadValue::Bytes(b) => write!(f, "h'{}'", hex::encode(b)),
            PayloadValue::Bool(b) => write!(f, "{b}"),
            PayloadValue::Float(x) => write!(f, "{x}"),
        }
    }
}

impl From<&str> for PayloadValue {
    fn from(s: &str) -> Self {
        PayloadValue::Text(s.to_string())
    }
}

impl From<String> for PayloadValue {
    fn from(s: String) -> Self {
        PayloadValue::Text(s)
    }
}

impl From<i64> for PayloadValue {
    fn from(i: i64) -> Self {
        PayloadValue::Integer(i)
    }
}

impl From<i32> for PayloadValue {
    fn from(i: i32) -> Self {
        PayloadValue::Integer(i64::from(i))
    }
}

impl From<u32> for PayloadValue {
    fn from(i: u32) -> Self {
        PayloadValue::Integer(i64::from(i))
    }
}

impl From<bool> for PayloadValue {
    fn from(b: bool) -> Self {
        PayloadValue::Bool(b)
    }
}

impl From<Vec<u8>> for PayloadValue {
    fn from(b: Vec<u8>) -> Self {
        PayloadValue::Bytes(b)
    }
}

impl From<f64> for PayloadValue {
    fn from(x: f64) -> Self {
        PayloadValue::Float(x)
    }
}

fn cbor_kind(value: &Value) -> &'static str {
    match value {
        Value::Integer(_) => "integer",
        Value::Bytes(_) => "bytes",
        Value::Float(_) => "float",
        Value::Text(_) => "text",
        Value::Bool(_) => "bool",
        Value::Null => "null",
        Value::Tag(..) => "tag",
        Value::Array(_) => "array",
        Value::Map(_) => "map",
        _ => "unknown",
    }
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// An ordered mapping of field names to values.
///
/// # Example
///
/// ```
/// use sawmill_protocol::payload::Payload;
///
/// let bytes = Payload::new()
///     .field("Verb", "set")
///     .field("Name", "foo")
///     .field("Value", 42)
///     .encode()
///     .unwrap();
/// assert_eq!(bytes[0], 0xa3); // map of three pairs
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
    fields: Vec<(String, PayloadValue)>,
}

impl Payload {
    /// An empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field. Validation (empty or duplicate keys) happens in
    /// [`encode`](Self::encode), so construction never fails.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<PayloadValue>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }

    /// The standard `intkey` payload: `{Verb, Name, Value}`.
    pub fn intkey(verb: &str, name: &str, value: i64) -> Self {
        Self::new()
            .field("Verb", verb)
            .field("Name", name)
            .field("Value", value)
    }

    /// The reference payload `{Verb:"set", Name:"foo", Value:42, Keki:"keki"}`.
    pub fn example() -> Self {
        Self::intkey("set", "foo", 42).field("Keki", "keki")
    }

    /// Builds a payload from a JSON object, preserving its key order.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, EncodingError> {
        let object = match value {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Null => return Err(EncodingError::NotAMapping { kind: "null" }),
            serde_json::Value::Array(_) => return Err(EncodingError::NotAMapping { kind: "array" }),
            _ => return Err(EncodingError::NotAMapping { kind: "scalar" }),
        };

        object
            .iter()
            .try_fold(Self::new(), |payload, (key, value)| {
                Ok(payload.field(key.as_str(), PayloadValue::from_json(key, value)?))
            })
    }

    /// Looks up a field by name.
    pub fn get(&self, key: &str) -> Option<&PayloadValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Fields in encoding order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PayloadValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Serializes the payload to canonical CBOR bytes.
    pub fn encode(&self) -> Result<Vec<u8>, EncodingError> {
        let mut entries = Vec::with_capacity(self.fields.len());
        for (index, (key, value)) in self.fields.iter().enumerate() {
            if key.is_empty() {
                return Err(EncodingError::EmptyKey);
            }
            if self.fields[..index].iter().any(|(k, _)| k == key) {
                return Err(EncodingError::DuplicateKey { key: key.clone() });
            }
            entries.push((Value::Text(key.clone()), value.to_cbor(key)?));
        }

        let mut buf = Vec::with_capacity(64);
        ciborium::ser::into_writer(&Value::Map(entries), &mut buf)
            .map_err(|e| EncodingError::Cbor(e.to_string()))?;

        tracing::debug!(fields = self.fields.len(), bytes = buf.len(), "payload encoded");
        Ok(buf)
    }

    /// Parses CBOR payload bytes. Unknown fields are kept, not rejected.
    pub fn decode(bytes: &[u8]) -> Result<Self, EncodingError> {
        let value: Value =
            ciborium::de::from_reader(bytes).map_err(|e| EncodingError::Cbor(e.to_string()))?;

        let entries = match value {
            Value::Map(entries) => entries,
            other => {
                return Err(EncodingError::NotAMapping {
                    kind: cbor_kind(&other),
                })
            }
        };

        let mut fields = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            let Value::Text(key) = key else {
                return Err(EncodingError::NonTextKey);
            };
            let value = PayloadValue::from_cbor(&key, value)?;
            fields.push((key, value));
        }
        Ok(Self { fields })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE_CBOR_HEX: &str =
        "a4645665726263736574644e616d6563666f6f6556616c7565182a644b656b69646b656b69";

    #[test]
    fn example_payload_matches_reference_bytes() {
        let bytes = Payload::example().encode().unwrap();
        assert_eq!(hex::encode(&bytes), EXAMPLE_CBOR_HEX);
    }

    #[test]
    fn encoding_is_deterministic() {
        let a = Payload::example().encode().unwrap();
        let b = Payload::example().encode().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn key_order_is_preserved() {
        let ab = Payload::new().field("a", 1).field("b", 2).encode().unwrap();
        let ba = Payload::new().field("b", 2).field("a", 1).encode().unwrap();
        assert_ne!(ab, ba, "insertion order is part of the encoding");
    }

    #[test]
    fn shortest_integer_forms() {
        let small = Payload::new().field("v", 23).encode().unwrap();
        assert_eq!(&small[small.len() - 1..], &[0x17]);

        let one_byte = Payload::new().field("v", 24).encode().unwrap();
        assert_eq!(&one_byte[one_byte.len() - 2..], &[0x18, 0x18]);

        let negative = Payload::new().field("v", -1).encode().unwrap();
        assert_eq!(&negative[negative.len() - 1..], &[0x20]);
    }

    #[test]
    fn decode_roundtrip_preserves_fields() {
        let payload = Payload::example()
            .field("Blob", vec![0xde, 0xad])
            .field("Flag", false);
        let bytes = payload.encode().unwrap();
        let decoded = Payload::decode(&bytes).unwrap();
        assert_eq!(decoded, payload);
        assert_eq!(decoded.encode().unwrap(), bytes);
    }

    #[test]
    fn decode_tolerates_unknown_fields() {
        let bytes = Payload::intkey("inc", "bar", 5)
            .field("Extra", "ignored by old handlers")
            .encode()
            .unwrap();
        let decoded = Payload::decode(&bytes).unwrap();
        assert_eq!(decoded.get("Verb").and_then(PayloadValue::as_text), Some("inc"));
        assert_eq!(decoded.get("Value").and_then(PayloadValue::as_integer), Some(5));
        assert_eq!(decoded.len(), 4);
    }

    #[test]
    fn empty_key_rejected() {
        let err = Payload::new().field("", 1).encode().unwrap_err();
        assert_eq!(err, EncodingError::EmptyKey);
    }

    #[test]
    fn duplicate_key_rejected() {
        let err = Payload::new()
            .field("Name", "foo")
            .field("Name", "bar")
            .encode()
            .unwrap_err();
        assert_eq!(err, EncodingError::DuplicateKey { key: "Name".into() });
    }

    #[test]
    fn non_finite_float_rejected() {
        let err = Payload::new().field("Value", f64::NAN).encode().unwrap_err();
        assert!(matches!(err, EncodingError::NonFiniteFloat { .. }));
    }

    #[test]
    fn json_object_maps_to_payload() {
        let json = serde_json::json!({ "Verb": "set", "Name": "foo", "Value": 42, "Keki": "keki" });
        let payload = Payload::from_json(&json).unwrap();
        assert_eq!(payload, Payload::example());
    }

    #[test]
    fn json_unsupported_values_rejected() {
        for (json, kind) in [
            (serde_json::json!({ "v": null }), "null"),
            (serde_json::json!({ "v": [1, 2] }), "array"),
            (serde_json::json!({ "v": { "nested": 1 } }), "object"),
        ] {
            let err = Payload::from_json(&json).unwrap_err();
            assert_eq!(
                err,
                EncodingError::UnsupportedValue {
                    field: "v".into(),
                    kind
                }
            );
        }
    }

    #[test]
    fn json_integer_overflow_rejected() {
        let json = serde_json::json!({ "v": u64::MAX });
        assert!(matches!(
            Payload::from_json(&json),
            Err(EncodingError::IntegerOutOfRange { .. })
        ));
    }

    #[test]
    fn json_non_object_rejected() {
        assert!(matches!(
            Payload::from_json(&serde_json::json!([1, 2, 3])),
            Err(EncodingError::NotAMapping { kind: "array" })
        ));
    }

    #[test]
    fn decode_rejects_non_map() {
        // CBOR array [1]
        assert!(matches!(
            Payload::decode(&[0x81, 0x01]),
            Err(EncodingError::NotAMapping { kind: "array" })
        ));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(Payload::decode(&[0xff, 0x00]), Err(EncodingError::Cbor(_))));
    }
}
