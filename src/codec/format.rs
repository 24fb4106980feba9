//! External transaction representations.
//!
//! Upstream producers serialize binary buffers inconsistently: some send a
//! base64 string, others the JSON form of a Node.js `Buffer`
//! (`{"type":"Buffer","data":[..]}`), sometimes itself stringified. All of
//! them are normalized here to one canonical byte sequence.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

use crate::codec::CodecError;

/// Standard alphabet, padding optional on input.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// How a transaction payload is represented by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionFormat {
    #[default]
    Base64,
    BufferObject,
}

impl FromStr for TransactionFormat {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "base64" => Ok(TransactionFormat::Base64),
            "bufferObject" | "buffer" => Ok(TransactionFormat::BufferObject),
            other => Err(CodecError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for TransactionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionFormat::Base64 => f.write_str("base64"),
            TransactionFormat::BufferObject => f.write_str("bufferObject"),
        }
    }
}

/// Map an external payload to raw bytes.
pub fn normalize(format: TransactionFormat, payload: &Value) -> Result<Vec<u8>, CodecError> {
    match format {
        TransactionFormat::Base64 => match payload {
            Value::String(text) => from_base64(text),
            other => Err(CodecError::Base64(format!(
                "expected a string, got {}",
                json_type(other)
            ))),
        },
        TransactionFormat::BufferObject => from_buffer_value(payload, true),
    }
}

pub fn from_base64(text: &str) -> Result<Vec<u8>, CodecError> {
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if compact.is_empty() {
        return Err(CodecError::Base64("empty payload".into()));
    }
    LENIENT
        .decode(compact.as_bytes())
        .map_err(|e| CodecError::Base64(e.to_string()))
}

pub fn to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// The Node.js `Buffer#toJSON` shape.
pub fn to_buffer_object(bytes: &[u8]) -> Value {
    json!({ "type": "Buffer", "data": bytes })
}

fn from_buffer_value(value: &Value, allow_string: bool) -> Result<Vec<u8>, CodecError> {
    match value {
        Value::Object(map) => {
            if let Some(kind) = map.get("type") {
                if kind.as_str() != Some("Buffer") {
                    return Err(CodecError::BufferObject(format!(
                        "unexpected type tag {kind}"
                    )));
                }
            }
            let data = map
                .get("data")
                .ok_or_else(|| CodecError::BufferObject("missing 'data' field".into()))?;
            byte_array(data)
        }
        Value::Array(_) => byte_array(value),
        // Some producers stringify the object before handing it over.
        Value::String(text) if allow_string => {
            let inner: Value = serde_json::from_str(text)
                .map_err(|e| CodecError::BufferObject(format!("not JSON: {e}")))?;
            from_buffer_value(&inner, false)
        }
        other => Err(CodecError::BufferObject(format!(
            "expected an object, got {}",
            json_type(other)
        ))),
    }
}

fn byte_array(value: &Value) -> Result<Vec<u8>, CodecError> {
    let items = value
        .as_array()
        .ok_or_else(|| CodecError::BufferObject("'data' must be an array".into()))?;
    if items.is_empty() {
        return Err(CodecError::BufferObject("empty payload".into()));
    }
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            item.as_u64()
                .and_then(|n| u8::try_from(n).ok())
                .ok_or_else(|| CodecError::BufferObject(format!("element {i} is not a byte: {item}")))
        })
        .collect()
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_formats_agree() {
        let bytes = vec![0x48, 0x54, 0x58, 0x01, 0x00, 0xff, 0x10];
        let from_b64 = normalize(TransactionFormat::Base64, &json!(to_base64(&bytes))).unwrap();
        let from_obj =
            normalize(TransactionFormat::BufferObject, &to_buffer_object(&bytes)).unwrap();
        let from_str = normalize(
            TransactionFormat::BufferObject,
            &json!(to_buffer_object(&bytes).to_string()),
        )
        .unwrap();
        assert_eq!(from_b64, bytes);
        assert_eq!(from_obj, bytes);
        assert_eq!(from_str, bytes);
    }

    #[test]
    fn test_invalid_base64() {
        let err = normalize(TransactionFormat::Base64, &json!("not-valid-base64!!")).unwrap_err();
        assert!(matches!(err, CodecError::Base64(_)));
        assert!(normalize(TransactionFormat::Base64, &json!("")).is_err());
        assert!(normalize(TransactionFormat::Base64, &json!(42)).is_err());
    }

    #[test]
    fn test_unpadded_and_wrapped_base64() {
        assert_eq!(from_base64("AQID").unwrap(), vec![1, 2, 3]);
        assert_eq!(from_base64("AQIDBA").unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(from_base64("AQID\nBA==").unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_invalid_buffer_objects() {
        let bad = [
            json!({"type": "Buffer"}),
            json!({"type": "Uint8Array", "data": [1]}),
            json!({"type": "Buffer", "data": [1, 256]}),
            json!({"type": "Buffer", "data": [1, -1]}),
            json!({"type": "Buffer", "data": "AQID"}),
            json!({"type": "Buffer", "data": []}),
            json!("{not json"),
            json!(null),
        ];
        for value in bad {
            assert!(
                normalize(TransactionFormat::BufferObject, &value).is_err(),
                "{value} should be rejected"
            );
        }
    }

    #[test]
    fn test_format_names() {
        assert_eq!("base64".parse::<TransactionFormat>().unwrap(), TransactionFormat::Base64);
        assert_eq!(
            "bufferObject".parse::<TransactionFormat>().unwrap(),
            TransactionFormat::BufferObject
        );
        assert!("hex".parse::<TransactionFormat>().is_err());
    }
}
