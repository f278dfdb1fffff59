//! Native token representation of sort-key values.
//!
//! | kind      | JSON                              |
//! |-----------|-----------------------------------|
//! | bool      | `true` / `false`                  |
//! | i32, i64  | number                            |
//! | f64       | string, shortest round-trip form  |
//! | str       | string                            |
//! | bytes     | lowercase hex string              |
//! | ts        | number (microseconds since epoch) |
//! | uuid      | lowercase hex string, 32 chars    |

use super::CursorError;
use keyset_proto::{Value, ValueKind};
use serde_json::Value as JsonValue;

/// Render a value. Null renders as JSON `null`.
pub(crate) fn to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Int32(i) => JsonValue::from(*i),
        Value::Int64(i) => JsonValue::from(*i),
        // Floats go through their Display form, which round-trips exactly and
        // also covers infinities.
        Value::Float64(f) => JsonValue::String(f.to_string()),
        Value::String(s) => JsonValue::String(s.clone()),
        Value::Bytes(b) => JsonValue::String(hex::encode(b)),
        Value::Timestamp(t) => JsonValue::from(*t),
        Value::Uuid(u) => JsonValue::String(hex::encode(u)),
    }
}

/// Parse a JSON value as `kind`.
pub(crate) fn from_json(kind: ValueKind, raw: &JsonValue) -> Result<Value, CursorError> {
    let mismatch = || CursorError::ValueMismatch { kind };

    let value = match kind {
        ValueKind::Bool => Value::Bool(raw.as_bool().ok_or_else(mismatch)?),
        ValueKind::Int32 => {
            let wide = raw.as_i64().ok_or_else(mismatch)?;
            Value::Int32(i32::try_from(wide).map_err(|_| mismatch())?)
        }
        ValueKind::Int64 => Value::Int64(raw.as_i64().ok_or_else(mismatch)?),
        ValueKind::Float64 => {
            let text = raw.as_str().ok_or_else(mismatch)?;
            Value::Float64(text.parse::<f64>().map_err(|_| mismatch())?)
        }
        ValueKind::String => Value::String(raw.as_str().ok_or_else(mismatch)?.to_string()),
        ValueKind::Bytes => {
            let text = raw.as_str().ok_or_else(mismatch)?;
            Value::Bytes(hex::decode(text).map_err(|_| mismatch())?)
        }
        ValueKind::Timestamp => Value::Timestamp(raw.as_i64().ok_or_else(mismatch)?),
        ValueKind::Uuid => {
            let text = raw.as_str().ok_or_else(mismatch)?;
            let mut uuid = [0u8; 16];
            hex::decode_to_slice(text, &mut uuid).map_err(|_| mismatch())?;
            Value::Uuid(uuid)
        }
    };

    Ok(value)
}
