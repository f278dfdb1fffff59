//! Cursor codec.
//!
//! Encodes the ordered sort-key values of a boundary row into an opaque
//! token, and decodes tokens back into values checked against the rule set.
//!
//! Token layout: `base64url(json)` where the JSON document is
//!
//! ```json
//! {"v":1,"f":[{"k":"created_at","t":"ts","v":1704067200000000},{"k":"id","t":"i64","v":7}]}
//! ```
//!
//! `t` is `"null"` for the absent marker (with `v` omitted), a native
//! [`ValueKind`] tag, or a custom codec's type name.

mod custom;
pub mod token;
mod value;

pub use custom::{CustomCodec, Rfc3339TimestampCodec};
pub use token::DEFAULT_MAX_TOKEN_LEN;

use keyset_proto::{Value, ValueKind, TOKEN_VERSION};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use thiserror::Error;

/// Tag of the absent marker.
const NULL_TAG: &str = "null";

/// Detailed cursor codec failures.
///
/// Decode failures are reported to callers as the opaque
/// [`Error::InvalidCursor`](crate::Error::InvalidCursor); this type is for
/// logs and tests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CursorError {
    #[error("cursor token is empty")]
    Empty,

    #[error("cursor token exceeds max length: {len} chars (max {max})")]
    TooLong { len: usize, max: usize },

    #[error("cursor envelope is malformed: {0}")]
    Envelope(String),

    #[error("cursor payload is malformed: {0}")]
    Payload(String),

    #[error("unsupported cursor version {0}")]
    Version(u32),

    #[error("cursor has {actual} fields, expected {expected}")]
    Arity { expected: usize, actual: usize },

    #[error("cursor field {position} has key {actual:?}, expected {expected:?}")]
    KeyMismatch {
        position: usize,
        expected: String,
        actual: String,
    },

    #[error("cursor field {position} has type {actual:?}, expected {expected:?}")]
    TypeMismatch {
        position: usize,
        expected: String,
        actual: String,
    },

    #[error("cursor value does not fit {kind}")]
    ValueMismatch { kind: ValueKind },

    #[error("custom codec {codec:?} failed: {message}")]
    Custom { codec: String, message: String },

    #[error("row has no value for key {0:?}")]
    MissingKey(String),
}

impl CursorError {
    /// Failure raised by a [`CustomCodec`].
    pub fn custom(codec: &str, message: impl std::fmt::Display) -> Self {
        CursorError::Custom {
            codec: codec.to_string(),
            message: message.to_string(),
        }
    }
}

/// Per-position codec metadata.
#[derive(Debug, Clone)]
pub struct CodecField {
    /// Logical key, written into the token and checked on decode.
    pub key: String,
    /// Declared native kind, if any.
    pub kind: Option<ValueKind>,
    /// Custom representation, if any. Takes precedence over `kind`.
    pub codec: Option<Arc<dyn CustomCodec>>,
}

impl CodecField {
    /// A field accepting any native kind.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: None,
            codec: None,
        }
    }

    /// Declare the native kind.
    pub fn with_kind(mut self, kind: ValueKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Use a custom representation.
    pub fn with_codec(mut self, codec: Arc<dyn CustomCodec>) -> Self {
        self.codec = Some(codec);
        self
    }

    fn expected_tag(&self) -> Option<&str> {
        match (&self.codec, self.kind) {
            (Some(codec), _) => Some(codec.type_name()),
            (None, Some(kind)) => Some(kind.tag()),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct TokenPayload {
    #[serde(rename = "v")]
    version: u32,
    #[serde(rename = "f")]
    fields: Vec<TokenField>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct TokenField {
    #[serde(rename = "k")]
    key: String,
    #[serde(rename = "t")]
    tag: String,
    #[serde(rename = "v", default, skip_serializing_if = "JsonValue::is_null")]
    value: JsonValue,
}

/// Encodes value tuples into tokens.
#[derive(Debug, Clone)]
pub struct Encoder<'a> {
    fields: &'a [CodecField],
}

impl<'a> Encoder<'a> {
    pub fn new(fields: &'a [CodecField]) -> Self {
        Self { fields }
    }

    /// Encode one value per field, in field order.
    pub fn encode(&self, values: &[Value]) -> Result<String, CursorError> {
        if values.len() != self.fields.len() {
            return Err(CursorError::Arity {
                expected: self.fields.len(),
                actual: values.len(),
            });
        }

        let fields = self
            .fields
            .iter()
            .zip(values)
            .map(|(field, value)| encode_field(field, value))
            .collect::<Result<Vec<_>, _>>()?;

        let payload = TokenPayload {
            version: TOKEN_VERSION,
            fields,
        };
        let bytes =
            serde_json::to_vec(&payload).map_err(|e| CursorError::Payload(e.to_string()))?;

        Ok(token::seal(&bytes))
    }
}

fn encode_field(field: &CodecField, value: &Value) -> Result<TokenField, CursorError> {
    let (tag, json) = match (value.kind(), &field.codec) {
        (None, _) => (NULL_TAG.to_string(), JsonValue::Null),
        (Some(_), Some(codec)) => (codec.type_name().to_string(), codec.encode(value)?),
        (Some(kind), None) => {
            if let Some(expected) = field.kind {
                if expected != kind {
                    return Err(CursorError::ValueMismatch { kind: expected });
                }
            }
            (kind.tag().to_string(), value::to_json(value))
        }
    };

    Ok(TokenField {
        key: field.key.clone(),
        tag,
        value: json,
    })
}

/// Decodes tokens into value tuples.
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    fields: &'a [CodecField],
    max_token_len: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(fields: &'a [CodecField]) -> Self {
        Self {
            fields,
            max_token_len: DEFAULT_MAX_TOKEN_LEN,
        }
    }

    /// Set the token length bound.
    pub fn with_max_token_len(mut self, max_token_len: usize) -> Self {
        self.max_token_len = max_token_len;
        self
    }

    /// Decode a token into one value per field. Absent positions decode to
    /// [`Value::Null`].
    pub fn decode(&self, token: &str) -> Result<Vec<Value>, CursorError> {
        let bytes = token::open(token, self.max_token_len)?;
        let payload: TokenPayload =
            serde_json::from_slice(&bytes).map_err(|e| CursorError::Payload(e.to_string()))?;

        if payload.version != TOKEN_VERSION {
            return Err(CursorError::Version(payload.version));
        }

        if payload.fields.len() != self.fields.len() {
            return Err(CursorError::Arity {
                expected: self.fields.len(),
                actual: payload.fields.len(),
            });
        }

        self.fields
            .iter()
            .zip(&payload.fields)
            .enumerate()
            .map(|(position, (field, raw))| decode_field(position, field, raw))
            .collect()
    }
}

fn decode_field(position: usize, field: &CodecField, raw: &TokenField) -> Result<Value, CursorError> {
    if raw.key != field.key {
        return Err(CursorError::KeyMismatch {
            position,
            expected: field.key.clone(),
            actual: raw.key.clone(),
        });
    }

    if raw.tag == NULL_TAG {
        return match raw.value {
            JsonValue::Null => Ok(Value::Null),
            _ => Err(CursorError::Payload("absent marker carries a value".into())),
        };
    }

    if let Some(expected) = field.expected_tag() {
        if raw.tag != expected {
            return Err(CursorError::TypeMismatch {
                position,
                expected: expected.to_string(),
                actual: raw.tag.clone(),
            });
        }
    }

    if let Some(codec) = &field.codec {
        return codec.decode(&raw.value);
    }

    let kind = ValueKind::from_tag(&raw.tag).ok_or_else(|| CursorError::TypeMismatch {
        position,
        expected: "native kind".to_string(),
        actual: raw.tag.clone(),
    })?;

    value::from_json(kind, &raw.value)
}
