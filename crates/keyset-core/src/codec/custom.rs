//! Custom per-key cursor encodings.

use super::CursorError;
use keyset_proto::Value;
use serde_json::Value as JsonValue;
use std::fmt;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Encode/decode hooks for a sort key whose token representation differs
/// from the native one.
///
/// `type_name` is written as the position's type tag; a token whose tag
/// differs is rejected. Implementations must be deterministic for tokens to
/// be stable, and `decode(encode(v))` must equal `v`.
pub trait CustomCodec: fmt::Debug + Send + Sync {
    /// Type tag stored in the token. Must not collide with a native tag.
    fn type_name(&self) -> &str;

    /// Render a non-null value for the token.
    fn encode(&self, value: &Value) -> Result<JsonValue, CursorError>;

    /// Parse a token value back into a sort-key value.
    fn decode(&self, raw: &JsonValue) -> Result<Value, CursorError>;
}

/// Stores [`Value::Timestamp`] as an RFC 3339 string.
///
/// RFC 3339 only covers the years 0000 to 9999. Encoding a timestamp outside
/// that range fails, so a page containing such a row cannot produce a cursor
/// and `paginate` returns `CursorEncoding`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rfc3339TimestampCodec;

impl Rfc3339TimestampCodec {
    pub const TYPE_NAME: &'static str = "rfc3339";
}

impl CustomCodec for Rfc3339TimestampCodec {
    fn type_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn encode(&self, value: &Value) -> Result<JsonValue, CursorError> {
        let micros = value
            .as_timestamp()
            .ok_or_else(|| CursorError::custom(Self::TYPE_NAME, "expected a timestamp"))?;
        let nanos = i128::from(micros) * 1_000;
        let at = OffsetDateTime::from_unix_timestamp_nanos(nanos)
            .map_err(|e| CursorError::custom(Self::TYPE_NAME, e))?;
        let text = at
            .format(&Rfc3339)
            .map_err(|e| CursorError::custom(Self::TYPE_NAME, e))?;
        Ok(JsonValue::String(text))
    }

    fn decode(&self, raw: &JsonValue) -> Result<Value, CursorError> {
        let text = raw
            .as_str()
            .ok_or_else(|| CursorError::custom(Self::TYPE_NAME, "expected a string"))?;
        let at = OffsetDateTime::parse(text, &Rfc3339)
            .map_err(|e| CursorError::custom(Self::TYPE_NAME, e))?;
        let micros = at.unix_timestamp_nanos() / 1_000;
        let micros = i64::try_from(micros)
            .map_err(|_| CursorError::custom(Self::TYPE_NAME, "timestamp out of range"))?;
        Ok(Value::Timestamp(micros))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc3339_roundtrip() {
        let codec = Rfc3339TimestampCodec;
        let value = Value::Timestamp(1_704_067_200_123_456);

        let raw = codec.encode(&value).unwrap();
        assert_eq!(raw, JsonValue::String("2024-01-01T00:00:00.123456Z".into()));
        assert_eq!(codec.decode(&raw).unwrap(), value);
    }

    #[test]
    fn test_rfc3339_rejects_wrong_shapes() {
        let codec = Rfc3339TimestampCodec;

        assert!(codec.encode(&Value::Int64(1)).is_err());
        assert!(codec.decode(&JsonValue::from(12)).is_err());
        assert!(codec.decode(&JsonValue::String("yesterday".into())).is_err());
    }

    #[test]
    fn test_rfc3339_range_is_limited() {
        let codec = Rfc3339TimestampCodec;

        assert!(codec.encode(&Value::Timestamp(i64::MAX)).is_err());
        assert!(codec.encode(&Value::Timestamp(i64::MIN)).is_err());
        assert!(codec
            .encode(&Value::Timestamp(253_402_300_799_000_000))
            .is_ok());
    }

    #[test]
    fn test_rfc3339_accepts_offsets() {
        let codec = Rfc3339TimestampCodec;
        let raw = JsonValue::String("2024-01-01T02:00:00+02:00".into());

        assert_eq!(
            codec.decode(&raw).unwrap(),
            Value::Timestamp(1_704_067_200_000_000)
        );
    }
}
