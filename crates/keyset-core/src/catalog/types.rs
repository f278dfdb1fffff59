//! Column type definitions for the catalog.

use keyset_proto::ValueKind;
use rkyv::{Archive, Deserialize, Serialize};

/// Scalar column types.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub enum ScalarType {
    /// Boolean value.
    Bool,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point.
    Float64,
    /// Fixed-precision decimal.
    Decimal {
        /// Total number of digits.
        precision: u8,
        /// Number of digits after decimal point.
        scale: u8,
    },
    /// UTF-8 string.
    String,
    /// Binary data.
    Bytes,
    /// Timestamp (microseconds since Unix epoch).
    Timestamp,
    /// UUID (128-bit identifier).
    Uuid,
}

/// Field types.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub enum FieldType {
    /// A scalar value.
    Scalar(ScalarType),
    /// An optional scalar value (nullable).
    OptionalScalar(ScalarType),
    /// An array of scalar values.
    ArrayScalar(ScalarType),
}

impl ScalarType {
    /// The cursor value kind for this column type.
    ///
    /// Decimals have no native kind; their cursor positions accept any
    /// native value.
    pub fn value_kind(&self) -> Option<ValueKind> {
        match self {
            ScalarType::Bool => Some(ValueKind::Bool),
            ScalarType::Int32 => Some(ValueKind::Int32),
            ScalarType::Int64 => Some(ValueKind::Int64),
            ScalarType::Float64 => Some(ValueKind::Float64),
            ScalarType::Decimal { .. } => None,
            ScalarType::String => Some(ValueKind::String),
            ScalarType::Bytes => Some(ValueKind::Bytes),
            ScalarType::Timestamp => Some(ValueKind::Timestamp),
            ScalarType::Uuid => Some(ValueKind::Uuid),
        }
    }
}

impl FieldType {
    /// Create a scalar field type.
    pub fn scalar(scalar: ScalarType) -> Self {
        FieldType::Scalar(scalar)
    }

    /// Create an optional scalar field type.
    pub fn optional_scalar(scalar: ScalarType) -> Self {
        FieldType::OptionalScalar(scalar)
    }

    /// Create an array of scalars field type.
    pub fn array_scalar(scalar: ScalarType) -> Self {
        FieldType::ArrayScalar(scalar)
    }

    /// Check if this type is an array.
    pub fn is_array(&self) -> bool {
        matches!(self, FieldType::ArrayScalar(_))
    }

    /// Arrays cannot be sort keys.
    pub fn is_sortable(&self) -> bool {
        !self.is_array()
    }

    /// Get the inner scalar type.
    pub fn scalar_type(&self) -> &ScalarType {
        match self {
            FieldType::Scalar(s) | FieldType::OptionalScalar(s) | FieldType::ArrayScalar(s) => s,
        }
    }
}
