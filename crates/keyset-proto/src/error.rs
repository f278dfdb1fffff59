//! Protocol error types.

use thiserror::Error;

/// Protocol-level errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization failed.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// A sort direction could not be parsed.
    #[error("invalid order: {0:?}")]
    InvalidOrder(String),

    /// A value kind tag is not recognized.
    #[error("unknown value kind: {0:?}")]
    UnknownKind(String),
}
