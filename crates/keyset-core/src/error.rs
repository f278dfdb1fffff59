//! Core error types.

use thiserror::Error;

/// Boxed error returned by a query engine.
pub type EngineError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Pagination errors.
///
/// Every variant except [`Error::ExecutionFailed`] is raised before the
/// query engine is called.
#[derive(Debug, Error)]
pub enum Error {
    /// The rule set is empty.
    #[error("no paging rule")]
    NoRule,

    /// Page size is zero or above the configured maximum.
    #[error("invalid limit: {0}")]
    InvalidLimit(usize),

    /// A sort direction is missing or unparseable.
    #[error("invalid order: {0}")]
    InvalidOrder(String),

    /// A rule is structurally malformed.
    #[error("invalid rule: {0}")]
    InvalidRule(String),

    /// A rule key does not map to a field of the record type.
    #[error("unknown key {key:?} on {record:?}")]
    UnknownKey { record: String, key: String },

    /// The record type is not known to the schema.
    #[error("unknown schema {0:?}")]
    UnknownSchema(String),

    /// A client-supplied cursor could not be decoded against the rule set.
    ///
    /// Intentionally carries no detail.
    #[error("invalid cursor")]
    InvalidCursor,

    /// A boundary row could not be encoded into a cursor token.
    #[error("cursor encoding error: {0}")]
    CursorEncoding(String),

    /// Paginator configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),

    /// The query engine failed.
    #[error("query execution failed: {0}")]
    ExecutionFailed(#[source] EngineError),

    /// Protocol error.
    #[error("protocol error: {0}")]
    Protocol(keyset_proto::Error),
}

impl From<keyset_proto::Error> for Error {
    fn from(err: keyset_proto::Error) -> Self {
        match err {
            keyset_proto::Error::InvalidOrder(raw) => Error::InvalidOrder(raw),
            other => Error::Protocol(other),
        }
    }
}
