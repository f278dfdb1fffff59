//! Keyset protocol types.
//!
//! This crate defines the types shared between the pagination engine, its
//! callers, and the query engine that executes page queries.
//!
//! # Modules
//!
//! - [`value`] - Sort-key values and their kinds
//! - [`order`] - Sort direction
//! - [`cursor`] - Client-facing page cursors and traversal direction
//! - [`query`] - Query IR consumed by the external query engine
//! - [`error`] - Protocol error types
//!
//! # Serialization
//!
//! [`Value`], [`Order`] and [`Cursor`] derive `rkyv::Archive`,
//! `rkyv::Serialize`, and `rkyv::Deserialize` for transport between
//! services. [`Cursor`] and [`Order`] also implement serde for JSON APIs.

pub mod cursor;
pub mod error;
pub mod order;
pub mod query;
pub mod value;

pub use error::Error;

// Re-export commonly used types at crate root
pub use cursor::{Cursor, Direction};
pub use order::Order;
pub use query::{
    Comparison, OrderTerm, QuerySpec, SeekClause, SeekCondition, SeekPredicate, SortColumn,
};
pub use value::{Value, ValueKind};

/// Cursor token format version.
///
/// Encoded into every token; decoders reject tokens carrying any other
/// version.
pub const TOKEN_VERSION: u32 = 1;
