//! Keyset Core - Rule model, cursor codec, and seek query construction.
//!
//! This crate turns an ordered set of sort rules and an opaque page cursor
//! into a seek query, hands it to a [`QueryEngine`], and encodes cursors for
//! the neighbouring pages from the rows that come back.

pub mod catalog;
pub mod codec;
pub mod config;
pub mod error;
pub mod paginator;
pub mod plan;
pub mod query;
pub mod rule;

pub use catalog::{EntityDef, FieldDef, FieldType, ScalarType, SchemaBundle, SchemaResolver};
pub use codec::{CodecField, CursorError, CustomCodec, Decoder, Encoder, Rfc3339TimestampCodec};
pub use config::PaginatorConfig;
pub use error::{EngineError, Error};
pub use paginator::Paginator;
pub use plan::{CompiledRule, Page, PagePlan, PageQuery};
pub use query::{
    KeysetRow, LiteralError, MemoryEngine, MemoryEngineError, MemoryRow, PlaceholderStyle,
    QueryEngine, SqlQuery, SqlRenderer,
};
pub use rule::Rule;

/// Re-export protocol types.
pub use keyset_proto as proto;
pub use keyset_proto::{Cursor, Direction, Order, QuerySpec, Value, ValueKind};
