//! Page query construction and execution.
//!
//! This module builds seek queries from compiled rules, renders them to SQL,
//! and defines the seam to the engine that executes them.

mod builder;
mod engine;
mod memory;
pub mod sql;

pub use builder::{build_args, build_order, build_predicate, fetch_limit, seek_op};
pub use engine::{KeysetRow, QueryEngine};
pub use memory::{MemoryEngine, MemoryEngineError, MemoryRow};
pub use sql::{sql_literal, LiteralError, PlaceholderStyle, SqlQuery, SqlRenderer};
