//! Data model consumed by the filter engine.
//!
//! A [`Block`] is an immutable bundle of named columns plus per-row
//! timestamps. Columns carry one of several physical encodings
//! ([`ValueType`]); the [`encoding`] module translates between encoded
//! values and their canonical string form.

pub mod block;
pub mod encoding;
pub mod value_type;

pub use block::{Block, BlockBuilder, BlockError, Column, ColumnData, MAX_ROWS_PER_BLOCK};
pub use value_type::ValueType;
