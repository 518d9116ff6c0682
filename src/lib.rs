//! Sift: Columnar Log-Block Filter Engine
//!
//! Evaluates query-filter trees against in-memory blocks of columnar log
//! data. A block bundles named columns (each stored under one of several
//! physical encodings) with per-row timestamps; a filter narrows a bitmap
//! of candidate rows without ever re-setting a cleared bit, so filters
//! compose by chaining.
//!
//! # Features
//!
//! - **Typed Column Encodings**: const, dict, uint8..64, int64, float64,
//!   IPv4 and ISO8601 timestamp, chosen automatically and losslessly
//! - **Word-Level Text Search**: phrase, prefix and sequence matching with
//!   Unicode token boundaries, plus case-insensitive variants
//! - **Typed Range Filters**: numeric, lexicographic, IPv4 and length
//!   ranges with decode-free fast paths over native encodings
//! - **Cross-Field Comparisons**: row-aligned equality and ordering
//!   between two fields
//! - **Time Filters**: timestamp ranges and day-of-week windows
//! - **Boolean Composition**: And/Or/Not with short-circuiting and
//!   work-minimizing Or evaluation
//!
//! # Example
//!
//! ```
//! use sift::{Bitmap, BlockBuilder, Filter};
//!
//! let block = BlockBuilder::new()
//!     .column("level", &["info", "error", "info"])
//!     .column("msg", &["ok", "disk failure", "ok"])
//!     .build()
//!     .unwrap();
//!
//! let filter = Filter::And(vec![
//!     Filter::Phrase {
//!         field: "level".to_string(),
//!         phrase: "error".to_string(),
//!     },
//!     Filter::Phrase {
//!         field: "msg".to_string(),
//!         phrase: "failure".to_string(),
//!     },
//! ]);
//!
//! let mut bm = Bitmap::all_set(block.row_count());
//! filter.apply(&block, &mut bm);
//! assert_eq!(bm.indices(), vec![1]);
//! ```

pub mod data;
pub mod filter;

// Re-export commonly used types
pub use data::{Block, BlockBuilder, BlockError, Column, ColumnData, ValueType};
pub use filter::{Bitmap, Filter, FilterError};
