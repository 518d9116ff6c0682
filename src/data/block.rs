//! In-memory block of columnar log data.
//!
//! A block holds up to [`MAX_ROWS_PER_BLOCK`] rows. Every column covers all
//! rows of its block and carries exactly one physical encoding, chosen by
//! [`BlockBuilder`] from the column's values. Encoding is lossless: a value
//! is only stored in a typed form when formatting it back yields the exact
//! original string, so filters always observe the ingested values.

use fxhash::FxHashMap;
use tracing::debug;

use crate::data::encoding;
use crate::data::value_type::ValueType;

/// Upper bound on rows per block.
pub const MAX_ROWS_PER_BLOCK: usize = 8 * 1024;

/// Maximum number of distinct values for dictionary encoding.
const MAX_DICT_LEN: usize = 8;

/// Errors from [`BlockBuilder::build`].
#[derive(Debug, thiserror::Error)]
pub enum BlockError {
    #[error("block has {0} rows, max is {MAX_ROWS_PER_BLOCK}")]
    TooManyRows(usize),
    #[error("column {name:?} has {actual} values, block has {expected} rows")]
    ColumnLen {
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error("{actual} timestamps for {expected} rows")]
    TimestampLen { expected: usize, actual: usize },
    #[error("duplicate column {0:?}")]
    DuplicateColumn(String),
}

/// Physically-encoded column values, one variant per [`ValueType`].
#[derive(Debug, Clone)]
pub enum ColumnData {
    String(Vec<String>),
    Dict { values: Vec<String>, indexes: Vec<u8> },
    Const(String),
    Uint8(Vec<u8>),
    Uint16(Vec<u16>),
    Uint32(Vec<u32>),
    Uint64(Vec<u64>),
    Int64(Vec<i64>),
    Float64(Vec<f64>),
    Ipv4(Vec<u32>),
    TimestampIso8601(Vec<i64>),
}

/// A single named column within a block.
///
/// `min_value`/`max_value` summarize the encoded values for cheap
/// whole-column rejection. Their meaning depends on the encoding: parsed
/// integers for the uint types, [`f64::to_bits`] for floats, the big-endian
/// address word for IPv4, and nanoseconds cast to u64 for timestamps. They
/// are zero for string, dict and const columns.
#[derive(Debug, Clone)]
pub struct Column {
    pub(crate) data: ColumnData,
    pub(crate) min_value: u64,
    pub(crate) max_value: u64,
}

impl Column {
    /// The column's physical encoding.
    pub fn value_type(&self) -> ValueType {
        match &self.data {
            ColumnData::String(_) => ValueType::String,
            ColumnData::Dict { .. } => ValueType::Dict,
            ColumnData::Const(_) => ValueType::Const,
            ColumnData::Uint8(_) => ValueType::Uint8,
            ColumnData::Uint16(_) => ValueType::Uint16,
            ColumnData::Uint32(_) => ValueType::Uint32,
            ColumnData::Uint64(_) => ValueType::Uint64,
            ColumnData::Int64(_) => ValueType::Int64,
            ColumnData::Float64(_) => ValueType::Float64,
            ColumnData::Ipv4(_) => ValueType::Ipv4,
            ColumnData::TimestampIso8601(_) => ValueType::TimestampIso8601,
        }
    }

    /// Returns row `row` in canonical string form.
    ///
    /// Stored strings are returned by reference; typed encodings are
    /// formatted into `scratch`.
    ///
    /// Panics when `row` is out of bounds or a dict index is corrupt.
    pub fn value<'a>(&'a self, row: usize, scratch: &'a mut String) -> &'a str {
        match &self.data {
            ColumnData::String(values) => &values[row],
            ColumnData::Dict { values, indexes } => {
                let idx = indexes[row] as usize;
                assert!(idx < values.len(), "dict index {idx} out of range");
                &values[idx]
            }
            ColumnData::Const(value) => value,
            ColumnData::Uint8(values) => {
                scratch.clear();
                encoding::push_uint64(scratch, u64::from(values[row]));
                scratch
            }
            ColumnData::Uint16(values) => {
                scratch.clear();
                encoding::push_uint64(scratch, u64::from(values[row]));
                scratch
            }
            ColumnData::Uint32(values) => {
                scratch.clear();
                encoding::push_uint64(scratch, u64::from(values[row]));
                scratch
            }
            ColumnData::Uint64(values) => {
                scratch.clear();
                encoding::push_uint64(scratch, values[row]);
                scratch
            }
            ColumnData::Int64(values) => {
                scratch.clear();
                encoding::push_int64(scratch, values[row]);
                scratch
            }
            ColumnData::Float64(values) => {
                scratch.clear();
                encoding::push_float64(scratch, values[row]);
                scratch
            }
            ColumnData::Ipv4(values) => {
                scratch.clear();
                encoding::push_ipv4(scratch, values[row]);
                scratch
            }
            ColumnData::TimestampIso8601(values) => {
                scratch.clear();
                encoding::push_timestamp_iso8601(scratch, values[row]);
                scratch
            }
        }
    }
}

/// Immutable bundle of columns plus per-row timestamps.
#[derive(Debug, Clone)]
pub struct Block {
    columns: Vec<(String, Column)>,
    timestamps: Vec<i64>,
    row_count: usize,
}

impl Block {
    /// Number of rows in the block.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Per-row timestamps in unix nanoseconds, one per row.
    pub fn timestamps(&self) -> &[i64] {
        &self.timestamps
    }

    /// Looks up a column by field name.
    ///
    /// Blocks hold few columns, so a linear scan beats a map here.
    pub fn column(&self, field: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, c)| c)
    }
}

/// Builds a [`Block`] from raw string columns, choosing each column's
/// physical encoding.
#[derive(Debug, Default)]
pub struct BlockBuilder {
    columns: Vec<(String, Vec<String>)>,
    timestamps: Option<Vec<i64>>,
}

impl BlockBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a column of raw string values.
    pub fn column(mut self, name: impl Into<String>, values: &[&str]) -> Self {
        let values = values.iter().map(|s| (*s).to_string()).collect();
        self.columns.push((name.into(), values));
        self
    }

    /// Sets the per-row timestamps. Without this call the block gets
    /// all-zero timestamps.
    pub fn timestamps(mut self, timestamps: &[i64]) -> Self {
        self.timestamps = Some(timestamps.to_vec());
        self
    }

    pub fn build(self) -> Result<Block, BlockError> {
        let row_count = match (&self.timestamps, self.columns.first()) {
            (Some(ts), _) => ts.len(),
            (None, Some((_, values))) => values.len(),
            (None, None) => 0,
        };
        if row_count > MAX_ROWS_PER_BLOCK {
            return Err(BlockError::TooManyRows(row_count));
        }
        if let Some(ts) = &self.timestamps {
            if ts.len() != row_count {
                return Err(BlockError::TimestampLen {
                    expected: row_count,
                    actual: ts.len(),
                });
            }
        }
        for (i, (name, values)) in self.columns.iter().enumerate() {
            if values.len() != row_count {
                return Err(BlockError::ColumnLen {
                    name: name.clone(),
                    expected: row_count,
                    actual: values.len(),
                });
            }
            if self.columns[..i].iter().any(|(n, _)| n == name) {
                return Err(BlockError::DuplicateColumn(name.clone()));
            }
        }

        let columns = self
            .columns
            .into_iter()
            .map(|(name, values)| {
                let column = encode_column(values);
                debug!(column = %name, value_type = %column.value_type(), "encoded column");
                (name, column)
            })
            .collect();
        let timestamps = self.timestamps.unwrap_or_else(|| vec![0; row_count]);
        Ok(Block {
            columns,
            timestamps,
            row_count,
        })
    }
}

/// Picks the tightest lossless encoding for a column.
///
/// Tried in order: const, dict, uint (narrowest width), int64, float64,
/// ipv4, timestamp, plain string. Typed encodings apply only when every
/// value formats back to its exact original string.
fn encode_column(values: Vec<String>) -> Column {
    if let Some(first) = values.first() {
        if values.iter().all(|v| v == first) {
            return Column {
                data: ColumnData::Const(first.clone()),
                min_value: 0,
                max_value: 0,
            };
        }
    }

    if let Some(data) = try_dict_encoding(&values) {
        return Column {
            data,
            min_value: 0,
            max_value: 0,
        };
    }

    if let Some(parsed) = parse_all(&values, encoding::try_parse_uint64, encoding::push_uint64) {
        let min = parsed.iter().copied().min().unwrap_or(0);
        let max = parsed.iter().copied().max().unwrap_or(0);
        let data = if max < (1 << 8) {
            ColumnData::Uint8(parsed.iter().map(|&v| v as u8).collect())
        } else if max < (1 << 16) {
            ColumnData::Uint16(parsed.iter().map(|&v| v as u16).collect())
        } else if max < (1 << 32) {
            ColumnData::Uint32(parsed.iter().map(|&v| v as u32).collect())
        } else {
            ColumnData::Uint64(parsed)
        };
        return Column {
            data,
            min_value: min,
            max_value: max,
        };
    }

    if let Some(parsed) = parse_all(&values, encoding::try_parse_int64, encoding::push_int64) {
        let min = parsed.iter().copied().min().unwrap_or(0);
        let max = parsed.iter().copied().max().unwrap_or(0);
        return Column {
            data: ColumnData::Int64(parsed),
            min_value: min as u64,
            max_value: max as u64,
        };
    }

    if let Some(parsed) = parse_all(&values, encoding::try_parse_float64, encoding::push_float64) {
        let min = parsed.iter().copied().fold(f64::INFINITY, f64::min);
        let max = parsed.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        return Column {
            data: ColumnData::Float64(parsed),
            min_value: min.to_bits(),
            max_value: max.to_bits(),
        };
    }

    if let Some(parsed) = parse_all(&values, encoding::try_parse_ipv4, encoding::push_ipv4) {
        let min = parsed.iter().copied().min().unwrap_or(0);
        let max = parsed.iter().copied().max().unwrap_or(0);
        return Column {
            data: ColumnData::Ipv4(parsed),
            min_value: u64::from(min),
            max_value: u64::from(max),
        };
    }

    if let Some(parsed) = parse_all(
        &values,
        encoding::try_parse_timestamp_iso8601,
        encoding::push_timestamp_iso8601,
    ) {
        let min = parsed.iter().copied().min().unwrap_or(0);
        let max = parsed.iter().copied().max().unwrap_or(0);
        return Column {
            data: ColumnData::TimestampIso8601(parsed),
            min_value: min as u64,
            max_value: max as u64,
        };
    }

    Column {
        data: ColumnData::String(values),
        min_value: 0,
        max_value: 0,
    }
}

fn try_dict_encoding(values: &[String]) -> Option<ColumnData> {
    let mut dict: Vec<String> = Vec::new();
    let mut by_value: FxHashMap<&str, u8> = FxHashMap::default();
    let mut indexes = Vec::with_capacity(values.len());
    for v in values {
        let idx = match by_value.get(v.as_str()) {
            Some(&idx) => idx,
            None => {
                if dict.len() >= MAX_DICT_LEN {
                    return None;
                }
                let idx = dict.len() as u8;
                dict.push(v.clone());
                by_value.insert(v.as_str(), idx);
                idx
            }
        };
        indexes.push(idx);
    }
    // Split the borrow: by_value holds refs into `values`, not `dict`.
    drop(by_value);
    Some(ColumnData::Dict {
        values: dict,
        indexes,
    })
}

/// Parses every value, then verifies the parse is lossless by formatting
/// each parsed value back and comparing with the original.
fn parse_all<T: Copy>(
    values: &[String],
    parse: impl Fn(&str) -> Option<T>,
    format: impl Fn(&mut String, T),
) -> Option<Vec<T>> {
    let mut out = Vec::with_capacity(values.len());
    let mut buf = String::new();
    for v in values {
        let parsed = parse(v)?;
        buf.clear();
        format(&mut buf, parsed);
        if buf != *v {
            return None;
        }
        out.push(parsed);
    }
    Some(out)
}

/// The type a single string value would encode to on its own. Used by the
/// value-type filter to report a const column's underlying type.
pub(crate) fn infer_scalar_type(s: &str) -> ValueType {
    if let Some(n) = parse_canonical(s, encoding::try_parse_uint64, encoding::push_uint64) {
        return if n < (1 << 8) {
            ValueType::Uint8
        } else if n < (1 << 16) {
            ValueType::Uint16
        } else if n < (1 << 32) {
            ValueType::Uint32
        } else {
            ValueType::Uint64
        };
    }
    if parse_canonical(s, encoding::try_parse_int64, encoding::push_int64).is_some() {
        return ValueType::Int64;
    }
    if parse_canonical(s, encoding::try_parse_float64, encoding::push_float64).is_some() {
        return ValueType::Float64;
    }
    if parse_canonical(s, encoding::try_parse_ipv4, encoding::push_ipv4).is_some() {
        return ValueType::Ipv4;
    }
    if parse_canonical(
        s,
        encoding::try_parse_timestamp_iso8601,
        encoding::push_timestamp_iso8601,
    )
    .is_some()
    {
        return ValueType::TimestampIso8601;
    }
    ValueType::Const
}

fn parse_canonical<T: Copy>(
    s: &str,
    parse: impl Fn(&str) -> Option<T>,
    format: impl Fn(&mut String, T),
) -> Option<T> {
    let parsed = parse(s)?;
    let mut buf = String::new();
    format(&mut buf, parsed);
    (buf == s).then_some(parsed)
}
