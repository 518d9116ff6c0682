use serde::{Deserialize, Serialize};

/// Physical encoding of a column inside one block.
///
/// Exactly one type applies per column per block. The encoding is chosen by
/// the block builder based on the column's values; filters dispatch on it to
/// pick decode-free fast paths where possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// Strings stored as is. The fallback encoding.
    String,
    /// Small set of distinct strings plus a per-row byte index into it.
    Dict,
    /// A single string value shared by every row.
    Const,
    /// Unsigned integers up to 2^8-1, one byte per value.
    Uint8,
    /// Unsigned integers up to 2^16-1.
    Uint16,
    /// Unsigned integers up to 2^32-1.
    Uint32,
    /// Unsigned integers up to 2^64-1.
    Uint64,
    /// Signed integers; used when at least one value is negative.
    Int64,
    /// Floating-point values in shortest round-trip decimal form.
    Float64,
    /// IPv4 addresses stored as big-endian 32-bit words.
    Ipv4,
    /// ISO8601 timestamps in the fixed `YYYY-MM-DDTHH:MM:SS.mmmZ` form,
    /// stored as unix nanoseconds.
    TimestampIso8601,
}

impl ValueType {
    /// Stable name used by the value-type filter.
    pub fn type_name(&self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Dict => "dict",
            ValueType::Const => "const",
            ValueType::Uint8 => "uint8",
            ValueType::Uint16 => "uint16",
            ValueType::Uint32 => "uint32",
            ValueType::Uint64 => "uint64",
            ValueType::Int64 => "int64",
            ValueType::Float64 => "float64",
            ValueType::Ipv4 => "ipv4",
            ValueType::TimestampIso8601 => "timestamp_iso8601",
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name())
    }
}
