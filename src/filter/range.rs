//! Range leaf filters: numeric, string, IPv4 and length ranges.
//!
//! Numeric and IPv4 ranges compare natively-encoded columns without
//! decoding; the column min/max metadata rejects whole columns early.
//! String-encoded columns fall back to parsing each candidate value.

use crate::data::block::{Block, ColumnData};
use crate::filter::bitmap::Bitmap;
use crate::filter::leaf::apply_string_match;
use crate::filter::matchers;

/// Inclusive numeric range over values parseable as floats.
pub(crate) fn apply_range(block: &Block, bm: &mut Bitmap, field: &str, min: f64, max: f64) {
    if min > max || min.is_nan() || max.is_nan() {
        bm.reset_bits();
        return;
    }
    let column = match block.column(field) {
        Some(column) => column,
        None => {
            // The implicit empty string is not a number.
            bm.reset_bits();
            return;
        }
    };
    match &column.data {
        ColumnData::Uint8(vs) => apply_uint_range(bm, vs, |&v| u64::from(v), column.min_value, column.max_value, min, max),
        ColumnData::Uint16(vs) => apply_uint_range(bm, vs, |&v| u64::from(v), column.min_value, column.max_value, min, max),
        ColumnData::Uint32(vs) => apply_uint_range(bm, vs, |&v| u64::from(v), column.min_value, column.max_value, min, max),
        ColumnData::Uint64(vs) => apply_uint_range(bm, vs, |&v| v, column.min_value, column.max_value, min, max),
        ColumnData::Int64(vs) => {
            // min_value/max_value hold the signed bounds cast to u64.
            let col_min = column.min_value as i64 as f64;
            let col_max = column.max_value as i64 as f64;
            if max < col_min || min > col_max {
                bm.reset_bits();
                return;
            }
            bm.for_each_set_bit(|i| {
                let f = vs[i] as f64;
                min <= f && f <= max
            });
        }
        ColumnData::Float64(vs) => {
            let col_min = f64::from_bits(column.min_value);
            let col_max = f64::from_bits(column.max_value);
            if max < col_min || min > col_max {
                bm.reset_bits();
                return;
            }
            bm.for_each_set_bit(|i| min <= vs[i] && vs[i] <= max);
        }
        // IPv4 and timestamp canonical forms never parse as numbers.
        ColumnData::Ipv4(_) | ColumnData::TimestampIso8601(_) => bm.reset_bits(),
        _ => apply_string_match(block, bm, field, |s| matchers::match_range(s, min, max)),
    }
}

fn apply_uint_range<T>(
    bm: &mut Bitmap,
    values: &[T],
    as_u64: impl Fn(&T) -> u64,
    col_min: u64,
    col_max: u64,
    min: f64,
    max: f64,
) {
    if max < 0.0 {
        bm.reset_bits();
        return;
    }
    let (min_u, max_u) = to_uint64_range(min, max);
    if max_u < col_min || min_u > col_max {
        bm.reset_bits();
        return;
    }
    bm.for_each_set_bit(|i| {
        let v = as_u64(&values[i]);
        min_u <= v && v <= max_u
    });
}

/// Tightens a float range to the integers it contains, clamped to u64.
fn to_uint64_range(min: f64, max: f64) -> (u64, u64) {
    (clamp_to_u64(min.ceil()), clamp_to_u64(max.floor()))
}

fn clamp_to_u64(f: f64) -> u64 {
    if f.is_nan() || f < 0.0 {
        0
    } else if f >= u64::MAX as f64 {
        u64::MAX
    } else {
        f as u64
    }
}

/// Lexicographic half-open range `min..max` over canonical strings.
pub(crate) fn apply_string_range(block: &Block, bm: &mut Bitmap, field: &str, min: &str, max: &str) {
    if min >= max {
        bm.reset_bits();
        return;
    }
    apply_string_match(block, bm, field, |s| matchers::match_string_range(s, min, max));
}

/// Inclusive range over values parseable as IPv4 addresses.
pub(crate) fn apply_ipv4_range(block: &Block, bm: &mut Bitmap, field: &str, min: u32, max: u32) {
    if min > max {
        bm.reset_bits();
        return;
    }
    let column = match block.column(field) {
        Some(column) => column,
        None => {
            bm.reset_bits();
            return;
        }
    };
    match &column.data {
        ColumnData::Ipv4(vs) => {
            if u64::from(max) < column.min_value || u64::from(min) > column.max_value {
                bm.reset_bits();
                return;
            }
            bm.for_each_set_bit(|i| min <= vs[i] && vs[i] <= max);
        }
        // Other typed canonical forms never look like dotted quads.
        ColumnData::Uint8(_)
        | ColumnData::Uint16(_)
        | ColumnData::Uint32(_)
        | ColumnData::Uint64(_)
        | ColumnData::Int64(_)
        | ColumnData::Float64(_)
        | ColumnData::TimestampIso8601(_) => bm.reset_bits(),
        _ => apply_string_match(block, bm, field, |s| matchers::match_ipv4_range(s, min, max)),
    }
}

/// Inclusive range over value lengths in chars.
pub(crate) fn apply_len_range(block: &Block, bm: &mut Bitmap, field: &str, min: u64, max: u64) {
    if min > max {
        bm.reset_bits();
        return;
    }
    let column = match block.column(field) {
        Some(column) => column,
        None => {
            // The implicit empty string has length zero.
            if min > 0 {
                bm.reset_bits();
            }
            return;
        }
    };
    match &column.data {
        // Every timestamp renders at the fixed canonical width.
        ColumnData::TimestampIso8601(_) => {
            let width = crate::data::encoding::TIMESTAMP_ISO8601_LEN as u64;
            if min > width || max < width {
                bm.reset_bits();
            }
        }
        ColumnData::Ipv4(_) => {
            if max < 7 || min > 15 {
                bm.reset_bits();
                return;
            }
            apply_len_match(block, bm, field, min, max);
        }
        ColumnData::Uint8(_)
        | ColumnData::Uint16(_)
        | ColumnData::Uint32(_)
        | ColumnData::Uint64(_) => {
            if max < decimal_len(column.min_value) || min > decimal_len(column.max_value) {
                bm.reset_bits();
                return;
            }
            apply_len_match(block, bm, field, min, max);
        }
        _ => apply_len_match(block, bm, field, min, max),
    }
}

fn apply_len_match(block: &Block, bm: &mut Bitmap, field: &str, min: u64, max: u64) {
    apply_string_match(block, bm, field, |s| matchers::match_len_range(s, min, max));
}

fn decimal_len(n: u64) -> u64 {
    n.checked_ilog10().map_or(1, |d| u64::from(d) + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::BlockBuilder;

    fn uint_block() -> Block {
        let values = ["5", "10", "100", "200", "1000", "1", "2", "3", "4"];
        BlockBuilder::new().column("n", &values).build().unwrap()
    }

    #[test]
    fn test_range_on_uint_column() {
        let block = uint_block();
        let mut bm = Bitmap::all_set(block.row_count());
        apply_range(&block, &mut bm, "n", 3.0, 100.0);
        assert_eq!(bm.indices(), vec![0, 1, 2, 7, 8]);
    }

    #[test]
    fn test_range_fractional_bounds_tighten() {
        let block = uint_block();
        let mut bm = Bitmap::all_set(block.row_count());
        // 0.1..2.9 only contains the integers 1 and 2.
        apply_range(&block, &mut bm, "n", 0.1, 2.9);
        assert_eq!(bm.indices(), vec![5, 6]);
    }

    #[test]
    fn test_range_out_of_column_bounds() {
        let block = uint_block();
        let mut bm = Bitmap::all_set(block.row_count());
        apply_range(&block, &mut bm, "n", 5000.0, 9000.0);
        assert!(bm.is_zero());

        let mut bm = Bitmap::all_set(block.row_count());
        apply_range(&block, &mut bm, "n", -5.0, -1.0);
        assert!(bm.is_zero());
    }

    #[test]
    fn test_range_on_int64_column() {
        let values = ["-10", "-5", "0", "5", "10", "1", "2", "3", "-65536"];
        let block = BlockBuilder::new().column("n", &values).build().unwrap();
        assert_eq!(
            block.column("n").unwrap().value_type(),
            crate::data::ValueType::Int64
        );

        let mut bm = Bitmap::all_set(block.row_count());
        apply_range(&block, &mut bm, "n", -5.0, 3.0);
        assert_eq!(bm.indices(), vec![1, 2, 5, 6, 7]);

        // Ranges entirely outside the column's bounds reject wholesale.
        let mut bm = Bitmap::all_set(block.row_count());
        apply_range(&block, &mut bm, "n", 100.0, 200.0);
        assert!(bm.is_zero());

        let mut bm = Bitmap::all_set(block.row_count());
        apply_range(&block, &mut bm, "n", -1e9, -70000.0);
        assert!(bm.is_zero());
    }

    #[test]
    fn test_range_inverted_bounds_match_nothing() {
        let block = uint_block();
        let mut bm = Bitmap::all_set(block.row_count());
        apply_range(&block, &mut bm, "n", 10.0, 3.0);
        assert!(bm.is_zero());
    }

    #[test]
    fn test_range_on_string_column_parses_values() {
        let block = BlockBuilder::new()
            .column("v", &["1.5", "abc", "2.5", "-1"])
            .build()
            .unwrap();
        let mut bm = Bitmap::all_set(block.row_count());
        apply_range(&block, &mut bm, "v", -2.0, 2.0);
        assert_eq!(bm.indices(), vec![0, 3]);
    }

    #[test]
    fn test_range_never_matches_ipv4_or_timestamp_columns() {
        let ips = [
            "1.2.3.1", "1.2.3.2", "1.2.3.3", "1.2.3.4", "1.2.3.5", "1.2.3.6", "1.2.3.7",
            "1.2.3.8", "1.2.3.9",
        ];
        let block = BlockBuilder::new().column("ip", &ips).build().unwrap();
        let mut bm = Bitmap::all_set(block.row_count());
        apply_range(&block, &mut bm, "ip", f64::NEG_INFINITY, f64::INFINITY);
        assert!(bm.is_zero());
    }

    #[test]
    fn test_string_range_half_open() {
        let block = BlockBuilder::new()
            .column("v", &["alpha", "beta", "carol", "delta"])
            .build()
            .unwrap();
        let mut bm = Bitmap::all_set(block.row_count());
        apply_string_range(&block, &mut bm, "v", "beta", "delta");
        assert_eq!(bm.indices(), vec![1, 2]);

        let mut bm = Bitmap::all_set(block.row_count());
        apply_string_range(&block, &mut bm, "v", "x", "a");
        assert!(bm.is_zero());
    }

    #[test]
    fn test_ipv4_range_native() {
        let ips = [
            "10.0.0.1", "10.0.0.2", "10.0.0.3", "10.0.0.4", "10.0.0.5", "10.0.0.6", "10.0.0.7",
            "10.0.0.8", "10.0.0.9",
        ];
        let block = BlockBuilder::new().column("ip", &ips).build().unwrap();
        let mut bm = Bitmap::all_set(block.row_count());
        apply_ipv4_range(&block, &mut bm, "ip", 0x0a000002, 0x0a000004);
        assert_eq!(bm.indices(), vec![1, 2, 3]);
    }

    #[test]
    fn test_ipv4_range_on_uint_column_matches_nothing() {
        let block = uint_block();
        let mut bm = Bitmap::all_set(block.row_count());
        apply_ipv4_range(&block, &mut bm, "n", 0, u32::MAX);
        assert!(bm.is_zero());
    }

    #[test]
    fn test_len_range_timestamp_width() {
        let timestamps: Vec<String> = (1..=9)
            .map(|i| format!("2006-01-02T15:04:05.00{i}Z"))
            .collect();
        let refs: Vec<&str> = timestamps.iter().map(|s| s.as_str()).collect();
        let block = BlockBuilder::new().column("ts", &refs).build().unwrap();

        let mut bm = Bitmap::all_set(block.row_count());
        apply_len_range(&block, &mut bm, "ts", 24, 24);
        assert_eq!(bm.count(), block.row_count());

        let mut bm = Bitmap::all_set(block.row_count());
        apply_len_range(&block, &mut bm, "ts", 0, 23);
        assert!(bm.is_zero());
    }

    #[test]
    fn test_len_range_counts_chars_not_bytes() {
        let block = BlockBuilder::new()
            .column("v", &["ФЫВА", "ab", "abcd"])
            .build()
            .unwrap();
        let mut bm = Bitmap::all_set(block.row_count());
        apply_len_range(&block, &mut bm, "v", 4, 4);
        assert_eq!(bm.indices(), vec![0, 2]);
    }

    #[test]
    fn test_len_range_absent_field() {
        let block = BlockBuilder::new().column("v", &["a"]).build().unwrap();
        let mut bm = Bitmap::all_set(1);
        apply_len_range(&block, &mut bm, "missing", 0, 5);
        assert_eq!(bm.count(), 1);

        let mut bm = Bitmap::all_set(1);
        apply_len_range(&block, &mut bm, "missing", 1, 5);
        assert!(bm.is_zero());
    }
}
