//! Shared leaf evaluation skeleton
//!
//! Every string-based leaf filter reduces to "clear the rows whose value
//! fails a predicate". The skeleton here picks the cheapest way to do that
//! for each column encoding.

use crate::data::block::{Block, ColumnData};
use crate::filter::bitmap::Bitmap;

/// Applies a string predicate to one field of the block.
///
/// An absent field behaves as a column of empty strings, so the predicate
/// runs once against `""` and either keeps or clears the whole bitmap.
/// Const columns also need a single predicate call. Dict columns evaluate
/// the predicate once per distinct value and then test per-row indexes.
/// Everything else decodes each candidate row to its canonical string.
pub(crate) fn apply_string_match(
    block: &Block,
    bm: &mut Bitmap,
    field: &str,
    matches: impl Fn(&str) -> bool,
) {
    let column = match block.column(field) {
        Some(column) => column,
        None => {
            if !matches("") {
                bm.reset_bits();
            }
            return;
        }
    };
    match &column.data {
        ColumnData::Const(value) => {
            if !matches(value) {
                bm.reset_bits();
            }
        }
        ColumnData::Dict { values, indexes } => apply_dict_match(bm, values, indexes, matches),
        _ => {
            let mut scratch = String::new();
            bm.for_each_set_bit(|i| matches(column.value(i, &mut scratch)));
        }
    }
}

/// Dict columns hold at most 8 distinct values, so a byte of match flags
/// covers the whole dictionary.
fn apply_dict_match(
    bm: &mut Bitmap,
    values: &[String],
    indexes: &[u8],
    matches: impl Fn(&str) -> bool,
) {
    let mut flags: u8 = 0;
    for (i, value) in values.iter().enumerate() {
        if matches(value) {
            flags |= 1 << i;
        }
    }
    if flags == 0 {
        bm.reset_bits();
        return;
    }
    bm.for_each_set_bit(|i| {
        let idx = indexes[i] as usize;
        assert!(idx < values.len(), "dict index {idx} out of range");
        flags & (1 << idx) != 0
    });
}
