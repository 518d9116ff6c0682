//! Text leaf filters: exact, phrase, prefix, sequence, in, regexp.

use fxhash::FxHashSet;
use regex::Regex;

use crate::data::block::{Block, Column, ColumnData};
use crate::data::encoding::try_parse_uint64;
use crate::data::value_type::ValueType;
use crate::filter::bitmap::Bitmap;
use crate::filter::leaf::apply_string_match;
use crate::filter::matchers;

/// Whether `value` could possibly equal some row of a uint column, judged
/// from the column's min/max alone. Non-uint columns always pass. Only
/// ever rejects; the per-row string compare stays authoritative.
fn uint_value_in_bounds(column: &Column, value: &str) -> bool {
    match column.value_type() {
        ValueType::Uint8 | ValueType::Uint16 | ValueType::Uint32 | ValueType::Uint64 => {
            match try_parse_uint64(value) {
                Some(n) => column.min_value <= n && n <= column.max_value,
                None => false,
            }
        }
        _ => true,
    }
}

pub(crate) fn apply_exact(block: &Block, bm: &mut Bitmap, field: &str, value: &str) {
    if let Some(column) = block.column(field) {
        if !uint_value_in_bounds(column, value) {
            bm.reset_bits();
            return;
        }
    }
    apply_string_match(block, bm, field, |s| s == value);
}

pub(crate) fn apply_exact_prefix(block: &Block, bm: &mut Bitmap, field: &str, prefix: &str) {
    apply_string_match(block, bm, field, |s| matchers::match_exact_prefix(s, prefix));
}

pub(crate) fn apply_phrase(block: &Block, bm: &mut Bitmap, field: &str, phrase: &str) {
    apply_string_match(block, bm, field, |s| matchers::match_phrase(s, phrase));
}

pub(crate) fn apply_any_case_phrase(block: &Block, bm: &mut Bitmap, field: &str, phrase: &str) {
    let phrase = phrase.to_lowercase();
    apply_string_match(block, bm, field, |s| {
        matchers::match_any_case_phrase(s, &phrase)
    });
}

pub(crate) fn apply_prefix(block: &Block, bm: &mut Bitmap, field: &str, prefix: &str) {
    apply_string_match(block, bm, field, |s| matchers::match_prefix(s, prefix));
}

pub(crate) fn apply_any_case_prefix(block: &Block, bm: &mut Bitmap, field: &str, prefix: &str) {
    let prefix = prefix.to_lowercase();
    apply_string_match(block, bm, field, |s| {
        matchers::match_any_case_prefix(s, &prefix)
    });
}

pub(crate) fn apply_sequence(block: &Block, bm: &mut Bitmap, field: &str, phrases: &[String]) {
    // Empty phrases match everywhere and only waste scan time.
    let phrases: Vec<&str> = phrases
        .iter()
        .map(String::as_str)
        .filter(|p| !p.is_empty())
        .collect();
    if phrases.is_empty() {
        return;
    }
    apply_string_match(block, bm, field, |s| matchers::match_sequence(s, &phrases));
}

pub(crate) fn apply_contains_all(block: &Block, bm: &mut Bitmap, field: &str, values: &[String]) {
    // Empty values match everywhere, so only the rest constrain rows.
    let phrases: Vec<&str> = values
        .iter()
        .map(String::as_str)
        .filter(|v| !v.is_empty())
        .collect();
    if phrases.is_empty() {
        return;
    }
    apply_string_match(block, bm, field, |s| {
        phrases.iter().all(|p| matchers::match_phrase(s, p))
    });
}

pub(crate) fn apply_in(block: &Block, bm: &mut Bitmap, field: &str, values: &[String]) {
    if values.is_empty() {
        bm.reset_bits();
        return;
    }
    if let Some(column) = block.column(field) {
        // Uint columns: membership by parsed value, skipping the per-row
        // decode entirely.
        let is_uint = matches!(
            column.value_type(),
            ValueType::Uint8 | ValueType::Uint16 | ValueType::Uint32 | ValueType::Uint64
        );
        if is_uint {
            let set: FxHashSet<u64> = values
                .iter()
                .filter_map(|v| try_parse_uint64(v))
                .filter(|&n| column.min_value <= n && n <= column.max_value)
                .collect();
            if set.is_empty() {
                bm.reset_bits();
                return;
            }
            match &column.data {
                ColumnData::Uint8(vs) => {
                    bm.for_each_set_bit(|i| set.contains(&u64::from(vs[i])))
                }
                ColumnData::Uint16(vs) => {
                    bm.for_each_set_bit(|i| set.contains(&u64::from(vs[i])))
                }
                ColumnData::Uint32(vs) => {
                    bm.for_each_set_bit(|i| set.contains(&u64::from(vs[i])))
                }
                ColumnData::Uint64(vs) => bm.for_each_set_bit(|i| set.contains(&vs[i])),
                _ => unreachable!("value_type and data disagree"),
            }
            return;
        }
    }
    let set: FxHashSet<&str> = values.iter().map(String::as_str).collect();
    apply_string_match(block, bm, field, |s| set.contains(s));
}

pub(crate) fn apply_regexp(block: &Block, bm: &mut Bitmap, field: &str, re: &Regex) {
    apply_string_match(block, bm, field, |s| re.is_match(s));
}
