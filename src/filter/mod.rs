//! Filter evaluation engine
//!
//! A [`Filter`] is an immutable tree of leaf predicates and the And/Or/Not
//! combinators. Applying a filter to a [`Block`] narrows a [`Bitmap`] of
//! candidate rows: bits are only ever cleared, never set, so filters
//! compose by chaining `apply` calls.

pub mod bitmap;
mod field;
mod leaf;
mod matchers;
mod range;
mod text;
mod time;

pub use bitmap::Bitmap;

use chrono::Weekday;
use regex::Regex;
use tracing::{debug, trace};

use crate::data::Block;
use bitmap::ScratchBitmap;

/// Filter construction errors.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("invalid regexp {pattern:?}: {source}")]
    InvalidRegexp {
        pattern: String,
        source: regex::Error,
    },
}

/// A filter over the rows of a block.
///
/// Leaf filters inspect one field's values (or, for the time filters, the
/// block's timestamps). A missing field behaves as a column of empty
/// strings. Filters hold no mutable state and may be applied to many
/// blocks concurrently.
#[derive(Debug, Clone)]
pub enum Filter {
    /// Matches every row.
    Noop,
    /// The field's whole value equals `value`.
    Exact { field: String, value: String },
    /// The field's whole value starts with `prefix`. No token boundaries.
    ExactPrefix { field: String, prefix: String },
    /// The field contains `phrase` bounded by token edges on both sides.
    Phrase { field: String, phrase: String },
    /// Case-insensitive [`Filter::Phrase`].
    AnyCasePhrase { field: String, phrase: String },
    /// The field contains a token starting with `prefix`.
    Prefix { field: String, prefix: String },
    /// Case-insensitive [`Filter::Prefix`].
    AnyCasePrefix { field: String, prefix: String },
    /// All phrases occur in order, token-bounded, without overlap.
    Sequence { field: String, phrases: Vec<String> },
    /// Every value occurs in the field as a token-bounded phrase, in any
    /// order. Empty values are ignored, so an all-empty list matches
    /// every row.
    ContainsAll { field: String, values: Vec<String> },
    /// The field's whole value is one of `values`.
    In { field: String, values: Vec<String> },
    /// The field parses as a number within `min..=max`.
    Range { field: String, min: f64, max: f64 },
    /// The field's value is within the lexicographic half-open
    /// `min..max` range.
    StringRange {
        field: String,
        min: String,
        max: String,
    },
    /// The field parses as an IPv4 address within `min..=max`.
    Ipv4Range { field: String, min: u32, max: u32 },
    /// The field's length in chars is within `min..=max`.
    LenRange { field: String, min: u64, max: u64 },
    /// The field's value matches a compiled regular expression. Build via
    /// [`Filter::regexp`].
    Regexp { field: String, re: Regex },
    /// The field's physical encoding has the given type name.
    ValueType { field: String, type_name: String },
    /// The row's timestamp, shifted by `offset` nanoseconds, falls on a
    /// day of week within `start_day..=end_day`. Wraps across the weekend
    /// when `start_day > end_day`.
    WeekRange {
        start_day: Weekday,
        end_day: Weekday,
        offset: i64,
    },
    /// The row's timestamp is within `min..=max` nanoseconds.
    TimeRange { min: i64, max: i64 },
    /// The stream field's whole value equals `value`.
    Stream { field: String, value: String },
    /// The field's value equals another field's value, row by row.
    EqField { field: String, other_field: String },
    /// The field's value is `<=` another field's value, row by row.
    /// `exclude_equal` tightens the comparison to `<`.
    LeField {
        field: String,
        other_field: String,
        exclude_equal: bool,
    },
    /// All children match.
    And(Vec<Filter>),
    /// At least one child matches.
    Or(Vec<Filter>),
    /// The child does not match.
    Not(Box<Filter>),
}

impl Filter {
    /// Builds a regexp filter, compiling `pattern` once up front.
    pub fn regexp(field: impl Into<String>, pattern: &str) -> Result<Self, FilterError> {
        let re = Regex::new(pattern).map_err(|source| FilterError::InvalidRegexp {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Filter::Regexp {
            field: field.into(),
            re,
        })
    }

    /// Clears every bit of `bm` whose row does not match this filter.
    ///
    /// `bm` must cover exactly the block's rows. Rows already cleared are
    /// never re-set and (except for cheap whole-column checks) never
    /// inspected.
    pub fn apply(&self, block: &Block, bm: &mut Bitmap) {
        assert_eq!(
            bm.len(),
            block.row_count(),
            "bitmap does not cover the block"
        );
        match self {
            Filter::Noop => {}
            Filter::Exact { field, value } => text::apply_exact(block, bm, field, value),
            Filter::ExactPrefix { field, prefix } => {
                text::apply_exact_prefix(block, bm, field, prefix)
            }
            Filter::Phrase { field, phrase } => text::apply_phrase(block, bm, field, phrase),
            Filter::AnyCasePhrase { field, phrase } => {
                text::apply_any_case_phrase(block, bm, field, phrase)
            }
            Filter::Prefix { field, prefix } => text::apply_prefix(block, bm, field, prefix),
            Filter::AnyCasePrefix { field, prefix } => {
                text::apply_any_case_prefix(block, bm, field, prefix)
            }
            Filter::Sequence { field, phrases } => {
                text::apply_sequence(block, bm, field, phrases)
            }
            Filter::ContainsAll { field, values } => {
                text::apply_contains_all(block, bm, field, values)
            }
            Filter::In { field, values } => text::apply_in(block, bm, field, values),
            Filter::Range { field, min, max } => range::apply_range(block, bm, field, *min, *max),
            Filter::StringRange { field, min, max } => {
                range::apply_string_range(block, bm, field, min, max)
            }
            Filter::Ipv4Range { field, min, max } => {
                range::apply_ipv4_range(block, bm, field, *min, *max)
            }
            Filter::LenRange { field, min, max } => {
                range::apply_len_range(block, bm, field, *min, *max)
            }
            Filter::Regexp { field, re } => text::apply_regexp(block, bm, field, re),
            Filter::ValueType { field, type_name } => {
                field::apply_value_type(block, bm, field, type_name)
            }
            Filter::WeekRange {
                start_day,
                end_day,
                offset,
            } => time::apply_week_range(block, bm, *start_day, *end_day, *offset),
            Filter::TimeRange { min, max } => time::apply_time_range(block, bm, *min, *max),
            Filter::Stream { field, value } => text::apply_exact(block, bm, field, value),
            Filter::EqField { field, other_field } => {
                field::apply_eq_field(block, bm, field, other_field)
            }
            Filter::LeField {
                field,
                other_field,
                exclude_equal,
            } => field::apply_le_field(block, bm, field, other_field, *exclude_equal),
            Filter::And(children) => apply_and(children, block, bm),
            Filter::Or(children) => apply_or(children, block, bm),
            Filter::Not(child) => apply_not(child, block, bm),
        }
    }
}

fn apply_and(children: &[Filter], block: &Block, bm: &mut Bitmap) {
    for (i, child) in children.iter().enumerate() {
        child.apply(block, bm);
        if bm.is_zero() {
            debug!(
                child = i,
                total = children.len(),
                "and filter short-circuited"
            );
            return;
        }
    }
}

/// Each child only sees the rows the caller still wants and no earlier
/// sibling has already matched. The result is the plain union of the
/// children's matches within the entry bitmap.
fn apply_or(children: &[Filter], block: &Block, bm: &mut Bitmap) {
    let rows = bm.len();
    let mut result = ScratchBitmap::get(rows);
    let mut tmp = ScratchBitmap::get(rows);
    for child in children {
        tmp.copy_from(bm);
        tmp.and_not(&result);
        if tmp.is_zero() {
            trace!("or filter already covers all candidate rows");
            break;
        }
        child.apply(block, &mut tmp);
        result.or(&tmp);
    }
    bm.copy_from(&result);
}

fn apply_not(child: &Filter, block: &Block, bm: &mut Bitmap) {
    let mut tmp = ScratchBitmap::get(bm.len());
    tmp.copy_from(bm);
    child.apply(block, &mut tmp);
    bm.and_not(&tmp);
}
