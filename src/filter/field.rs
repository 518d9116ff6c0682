//! Cross-field leaf filters and the value-type filter.

use crate::data::block::{infer_scalar_type, Block, Column, ColumnData};
use crate::filter::bitmap::Bitmap;

/// The value shared by every row, when the column has one. Absent columns
/// are all empty strings.
fn row_invariant_value(column: Option<&Column>) -> Option<&str> {
    match column {
        None => Some(""),
        Some(column) => match &column.data {
            ColumnData::Const(value) => Some(value),
            _ => None,
        },
    }
}

/// Keeps rows where `field` and `other_field` hold the same value.
pub(crate) fn apply_eq_field(block: &Block, bm: &mut Bitmap, field: &str, other_field: &str) {
    if field == other_field {
        return;
    }
    let a = block.column(field);
    let b = block.column(other_field);
    if let (Some(va), Some(vb)) = (row_invariant_value(a), row_invariant_value(b)) {
        if va != vb {
            bm.reset_bits();
        }
        return;
    }
    let mut sa = String::new();
    let mut sb = String::new();
    bm.for_each_set_bit(|i| {
        let va = match a {
            Some(column) => column.value(i, &mut sa),
            None => "",
        };
        let vb = match b {
            Some(column) => column.value(i, &mut sb),
            None => "",
        };
        va == vb
    });
}

/// Keeps rows where `field` is `<=` `other_field` (or strictly `<` with
/// `exclude_equal`). Values compare as canonical strings.
pub(crate) fn apply_le_field(
    block: &Block,
    bm: &mut Bitmap,
    field: &str,
    other_field: &str,
    exclude_equal: bool,
) {
    if field == other_field {
        if exclude_equal {
            bm.reset_bits();
        }
        return;
    }
    let a = block.column(field);
    let b = block.column(other_field);
    let mut sa = String::new();
    let mut sb = String::new();
    bm.for_each_set_bit(|i| {
        let va = match a {
            Some(column) => column.value(i, &mut sa),
            None => "",
        };
        let vb = match b {
            Some(column) => column.value(i, &mut sb),
            None => "",
        };
        if exclude_equal {
            va < vb
        } else {
            va <= vb
        }
    });
}

/// Keeps all rows when the column's physical encoding carries `type_name`,
/// clears all rows otherwise. A const column reports the type its single
/// value would encode to on its own. Absent fields never match.
pub(crate) fn apply_value_type(block: &Block, bm: &mut Bitmap, field: &str, type_name: &str) {
    let column = match block.column(field) {
        Some(column) => column,
        None => {
            bm.reset_bits();
            return;
        }
    };
    let name = match &column.data {
        ColumnData::Const(value) => infer_scalar_type(value).type_name(),
        _ => column.value_type().type_name(),
    };
    if name != type_name {
        bm.reset_bits();
    }
}
