//! Timestamp leaf filters, evaluated against the block's per-row
//! timestamps rather than a named column.

use chrono::{DateTime, Datelike, Weekday};

use crate::data::Block;
use crate::filter::bitmap::Bitmap;

/// Keeps rows whose timestamp is within `min..=max` nanoseconds.
pub(crate) fn apply_time_range(block: &Block, bm: &mut Bitmap, min: i64, max: i64) {
    if min > max {
        bm.reset_bits();
        return;
    }
    let timestamps = block.timestamps();
    bm.for_each_set_bit(|i| {
        let ts = timestamps[i];
        min <= ts && ts <= max
    });
}

/// Keeps rows whose timestamp, shifted by `offset` nanoseconds, falls on a
/// day of week within `start_day..=end_day` (UTC). When `start_day` is
/// after `end_day` the range wraps around the week, so Saturday..Sunday
/// means the weekend.
pub(crate) fn apply_week_range(
    block: &Block,
    bm: &mut Bitmap,
    start_day: Weekday,
    end_day: Weekday,
    offset: i64,
) {
    let start = start_day.num_days_from_sunday();
    let end = end_day.num_days_from_sunday();
    let timestamps = block.timestamps();
    bm.for_each_set_bit(|i| {
        let ts = timestamps[i].saturating_add(offset);
        let day = DateTime::from_timestamp_nanos(ts).weekday().num_days_from_sunday();
        if start <= end {
            start <= day && day <= end
        } else {
            day >= start || day <= end
        }
    });
}
