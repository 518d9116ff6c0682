//! Value-type codecs
//!
//! Pure translation between physically-encoded values and their canonical
//! string form. Phrase, prefix and range matchers all operate on canonical
//! strings, so the formatters here must produce exactly the representation
//! the parsers accept: decimal without leading zeros, dotted-quad without
//! zero-padded octets, and millisecond-precision UTC timestamps with a
//! trailing `Z`.

use std::fmt::Write;

use chrono::{DateTime, NaiveDate, Utc};

/// Maximum decimal length of a u64, including `_` digit separators.
const MAX_UINT64_STR_LEN: usize = "18_446_744_073_709_551_615".len();

/// Parses a decimal unsigned integer. Accepts `_` digit separators.
pub fn try_parse_uint64(s: &str) -> Option<u64> {
    if s.is_empty() || s.len() > MAX_UINT64_STR_LEN {
        return None;
    }
    let mut n: u64 = 0;
    for ch in s.bytes() {
        if ch == b'_' {
            continue;
        }
        if !ch.is_ascii_digit() {
            return None;
        }
        n = n.checked_mul(10)?.checked_add(u64::from(ch - b'0'))?;
    }
    Some(n)
}

/// Parses a decimal signed integer with an optional leading `-`.
pub fn try_parse_int64(s: &str) -> Option<i64> {
    match s.strip_prefix('-') {
        Some(rest) => {
            let n = try_parse_uint64(rest)?;
            if n > (1 << 63) {
                return None;
            }
            Some((n as i64).wrapping_neg())
        }
        None => {
            let n = try_parse_uint64(s)?;
            i64::try_from(n).ok()
        }
    }
}

/// Parses a float in plain decimal notation.
///
/// Scientific notation, a leading `+` and bare leading/trailing dots are
/// rejected, since those forms cannot be converted back to the same string.
pub fn try_parse_float64(s: &str) -> Option<f64> {
    if s.is_empty() || s.len() > 20 {
        return None;
    }
    let (minus, s) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let f = match s.find('.') {
        None => try_parse_uint64(s)? as f64,
        Some(n) => {
            if n == 0 || n == s.len() - 1 {
                return None;
            }
            let int_part = &s[..n];
            let frac_part = &s[n + 1..];
            let n_int = try_parse_uint64(int_part)?;
            let n_frac = try_parse_uint64(frac_part)?;
            let separators = frac_part.matches('_').count() as i32;
            let p10 = 10f64.powi(separators - frac_part.len() as i32);
            (n_frac as f64).mul_add(p10, n_int as f64)
        }
    };
    Some(if minus { -f } else { f })
}

/// Parses a dotted-quad IPv4 address into a big-endian 32-bit word.
pub fn try_parse_ipv4(s: &str) -> Option<u32> {
    if s.len() < "1.1.1.1".len() || s.len() > "255.255.255.255".len() {
        return None;
    }
    let mut octets = [0u8; 4];
    let mut parts = s.split('.');
    for octet in octets.iter_mut() {
        let part = parts.next()?;
        if part.is_empty() || part.len() > 3 {
            return None;
        }
        let v = try_parse_uint64(part)?;
        if v > 255 {
            return None;
        }
        *octet = v as u8;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(u32::from_be_bytes(octets))
}

/// Canonical timestamp width: `YYYY-MM-DDTHH:MM:SS.mmmZ`.
pub const TIMESTAMP_ISO8601_LEN: usize = "2006-01-02T15:04:05.000Z".len();

/// Parses a `YYYY-MM-DDTHH:MM:SS.mmmZ` timestamp into unix nanoseconds.
///
/// Only the exact canonical width is accepted. Timestamps with a timezone
/// offset or a different fractional precision cannot be converted back to
/// the same string representation, so they are treated as non-timestamps.
/// A space is allowed instead of `T` so SQL datetime strings parse too.
/// Years are restricted to 1677..=2262 so nanoseconds fit in an i64.
pub fn try_parse_timestamp_iso8601(s: &str) -> Option<i64> {
    let b = s.as_bytes();
    if b.len() != TIMESTAMP_ISO8601_LEN {
        return None;
    }
    if b[4] != b'-'
        || b[7] != b'-'
        || (b[10] != b'T' && b[10] != b' ')
        || b[13] != b':'
        || b[16] != b':'
        || b[19] != b'.'
        || b[23] != b'Z'
    {
        return None;
    }
    let year = try_parse_uint64(&s[..4])?;
    if !(1677..=2262).contains(&year) {
        return None;
    }
    let month = try_parse_uint64(&s[5..7])?;
    let day = try_parse_uint64(&s[8..10])?;
    let hour = try_parse_uint64(&s[11..13])?;
    let minute = try_parse_uint64(&s[14..16])?;
    let second = try_parse_uint64(&s[17..19])?;
    let millis = try_parse_uint64(&s[20..23])?;

    let date = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)?;
    let time = date.and_hms_milli_opt(hour as u32, minute as u32, second as u32, millis as u32)?;
    time.and_utc().timestamp_nanos_opt()
}

/// Appends the canonical decimal form of an unsigned integer.
pub fn push_uint64(buf: &mut String, n: u64) {
    write!(buf, "{n}").expect("writing to a String cannot fail");
}

/// Appends the canonical decimal form of a signed integer.
pub fn push_int64(buf: &mut String, n: i64) {
    write!(buf, "{n}").expect("writing to a String cannot fail");
}

/// Appends the shortest round-trippable decimal form of a float.
pub fn push_float64(buf: &mut String, f: f64) {
    write!(buf, "{f}").expect("writing to a String cannot fail");
}

/// Appends the canonical dotted-quad form of an IPv4 word.
pub fn push_ipv4(buf: &mut String, n: u32) {
    let [a, b, c, d] = n.to_be_bytes();
    write!(buf, "{a}.{b}.{c}.{d}").expect("writing to a String cannot fail");
}

/// Appends the canonical `YYYY-MM-DDTHH:MM:SS.mmmZ` form of a nanosecond
/// timestamp.
pub fn push_timestamp_iso8601(buf: &mut String, nsecs: i64) {
    let dt: DateTime<Utc> = DateTime::from_timestamp_nanos(nsecs);
    write!(buf, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.3fZ")).expect("writing to a String cannot fail");
}
