//! Primitive string matchers
//!
//! Pure predicates shared by the leaf filters. All of them operate on the
//! canonical string form of a value; the token-boundary rules live here.

use crate::data::encoding::{try_parse_float64, try_parse_ipv4};

/// Token characters are Unicode letters, digits and `_`. A phrase only
/// matches where it is not glued to surrounding token characters.
pub(crate) fn is_token_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Byte offset of the first occurrence of `phrase` in `s` that respects
/// token boundaries on both sides.
pub(crate) fn phrase_pos(s: &str, phrase: &str) -> Option<usize> {
    if phrase.is_empty() {
        return Some(0);
    }
    if phrase.len() > s.len() {
        return None;
    }
    let starts_with_token = phrase.chars().next().is_some_and(is_token_char);
    let ends_with_token = phrase.chars().next_back().is_some_and(is_token_char);
    let mut pos = 0;
    loop {
        let n = s[pos..].find(phrase)?;
        pos += n;
        let end = pos + phrase.len();
        let bounded_left = !starts_with_token
            || pos == 0
            || !s[..pos].chars().next_back().is_some_and(is_token_char);
        let bounded_right = !ends_with_token
            || end == s.len()
            || !s[end..].chars().next().is_some_and(is_token_char);
        if bounded_left && bounded_right {
            return Some(pos);
        }
        // A rejected position starts on a char boundary, so skipping one
        // char keeps the slice valid.
        pos += s[pos..].chars().next().map_or(1, char::len_utf8);
        if pos + phrase.len() > s.len() {
            return None;
        }
    }
}

/// Whether `s` contains `phrase` as a token-bounded substring. The empty
/// phrase only matches the empty string.
pub(crate) fn match_phrase(s: &str, phrase: &str) -> bool {
    if phrase.is_empty() {
        return s.is_empty();
    }
    phrase_pos(s, phrase).is_some()
}

/// Whether `s` contains a token starting with `prefix`. Only the left
/// boundary is checked. The empty prefix matches any non-empty string.
pub(crate) fn match_prefix(s: &str, prefix: &str) -> bool {
    if prefix.is_empty() {
        return !s.is_empty();
    }
    if prefix.len() > s.len() {
        return false;
    }
    let starts_with_token = prefix.chars().next().is_some_and(is_token_char);
    let mut pos = 0;
    loop {
        let n = match s[pos..].find(prefix) {
            Some(n) => n,
            None => return false,
        };
        pos += n;
        if !starts_with_token
            || pos == 0
            || !s[..pos].chars().next_back().is_some_and(is_token_char)
        {
            return true;
        }
        pos += s[pos..].chars().next().map_or(1, char::len_utf8);
        if pos + prefix.len() > s.len() {
            return false;
        }
    }
}

/// Case-insensitive [`match_phrase`]. `phrase` must already be lowercase.
pub(crate) fn match_any_case_phrase(s: &str, phrase: &str) -> bool {
    match_phrase(&s.to_lowercase(), phrase)
}

/// Case-insensitive [`match_prefix`]. `prefix` must already be lowercase.
pub(crate) fn match_any_case_prefix(s: &str, prefix: &str) -> bool {
    match_prefix(&s.to_lowercase(), prefix)
}

/// Whether the whole value starts with `prefix`, with no boundary rules.
pub(crate) fn match_exact_prefix(s: &str, prefix: &str) -> bool {
    s.starts_with(prefix)
}

/// Whether all `phrases` occur in order, each token-bounded and starting
/// after the end of the previous match.
pub(crate) fn match_sequence<S: AsRef<str>>(s: &str, phrases: &[S]) -> bool {
    let mut s = s;
    for phrase in phrases {
        let phrase = phrase.as_ref();
        match phrase_pos(s, phrase) {
            Some(n) => s = &s[n + phrase.len()..],
            None => return false,
        }
    }
    true
}

/// Lexicographic half-open range: `min <= s < max`.
pub(crate) fn match_string_range(s: &str, min: &str, max: &str) -> bool {
    s >= min && s < max
}

/// Inclusive range over the value's length in chars.
pub(crate) fn match_len_range(s: &str, min: u64, max: u64) -> bool {
    let n = s.chars().count() as u64;
    min <= n && n <= max
}

/// Inclusive range over values parseable as IPv4 addresses.
pub(crate) fn match_ipv4_range(s: &str, min: u32, max: u32) -> bool {
    match try_parse_ipv4(s) {
        Some(ip) => min <= ip && ip <= max,
        None => false,
    }
}

/// Inclusive range over values parseable as floats.
pub(crate) fn match_range(s: &str, min: f64, max: f64) -> bool {
    match try_parse_float64(s) {
        Some(f) => min <= f && f <= max,
        None => false,
    }
}
