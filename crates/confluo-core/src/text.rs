//! Character/byte column helpers
//!
//! Columns travelling through the engine are 1-based character columns;
//! `regex` reports byte offsets and the render boundary wants byte columns.

use unicode_width::UnicodeWidthStr;

pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Character count of `s[..byte_offset]`
pub fn byte_to_char(s: &str, byte_offset: usize) -> usize {
    s.get(..byte_offset).map_or_else(|| char_len(s), char_len)
}

fn char_to_byte(s: &str, char_offset: usize) -> usize {
    s.char_indices()
        .nth(char_offset)
        .map_or(s.len(), |(idx, _)| idx)
}

/// `s[start..end]` in characters, clamped to the string like a slice in a
/// dynamic language would be
pub fn char_slice(s: &str, start: usize, end: Option<usize>) -> &str {
    let start_byte = char_to_byte(s, start);
    let end_byte = end.map_or(s.len(), |end| char_to_byte(s, end));
    if end_byte <= start_byte {
        return "";
    }
    &s[start_byte..end_byte]
}

/// Text of `typed` from a 1-based column to the end
pub fn from_column(typed: &str, ccol: usize) -> &str {
    char_slice(typed, ccol.saturating_sub(1), None)
}

/// Byte-based column for a character column of `typed`
pub fn byte_column(typed: &str, ccol: usize) -> usize {
    char_slice(typed, 0, Some(ccol.saturating_sub(1))).len() + 1
}

pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}
