//! Character-offset helpers
//!
//! Every position in keytrace counts Unicode scalar values. These helpers
//! convert between character offsets and the byte offsets `String` needs,
//! clamping instead of panicking when an offset runs past the end.

/// Number of characters in `s`
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte offset of character `idx`, clamped to `s.len()`
pub fn byte_offset(s: &str, idx: usize) -> usize {
    s.char_indices().nth(idx).map(|(b, _)| b).unwrap_or(s.len())
}

/// Characters `[start, end)` of `s`, clamped to the available text
pub fn char_slice(s: &str, start: usize, end: usize) -> &str {
    let end = end.max(start);
    let from = byte_offset(s, start);
    let to = byte_offset(s, end);
    &s[from..to]
}

/// Word and character counts of a piece of text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextStats {
    /// Whitespace-separated words
    pub words: usize,
    /// Characters
    pub chars: usize,
}

impl TextStats {
    pub fn of(text: &str) -> Self {
        Self {
            words: text.split_whitespace().count(),
            chars: char_len(text),
        }
    }
}
