//! Diff encoder: raw text observations to keystroke events
//!
//! The writing surface reports `(previous, new, cursor)` every time its text
//! changes. Under the single-contiguous-edit assumption the length change
//! and the cursor alone identify the edit:
//!
//! - text grew by `n`: the `n` characters ending at the cursor were inserted
//! - text shrank by `n`: `n` characters starting at the cursor were removed,
//!   and the removed characters are read from the previous text
//! - same length: nothing is emitted
//!
//! [`EncodeStrategy::Trim`] drops the cursor hint and diffs by common
//! prefix and suffix instead, which also captures same-length replacements.

use serde::Deserialize;

use crate::text::{char_len, char_slice};
use crate::types::KeystrokeEvent;

/// How text observations are turned into events
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodeStrategy {
    /// Length delta anchored at the cursor; at most one event
    #[default]
    Cursor,
    /// Common prefix/suffix trim; a delete and/or an insert
    Trim,
}

/// Encode one observation with the cursor-anchored algorithm.
///
/// `cursor` is the caret position after the change, in characters. It is
/// clamped into the range that keeps every slice inside the text.
pub fn encode(previous: &str, new: &str, cursor: usize, now: i64) -> Option<KeystrokeEvent> {
    let prev_len = char_len(previous);
    let new_len = char_len(new);
    let cursor = cursor.min(new_len);

    if new_len > prev_len {
        let delta = new_len - prev_len;
        let end = cursor.max(delta);
        let start = end - delta;
        Some(KeystrokeEvent::insert(now, start, char_slice(new, start, end)))
    } else if new_len < prev_len {
        let delta = prev_len - new_len;
        Some(KeystrokeEvent::delete(
            now,
            cursor,
            char_slice(previous, cursor, cursor + delta),
        ))
    } else {
        None
    }
}

/// Encode one observation by trimming the common prefix and suffix.
///
/// Returns the removal (if any) followed by the insertion (if any), both
/// stamped `now`.
pub fn encode_trimmed(previous: &str, new: &str, now: i64) -> Vec<KeystrokeEvent> {
    let old: Vec<char> = previous.chars().collect();
    let new_chars: Vec<char> = new.chars().collect();

    let prefix = old
        .iter()
        .zip(&new_chars)
        .take_while(|(a, b)| a == b)
        .count();
    let max_suffix = old.len().min(new_chars.len()) - prefix;
    let suffix = old
        .iter()
        .rev()
        .zip(new_chars.iter().rev())
        .take(max_suffix)
        .take_while(|(a, b)| a == b)
        .count();

    let removed: String = old[prefix..old.len() - suffix].iter().collect();
    let inserted: String = new_chars[prefix..new_chars.len() - suffix].iter().collect();

    let mut events = Vec::with_capacity(2);
    if !removed.is_empty() {
        events.push(KeystrokeEvent::delete(now, prefix, removed));
    }
    if !inserted.is_empty() {
        events.push(KeystrokeEvent::insert(now, prefix, inserted));
    }
    events
}

/// Encode with the given strategy.
pub fn encode_with(
    strategy: EncodeStrategy,
    previous: &str,
    new: &str,
    cursor: usize,
    now: i64,
) -> Vec<KeystrokeEvent> {
    match strategy {
        EncodeStrategy::Cursor => encode(previous, new, cursor, now).into_iter().collect(),
        EncodeStrategy::Trim => encode_trimmed(previous, new, now),
    }
}
