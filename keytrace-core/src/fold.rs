//! Reconstruction of text from an event log
//!
//! [`fold`] is pure: it starts from the empty string and applies a prefix
//! of the log in order. Corrupted entries do not fail the fold. A span that
//! runs past the accumulated text is clamped to what is available, so
//! playback can continue past a damaged record at the cost of a garbled
//! result. [`apply`] reports when that happened.

use crate::text;
use crate::types::{Action, KeystrokeEvent};

/// How an event landed on the text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The event fit the text exactly as recorded
    Clean,
    /// The span exceeded the text and was clamped
    Clamped,
}

impl Applied {
    pub fn is_clamped(&self) -> bool {
        matches!(self, Applied::Clamped)
    }
}

/// Apply a single event to `text` in place.
pub fn apply(text: &mut String, event: &KeystrokeEvent) -> Applied {
    let len = text::char_len(text);

    match event.action {
        Action::Insert => {
            let at = text::byte_offset(text, event.position);
            text.insert_str(at, &event.content);
            if event.position > len {
                Applied::Clamped
            } else {
                Applied::Clean
            }
        }
        Action::Delete | Action::DeleteWord => {
            let start = text::byte_offset(text, event.position);
            let end = text::byte_offset(text, event.end());
            text.replace_range(start..end, "");
            if event.end() > len {
                Applied::Clamped
            } else {
                Applied::Clean
            }
        }
    }
}

/// Text after applying `events[..upto]` to the empty string.
///
/// `upto` is clamped to `events.len()`.
pub fn fold(events: &[KeystrokeEvent], upto: usize) -> String {
    let upto = upto.min(events.len());
    let mut text = String::new();
    for event in &events[..upto] {
        apply(&mut text, event);
    }
    text
}

/// Text after applying the whole log.
pub fn fold_all(events: &[KeystrokeEvent]) -> String {
    fold(events, events.len())
}
