//! Core domain types for keytrace
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Event** | One insert or delete captured from the writing surface |
//! | **Log** | The ordered, append-only sequence of events for one piece of text |
//! | **Fold** | The text obtained by applying a prefix of the log to an empty string |
//! | **Position** | A character offset (Unicode scalar values, not bytes) |
//!
//! Events carry the exact characters they insert or remove, so a log can be
//! inspected and replayed without any snapshot of the text it came from.

use serde::{Deserialize, Serialize};

use crate::text;

// ============================================
// Action
// ============================================

/// What a keystroke event did to the text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    /// Characters were inserted at `position`
    Insert,
    /// Characters were removed starting at `position`
    Delete,
    /// Word deletion recorded by other producers.
    ///
    /// The encoder never emits this; replay treats it as a [`Action::Delete`]
    /// of the recorded content length.
    DeleteWord,
}

impl Action {
    /// Returns the identifier used in the exchange format
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Insert => "insert",
            Action::Delete => "delete",
            Action::DeleteWord => "deleteWord",
        }
    }

    /// True for actions that remove text
    pub fn is_removal(&self) -> bool {
        matches!(self, Action::Delete | Action::DeleteWord)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "insert" => Ok(Action::Insert),
            "delete" => Ok(Action::Delete),
            "deleteWord" => Ok(Action::DeleteWord),
            _ => Err(format!("unknown action: {}", s)),
        }
    }
}

// ============================================
// KeystrokeEvent
// ============================================

/// The atomic unit of the event log.
///
/// `position` refers to the text as it existed immediately before this
/// event. For removals it is the start of the removed span and `content`
/// holds the removed characters, not just their count.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeystrokeEvent {
    /// Milliseconds since an arbitrary epoch, non-decreasing across a log
    pub timestamp: i64,
    /// Kind of edit
    pub action: Action,
    /// Character offset into the text before this event
    pub position: usize,
    /// Inserted or removed characters
    #[serde(default)]
    pub content: String,
}

impl KeystrokeEvent {
    /// Create an insert event
    pub fn insert(timestamp: i64, position: usize, content: impl Into<String>) -> Self {
        Self {
            timestamp,
            action: Action::Insert,
            position,
            content: content.into(),
        }
    }

    /// Create a delete event
    pub fn delete(timestamp: i64, position: usize, content: impl Into<String>) -> Self {
        Self {
            timestamp,
            action: Action::Delete,
            position,
            content: content.into(),
        }
    }

    /// Number of characters in `content`
    pub fn char_len(&self) -> usize {
        text::char_len(&self.content)
    }

    /// Character offset one past the end of the affected span
    pub fn end(&self) -> usize {
        self.position.saturating_add(self.char_len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_round_trip_names() {
        for action in [Action::Insert, Action::Delete, Action::DeleteWord] {
            assert_eq!(action.as_str().parse::<Action>().unwrap(), action);
        }
        assert!("backspace".parse::<Action>().is_err());
    }

    #[test]
    fn test_action_serde_names() {
        let json = serde_json::to_string(&Action::DeleteWord).unwrap();
        assert_eq!(json, "\"deleteWord\"");
        let action: Action = serde_json::from_str("\"insert\"").unwrap();
        assert_eq!(action, Action::Insert);
    }

    #[test]
    fn test_removal_actions() {
        assert!(!Action::Insert.is_removal());
        assert!(Action::Delete.is_removal());
        assert!(Action::DeleteWord.is_removal());
    }

    #[test]
    fn test_event_span_counts_characters() {
        let event = KeystrokeEvent::insert(0, 3, "héllo");
        assert_eq!(event.char_len(), 5);
        assert_eq!(event.end(), 8);
    }
}
