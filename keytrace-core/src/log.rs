//! The append-only event log
//!
//! [`EventLog`] is owned by the recording side. Playback never aliases it:
//! it takes an immutable [`EventLog::snapshot`] and re-takes it explicitly
//! if the log has grown since.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::fold::apply;
use crate::text;
use crate::types::{Action, KeystrokeEvent};

/// Ordered, append-only sequence of keystroke events
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventLog {
    events: Vec<KeystrokeEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Append an event to the end of the log
    pub fn push(&mut self, event: KeystrokeEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[KeystrokeEvent] {
        &self.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, KeystrokeEvent> {
        self.events.iter()
    }

    pub fn last(&self) -> Option<&KeystrokeEvent> {
        self.events.last()
    }

    /// Immutable copy of the log for playback
    pub fn snapshot(&self) -> Arc<[KeystrokeEvent]> {
        Arc::from(self.events.as_slice())
    }

    /// Drop every event. Only an explicit session reset calls this.
    pub(crate) fn clear(&mut self) {
        self.events.clear();
    }

    pub(crate) fn replace(&mut self, events: Vec<KeystrokeEvent>) {
        self.events = events;
    }

    /// Summary statistics over the whole log
    pub fn summary(&self) -> LogSummary {
        LogSummary::of(&self.events)
    }
}

impl From<Vec<KeystrokeEvent>> for EventLog {
    fn from(events: Vec<KeystrokeEvent>) -> Self {
        Self { events }
    }
}

impl<'a> IntoIterator for &'a EventLog {
    type Item = &'a KeystrokeEvent;
    type IntoIter = std::slice::Iter<'a, KeystrokeEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

// ============================================
// Summary
// ============================================

/// Aggregate statistics for a log
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogSummary {
    pub events: usize,
    pub inserts: usize,
    pub deletes: usize,
    pub delete_words: usize,
    /// Characters added by insert events
    pub chars_inserted: usize,
    /// Characters recorded as removed by delete events
    pub chars_removed: usize,
    pub first_timestamp: Option<i64>,
    pub last_timestamp: Option<i64>,
    /// Characters in the fully folded text
    pub final_len: usize,
}

impl LogSummary {
    pub fn of(events: &[KeystrokeEvent]) -> Self {
        let mut summary = LogSummary {
            events: events.len(),
            first_timestamp: events.first().map(|e| e.timestamp),
            last_timestamp: events.last().map(|e| e.timestamp),
            ..Default::default()
        };

        let mut text = String::new();
        for event in events {
            match event.action {
                Action::Insert => {
                    summary.inserts += 1;
                    summary.chars_inserted += event.char_len();
                }
                Action::Delete => {
                    summary.deletes += 1;
                    summary.chars_removed += event.char_len();
                }
                Action::DeleteWord => {
                    summary.delete_words += 1;
                    summary.chars_removed += event.char_len();
                }
            }
            apply(&mut text, event);
        }
        summary.final_len = text::char_len(&text);
        summary
    }

    /// Milliseconds between the first and last event
    pub fn duration_ms(&self) -> i64 {
        match (self.first_timestamp, self.last_timestamp) {
            (Some(first), Some(last)) => last.saturating_sub(first).max(0),
            _ => 0,
        }
    }

    /// Wall-clock time of the first event
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.first_timestamp.and_then(DateTime::<Utc>::from_timestamp_millis)
    }

    /// Wall-clock time of the last event
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.last_timestamp.and_then(DateTime::<Utc>::from_timestamp_millis)
    }
}

// ============================================
// Validation
// ============================================

/// A problem found while checking a log against its own fold
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogIssue {
    /// Timestamp went backwards relative to the previous event
    TimestampRegression {
        index: usize,
        previous: i64,
        timestamp: i64,
    },
    /// The event's span extends past the text accumulated so far
    SpanOutOfBounds {
        index: usize,
        end: usize,
        text_len: usize,
    },
    /// A removal's recorded content differs from the text it removed
    ContentMismatch {
        index: usize,
        expected: String,
        found: String,
    },
}

impl LogIssue {
    pub fn index(&self) -> usize {
        match self {
            LogIssue::TimestampRegression { index, .. }
            | LogIssue::SpanOutOfBounds { index, .. }
            | LogIssue::ContentMismatch { index, .. } => *index,
        }
    }
}

impl std::fmt::Display for LogIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogIssue::TimestampRegression {
                index,
                previous,
                timestamp,
            } => write!(
                f,
                "event {}: timestamp {} is earlier than previous {}",
                index, timestamp, previous
            ),
            LogIssue::SpanOutOfBounds {
                index,
                end,
                text_len,
            } => write!(
                f,
                "event {}: span ends at {} but text has {} characters",
                index, end, text_len
            ),
            LogIssue::ContentMismatch {
                index,
                expected,
                found,
            } => write!(
                f,
                "event {}: removes {:?} but text holds {:?}",
                index, expected, found
            ),
        }
    }
}

/// Check every event against the text folded so far.
///
/// Validation is advisory. Playback clamps whatever it reports.
pub fn validate(events: &[KeystrokeEvent]) -> Vec<LogIssue> {
    let mut issues = Vec::new();
    let mut text = String::new();
    let mut previous_ts: Option<i64> = None;

    for (index, event) in events.iter().enumerate() {
        if let Some(previous) = previous_ts {
            if event.timestamp < previous {
                issues.push(LogIssue::TimestampRegression {
                    index,
                    previous,
                    timestamp: event.timestamp,
                });
            }
        }
        previous_ts = Some(event.timestamp);

        let text_len = text::char_len(&text);
        let end = if event.action.is_removal() {
            event.end()
        } else {
            event.position
        };
        if end > text_len {
            issues.push(LogIssue::SpanOutOfBounds {
                index,
                end,
                text_len,
            });
        } else if event.action.is_removal() {
            let found = text::char_slice(&text, event.position, event.end());
            if found != event.content {
                issues.push(LogIssue::ContentMismatch {
                    index,
                    expected: event.content.clone(),
                    found: found.to_string(),
                });
            }
        }

        apply(&mut text, event);
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EventLog {
        EventLog::from(vec![
            KeystrokeEvent::insert(1000, 0, "Hello"),
            KeystrokeEvent::insert(1200, 5, " wrld"),
            KeystrokeEvent::delete(1500, 6, "wrld"),
            KeystrokeEvent::insert(1900, 6, "world"),
        ])
    }

    #[test]
    fn test_push_and_snapshot() {
        let mut log = EventLog::new();
        assert!(log.is_empty());
        log.push(KeystrokeEvent::insert(0, 0, "a"));
        let snapshot = log.snapshot();
        log.push(KeystrokeEvent::insert(1, 1, "b"));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(log.len(), 2);
        assert_eq!(log.last().unwrap().content, "b");
    }

    #[test]
    fn test_summary() {
        let summary = sample().summary();
        assert_eq!(summary.events, 4);
        assert_eq!(summary.inserts, 3);
        assert_eq!(summary.deletes, 1);
        assert_eq!(summary.chars_inserted, 15);
        assert_eq!(summary.chars_removed, 4);
        assert_eq!(summary.duration_ms(), 900);
        assert_eq!(summary.final_len, "Hello world".len());
    }

    #[test]
    fn test_empty_summary() {
        let summary = EventLog::new().summary();
        assert_eq!(summary, LogSummary::default());
        assert_eq!(summary.duration_ms(), 0);
        assert!(summary.started_at().is_none());
    }

    #[test]
    fn test_summary_wall_clock() {
        let summary = sample().summary();
        let started = summary.started_at().unwrap();
        assert_eq!(started.timestamp_millis(), 1000);
        assert_eq!(
            summary.ended_at().unwrap() - started,
            chrono::Duration::milliseconds(900)
        );
    }

    #[test]
    fn test_validate_clean_log() {
        assert!(validate(sample().events()).is_empty());
    }

    #[test]
    fn test_validate_reports_issues() {
        let events = vec![
            KeystrokeEvent::insert(100, 0, "abc"),
            KeystrokeEvent::delete(50, 1, "xb"),
            KeystrokeEvent::delete(60, 1, "zzzz"),
        ];
        let issues = validate(&events);

        assert_eq!(
            issues[0],
            LogIssue::TimestampRegression {
                index: 1,
                previous: 100,
                timestamp: 50
            }
        );
        assert_eq!(
            issues[1],
            LogIssue::ContentMismatch {
                index: 1,
                expected: "xb".to_string(),
                found: "bc".to_string()
            }
        );
        assert_eq!(
            issues[2],
            LogIssue::SpanOutOfBounds {
                index: 2,
                end: 5,
                text_len: 1
            }
        );
        assert_eq!(issues.len(), 3);
        assert_eq!(issues[2].index(), 2);
    }
}
