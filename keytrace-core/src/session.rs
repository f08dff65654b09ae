//! Recording session: the encoder side of keytrace
//!
//! A [`RecordingSession`] owns the live text mirror and the event log.
//! Collaborators hold it explicitly (no ambient global state), so several
//! independent sessions can coexist.
//!
//! Lifecycle:
//! - created empty and inactive
//! - [`start`](RecordingSession::start) / [`stop`](RecordingSession::stop)
//!   toggle whether observations become events; stopping keeps the log so
//!   recording can resume
//! - only [`clear`](RecordingSession::clear) empties log and text together

use crate::encoder::{encode_with, EncodeStrategy};
use crate::fold::fold_all;
use crate::log::EventLog;
use crate::text::TextStats;
use crate::types::KeystrokeEvent;

/// Current wall-clock time in epoch milliseconds, the timestamp unit of events
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Clipboard operations a writing surface may attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardOp {
    Copy,
    Cut,
    Paste,
}

impl ClipboardOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClipboardOp::Copy => "copy",
            ClipboardOp::Cut => "cut",
            ClipboardOp::Paste => "paste",
        }
    }
}

/// Live recording state for one piece of text
#[derive(Debug, Clone, Default)]
pub struct RecordingSession {
    log: EventLog,
    active: bool,
    current_text: String,
    strategy: EncodeStrategy,
}

impl RecordingSession {
    /// Create an empty, inactive session using the cursor-anchored encoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty, inactive session with the given encoder strategy
    pub fn with_strategy(strategy: EncodeStrategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    /// Start or resume recording. Existing text and events are kept.
    pub fn start(&mut self) {
        if !self.active {
            tracing::info!(events = self.log.len(), "Recording started");
        }
        self.active = true;
    }

    /// Pause recording. The log is kept.
    pub fn stop(&mut self) {
        if self.active {
            tracing::info!(events = self.log.len(), "Recording stopped");
        }
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn strategy(&self) -> EncodeStrategy {
        self.strategy
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn current_text(&self) -> &str {
        &self.current_text
    }

    /// Word and character counts of the current text
    pub fn stats(&self) -> TextStats {
        TextStats::of(&self.current_text)
    }

    /// Feed a raw text change from the writing surface.
    ///
    /// `cursor` is the caret position after the change. While active, the
    /// change is diffed against the mirror and the resulting events are
    /// appended. The mirror is updated either way. Returns the events
    /// appended by this call.
    pub fn observe(&mut self, new_text: &str, cursor: usize, now_ms: i64) -> &[KeystrokeEvent] {
        let before = self.log.len();

        if self.active {
            let events = encode_with(self.strategy, &self.current_text, new_text, cursor, now_ms);
            for event in events {
                tracing::debug!(
                    action = %event.action,
                    position = event.position,
                    chars = event.char_len(),
                    "Appending keystroke event"
                );
                self.log.push(event);
            }
        }

        self.current_text.clear();
        self.current_text.push_str(new_text);

        &self.log.events()[before..]
    }

    /// Replace the text mirror without producing events
    pub fn reset_text(&mut self, text: impl Into<String>) {
        self.current_text = text.into();
    }

    /// Decide a clipboard request from the writing surface.
    ///
    /// Always refused: pasted or cut text would bypass keystroke capture,
    /// and copying would let text leave the surface untyped. Returns `false`.
    pub fn allow_clipboard(&self, op: ClipboardOp) -> bool {
        tracing::debug!(op = op.as_str(), "Blocked clipboard operation");
        false
    }

    /// Replace the log with a loaded recording.
    ///
    /// The mirror becomes the fold of the loaded events; the active flag is
    /// left unchanged.
    pub fn load(&mut self, events: Vec<KeystrokeEvent>) {
        self.current_text = fold_all(&events);
        tracing::info!(events = events.len(), "Loaded recording into session");
        self.log.replace(events);
    }

    /// Reset everything: log, text and active flag
    pub fn clear(&mut self) {
        tracing::info!(events = self.log.len(), "Recording cleared");
        self.log.clear();
        self.current_text.clear();
        self.active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fold::fold;

    /// Type `s` one character at a time at the end of the text
    fn type_str(session: &mut RecordingSession, s: &str, t: &mut i64) {
        for c in s.chars() {
            let mut next = session.current_text().to_string();
            next.push(c);
            let cursor = next.chars().count();
            *t += 50;
            session.observe(&next, cursor, *t);
        }
    }

    #[test]
    fn test_new_session_is_inactive_and_empty() {
        let session = RecordingSession::new();
        assert!(!session.is_active());
        assert!(session.log().is_empty());
        assert_eq!(session.current_text(), "");
        assert_eq!(session.strategy(), EncodeStrategy::Cursor);
    }

    #[test]
    fn test_inactive_session_mirrors_without_events() {
        let mut session = RecordingSession::new();
        let appended = session.observe("abc", 3, 0).len();
        assert_eq!(appended, 0);
        assert_eq!(session.current_text(), "abc");
        assert!(session.log().is_empty());
    }

    #[test]
    fn test_typing_and_backspace() {
        let mut session = RecordingSession::new();
        session.start();
        let mut t = 0;
        type_str(&mut session, "cat", &mut t);

        let appended = session.observe("ca", 2, 500);
        assert_eq!(appended, &[KeystrokeEvent::delete(500, 2, "t")]);
        assert_eq!(session.log().len(), 4);
        assert_eq!(fold(session.log().events(), 4), session.current_text());
    }

    #[test]
    fn test_pause_and_resume_keeps_log() {
        let mut session = RecordingSession::new();
        session.start();
        let mut t = 0;
        type_str(&mut session, "ab", &mut t);
        session.stop();
        assert_eq!(session.log().len(), 2);

        session.start();
        type_str(&mut session, "c", &mut t);
        assert_eq!(session.log().len(), 3);
        assert_eq!(fold(session.log().events(), 3), "abc");
    }

    #[test]
    fn test_same_length_change_is_dropped_by_default() {
        let mut session = RecordingSession::new();
        session.start();
        session.observe("cat", 3, 0);
        assert!(session.observe("car", 3, 10).is_empty());
        assert_eq!(session.current_text(), "car");
    }

    #[test]
    fn test_trim_strategy_records_replacement() {
        let mut session = RecordingSession::with_strategy(EncodeStrategy::Trim);
        session.start();
        session.observe("cat", 3, 0);
        assert_eq!(session.observe("car", 3, 10).len(), 2);
        assert_eq!(fold(session.log().events(), session.log().len()), "car");
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut session = RecordingSession::new();
        session.start();
        session.observe("hi", 2, 0);
        session.clear();
        assert!(session.log().is_empty());
        assert_eq!(session.current_text(), "");
        assert!(!session.is_active());
    }

    #[test]
    fn test_reset_text_is_out_of_band() {
        let mut session = RecordingSession::new();
        session.start();
        session.reset_text("draft");
        assert!(session.log().is_empty());
        assert_eq!(session.current_text(), "draft");
    }

    #[test]
    fn test_load_replaces_log_and_text() {
        let mut session = RecordingSession::new();
        session.start();
        session.observe("zzz", 3, 0);
        session.load(vec![
            KeystrokeEvent::insert(0, 0, "H"),
            KeystrokeEvent::insert(100, 1, "i"),
        ]);
        assert_eq!(session.log().len(), 2);
        assert_eq!(session.current_text(), "Hi");
        assert!(session.is_active());
    }

    #[test]
    fn test_clipboard_is_blocked() {
        let session = RecordingSession::new();
        for op in [ClipboardOp::Copy, ClipboardOp::Cut, ClipboardOp::Paste] {
            assert!(!session.allow_clipboard(op));
        }
    }

    #[test]
    fn test_stats() {
        let mut session = RecordingSession::new();
        session.reset_text("two words");
        assert_eq!(session.stats(), TextStats { words: 2, chars: 9 });
    }
}
