//! Application state for the TUI.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use keytrace_core::format::{default_recording_name, default_text_name, write_log};
use keytrace_core::text::{byte_offset, char_len};
use keytrace_core::{
    now_ms, ClipboardOp, Config, Error, KeystrokeEvent, PlaybackSettings, RecordingSession,
    ReplayEngine, Ticket,
};

/// Upper bound on how long the main loop blocks waiting for input
const MAX_POLL: Duration = Duration::from_millis(100);

/// How long a status message stays visible
const STATUS_TTL: Duration = Duration::from_secs(4);

/// Current view mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    /// Writing surface
    #[default]
    Record,
    /// Playback of the recorded or loaded log
    Replay,
}

/// Transient message shown in the status line
#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
    shown_at: Instant,
}

/// Main application state.
pub struct App {
    /// Current view mode
    pub view_mode: ViewMode,
    /// Recording session fed by the writing surface
    pub session: RecordingSession,
    /// Caret position in characters
    pub caret: usize,
    /// Playback engine
    pub engine: ReplayEngine,
    /// Whether the writing surface is available (false for `replay`)
    pub can_record: bool,
    /// Scroll offset for the text panes
    pub scroll_offset: u16,
    /// Latest status message
    pub status: Option<StatusMessage>,
    /// Whether the app should exit
    pub should_quit: bool,
    /// Armed playback advance and when it is due
    timer: Option<(Ticket, Instant)>,
    /// Explicit save path from the command line
    save_path: Option<PathBuf>,
    /// Directory for default-named saves
    output_dir: PathBuf,
}

impl App {
    /// Create an app that starts on the writing surface.
    ///
    /// `resume` seeds the session with a previously saved log.
    pub fn recorder(
        config: &Config,
        save_path: Option<PathBuf>,
        resume: Option<Vec<KeystrokeEvent>>,
    ) -> Self {
        let mut session = RecordingSession::with_strategy(config.recording.strategy);
        if let Some(events) = resume {
            session.load(events);
        }
        let caret = char_len(session.current_text());

        Self {
            view_mode: ViewMode::Record,
            engine: ReplayEngine::new(
                session.log().snapshot(),
                PlaybackSettings::from(&config.playback),
            ),
            session,
            caret,
            can_record: true,
            scroll_offset: 0,
            status: None,
            should_quit: false,
            timer: None,
            save_path,
            output_dir: config.recording.output_dir(),
        }
    }

    /// Create an app that only plays back `events`.
    pub fn player(config: &Config, events: Vec<KeystrokeEvent>) -> Self {
        Self {
            view_mode: ViewMode::Replay,
            engine: ReplayEngine::new(events, PlaybackSettings::from(&config.playback)),
            session: RecordingSession::new(),
            caret: 0,
            can_record: false,
            scroll_offset: 0,
            status: None,
            should_quit: false,
            timer: None,
            save_path: None,
            output_dir: config.recording.output_dir(),
        }
    }

    /// Start playback without waiting for a key press.
    pub fn autoplay(&mut self) {
        self.engine.play();
        self.sync_timer(Instant::now());
    }

    /// Fire the playback advance if it is due and expire old status messages.
    pub fn tick(&mut self, now: Instant) {
        if let Some((ticket, due)) = self.timer {
            if now >= due {
                self.timer = None;
                self.engine.fire(ticket);
                self.sync_timer(now);
            }
        }

        if let Some(status) = &self.status {
            if now.duration_since(status.shown_at) > STATUS_TTL {
                self.status = None;
            }
        }
    }

    /// How long the main loop may wait for input before the next tick.
    pub fn poll_timeout(&self, now: Instant) -> Duration {
        match self.timer {
            Some((_, due)) => due.saturating_duration_since(now).min(MAX_POLL),
            None => MAX_POLL,
        }
    }

    /// Track the engine's pending advance. A new ticket restarts the clock.
    fn sync_timer(&mut self, now: Instant) {
        self.timer = match (self.engine.pending(), self.timer) {
            (Some(pending), Some((ticket, due))) if pending.ticket == ticket => Some((ticket, due)),
            (Some(pending), _) => Some((pending.ticket, now + pending.delay)),
            (None, _) => None,
        };
    }

    fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: false,
            shown_at: Instant::now(),
        });
    }

    fn set_error(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: true,
            shown_at: Instant::now(),
        });
    }

    /// Handle keyboard input.
    pub fn handle_key(&mut self, key: KeyEvent) {
        match self.view_mode {
            ViewMode::Record => self.handle_record_key(key),
            ViewMode::Replay => self.handle_replay_key(key),
        }
        self.sync_timer(Instant::now());
    }

    // ========== Writing surface ==========

    /// Handle keyboard input on the writing surface.
    fn handle_record_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Char('r') => self.toggle_recording(),
                KeyCode::Char('s') => self.save_recording(),
                KeyCode::Char('t') => self.export_text(),
                KeyCode::Char('n') => self.new_recording(),
                KeyCode::Char('p') => self.open_replay(),
                KeyCode::Char('c') => self.block_clipboard(ClipboardOp::Copy),
                KeyCode::Char('x') => self.block_clipboard(ClipboardOp::Cut),
                KeyCode::Char('v') => self.block_clipboard(ClipboardOp::Paste),
                KeyCode::Char('w') | KeyCode::Backspace => self.delete_word_before_caret(),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Left => self.caret = self.caret.saturating_sub(1),
            KeyCode::Right => self.caret = (self.caret + 1).min(char_len(self.session.current_text())),
            KeyCode::Home => self.caret = self.line_start(),
            KeyCode::End => self.caret = self.line_end(),
            KeyCode::Char(c) => self.insert_at_caret(&c.to_string()),
            KeyCode::Enter => self.insert_at_caret("\n"),
            KeyCode::Tab => self.insert_at_caret("\t"),
            KeyCode::Backspace => self.delete_before_caret(),
            KeyCode::Delete => self.delete_after_caret(),
            _ => {}
        }
    }

    fn toggle_recording(&mut self) {
        if self.session.is_active() {
            self.session.stop();
            self.set_status("Recording stopped");
        } else {
            self.session.start();
            self.set_status("Recording started");
        }
    }

    fn new_recording(&mut self) {
        if self.session.is_active() {
            self.set_error("Stop recording before starting a new one");
            return;
        }
        self.session.clear();
        self.caret = 0;
        self.scroll_offset = 0;
        self.set_status("Recording cleared");
    }

    fn block_clipboard(&mut self, op: ClipboardOp) {
        if !self.session.allow_clipboard(op) {
            self.set_error(format!("{} is disabled on the writing surface", capitalize(op.as_str())));
        }
    }

    /// Whether edits reach the text. Matches a disabled text area when idle.
    fn ensure_writable(&mut self) -> bool {
        if self.session.is_active() {
            true
        } else {
            self.set_error("Press Ctrl+R to start recording");
            false
        }
    }

    /// Submit a full-text change to the session, as a text widget would.
    fn submit(&mut self, new_text: String, caret: usize) {
        self.caret = caret;
        self.session.observe(&new_text, caret, now_ms());
    }

    fn insert_at_caret(&mut self, s: &str) {
        if !self.ensure_writable() {
            return;
        }
        let mut text = self.session.current_text().to_string();
        text.insert_str(byte_offset(&text, self.caret), s);
        let caret = self.caret + char_len(s);
        self.submit(text, caret);
    }

    fn delete_before_caret(&mut self) {
        if !self.ensure_writable() || self.caret == 0 {
            return;
        }
        self.delete_span(self.caret - 1, self.caret);
    }

    fn delete_after_caret(&mut self) {
        if !self.ensure_writable() || self.caret >= char_len(self.session.current_text()) {
            return;
        }
        self.delete_span(self.caret, self.caret + 1);
    }

    fn delete_word_before_caret(&mut self) {
        if !self.ensure_writable() || self.caret == 0 {
            return;
        }
        let chars: Vec<char> = self.session.current_text().chars().collect();
        let mut start = self.caret.min(chars.len());
        while start > 0 && chars[start - 1].is_whitespace() {
            start -= 1;
        }
        while start > 0 && !chars[start - 1].is_whitespace() {
            start -= 1;
        }
        self.delete_span(start, self.caret);
    }

    /// Remove characters `[start, end)` and leave the caret at `start`.
    fn delete_span(&mut self, start: usize, end: usize) {
        let mut text = self.session.current_text().to_string();
        let from = byte_offset(&text, start);
        let to = byte_offset(&text, end);
        text.replace_range(from..to, "");
        self.submit(text, start);
    }

    fn line_start(&self) -> usize {
        let chars: Vec<char> = self.session.current_text().chars().collect();
        let mut idx = self.caret.min(chars.len());
        while idx > 0 && chars[idx - 1] != '\n' {
            idx -= 1;
        }
        idx
    }

    fn line_end(&self) -> usize {
        let chars: Vec<char> = self.session.current_text().chars().collect();
        let mut idx = self.caret.min(chars.len());
        while idx < chars.len() && chars[idx] != '\n' {
            idx += 1;
        }
        idx
    }

    fn save_recording(&mut self) {
        let path = self.save_path.clone().unwrap_or_else(|| {
            self.output_dir
                .join(default_recording_name(now_ms()))
        });
        match write_log(&path, self.session.log().events()) {
            Ok(()) => self.set_status(format!("Recording saved to {}", path.display())),
            Err(Error::EmptyRecording) => self.set_error("No recording to save"),
            Err(e) => {
                tracing::error!(error = %e, path = %path.display(), "Failed to save recording");
                self.set_error(format!("Failed to save recording: {}", e));
            }
        }
    }

    fn export_text(&mut self) {
        if self.session.current_text().trim().is_empty() {
            self.set_error("No text to export");
            return;
        }
        let path = self
            .output_dir
            .join(default_text_name(now_ms()));
        match write_text(&path, self.session.current_text()) {
            Ok(()) => self.set_status(format!("Text saved to {}", path.display())),
            Err(e) => {
                tracing::error!(error = %e, path = %path.display(), "Failed to export text");
                self.set_error(format!("Failed to export text: {}", e));
            }
        }
    }

    /// Switch to playback with a fresh snapshot of the session log.
    fn open_replay(&mut self) {
        if self.session.log().is_empty() {
            self.set_error("Nothing recorded yet");
            return;
        }
        self.session.stop();
        self.engine.load(self.session.log().snapshot());
        self.scroll_offset = 0;
        self.view_mode = ViewMode::Replay;
        tracing::info!(events = self.engine.len(), "Switched to playback");
    }

    // ========== Playback ==========

    /// Handle keyboard input during playback.
    fn handle_replay_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                if self.can_record {
                    self.close_replay();
                } else {
                    self.should_quit = true;
                }
            }
            KeyCode::Char(' ') => {
                self.engine.toggle();
            }
            KeyCode::Char('r') => self.engine.reset(),
            KeyCode::Left | KeyCode::Char('h') => self.engine.step_back(),
            KeyCode::Right | KeyCode::Char('l') => self.engine.step_forward(),
            KeyCode::Home | KeyCode::Char('g') => self.engine.seek(0),
            KeyCode::End | KeyCode::Char('G') => self.engine.seek(self.engine.len()),
            KeyCode::Char('+') | KeyCode::Char('=') => {
                let speed = self.engine.faster();
                self.set_status(format!("Speed {}x", speed));
            }
            KeyCode::Char('-') => {
                let speed = self.engine.slower();
                self.set_status(format!("Speed {}x", speed));
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.scroll_offset = self.scroll_offset.saturating_add(1);
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.scroll_offset = self.scroll_offset.saturating_sub(1);
            }
            _ => {}
        }
    }

    fn close_replay(&mut self) {
        self.engine.pause();
        self.scroll_offset = 0;
        self.view_mode = ViewMode::Record;
    }
}

fn write_text(path: &std::path::Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, text)?;
    tracing::info!(path = %path.display(), "Exported text");
    Ok(())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keytrace_core::{fold_all, PlaybackStatus};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn recording_app() -> App {
        let mut app = App::recorder(&Config::default(), None, None);
        app.handle_key(ctrl('r'));
        app
    }

    #[test]
    fn test_typing_is_ignored_until_recording() {
        let mut app = App::recorder(&Config::default(), None, None);
        type_str(&mut app, "abc");
        assert_eq!(app.session.current_text(), "");
        assert!(app.status.as_ref().unwrap().is_error);
    }

    #[test]
    fn test_typing_and_editing_records_events() {
        let mut app = recording_app();
        type_str(&mut app, "helo");
        app.handle_key(key(KeyCode::Left));
        type_str(&mut app, "l");
        app.handle_key(key(KeyCode::End));
        app.handle_key(key(KeyCode::Backspace));
        app.handle_key(key(KeyCode::Home));
        app.handle_key(key(KeyCode::Delete));

        assert_eq!(app.session.current_text(), "ell");
        assert_eq!(app.session.log().len(), 7);
        assert_eq!(fold_all(app.session.log().events()), "ell");
    }

    #[test]
    fn test_delete_word() {
        let mut app = recording_app();
        type_str(&mut app, "one two  ");
        app.handle_key(ctrl('w'));
        assert_eq!(app.session.current_text(), "one ");
        assert_eq!(app.caret, 4);
        assert_eq!(fold_all(app.session.log().events()), "one ");
    }

    #[test]
    fn test_multiline_home_end() {
        let mut app = recording_app();
        type_str(&mut app, "ab");
        app.handle_key(key(KeyCode::Enter));
        type_str(&mut app, "cd");
        app.handle_key(key(KeyCode::Home));
        assert_eq!(app.caret, 3);
        app.handle_key(key(KeyCode::End));
        assert_eq!(app.caret, 5);
    }

    #[test]
    fn test_clipboard_is_blocked() {
        let mut app = recording_app();
        type_str(&mut app, "x");
        app.handle_key(ctrl('v'));
        assert_eq!(app.session.current_text(), "x");
        assert_eq!(
            app.status.as_ref().unwrap().text,
            "Paste is disabled on the writing surface"
        );
    }

    #[test]
    fn test_new_recording_requires_stop() {
        let mut app = recording_app();
        type_str(&mut app, "x");
        app.handle_key(ctrl('n'));
        assert_eq!(app.session.log().len(), 1);

        app.handle_key(ctrl('r'));
        app.handle_key(ctrl('n'));
        assert!(app.session.log().is_empty());
        assert_eq!(app.caret, 0);
    }

    #[test]
    fn test_replay_from_recording() {
        let mut app = recording_app();
        type_str(&mut app, "Hi");
        app.handle_key(ctrl('p'));
        assert_eq!(app.view_mode, ViewMode::Replay);
        assert!(!app.session.is_active());
        assert_eq!(app.engine.len(), 2);

        app.handle_key(key(KeyCode::Char(' ')));
        assert_eq!(app.engine.status(), PlaybackStatus::Playing);
        assert!(app.poll_timeout(Instant::now()) <= MAX_POLL);

        let later = Instant::now() + Duration::from_secs(10);
        app.tick(later);
        assert_eq!(app.engine.cursor_index(), 1);
        app.tick(later + Duration::from_secs(10));
        assert_eq!(app.engine.status(), PlaybackStatus::Finished);
        assert_eq!(app.engine.reconstructed_text(), "Hi");

        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.view_mode, ViewMode::Record);
        assert!(!app.should_quit);
    }

    #[test]
    fn test_replay_keys() {
        let events = vec![
            KeystrokeEvent::insert(0, 0, "a"),
            KeystrokeEvent::insert(100, 1, "b"),
            KeystrokeEvent::insert(200, 2, "c"),
        ];
        let mut app = App::player(&Config::default(), events);
        app.handle_key(key(KeyCode::Right));
        app.handle_key(key(KeyCode::Right));
        assert_eq!(app.engine.reconstructed_text(), "ab");
        app.handle_key(key(KeyCode::Left));
        assert_eq!(app.engine.reconstructed_text(), "a");
        app.handle_key(key(KeyCode::End));
        assert_eq!(app.engine.reconstructed_text(), "abc");
        app.handle_key(key(KeyCode::Char('r')));
        assert_eq!(app.engine.cursor_index(), 0);

        app.handle_key(key(KeyCode::Char('+')));
        assert_eq!(app.engine.speed(), 1.5);
        app.handle_key(key(KeyCode::Char('-')));
        app.handle_key(key(KeyCode::Char('-')));
        app.handle_key(key(KeyCode::Char('-')));
        assert_eq!(app.engine.speed(), 0.5);

        app.handle_key(key(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[test]
    fn test_pause_drops_timer() {
        let events = vec![
            KeystrokeEvent::insert(0, 0, "a"),
            KeystrokeEvent::insert(100, 1, "b"),
        ];
        let mut app = App::player(&Config::default(), events);
        app.handle_key(key(KeyCode::Char(' ')));
        assert!(app.timer.is_some());
        app.handle_key(key(KeyCode::Char(' ')));
        assert!(app.timer.is_none());

        app.tick(Instant::now() + Duration::from_secs(10));
        assert_eq!(app.engine.cursor_index(), 0);
    }

    #[test]
    fn test_resume_seeds_session() {
        let events = vec![KeystrokeEvent::insert(0, 0, "draft")];
        let app = App::recorder(&Config::default(), None, Some(events));
        assert_eq!(app.session.current_text(), "draft");
        assert_eq!(app.caret, 5);
        assert_eq!(app.session.log().len(), 1);
    }

    #[test]
    fn test_save_recording_to_explicit_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out.json");
        let mut app = App::recorder(&Config::default(), Some(path.clone()), None);

        app.handle_key(ctrl('s'));
        assert!(!path.exists());
        assert_eq!(app.status.as_ref().unwrap().text, "No recording to save");

        app.handle_key(ctrl('r'));
        type_str(&mut app, "ok");
        app.handle_key(ctrl('s'));
        let saved = keytrace_core::format::read_log(&path).unwrap();
        assert_eq!(fold_all(&saved), "ok");
    }
}
