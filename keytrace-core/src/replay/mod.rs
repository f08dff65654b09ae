//! Replay engine
//!
//! [`ReplayEngine`] walks a cursor through an immutable log snapshot and
//! keeps the reconstructed text for the current cursor. It does not own a
//! clock. Whenever it wants to advance it arms a [`ScheduledAdvance`] and
//! the driver (a TUI loop, or the async [`player`]) calls
//! [`ReplayEngine::fire`] with the ticket once the delay has elapsed.
//!
//! ## States
//!
//! | State | Condition |
//! |-------|-----------|
//! | Idle | not playing, `cursor < len` |
//! | Playing | playing, exactly one advance pending |
//! | Finished | not playing, `cursor == len` |
//!
//! Every call that changes the cursor or the playing flag disarms the
//! pending advance first, so a stale ticket can never apply an event.
//!
//! ## Timing
//!
//! The advance that applies event `i` waits for the recorded gap between
//! event `i` and `i + 1`, divided by the speed and floored at
//! `min_delay`. The advance that applies the last event waits
//! `trailing_delay`.

pub mod player;

use std::sync::Arc;
use std::time::Duration;

use crate::config::PlaybackConfig;
use crate::fold::apply;
use crate::types::KeystrokeEvent;

pub use player::{spawn_player, PlaybackSnapshot, PlayerCommand, PlayerHandle};

/// Timing and speed limits for playback
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSettings {
    /// Speed used by a fresh engine
    pub initial_speed: f64,
    pub min_speed: f64,
    pub max_speed: f64,
    /// Increment used by [`ReplayEngine::faster`] and [`ReplayEngine::slower`]
    pub speed_step: f64,
    /// Floor for every scheduled delay
    pub min_delay: Duration,
    /// Delay before applying the last event
    pub trailing_delay: Duration,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            initial_speed: 1.0,
            min_speed: 0.5,
            max_speed: 5.0,
            speed_step: 0.5,
            min_delay: Duration::from_millis(10),
            trailing_delay: Duration::from_millis(500),
        }
    }
}

impl From<&PlaybackConfig> for PlaybackSettings {
    fn from(config: &PlaybackConfig) -> Self {
        Self {
            initial_speed: config.speed,
            min_speed: config.min_speed,
            max_speed: config.max_speed,
            speed_step: config.speed_step,
            min_delay: Duration::from_millis(config.min_delay_ms),
            trailing_delay: Duration::from_millis(config.trailing_delay_ms),
        }
    }
}

/// Where the engine is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Idle,
    Playing,
    Finished,
}

impl PlaybackStatus {
    /// Label for the play/pause control
    pub fn control_label(&self) -> &'static str {
        match self {
            PlaybackStatus::Idle => "Play",
            PlaybackStatus::Playing => "Pause",
            PlaybackStatus::Finished => "Replay",
        }
    }
}

/// Identifies one armed advance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

/// An advance the driver should fire after `delay`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledAdvance {
    pub ticket: Ticket,
    pub delay: Duration,
}

/// Timed playback over a log snapshot
#[derive(Debug, Clone)]
pub struct ReplayEngine {
    events: Arc<[KeystrokeEvent]>,
    settings: PlaybackSettings,
    cursor: usize,
    text: String,
    playing: bool,
    speed: f64,
    pending: Option<ScheduledAdvance>,
    next_ticket: u64,
    clamped: usize,
}

impl ReplayEngine {
    /// Create an idle engine at index 0
    pub fn new(events: impl Into<Arc<[KeystrokeEvent]>>, settings: PlaybackSettings) -> Self {
        let speed = clamp_speed(settings.initial_speed, &settings);
        Self {
            events: events.into(),
            settings,
            cursor: 0,
            text: String::new(),
            playing: false,
            speed,
            pending: None,
            next_ticket: 0,
            clamped: 0,
        }
    }

    /// Replace the snapshot. Cursor, cache and timer are reset; speed is kept.
    pub fn load(&mut self, events: impl Into<Arc<[KeystrokeEvent]>>) {
        self.disarm();
        self.events = events.into();
        self.playing = false;
        self.cursor = 0;
        self.text.clear();
        self.clamped = 0;
        tracing::debug!(events = self.events.len(), "Replay snapshot loaded");
    }

    pub fn events(&self) -> &[KeystrokeEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of events folded so far
    pub fn cursor_index(&self) -> usize {
        self.cursor
    }

    /// Text after folding `cursor_index()` events
    pub fn reconstructed_text(&self) -> &str {
        &self.text
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn settings(&self) -> &PlaybackSettings {
        &self.settings
    }

    /// The currently armed advance, if any
    pub fn pending(&self) -> Option<ScheduledAdvance> {
        self.pending
    }

    /// How many of the applied events `[0, cursor)` had to be clamped
    pub fn clamped_events(&self) -> usize {
        self.clamped
    }

    pub fn status(&self) -> PlaybackStatus {
        if self.playing {
            PlaybackStatus::Playing
        } else if self.cursor >= self.events.len() {
            PlaybackStatus::Finished
        } else {
            PlaybackStatus::Idle
        }
    }

    /// `cursor / len * 100`, or 0 for an empty log
    pub fn progress_percent(&self) -> f64 {
        if self.events.is_empty() {
            0.0
        } else {
            self.cursor as f64 / self.events.len() as f64 * 100.0
        }
    }

    /// Start playing. From the end of the log this restarts at index 0.
    pub fn play(&mut self) -> Option<ScheduledAdvance> {
        self.disarm();
        if self.cursor >= self.events.len() {
            self.rewind();
        }
        if self.events.is_empty() {
            self.playing = false;
            tracing::debug!("Nothing to play");
            return None;
        }
        self.playing = true;
        tracing::debug!(cursor = self.cursor, speed = self.speed, "Playback started");
        self.arm()
    }

    /// Stop scheduling; the cursor stays where it is
    pub fn pause(&mut self) {
        self.disarm();
        if self.playing {
            tracing::debug!(cursor = self.cursor, "Playback paused");
        }
        self.playing = false;
    }

    /// Play when stopped, pause when playing
    pub fn toggle(&mut self) -> Option<ScheduledAdvance> {
        if self.playing {
            self.pause();
            None
        } else {
            self.play()
        }
    }

    /// Jump to `index` (clamped to `[0, len]`) and stop playing
    pub fn seek(&mut self, index: usize) {
        self.disarm();
        self.playing = false;

        let index = index.min(self.events.len());
        if index < self.cursor {
            self.rewind();
        }
        while self.cursor < index {
            self.apply_next();
        }
    }

    /// Back to index 0, stopped
    pub fn reset(&mut self) {
        self.seek(0);
    }

    pub fn step_forward(&mut self) {
        self.seek(self.cursor.saturating_add(1));
    }

    pub fn step_back(&mut self) {
        self.seek(self.cursor.saturating_sub(1));
    }

    /// Set the speed factor, clamped to the configured range.
    ///
    /// An advance that is already armed keeps its delay; the new speed
    /// applies from the next one. Returns the effective speed.
    pub fn set_speed(&mut self, factor: f64) -> f64 {
        self.speed = clamp_speed(factor, &self.settings);
        self.speed
    }

    pub fn faster(&mut self) -> f64 {
        self.set_speed(self.speed + self.settings.speed_step)
    }

    pub fn slower(&mut self) -> f64 {
        self.set_speed(self.speed - self.settings.speed_step)
    }

    /// Delay before the advance that applies event `index`
    pub fn delay_before(&self, index: usize) -> Duration {
        match (self.events.get(index), self.events.get(index + 1)) {
            (Some(current), Some(next)) => {
                let gap_ms = next.timestamp.saturating_sub(current.timestamp).max(0) as f64;
                let nanos = (gap_ms * 1_000_000.0 / self.speed).round() as u64;
                Duration::from_nanos(nanos).max(self.settings.min_delay)
            }
            _ => self.settings.trailing_delay,
        }
    }

    /// Fire an armed advance. Stale or unknown tickets are ignored.
    ///
    /// Returns the next armed advance, if playback continues.
    pub fn fire(&mut self, ticket: Ticket) -> Option<ScheduledAdvance> {
        match self.pending {
            Some(pending) if pending.ticket == ticket => self.advance(),
            _ => {
                tracing::trace!(?ticket, "Ignoring stale advance");
                None
            }
        }
    }

    /// Apply the event at the cursor and arm the next advance.
    ///
    /// Does nothing unless playing. Reaching the end of the log finishes
    /// playback.
    pub fn advance(&mut self) -> Option<ScheduledAdvance> {
        self.disarm();
        if !self.playing {
            return None;
        }

        self.apply_next();

        if self.cursor >= self.events.len() {
            self.playing = false;
            tracing::debug!(events = self.events.len(), "Playback finished");
            return None;
        }

        self.arm()
    }

    fn rewind(&mut self) {
        self.cursor = 0;
        self.text.clear();
        self.clamped = 0;
    }

    /// Apply the event at the cursor, if any, and move past it.
    fn apply_next(&mut self) {
        let Some(event) = self.events.get(self.cursor) else {
            return;
        };
        if apply(&mut self.text, event).is_clamped() {
            self.clamped += 1;
            tracing::warn!(
                index = self.cursor,
                action = %event.action,
                position = event.position,
                "Event span exceeds reconstructed text; clamped"
            );
        }
        self.cursor += 1;
    }

    fn arm(&mut self) -> Option<ScheduledAdvance> {
        let scheduled = ScheduledAdvance {
            ticket: Ticket(self.next_ticket),
            delay: self.delay_before(self.cursor),
        };
        self.next_ticket += 1;
        self.pending = Some(scheduled);
        self.pending
    }

    fn disarm(&mut self) {
        self.pending = None;
    }
}

/// Clamp `factor` into the configured range without panicking.
///
/// Unusable bounds (NaN, non-positive or inverted) fall back to the defaults.
fn clamp_speed(factor: f64, settings: &PlaybackSettings) -> f64 {
    let (min, max) = speed_bounds(settings);
    if factor.is_nan() {
        return min;
    }
    factor.max(min).min(max)
}

fn speed_bounds(settings: &PlaybackSettings) -> (f64, f64) {
    let (min, max) = (settings.min_speed, settings.max_speed);
    if min.is_nan() || max.is_nan() || min <= 0.0 || max < min {
        let defaults = PlaybackSettings::default();
        (defaults.min_speed, defaults.max_speed)
    } else {
        (min, max)
    }
}
